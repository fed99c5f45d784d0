//! Resolution of a connection string to an authenticated, open tenant database.
//!
//! Every tenant-scoped operation goes through [`TenantResolver::open`]:
//! parse, authenticate, derive `root/<username>/<database>.db`, make sure the
//! tenant directory exists, then open the file with foreign keys enabled.
//! Handles are not cached; each request opens its own and drops it when done.

use crate::{descriptor::ConnectionDescriptor, ident};
use auth::CredentialStore;
use common::{Config, GatewayError, GatewayResult};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use tracing::debug;

/// File extension of tenant database files.
pub const DATABASE_EXTENSION: &str = "db";

/// Authenticates descriptors and opens tenant databases beneath a fixed root.
#[derive(Clone)]
pub struct TenantResolver {
    root: PathBuf,
    scheme: String,
    busy_timeout: Duration,
    credentials: Arc<dyn CredentialStore>,
}

impl TenantResolver {
    pub fn new(config: &Config, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            root: config.data_dir.clone(),
            scheme: config.scheme.clone(),
            busy_timeout: config.busy_timeout(),
            credentials,
        }
    }

    /// Root directory holding one subdirectory per tenant.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scheme every connection string must carry.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The injected credential store.
    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    /// Parse a connection string against the configured scheme.
    pub fn parse(&self, connection_string: &str) -> GatewayResult<ConnectionDescriptor> {
        ConnectionDescriptor::parse_with_scheme(connection_string, &self.scheme)
    }

    /// Parse, authenticate, and open in one step.
    pub fn open(&self, connection_string: &str) -> GatewayResult<TenantDatabase> {
        let descriptor = self.parse(connection_string)?;
        self.resolve(&descriptor)
    }

    /// Authenticate `descriptor` and open its database.
    pub fn resolve(&self, descriptor: &ConnectionDescriptor) -> GatewayResult<TenantDatabase> {
        self.authenticate(descriptor)?;
        let path = self.database_path(descriptor)?;
        self.ensure_tenant_dir(&descriptor.username)?;
        let conn = self.open_file(&path)?;
        debug!(
            username = %descriptor.username,
            database = %descriptor.database,
            "tenant database opened"
        );
        Ok(TenantDatabase {
            conn,
            username: descriptor.username.clone(),
            database: descriptor.database.clone(),
            path,
        })
    }

    /// Unknown users and wrong passwords both fail with `AuthenticationFailed`.
    pub fn authenticate(&self, descriptor: &ConnectionDescriptor) -> GatewayResult<()> {
        if self
            .credentials
            .authenticate(&descriptor.username, &descriptor.password)?
        {
            Ok(())
        } else {
            Err(GatewayError::AuthenticationFailed)
        }
    }

    /// `root/<username>/<database>.db`; both segments must be path-safe.
    pub fn database_path(&self, descriptor: &ConnectionDescriptor) -> GatewayResult<PathBuf> {
        let username = ident::username_segment(&descriptor.username)?;
        let database = ident::database_segment(&descriptor.database)?;
        Ok(self
            .root
            .join(username)
            .join(format!("{database}.{DATABASE_EXTENSION}")))
    }

    /// Create `root/<username>` if missing. Safe under concurrent first use.
    pub fn ensure_tenant_dir(&self, username: &str) -> GatewayResult<PathBuf> {
        let dir = self.root.join(ident::username_segment(username)?);
        fs::create_dir_all(&dir).map_err(|err| {
            GatewayError::StorageUnavailable(format!(
                "failed to create tenant directory {}: {err}",
                dir.display()
            ))
        })?;
        Ok(dir)
    }

    fn open_file(&self, path: &Path) -> GatewayResult<Connection> {
        let conn = Connection::open(path).map_err(|err| {
            GatewayError::StorageUnavailable(format!(
                "failed to open database {}: {err}",
                path.display()
            ))
        })?;
        conn.busy_timeout(self.busy_timeout)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(conn)
    }
}

/// An open handle to one tenant's database, valid for a single request.
#[derive(Debug)]
pub struct TenantDatabase {
    conn: Connection,
    username: String,
    database: String,
    path: PathBuf,
}

impl TenantDatabase {
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Begin a transaction holding the write lock from `BEGIN`, so competing
    /// writers wait out the busy timeout instead of failing with `SQLITE_BUSY`.
    pub fn write_transaction(&mut self) -> GatewayResult<Transaction<'_>> {
        Ok(self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?)
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
