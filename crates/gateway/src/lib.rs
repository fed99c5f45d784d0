//! Tenant-scoped gateway operations.
//!
//! Every method except [`Gateway::create_user`] takes a connection string,
//! authenticates it through the [`TenantResolver`], opens a fresh handle to the
//! tenant database, runs its statements, and drops the handle before
//! returning. Methods are blocking; async callers should run them on
//! `spawn_blocking`.

pub mod audit;

use audit::AuditSink;
use auth::{CredentialStore, SqliteCredentialStore};
use catalog::IndexCatalog;
use common::{Config, Credential, GatewayError, GatewayResult, IndexInfo, RecordBatch};
use std::{collections::BTreeMap, fs, path::PathBuf, sync::Arc};
use tenant::{ConnectionDescriptor, TenantDatabase, TenantResolver, ident};
use tracing::info;

/// Column-name keyed map used for column definitions, records, and updates.
pub type ColumnMap = BTreeMap<String, String>;

/// Entry point for all per-request operations.
#[derive(Clone)]
pub struct Gateway {
    resolver: TenantResolver,
    audit: Arc<dyn AuditSink>,
}

impl Gateway {
    pub fn new(
        config: &Config,
        credentials: Arc<dyn CredentialStore>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            resolver: TenantResolver::new(config, credentials),
            audit,
        }
    }

    /// Prepare `config.data_dir`, open the SQLite credential store inside it,
    /// and seed the configured default user if the store is empty.
    pub fn bootstrap(config: &Config, audit: Arc<dyn AuditSink>) -> GatewayResult<Self> {
        fs::create_dir_all(&config.data_dir).map_err(|err| {
            GatewayError::StorageUnavailable(format!(
                "failed to create data directory {}: {err}",
                config.data_dir.display()
            ))
        })?;
        let store = SqliteCredentialStore::open(&config.auth_db_path(), config.busy_timeout())?;
        store.bootstrap(config.seed_user.as_ref())?;
        Ok(Self::new(config, Arc::new(store), audit))
    }

    pub fn resolver(&self) -> &TenantResolver {
        &self.resolver
    }

    /// Register a credential; returns `scheme://user:pass/<dbname>`.
    pub fn create_user(&self, username: &str, password: &str) -> GatewayResult<String> {
        ident::username_segment(username)?;
        ident::password(password)?;
        self.resolver
            .credentials()
            .register(&Credential::new(username, password))?;
        self.audit.record(&format!("user {username} created"));
        info!(username, "user created");
        Ok(ConnectionDescriptor::template(
            self.resolver.scheme(),
            username,
            password,
        ))
    }

    /// Create the tenant database file and its index metadata table.
    pub fn create_database(&self, connection_string: &str) -> GatewayResult<PathBuf> {
        let db = self.open(connection_string)?;
        catalog::ensure_metadata_table(db.connection())?;
        self.record(&db, "database created");
        Ok(db.path().to_path_buf())
    }

    pub fn create_table(
        &self,
        connection_string: &str,
        table_name: &str,
        columns: &ColumnMap,
    ) -> GatewayResult<()> {
        let db = self.open(connection_string)?;
        statement::create_table(table_name, columns)?.execute(db.connection())?;
        self.record(&db, &format!("table {table_name} created"));
        Ok(())
    }

    pub fn insert_record(
        &self,
        connection_string: &str,
        table_name: &str,
        record: &ColumnMap,
    ) -> GatewayResult<()> {
        let db = self.open(connection_string)?;
        statement::insert(table_name, record)?.execute(db.connection())?;
        self.record(&db, &format!("record inserted into {table_name}"));
        Ok(())
    }

    /// Insert every record or none: the batch runs in one transaction and the
    /// first failure rolls back the records before it.
    pub fn insert_multiple_records(
        &self,
        connection_string: &str,
        table_name: &str,
        records: &[ColumnMap],
    ) -> GatewayResult<usize> {
        let mut db = self.open(connection_string)?;
        let statements = records
            .iter()
            .map(|record| statement::insert(table_name, record))
            .collect::<GatewayResult<Vec<_>>>()?;

        let tx = db.write_transaction()?;
        for stmt in &statements {
            stmt.execute(&tx)?;
        }
        tx.commit()?;

        self.record(
            &db,
            &format!("{} record(s) inserted into {table_name}", statements.len()),
        );
        Ok(statements.len())
    }

    pub fn query_data(
        &self,
        connection_string: &str,
        table_name: &str,
        columns: &str,
        condition: &str,
    ) -> GatewayResult<RecordBatch> {
        let db = self.open(connection_string)?;
        let stmt = statement::select(table_name, columns, condition)?;
        self.record(&db, &format!("executing query: {}", stmt.sql));
        stmt.query(db.connection())
    }

    /// Add a column to an existing table.
    pub fn update_table(
        &self,
        connection_string: &str,
        table_name: &str,
        column_name: &str,
        column_type: &str,
    ) -> GatewayResult<()> {
        let db = self.open(connection_string)?;
        statement::add_column(table_name, column_name, column_type)?.execute(db.connection())?;
        self.record(
            &db,
            &format!("column {column_name} added to {table_name}"),
        );
        Ok(())
    }

    /// Returns the number of rows changed.
    pub fn update_record(
        &self,
        connection_string: &str,
        table_name: &str,
        updates: &ColumnMap,
        condition: &str,
    ) -> GatewayResult<usize> {
        let db = self.open(connection_string)?;
        let changed =
            statement::update(table_name, updates, condition)?.execute(db.connection())?;
        self.record(
            &db,
            &format!("{changed} record(s) updated in {table_name}"),
        );
        Ok(changed)
    }

    /// Returns the index name actually used.
    pub fn add_index(
        &self,
        connection_string: &str,
        table_name: &str,
        columns: &[String],
        index_name: Option<&str>,
    ) -> GatewayResult<String> {
        let mut db = self.open(connection_string)?;
        let name = IndexCatalog::new(&mut db).add_index(table_name, columns, index_name)?;
        self.record(&db, &format!("index {name} created on {table_name}"));
        Ok(name)
    }

    pub fn delete_index(&self, connection_string: &str, index_name: &str) -> GatewayResult<()> {
        let mut db = self.open(connection_string)?;
        IndexCatalog::new(&mut db).delete_index(index_name)?;
        self.record(&db, &format!("index {index_name} deleted"));
        Ok(())
    }

    pub fn list_indexes(&self, connection_string: &str) -> GatewayResult<Vec<IndexInfo>> {
        let db = self.open(connection_string)?;
        catalog::list_indexes(db.connection())
    }

    fn open(&self, connection_string: &str) -> GatewayResult<TenantDatabase> {
        let descriptor = self.resolver.parse(connection_string)?;
        self.resolver.resolve(&descriptor).inspect_err(|err| {
            if matches!(err, GatewayError::AuthenticationFailed) {
                self.audit.record(&format!(
                    "authentication failed for user {}",
                    descriptor.username
                ));
            }
        })
    }

    fn record(&self, db: &TenantDatabase, event: &str) {
        self.audit
            .record(&format!("{}/{}: {event}", db.username(), db.database()));
    }
}
