//! Credential store consulted by the tenant resolver.
//!
//! The store answers exact `(username, password)` membership queries and
//! accepts new registrations. Records are never updated or deleted.
//!
//! Usernames name tenant directories, so two usernames that differ only in
//! ASCII case cannot both be registered. Authentication still requires the
//! registered spelling.

use common::{Credential, GatewayError, GatewayResult};
use rusqlite::{Connection, ErrorCode, OptionalExtension, params};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
    time::Duration,
};
use tracing::{debug, info};

/// Persistent username/password registry.
pub trait CredentialStore: Send + Sync {
    /// Add a credential. Fails with `UserAlreadyExists` when the username, or
    /// one differing from it only in ASCII case, is taken.
    fn register(&self, credential: &Credential) -> GatewayResult<()>;

    /// True only for an exact username and password match.
    fn authenticate(&self, username: &str, password: &str) -> GatewayResult<bool>;

    /// Number of registered users.
    fn user_count(&self) -> GatewayResult<u64>;

    /// Seed `seed` when the store is empty. Returns true if a record was written.
    fn bootstrap(&self, seed: Option<&Credential>) -> GatewayResult<bool> {
        let Some(seed) = seed else {
            return Ok(false);
        };
        if self.user_count()? > 0 {
            return Ok(false);
        }
        self.register(seed)?;
        info!(username = %seed.username, "seeded default credential");
        Ok(true)
    }
}

const CREATE_USERS_TABLE: &str = "CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password TEXT NOT NULL
)";

/// Credential store backed by a single SQLite file (`auth.db`).
///
/// Like tenant handles, a connection is opened per call and dropped afterwards.
#[derive(Debug, Clone)]
pub struct SqliteCredentialStore {
    path: PathBuf,
    busy_timeout: Duration,
}

impl SqliteCredentialStore {
    /// Open (creating if needed) the store at `path` and ensure the `users` table.
    pub fn open(path: &Path, busy_timeout: Duration) -> GatewayResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| {
                    GatewayError::StorageUnavailable(format!(
                        "failed to create {}: {err}",
                        parent.display()
                    ))
                })?;
            }
        }

        let store = Self {
            path: path.to_path_buf(),
            busy_timeout,
        };
        store.connect()?.execute_batch(CREATE_USERS_TABLE)?;
        debug!(path = %store.path.display(), "credential store ready");
        Ok(store)
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> GatewayResult<Connection> {
        let conn = Connection::open(&self.path).map_err(|err| {
            GatewayError::StorageUnavailable(format!(
                "failed to open credential store {}: {err}",
                self.path.display()
            ))
        })?;
        conn.busy_timeout(self.busy_timeout)?;
        Ok(conn)
    }
}

impl CredentialStore for SqliteCredentialStore {
    fn register(&self, credential: &Credential) -> GatewayResult<()> {
        let conn = self.connect()?;
        let result = conn.execute(
            "INSERT INTO users (username, password) VALUES (?1, ?2)",
            params![credential.username, credential.password],
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(GatewayError::UserAlreadyExists(credential.username.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn authenticate(&self, username: &str, password: &str) -> GatewayResult<bool> {
        let conn = self.connect()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM users WHERE username = ?1 COLLATE BINARY AND password = ?2",
                params![username, password],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn user_count(&self) -> GatewayResult<u64> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }
}

/// Process-local store for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    users: Mutex<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `credentials`.
    pub fn with_users<'a>(credentials: impl IntoIterator<Item = &'a Credential>) -> Self {
        let users = credentials
            .into_iter()
            .map(|c| (c.username.clone(), c.password.clone()))
            .collect();
        Self {
            users: Mutex::new(users),
        }
    }

    fn lock(&self) -> GatewayResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.users
            .lock()
            .map_err(|_| GatewayError::StorageUnavailable("credential store poisoned".into()))
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn register(&self, credential: &Credential) -> GatewayResult<()> {
        let mut users = self.lock()?;
        if users
            .keys()
            .any(|name| name.eq_ignore_ascii_case(&credential.username))
        {
            return Err(GatewayError::UserAlreadyExists(credential.username.clone()));
        }
        users.insert(credential.username.clone(), credential.password.clone());
        Ok(())
    }

    fn authenticate(&self, username: &str, password: &str) -> GatewayResult<bool> {
        Ok(self
            .lock()?
            .get(username)
            .is_some_and(|stored| stored == password))
    }

    fn user_count(&self) -> GatewayResult<u64> {
        Ok(self.lock()?.len() as u64)
    }
}
