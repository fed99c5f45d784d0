#[cfg(test)]
mod tests;

pub mod pretty;

use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, io, path::PathBuf, time::Duration};
use thiserror::Error;

/// Default connection-string scheme token (`grpc://user:pass/db`).
pub const DEFAULT_SCHEME: &str = "grpc";

/// Name of the reserved side table that shadows the engine's index catalog.
pub const INDEX_METADATA_TABLE: &str = "indexes";

/// Named projection of a result row keyed by column name.
///
/// Every value is carried as text regardless of its storage class.
/// Examples:
/// - `let mut map = RowMap::new(); map.insert("id".into(), "1".into());`
/// - `let map = RowMap::from([("name".into(), "widget".into())]);`
/// - `let map = RowMap::from([("deleted_at".into(), "NULL".into())]);`
pub type RowMap = HashMap<String, String>;

/// Rectangular result set carrying column labels, rows, and a pagination cursor.
/// Examples:
/// - `let rb = RecordBatch { columns: vec!["id".into()], rows: vec![], next_cursor: None };`
/// - `let rb = RecordBatch { columns: vec!["id".into(), "name".into()], rows: vec![row], next_cursor: Some("1".into()) };`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordBatch {
    pub columns: Vec<String>,
    pub rows: Vec<RowMap>,
    pub next_cursor: Option<String>,
}

impl RecordBatch {
    /// Number of rows in the batch.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the batch holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One entry of the index metadata table as reported by list-indexes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexInfo {
    pub index_name: String,
    pub table_name: String,
    /// Indexed columns joined with `", "` exactly as stored.
    pub columns: String,
}

/// A username/password pair.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Canonical error type shared across gateway subsystems.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("malformed connection string: {0}")]
    MalformedConnectionString(String),
    #[error("connection string is missing a database name")]
    MissingDatabaseName,
    #[error("malformed credentials: expected username:password")]
    MalformedCredentials,
    #[error("authentication failed")]
    AuthenticationFailed,
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("index '{0}' not found")]
    IndexNotFound(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("user '{0}' already exists")]
    UserAlreadyExists(String),
    #[error("statement execution failed: {0}")]
    StatementExecutionFailed(#[from] rusqlite::Error),
}

impl From<io::Error> for GatewayError {
    fn from(err: io::Error) -> Self {
        GatewayError::StorageUnavailable(err.to_string())
    }
}

/// Result alias that carries a `GatewayError`.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Runtime configuration for the gateway components.
///
/// # Example
/// ```
/// use common::Config;
/// use std::path::PathBuf;
///
/// let config = Config::builder()
///     .data_dir(PathBuf::from("./my_data"))
///     .scheme("myapp".to_string())
///     .busy_timeout_ms(1000)
///     .build();
/// assert_eq!(config.scheme, "myapp");
/// ```
#[derive(Clone, Debug, Serialize, Deserialize, bon::Builder)]
pub struct Config {
    /// Root directory holding `auth.db` and one subdirectory per tenant.
    #[builder(default = PathBuf::from("./data"))]
    pub data_dir: PathBuf,
    /// Literal scheme token every connection string must start with.
    #[builder(default = DEFAULT_SCHEME.to_string())]
    pub scheme: String,
    /// How long a handle waits on another writer's lock before failing.
    #[builder(default = 5000)]
    pub busy_timeout_ms: u64,
    /// Credential seeded into an empty store at bootstrap.
    pub seed_user: Option<Credential>,
}

impl Config {
    /// Busy timeout as a `Duration`.
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Location of the credential database.
    pub fn auth_db_path(&self) -> PathBuf {
        self.data_dir.join("auth.db")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            scheme: DEFAULT_SCHEME.to_string(),
            busy_timeout_ms: 5000,
            seed_user: None,
        }
    }
}

/// Convenient re-exports for downstream crates.
pub mod prelude {
    pub use crate::{
        Config, Credential, GatewayError, GatewayResult, IndexInfo, RecordBatch, RowMap,
    };
}
