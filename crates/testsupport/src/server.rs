//! Helpers for spinning up the gateway server on a temporary data directory.
//!
//! The [`TestServer`] struct runs the real accept loop in-process so
//! integration tests can exercise the public wire protocol without touching
//! the real filesystem. Each server instance owns an isolated temporary
//! directory and shuts itself down automatically when dropped.

use crate::fixtures::{SEED_PASSWORD, SEED_USER, connection_string};
use anyhow::Result;
use common::{Config, Credential, DEFAULT_SCHEME};
use gateway::Gateway;
use gateway::audit::MemoryAuditSink;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Knobs for [`TestServer::start_with`].
#[derive(Debug, Clone)]
pub struct TestServerOptions {
    pub scheme: String,
    /// Registered at startup; `None` starts with an empty credential store.
    pub seed_user: Option<Credential>,
}

impl Default for TestServerOptions {
    fn default() -> Self {
        Self {
            scheme: DEFAULT_SCHEME.to_string(),
            seed_user: Some(Credential::new(SEED_USER, SEED_PASSWORD)),
        }
    }
}

/// In-process TCP server for end-to-end tests.
pub struct TestServer {
    address: String,
    scheme: String,
    audit: Arc<MemoryAuditSink>,
    temp_dir: TempDir,
    task: JoinHandle<()>,
}

impl TestServer {
    /// Start a server bound to `127.0.0.1` on a random port with the default
    /// scheme and the seeded user.
    pub async fn start() -> Result<Self> {
        Self::start_with(TestServerOptions::default()).await
    }

    pub async fn start_with(options: TestServerOptions) -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?.to_string();

        let config = Config::builder()
            .data_dir(temp_dir.path().to_path_buf())
            .scheme(options.scheme.clone())
            .maybe_seed_user(options.seed_user)
            .build();
        let audit = Arc::new(MemoryAuditSink::new());
        let gateway = Arc::new(Gateway::bootstrap(&config, audit.clone())?);

        let task = tokio::spawn(async move {
            if let Err(e) = ::server::run_server(listener, gateway).await {
                tracing::error!(error = %e, "test server stopped");
            }
        });

        Ok(Self {
            address,
            scheme: options.scheme,
            audit,
            temp_dir,
            task,
        })
    }

    /// Return the socket address clients should dial.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Root directory the server stores `auth.db` and tenant files under.
    pub fn data_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Connection string for the seeded user and `database`.
    pub fn connection_string(&self, database: &str) -> String {
        connection_string(&self.scheme, SEED_USER, SEED_PASSWORD, database)
    }

    /// Audit events recorded so far.
    pub fn audit_events(&self) -> Vec<String> {
        self.audit.events()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
