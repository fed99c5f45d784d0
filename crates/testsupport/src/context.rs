//! Isolated in-process gateway for tests that do not need the wire.
//!
//! A [`GatewayContext`] owns a temporary data directory, an in-memory
//! credential store with one registered tenant, and an in-memory audit sink.
//! Everything is removed when the context is dropped.

use crate::fixtures::{ALICE, ALICE_PASSWORD, connection_string};
use auth::MemoryCredentialStore;
use common::{Config, Credential, GatewayResult};
use gateway::Gateway;
use gateway::audit::MemoryAuditSink;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// A gateway rooted in a temporary directory.
///
/// # Example
///
/// ```
/// use testsupport::prelude::*;
///
/// let ctx = GatewayContext::new().unwrap();
/// let cs = ctx.connection_string("orders");
/// ctx.gateway().create_database(&cs).unwrap();
/// assert!(ctx.data_dir().join("alice").join("orders.db").exists());
/// ```
pub struct GatewayContext {
    _temp_dir: TempDir,
    data_dir: std::path::PathBuf,
    scheme: String,
    gateway: Gateway,
    audit: Arc<MemoryAuditSink>,
}

impl GatewayContext {
    /// Context with the default scheme and `alice` registered.
    pub fn new() -> GatewayResult<Self> {
        Self::with_scheme(common::DEFAULT_SCHEME)
    }

    pub fn with_scheme(scheme: &str) -> GatewayResult<Self> {
        let temp_dir = tempfile::tempdir()?;
        let data_dir = temp_dir.path().join("data");
        let config = Config::builder()
            .data_dir(data_dir.clone())
            .scheme(scheme.to_string())
            .build();
        let store = MemoryCredentialStore::with_users(&[Credential::new(ALICE, ALICE_PASSWORD)]);
        let audit = Arc::new(MemoryAuditSink::new());
        let gateway = Gateway::new(&config, Arc::new(store), audit.clone());

        Ok(Self {
            _temp_dir: temp_dir,
            data_dir,
            scheme: scheme.to_string(),
            gateway,
            audit,
        })
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Connection string for the registered tenant and `database`.
    pub fn connection_string(&self, database: &str) -> String {
        connection_string(&self.scheme, ALICE, ALICE_PASSWORD, database)
    }

    pub fn audit_events(&self) -> Vec<String> {
        self.audit.events()
    }
}
