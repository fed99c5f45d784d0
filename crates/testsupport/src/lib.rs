//! Test support utilities for the gateway workspace.
//!
//! This crate provides:
//! - An in-process [`TestServer`](server::TestServer) running the real accept
//!   loop against a temporary data directory
//! - [`GatewayContext`](context::GatewayContext), an isolated gateway with a
//!   registered tenant for tests that skip the wire
//! - Fixtures for credentials, connection strings, and column maps
//! - Assertion helpers and proptest strategies
//!
//! # Example Usage
//!
//! ```no_run
//! use testsupport::prelude::*;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let server = TestServer::start().await?;
//!     let cs = server.connection_string("orders");
//!     assert!(cs.ends_with("/orders"));
//!     // connect with the client crate and run operations against `cs`
//!     Ok(())
//! }
//! ```

pub mod assertions;
pub mod context;
pub mod fixtures;
pub mod proptest_generators;
pub mod server;

/// Convenient re-exports for common testing patterns.
pub mod prelude {
    pub use crate::assertions::*;
    pub use crate::context::*;
    pub use crate::fixtures::*;
    pub use crate::server::*;
}
