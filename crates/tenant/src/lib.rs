//! Tenant identity: connection-string parsing, identifier validation, and
//! resolution of an authenticated descriptor to an open per-tenant database.

pub mod descriptor;
pub mod ident;
pub mod resolver;

pub use descriptor::ConnectionDescriptor;
pub use resolver::{TenantDatabase, TenantResolver};
