//! Connection descriptor parsing.
//!
//! A connection string has the shape `scheme://username:password/database`.
//! Nothing is trimmed, unescaped, or canonicalized: a `/` or `:` inside a
//! username, or a `/` inside a password, makes the string unparseable.

use common::{DEFAULT_SCHEME, GatewayError, GatewayResult};
use std::fmt;

/// Placeholder database segment handed out by create-user.
pub const DATABASE_PLACEHOLDER: &str = "<dbname>";

/// The parsed `(username, password, database)` triple.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    pub username: String,
    pub password: String,
    pub database: String,
}

impl ConnectionDescriptor {
    /// Parse using the default `grpc` scheme.
    pub fn parse(input: &str) -> GatewayResult<Self> {
        Self::parse_with_scheme(input, DEFAULT_SCHEME)
    }

    /// Parse a connection string that must start with `<scheme>://`.
    ///
    /// # Example
    /// ```
    /// use tenant::ConnectionDescriptor;
    ///
    /// let d = ConnectionDescriptor::parse_with_scheme("myapp://alice:secret1/orders", "myapp").unwrap();
    /// assert_eq!(d.username, "alice");
    /// assert_eq!(d.database, "orders");
    /// ```
    pub fn parse_with_scheme(input: &str, scheme: &str) -> GatewayResult<Self> {
        let rest = input
            .strip_prefix(scheme)
            .and_then(|rest| rest.strip_prefix("://"))
            .ok_or_else(|| {
                GatewayError::MalformedConnectionString(format!(
                    "connection string must start with '{scheme}://'"
                ))
            })?;

        let (credentials, database) = rest
            .split_once('/')
            .ok_or(GatewayError::MissingDatabaseName)?;
        if database.is_empty() {
            return Err(GatewayError::MissingDatabaseName);
        }

        let (username, password) = credentials
            .split_once(':')
            .ok_or(GatewayError::MalformedCredentials)?;

        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
            database: database.to_string(),
        })
    }

    /// Connection string for `username` with the database segment left as a placeholder.
    pub fn template(scheme: &str, username: &str, password: &str) -> String {
        format!("{scheme}://{username}:{password}/{DATABASE_PLACEHOLDER}")
    }
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}
