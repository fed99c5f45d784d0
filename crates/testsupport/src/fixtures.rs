//! Common test fixtures: credentials, connection strings, and column maps.

use protocol::ColumnMap;

/// User the test server seeds into an empty credential store.
pub const SEED_USER: &str = "john";
pub const SEED_PASSWORD: &str = "secret123";

/// Second tenant for isolation tests.
pub const ALICE: &str = "alice";
pub const ALICE_PASSWORD: &str = "secret1";

/// Format `scheme://username:password/database`.
///
/// # Example
///
/// ```
/// use testsupport::prelude::*;
///
/// let cs = connection_string("myapp", "alice", "secret1", "orders");
/// assert_eq!(cs, "myapp://alice:secret1/orders");
/// ```
pub fn connection_string(scheme: &str, username: &str, password: &str, database: &str) -> String {
    format!("{scheme}://{username}:{password}/{database}")
}

/// Build a column map from string pairs.
///
/// # Example
///
/// ```
/// use testsupport::prelude::*;
///
/// let map = column_map(&[("id", "1"), ("name", "widget")]);
/// assert_eq!(map["name"], "widget");
/// ```
pub fn column_map(pairs: &[(&str, &str)]) -> ColumnMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// `{id: INTEGER PRIMARY KEY, name: TEXT, qty: INTEGER}`.
pub fn orders_columns() -> ColumnMap {
    column_map(&[
        ("id", "INTEGER PRIMARY KEY"),
        ("name", "TEXT"),
        ("qty", "INTEGER"),
    ])
}

/// One `orders` record.
pub fn order(id: u32, name: &str, qty: u32) -> ColumnMap {
    let id = id.to_string();
    let qty = qty.to_string();
    column_map(&[("id", &id), ("name", name), ("qty", &qty)])
}

/// `count` sequential `orders` records named `item<id>`.
pub fn orders(count: u32) -> Vec<ColumnMap> {
    (1..=count)
        .map(|id| order(id, &format!("item{id}"), id * 10))
        .collect()
}
