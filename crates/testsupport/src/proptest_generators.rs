//! Property-based test generators using proptest.
//!
//! Strategies produce inputs the gateway accepts: identifiers, cell values
//! without quoting hazards, and records for a fixed set of columns.

use proptest::prelude::*;
use protocol::ColumnMap;

/// Identifier the validators accept. The `t_` prefix keeps clear of SQL
/// keywords and the reserved `indexes` table.
pub fn arb_identifier() -> impl Strategy<Value = String> {
    "t_[a-z0-9_]{1,12}"
}

/// Tenant username segment.
pub fn arb_username() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_-]{1,16}"
}

/// Password usable in a connection string. May contain `:`.
pub fn arb_password() -> impl Strategy<Value = String> {
    "[A-Za-z0-9:!@#$%^&*_-]{1,24}"
}

/// Text cell value.
pub fn arb_cell() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 ._-]{0,20}"
}

/// One record over `columns`.
///
/// # Example
///
/// ```
/// use proptest::prelude::*;
/// use testsupport::proptest_generators::arb_record;
///
/// proptest! {
///     #[test]
///     fn records_cover_all_columns(record in arb_record(vec!["a".into(), "b".into()])) {
///         prop_assert_eq!(record.len(), 2);
///     }
/// }
/// ```
pub fn arb_record(columns: Vec<String>) -> impl Strategy<Value = ColumnMap> {
    let width = columns.len();
    prop::collection::vec(arb_cell(), width).prop_map(move |cells| {
        columns.iter().cloned().zip(cells).collect()
    })
}

/// Between one and `max` records over `columns`.
pub fn arb_records(columns: Vec<String>, max: usize) -> impl Strategy<Value = Vec<ColumnMap>> {
    prop::collection::vec(arb_record(columns), 1..=max)
}
