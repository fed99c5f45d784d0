//! Custom assertion helpers for testing.
//!
//! Diffs are rendered with `pretty_assertions` so mismatched rows and index
//! listings are readable.

use common::{GatewayError, GatewayResult, IndexInfo, RecordBatch, RowMap};
use pretty_assertions::assert_eq;
use protocol::ErrorCode;
use std::fmt::Debug;

/// Assert that a batch holds exactly `expected` rows, in order.
///
/// # Example
///
/// ```
/// use common::{RecordBatch, RowMap};
/// use testsupport::prelude::*;
///
/// let batch = RecordBatch {
///     columns: vec!["id".into()],
///     rows: vec![RowMap::from([("id".to_string(), "1".to_string())])],
///     next_cursor: Some("1".into()),
/// };
/// assert_rows(&batch, &[&[("id", "1")]]);
/// ```
pub fn assert_rows(batch: &RecordBatch, expected: &[&[(&str, &str)]]) {
    let expected: Vec<RowMap> = expected
        .iter()
        .map(|row| {
            row.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        })
        .collect();
    assert_eq!(batch.rows, expected);
}

/// Assert that `indexes` lists exactly the given `(index, table, columns)`
/// triples, in order.
pub fn assert_indexes(indexes: &[IndexInfo], expected: &[(&str, &str, &str)]) {
    let expected: Vec<IndexInfo> = expected
        .iter()
        .map(|(index, table, columns)| IndexInfo {
            index_name: index.to_string(),
            table_name: table.to_string(),
            columns: columns.to_string(),
        })
        .collect();
    assert_eq!(indexes, expected.as_slice());
}

/// Assert that an operation fails with an error that maps to `expected`.
///
/// # Example
///
/// ```
/// use common::GatewayError;
/// use protocol::ErrorCode;
/// use testsupport::prelude::*;
///
/// let result: common::GatewayResult<()> = Err(GatewayError::AuthenticationFailed);
/// assert_error_code(result, ErrorCode::AuthenticationFailed);
/// ```
pub fn assert_error_code<T: Debug>(result: GatewayResult<T>, expected: ErrorCode) -> GatewayError {
    match result {
        Ok(value) => panic!("expected {expected:?} error, got Ok({value:?})"),
        Err(err) => {
            assert_eq!(
                ::server::map_error_to_code(&err),
                expected,
                "error was: {err}"
            );
            err
        }
    }
}

/// Assert that no audit event contains `secret`.
pub fn assert_not_leaked(events: &[String], secret: &str) {
    let leaked: Vec<&String> = events.iter().filter(|e| e.contains(secret)).collect();
    assert!(leaked.is_empty(), "secret leaked into audit events: {leaked:?}");
}
