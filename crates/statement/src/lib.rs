//! SQL statement construction for structured gateway requests.
//!
//! Builders validate every interpolated identifier and emit a [`Statement`]
//! whose values travel as bound parameters. Execution helpers turn result
//! rows into string maps and derive the pagination cursor.

use common::{GatewayError, GatewayResult, RecordBatch, RowMap};
use rusqlite::{Connection, params_from_iter, types::ValueRef};
use std::collections::BTreeMap;
use tenant::ident;
use tracing::debug;

/// Rendered SQL text plus its positional parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<String>,
}

impl Statement {
    fn new(sql: String) -> Self {
        Self {
            sql,
            params: Vec::new(),
        }
    }

    fn with_params(sql: String, params: Vec<String>) -> Self {
        Self { sql, params }
    }

    /// Run a statement that returns no rows. Returns the number of rows changed.
    pub fn execute(&self, conn: &Connection) -> GatewayResult<usize> {
        debug!(sql = %self.sql, params = self.params.len(), "execute");
        Ok(conn.execute(&self.sql, params_from_iter(self.params.iter()))?)
    }

    /// Run a select and collect every row as strings.
    pub fn query(&self, conn: &Connection) -> GatewayResult<RecordBatch> {
        debug!(sql = %self.sql, params = self.params.len(), "query");
        let mut stmt = conn.prepare(&self.sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query(params_from_iter(self.params.iter()))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut map = RowMap::with_capacity(columns.len());
            for (idx, name) in columns.iter().enumerate() {
                map.insert(name.clone(), render_value(row.get_ref(idx)?));
            }
            out.push(map);
        }

        let next_cursor = cursor_from(&columns, &out);
        Ok(RecordBatch {
            columns,
            rows: out,
            next_cursor,
        })
    }
}

/// Uniform text rendering of a stored value.
pub fn render_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Value of the `id` column (any case) in the last row, if both exist.
pub fn cursor_from(columns: &[String], rows: &[RowMap]) -> Option<String> {
    let id_column = columns.iter().find(|c| c.eq_ignore_ascii_case("id"))?;
    rows.last()?.get(id_column).cloned()
}

fn require_non_empty<T>(items: &[T], what: &str) -> GatewayResult<()> {
    if items.is_empty() {
        return Err(GatewayError::InvalidRequest(format!("{what} must not be empty")));
    }
    Ok(())
}

/// `CREATE TABLE IF NOT EXISTS <table> (<col> <type>, ...)`, columns in name order.
pub fn create_table(table: &str, columns: &BTreeMap<String, String>) -> GatewayResult<Statement> {
    let table = ident::user_table(table)?;
    if columns.is_empty() {
        return Err(GatewayError::InvalidRequest("column map must not be empty".into()));
    }
    let defs = columns
        .iter()
        .map(|(name, ty)| {
            Ok(format!(
                "{} {}",
                ident::identifier("column", name)?,
                ident::column_type(ty)?
            ))
        })
        .collect::<GatewayResult<Vec<_>>>()?;
    Ok(Statement::new(format!(
        "CREATE TABLE IF NOT EXISTS {table} ({})",
        defs.join(", ")
    )))
}

/// `INSERT INTO <table> (<cols>) VALUES (?, ...)` with values bound.
pub fn insert(table: &str, record: &BTreeMap<String, String>) -> GatewayResult<Statement> {
    let table = ident::user_table(table)?;
    if record.is_empty() {
        return Err(GatewayError::InvalidRequest("record must not be empty".into()));
    }
    let mut columns = Vec::with_capacity(record.len());
    let mut params = Vec::with_capacity(record.len());
    for (column, value) in record {
        columns.push(ident::identifier("column", column)?);
        params.push(value.clone());
    }
    let placeholders = vec!["?"; columns.len()].join(", ");
    Ok(Statement::with_params(
        format!(
            "INSERT INTO {table} ({}) VALUES ({placeholders})",
            columns.join(", ")
        ),
        params,
    ))
}

/// `UPDATE <table> SET <col> = ?, ... WHERE <condition>`.
///
/// A condition is required; an unconditional update must be spelled out
/// (for example `1 = 1`).
pub fn update(
    table: &str,
    updates: &BTreeMap<String, String>,
    condition: &str,
) -> GatewayResult<Statement> {
    let table = ident::user_table(table)?;
    if updates.is_empty() {
        return Err(GatewayError::InvalidRequest("updates must not be empty".into()));
    }
    if condition.trim().is_empty() {
        return Err(GatewayError::InvalidRequest(
            "update requires a condition".into(),
        ));
    }
    let condition = ident::condition(condition)?;
    let mut sets = Vec::with_capacity(updates.len());
    let mut params = Vec::with_capacity(updates.len());
    for (column, value) in updates {
        sets.push(format!("{} = ?", ident::identifier("column", column)?));
        params.push(value.clone());
    }
    Ok(Statement::with_params(
        format!("UPDATE {table} SET {} WHERE {condition}", sets.join(", ")),
        params,
    ))
}

/// `SELECT <columns> FROM <table> [WHERE <condition>]`. An empty condition
/// omits the clause.
pub fn select(table: &str, columns: &str, condition: &str) -> GatewayResult<Statement> {
    let table = ident::identifier("table", table)?;
    let columns = ident::column_list(columns)?;
    let mut sql = format!("SELECT {columns} FROM {table}");
    if !condition.trim().is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(ident::condition(condition)?);
    }
    Ok(Statement::new(sql))
}

/// `ALTER TABLE <table> ADD COLUMN <name> <type>`.
pub fn add_column(table: &str, column: &str, column_type: &str) -> GatewayResult<Statement> {
    Ok(Statement::new(format!(
        "ALTER TABLE {} ADD COLUMN {} {}",
        ident::user_table(table)?,
        ident::identifier("column", column)?,
        ident::column_type(column_type)?
    )))
}

/// `<table>_<col1>_<col2>..._idx`.
pub fn default_index_name(table: &str, columns: &[String]) -> String {
    format!("{table}_{}_idx", columns.join("_"))
}

/// `CREATE INDEX IF NOT EXISTS <name> ON <table> (<cols>)`.
pub fn create_index(index: &str, table: &str, columns: &[String]) -> GatewayResult<Statement> {
    require_non_empty(columns, "index columns")?;
    let index = ident::identifier("index", index)?;
    let table = ident::user_table(table)?;
    let cols = columns
        .iter()
        .map(|c| ident::identifier("column", c))
        .collect::<GatewayResult<Vec<_>>>()?;
    Ok(Statement::new(format!(
        "CREATE INDEX IF NOT EXISTS {index} ON {table} ({})",
        cols.join(", ")
    )))
}

/// `DROP INDEX IF EXISTS <name>`.
pub fn drop_index(index: &str) -> GatewayResult<Statement> {
    Ok(Statement::new(format!(
        "DROP INDEX IF EXISTS {}",
        ident::identifier("index", index)?
    )))
}

#[cfg(test)]
mod tests;
