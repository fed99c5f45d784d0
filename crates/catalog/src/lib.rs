use common::{GatewayError, GatewayResult, INDEX_METADATA_TABLE, IndexInfo};
use rusqlite::{Connection, OptionalExtension, params};
use tenant::TenantDatabase;
use tracing::info;

/// Separator used when persisting an index's column list.
pub const COLUMN_SEPARATOR: &str = ", ";

/// DDL for the reserved side table that shadows the engine's index catalog.
pub fn metadata_table_ddl() -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {INDEX_METADATA_TABLE} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            table_name TEXT NOT NULL,
            index_name TEXT NOT NULL UNIQUE COLLATE NOCASE,
            columns TEXT NOT NULL,
            UNIQUE(user_id, index_name)
        )"
    )
}

/// Create the metadata table if it does not exist yet.
pub fn ensure_metadata_table(conn: &Connection) -> GatewayResult<()> {
    conn.execute_batch(&metadata_table_ddl())?;
    Ok(())
}

/// Index metadata kept in lock-step with the indexes that actually exist.
///
/// Each mutation runs the engine DDL and the metadata write inside one
/// transaction, so a failure in either step leaves both untouched.
pub struct IndexCatalog<'db> {
    db: &'db mut TenantDatabase,
}

impl<'db> IndexCatalog<'db> {
    pub fn new(db: &'db mut TenantDatabase) -> Self {
        Self { db }
    }

    /// Create an index and record it. Returns the index name used.
    ///
    /// An absent or empty `index_name` becomes `<table>_<col1>_..._idx`.
    pub fn add_index(
        &mut self,
        table_name: &str,
        columns: &[String],
        index_name: Option<&str>,
    ) -> GatewayResult<String> {
        let name = match index_name {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => statement::default_index_name(table_name, columns),
        };
        let create = statement::create_index(&name, table_name, columns)?;
        let owner = self.db.username().to_string();

        let tx = self.db.write_transaction()?;
        ensure_metadata_table(&tx)?;
        create.execute(&tx)?;
        tx.execute(
            &format!(
                "INSERT INTO {INDEX_METADATA_TABLE} (user_id, table_name, index_name, columns)
                 VALUES (?1, ?2, ?3, ?4)"
            ),
            params![owner, table_name, name, columns.join(COLUMN_SEPARATOR)],
        )?;
        tx.commit()?;

        info!(username = %owner, table = %table_name, index = %name, "index created");
        Ok(name)
    }

    /// Drop an index and its metadata row. Unknown names fail with
    /// `IndexNotFound` and change nothing.
    pub fn delete_index(&mut self, index_name: &str) -> GatewayResult<()> {
        let drop = statement::drop_index(index_name)?;
        let owner = self.db.username().to_string();

        let tx = self.db.write_transaction()?;
        ensure_metadata_table(&tx)?;
        if find_index(&tx, index_name)?.is_none() {
            return Err(GatewayError::IndexNotFound(index_name.to_string()));
        }
        drop.execute(&tx)?;
        tx.execute(
            &format!("DELETE FROM {INDEX_METADATA_TABLE} WHERE index_name = ?1 COLLATE NOCASE"),
            params![index_name],
        )?;
        tx.commit()?;

        info!(username = %owner, index = %index_name, "index dropped");
        Ok(())
    }

    /// Every metadata row in creation order.
    pub fn list_indexes(&self) -> GatewayResult<Vec<IndexInfo>> {
        list_indexes(self.db.connection())
    }
}

/// Every metadata row in creation order. A database without the metadata
/// table has no indexes.
pub fn list_indexes(conn: &Connection) -> GatewayResult<Vec<IndexInfo>> {
    if !metadata_table_exists(conn)? {
        return Ok(Vec::new());
    }
    let mut stmt = conn.prepare(&format!(
        "SELECT index_name, table_name, columns FROM {INDEX_METADATA_TABLE} ORDER BY id"
    ))?;
    let rows = stmt.query_map([], |row| {
        Ok(IndexInfo {
            index_name: row.get(0)?,
            table_name: row.get(1)?,
            columns: row.get(2)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Look up one metadata row by index name. Index names compare without
/// regard to ASCII case, as the engine's own index names do.
pub fn find_index(conn: &Connection, index_name: &str) -> GatewayResult<Option<IndexInfo>> {
    let found = conn
        .query_row(
            &format!(
                "SELECT index_name, table_name, columns FROM {INDEX_METADATA_TABLE}
                 WHERE index_name = ?1 COLLATE NOCASE"
            ),
            params![index_name],
            |row| {
                Ok(IndexInfo {
                    index_name: row.get(0)?,
                    table_name: row.get(1)?,
                    columns: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(found)
}

fn metadata_table_exists(conn: &Connection) -> GatewayResult<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![INDEX_METADATA_TABLE],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}
