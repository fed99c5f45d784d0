use super::*;
use proptest::prelude::*;

fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn orders_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    create_table(
        "orders",
        &map(&[("id", "INTEGER PRIMARY KEY"), ("name", "TEXT"), ("qty", "REAL")]),
    )
    .unwrap()
    .execute(&conn)
    .unwrap();
    conn
}

#[test]
fn create_table_renders_sorted_columns() {
    let stmt = create_table("orders", &map(&[("name", "TEXT"), ("id", "INTEGER PRIMARY KEY")]))
        .unwrap();
    assert_eq!(
        stmt.sql,
        "CREATE TABLE IF NOT EXISTS orders (id INTEGER PRIMARY KEY, name TEXT)"
    );
    assert!(stmt.params.is_empty());
}

#[test]
fn create_table_twice_is_idempotent() {
    let conn = orders_db();
    let again = create_table(
        "orders",
        &map(&[("id", "INTEGER PRIMARY KEY"), ("name", "TEXT"), ("qty", "REAL")]),
    )
    .unwrap();
    again.execute(&conn).unwrap();

    let sql: String = conn
        .query_row(
            "SELECT sql FROM sqlite_master WHERE name = 'orders'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert!(sql.contains("id INTEGER PRIMARY KEY"));
}

#[test]
fn create_table_rejects_bad_input() {
    assert!(create_table("orders", &BTreeMap::new()).is_err());
    assert!(create_table("indexes", &map(&[("id", "INTEGER")])).is_err());
    assert!(create_table("o; DROP", &map(&[("id", "INTEGER")])).is_err());
    assert!(create_table("orders", &map(&[("id", "INTEGER); DROP TABLE x")])).is_err());
}

#[test]
fn insert_binds_values() {
    let stmt = insert("orders", &map(&[("name", "widget"), ("id", "1")])).unwrap();
    assert_eq!(stmt.sql, "INSERT INTO orders (id, name) VALUES (?, ?)");
    assert_eq!(stmt.params, vec!["1".to_string(), "widget".to_string()]);
}

#[test]
fn injected_values_are_stored_literally() {
    let conn = orders_db();
    let hostile = "x'); DROP TABLE orders; --";
    insert("orders", &map(&[("id", "1"), ("name", hostile)]))
        .unwrap()
        .execute(&conn)
        .unwrap();

    let batch = select("orders", "name", "").unwrap().query(&conn).unwrap();
    assert_eq!(batch.rows[0]["name"], hostile);
}

#[test]
fn select_returns_stringified_rows_and_cursor() {
    let conn = orders_db();
    insert("orders", &map(&[("id", "1"), ("name", "widget")]))
        .unwrap()
        .execute(&conn)
        .unwrap();
    insert("orders", &map(&[("id", "2"), ("name", "gear"), ("qty", "2.5")]))
        .unwrap()
        .execute(&conn)
        .unwrap();

    let batch = select("orders", "*", "").unwrap().query(&conn).unwrap();
    assert_eq!(batch.columns, vec!["id", "name", "qty"]);
    assert_eq!(batch.rows.len(), 2);
    assert_eq!(batch.rows[0]["id"], "1");
    assert_eq!(batch.rows[0]["qty"], "NULL");
    assert_eq!(batch.rows[1]["qty"], "2.5");
    assert_eq!(batch.next_cursor.as_deref(), Some("2"));
}

#[test]
fn select_with_condition_filters() {
    let conn = orders_db();
    for (id, name) in [("1", "widget"), ("2", "gear"), ("3", "sprocket")] {
        insert("orders", &map(&[("id", id), ("name", name)]))
            .unwrap()
            .execute(&conn)
            .unwrap();
    }

    let stmt = select("orders", "id, name", "id >= 2").unwrap();
    assert_eq!(stmt.sql, "SELECT id, name FROM orders WHERE id >= 2");
    let batch = stmt.query(&conn).unwrap();
    assert_eq!(batch.rows.len(), 2);
    assert_eq!(batch.next_cursor.as_deref(), Some("3"));
}

#[test]
fn cursor_requires_id_column_and_rows() {
    let conn = orders_db();
    insert("orders", &map(&[("id", "7"), ("name", "widget")]))
        .unwrap()
        .execute(&conn)
        .unwrap();

    let no_id = select("orders", "name", "").unwrap().query(&conn).unwrap();
    assert_eq!(no_id.next_cursor, None);

    let empty = select("orders", "*", "id > 100").unwrap().query(&conn).unwrap();
    assert!(empty.rows.is_empty());
    assert_eq!(empty.next_cursor, None);

    let columns = vec!["ID".to_string()];
    let rows = vec![RowMap::from([("ID".to_string(), "9".to_string())])];
    assert_eq!(cursor_from(&columns, &rows).as_deref(), Some("9"));
}

#[test]
fn select_rejects_stacked_statements() {
    assert!(select("orders", "*", "1 = 1; DELETE FROM orders").is_err());
    assert!(select("orders", "* FROM orders --", "").is_err());
}

#[test]
fn update_binds_values_and_requires_condition() {
    let stmt = update("orders", &map(&[("name", "gizmo")]), "id = 1").unwrap();
    assert_eq!(stmt.sql, "UPDATE orders SET name = ? WHERE id = 1");
    assert_eq!(stmt.params, vec!["gizmo".to_string()]);

    assert!(update("orders", &map(&[("name", "gizmo")]), "  ").is_err());
    assert!(update("orders", &BTreeMap::new(), "id = 1").is_err());
}

#[test]
fn update_changes_matching_rows_only() {
    let conn = orders_db();
    for id in ["1", "2"] {
        insert("orders", &map(&[("id", id), ("name", "widget")]))
            .unwrap()
            .execute(&conn)
            .unwrap();
    }

    let changed = update("orders", &map(&[("name", "gizmo")]), "id = 2")
        .unwrap()
        .execute(&conn)
        .unwrap();
    assert_eq!(changed, 1);

    let batch = select("orders", "name", "id = 1").unwrap().query(&conn).unwrap();
    assert_eq!(batch.rows[0]["name"], "widget");
}

#[test]
fn add_column_extends_schema() {
    let conn = orders_db();
    let stmt = add_column("orders", "price", "REAL").unwrap();
    assert_eq!(stmt.sql, "ALTER TABLE orders ADD COLUMN price REAL");
    stmt.execute(&conn).unwrap();

    let batch = select("orders", "price", "").unwrap().query(&conn).unwrap();
    assert_eq!(batch.columns, vec!["price"]);
}

#[test]
fn index_statements_render() {
    let cols = vec!["name".to_string(), "qty".to_string()];
    assert_eq!(default_index_name("orders", &cols), "orders_name_qty_idx");
    assert_eq!(
        create_index("orders_name_qty_idx", "orders", &cols).unwrap().sql,
        "CREATE INDEX IF NOT EXISTS orders_name_qty_idx ON orders (name, qty)"
    );
    assert_eq!(
        drop_index("orders_name_qty_idx").unwrap().sql,
        "DROP INDEX IF EXISTS orders_name_qty_idx"
    );
    assert!(create_index("i", "orders", &[]).is_err());
    assert!(drop_index("x; DROP TABLE orders").is_err());
}

#[test]
fn engine_errors_surface_as_execution_failures() {
    let conn = orders_db();
    let err = insert("missing", &map(&[("id", "1")]))
        .unwrap()
        .execute(&conn)
        .unwrap_err();
    assert!(matches!(err, GatewayError::StatementExecutionFailed(_)));
}

#[test]
fn values_render_uniformly() {
    assert_eq!(render_value(ValueRef::Null), "NULL");
    assert_eq!(render_value(ValueRef::Integer(-4)), "-4");
    assert_eq!(render_value(ValueRef::Real(2.0)), "2");
    assert_eq!(render_value(ValueRef::Text(b"hi")), "hi");
}

proptest! {
    #[test]
    fn insert_placeholder_count_matches_params(
        record in proptest::collection::btree_map("[a-z][a-z0-9_]{0,8}", ".{0,12}", 1..8)
    ) {
        let stmt = insert("t", &record).unwrap();
        prop_assert_eq!(stmt.sql.matches('?').count(), record.len());
        prop_assert_eq!(stmt.params.len(), record.len());
    }
}
