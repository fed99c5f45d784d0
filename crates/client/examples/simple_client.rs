//! Walks one tenant through the full gateway lifecycle.
//!
//! Run the server first:
//!   cargo run --bin gatewaydb-server -- --data-dir /tmp/gatewaydb
//!
//! Then run this example:
//!   cargo run --example simple_client

use anyhow::Result;
use client::{Client, columns};

#[tokio::main]
async fn main() -> Result<()> {
    println!("Connecting to 127.0.0.1:50051...");
    let mut client = Client::connect("127.0.0.1:50051").await?;

    // The server seeds john/secret123 on first start.
    let cs = "grpc://john:secret123/inventory";

    println!("{}", client.create_database(cs).await?);
    println!(
        "{}",
        client
            .create_table(
                cs,
                "items",
                columns([("id", "INTEGER PRIMARY KEY"), ("name", "TEXT"), ("qty", "INTEGER")]),
            )
            .await?
    );
    println!(
        "{}",
        client
            .insert_record(cs, "items", columns([("id", "1"), ("name", "bolt"), ("qty", "40")]))
            .await?
    );

    let batch = client.query_data(cs, "items", "*", "qty > 10").await?;
    println!("Columns: {:?}", batch.columns);
    for row in &batch.rows {
        println!("  {row:?}");
    }
    println!("Next cursor: {:?}", batch.next_cursor);

    println!(
        "{}",
        client
            .add_index(cs, "items", vec!["name".to_string()], None)
            .await?
    );
    for index in client.list_indexes(cs).await? {
        println!(
            "  {} on {} ({})",
            index.index_name, index.table_name, index.columns
        );
    }

    client.close().await?;
    Ok(())
}
