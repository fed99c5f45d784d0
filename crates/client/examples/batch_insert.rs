//! Inserts records in batches and shows that a failing batch leaves no rows.
//!
//! Run the server first:
//!   cargo run --bin gatewaydb-server -- --data-dir /tmp/gatewaydb
//!
//! Then run this example:
//!   cargo run --example batch_insert

use anyhow::Result;
use client::{Client, ClientError, columns};
use std::time::Instant;

const BATCH_SIZE: usize = 100;
const BATCHES: usize = 5;

#[tokio::main]
async fn main() -> Result<()> {
    let mut client = Client::connect("127.0.0.1:50051").await?;
    let cs = "grpc://john:secret123/metrics";

    client.create_database(cs).await?;
    client
        .create_table(
            cs,
            "samples",
            columns([("id", "INTEGER PRIMARY KEY"), ("value", "REAL")]),
        )
        .await?;

    let start = Instant::now();
    for batch in 0..BATCHES {
        let records = (0..BATCH_SIZE)
            .map(|i| {
                let id = (batch * BATCH_SIZE + i).to_string();
                let value = format!("{}.5", i);
                columns([("id", id.as_str()), ("value", value.as_str())])
            })
            .collect();
        let message = client
            .insert_multiple_records(cs, "samples", records)
            .await?;
        println!("batch {batch}: {message}");
    }
    println!("Inserted {} rows in {:?}", BATCH_SIZE * BATCHES, start.elapsed());

    // Id 0 already exists, so the whole batch is rejected.
    let conflicting = vec![
        columns([("id", "100000"), ("value", "1")]),
        columns([("id", "0"), ("value", "2")]),
    ];
    match client
        .insert_multiple_records(cs, "samples", conflicting)
        .await
    {
        Err(ClientError::Rejected { code, message }) => {
            println!("Batch rejected ({code:?}): {message}")
        }
        other => println!("Unexpected outcome: {other:?}"),
    }

    let leftover = client
        .query_data(cs, "samples", "id", "id = 100000")
        .await?;
    println!("Rows from rejected batch: {}", leftover.len());

    client.close().await?;
    Ok(())
}
