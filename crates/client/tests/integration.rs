//! Integration tests for the client library.
//!
//! Each test starts an in-process server on a temporary data directory and
//! talks to it through the public client API.

use anyhow::Result;
use client::{Client, ClientError, columns};
use protocol::ErrorCode;
use testsupport::prelude::*;

async fn connect(server: &TestServer) -> Result<Client> {
    Ok(Client::connect(server.address()).await?)
}

#[tokio::test]
async fn create_user_returns_template() -> Result<()> {
    let server = TestServer::start().await?;
    let mut client = connect(&server).await?;

    let template = client.create_user("alice", "pw:with:colons").await?;
    assert_eq!(template, "grpc://alice:pw:with:colons/<dbname>");

    let err = client.create_user("alice", "other").await.unwrap_err();
    assert_eq!(err.error_code(), Some(ErrorCode::UserAlreadyExists));

    client.close().await?;
    Ok(())
}

#[tokio::test]
async fn full_tenant_lifecycle() -> Result<()> {
    let server = TestServer::start().await?;
    let mut client = connect(&server).await?;
    let cs = server.connection_string("orders");

    client.create_database(&cs).await?;
    client.create_table(&cs, "orders", orders_columns()).await?;
    client.insert_record(&cs, "orders", order(1, "widget", 5)).await?;

    let batch = client.query_data(&cs, "orders", "id, name", "").await?;
    assert_rows(&batch, &[&[("id", "1"), ("name", "widget")]]);
    assert_eq!(batch.next_cursor.as_deref(), Some("1"));

    client.update_table(&cs, "orders", "price", "REAL").await?;
    client
        .update_record(&cs, "orders", columns([("price", "2.5")]), "id = 1")
        .await?;
    let batch = client.query_data(&cs, "orders", "price", "id = 1").await?;
    assert_rows(&batch, &[&[("price", "2.5")]]);

    let message = client
        .add_index(&cs, "orders", vec!["name".into()], None)
        .await?;
    assert!(message.contains("orders_name_idx"));
    assert_indexes(
        &client.list_indexes(&cs).await?,
        &[("orders_name_idx", "orders", "name")],
    );

    client.delete_index(&cs, "orders_name_idx").await?;
    assert!(client.list_indexes(&cs).await?.is_empty());

    client.close().await?;
    Ok(())
}

#[tokio::test]
async fn errors_keep_the_connection_open() -> Result<()> {
    let server = TestServer::start().await?;
    let mut client = connect(&server).await?;
    let cs = server.connection_string("orders");

    let err = client
        .create_database("grpc://john:wrong/orders")
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), Some(ErrorCode::AuthenticationFailed));

    let err = client.create_database("john:secret123/orders").await.unwrap_err();
    assert_eq!(err.error_code(), Some(ErrorCode::MalformedConnectionString));

    let err = client.create_database("grpc://john:secret123/").await.unwrap_err();
    assert_eq!(err.error_code(), Some(ErrorCode::MissingDatabaseName));

    let err = client.create_database("grpc://johnsecret123/orders").await.unwrap_err();
    assert_eq!(err.error_code(), Some(ErrorCode::MalformedCredentials));

    let err = client.delete_index(&cs, "nope_idx").await.unwrap_err();
    assert_eq!(err.error_code(), Some(ErrorCode::IndexNotFound));

    let err = client.query_data(&cs, "missing", "*", "").await.unwrap_err();
    assert_eq!(err.error_code(), Some(ErrorCode::ExecutionError));

    let err = client
        .query_data(&cs, "orders", "*", "1 = 1; DROP TABLE x")
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), Some(ErrorCode::InvalidRequest));

    // Still usable after every failure above.
    client.create_database(&cs).await?;
    client.close().await?;
    Ok(())
}

#[tokio::test]
async fn batch_insert_is_atomic_over_the_wire() -> Result<()> {
    let server = TestServer::start().await?;
    let mut client = connect(&server).await?;
    let cs = server.connection_string("orders");
    client.create_table(&cs, "orders", orders_columns()).await?;

    let mut records = orders(3);
    records.push(order(2, "duplicate", 1));
    let err = client
        .insert_multiple_records(&cs, "orders", records)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Rejected { code: ErrorCode::ExecutionError, .. }));
    assert!(client.query_data(&cs, "orders", "*", "").await?.is_empty());

    client.insert_multiple_records(&cs, "orders", orders(3)).await?;
    let batch = client.query_data(&cs, "orders", "id", "").await?;
    assert_eq!(batch.len(), 3);
    assert_eq!(batch.next_cursor.as_deref(), Some("3"));

    client.close().await?;
    Ok(())
}

#[tokio::test]
async fn concurrent_clients_share_a_tenant_database() -> Result<()> {
    let server = TestServer::start().await?;
    let cs = server.connection_string("events");
    {
        let mut setup = connect(&server).await?;
        setup
            .create_table(&cs, "events", columns([("id", "INTEGER PRIMARY KEY"), ("label", "TEXT")]))
            .await?;
        setup.close().await?;
    }

    let mut tasks = Vec::new();
    for i in 0..8 {
        let addr = server.address().to_string();
        let cs = cs.clone();
        tasks.push(tokio::spawn(async move {
            let mut client = Client::connect(&addr).await?;
            let id = i.to_string();
            let label = format!("evt{i}");
            client
                .insert_record(&cs, "events", columns([("id", id.as_str()), ("label", label.as_str())]))
                .await?;
            client.close().await?;
            Result::<()>::Ok(())
        }));
    }
    for handle in tasks {
        handle.await??;
    }

    let mut verifier = connect(&server).await?;
    assert_eq!(verifier.query_data(&cs, "events", "*", "").await?.len(), 8);
    verifier.close().await?;
    Ok(())
}
