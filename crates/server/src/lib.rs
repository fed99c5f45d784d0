//! TCP server for the tenant database gateway.
//!
//! Accepts client connections and runs gateway operations remotely using the
//! wire protocol defined in the `protocol` crate. Each connection gets its own
//! task; the blocking SQLite work of each request runs on the blocking pool.

pub mod error;

use anyhow::Result;
use gateway::Gateway;
use protocol::{ClientRequest, ErrorCode, ServerResponse, frame};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

pub use error::map_error_to_code;

/// Run the server loop, accepting connections and spawning handlers.
pub async fn run_server(listener: TcpListener, gateway: Arc<Gateway>) -> Result<()> {
    loop {
        match listener.accept().await {
            Ok((socket, addr)) => {
                info!(%addr, "new connection");
                let gateway = gateway.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_client(socket, gateway).await {
                        warn!(%addr, error = %e, "error handling client");
                    }
                    info!(%addr, "connection closed");
                });
            }
            Err(e) => {
                error!(error = %e, "error accepting connection");
            }
        }
    }
}

/// Handle a single client connection until it closes or sends `Close`.
///
/// Operation failures are reported as `ServerResponse::Error` and keep the
/// connection open; only transport errors end it.
pub async fn handle_client(mut socket: TcpStream, gateway: Arc<Gateway>) -> Result<()> {
    let client_addr = socket
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    loop {
        let request: ClientRequest = match frame::read_message_async(&mut socket).await {
            Ok(req) => req,
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => {
                let response = ServerResponse::Error {
                    code: ErrorCode::IoError,
                    message: format!("Failed to read request: {e}"),
                };
                let _ = frame::write_message_async(&mut socket, &response).await;
                return Err(e.into());
            }
        };

        if matches!(request, ClientRequest::Close) {
            break;
        }

        let operation = request.operation();
        debug!(client = %client_addr, operation, "request received");
        let start = Instant::now();

        let worker = gateway.clone();
        let response = tokio::task::spawn_blocking(move || dispatch(&worker, request))
            .await
            .unwrap_or_else(|e| ServerResponse::Error {
                code: ErrorCode::Unknown,
                message: format!("request task failed: {e}"),
            });

        match &response {
            ServerResponse::Error { code, message } => info!(
                client = %client_addr,
                operation,
                elapsed = ?start.elapsed(),
                ?code,
                %message,
                "operation failed"
            ),
            _ => info!(
                client = %client_addr,
                operation,
                elapsed = ?start.elapsed(),
                "operation completed"
            ),
        }

        frame::write_message_async(&mut socket, &response).await?;
    }

    Ok(())
}

/// Run one request against the gateway and convert the outcome into a
/// response. Blocking.
pub fn dispatch(gateway: &Gateway, request: ClientRequest) -> ServerResponse {
    let result = match request {
        ClientRequest::CreateUser { username, password } => gateway
            .create_user(&username, &password)
            .map(|connection_string| ServerResponse::UserCreated {
                message: "User created successfully".to_string(),
                connection_string,
            }),
        ClientRequest::CreateDatabase { connection_string } => gateway
            .create_database(&connection_string)
            .map(|_| ack("Database created successfully!")),
        ClientRequest::CreateTable {
            connection_string,
            table_name,
            columns,
        } => gateway
            .create_table(&connection_string, &table_name, &columns)
            .map(|()| ack("Table created successfully!")),
        ClientRequest::InsertRecord {
            connection_string,
            table_name,
            record,
        } => gateway
            .insert_record(&connection_string, &table_name, &record)
            .map(|()| ack("Record inserted successfully!")),
        ClientRequest::InsertMultipleRecords {
            connection_string,
            table_name,
            records,
        } => gateway
            .insert_multiple_records(&connection_string, &table_name, &records)
            .map(|count| ack(&format!("{count} records inserted successfully!"))),
        ClientRequest::QueryData {
            connection_string,
            table_name,
            columns,
            condition,
        } => gateway
            .query_data(&connection_string, &table_name, &columns, &condition)
            .map(|batch| ServerResponse::Rows {
                message: "Query executed successfully".to_string(),
                batch,
            }),
        ClientRequest::UpdateTable {
            connection_string,
            table_name,
            column_name,
            column_type,
        } => gateway
            .update_table(&connection_string, &table_name, &column_name, &column_type)
            .map(|()| ack("Table updated successfully")),
        ClientRequest::UpdateRecord {
            connection_string,
            table_name,
            updates,
            condition,
        } => gateway
            .update_record(&connection_string, &table_name, &updates, &condition)
            .map(|changed| ack(&format!("Record updated successfully ({changed} rows)"))),
        ClientRequest::AddIndex {
            connection_string,
            table_name,
            columns,
            index_name,
        } => gateway
            .add_index(
                &connection_string,
                &table_name,
                &columns,
                index_name.as_deref(),
            )
            .map(|name| ack(&format!("Index {name} created successfully!"))),
        ClientRequest::DeleteIndex {
            connection_string,
            index_name,
        } => gateway
            .delete_index(&connection_string, &index_name)
            .map(|()| ack("Index deleted successfully!")),
        ClientRequest::ListIndexes { connection_string } => gateway
            .list_indexes(&connection_string)
            .map(|indexes| ServerResponse::Indexes { indexes }),
        ClientRequest::Close => Ok(ack("closing")),
    };

    result.unwrap_or_else(|err| ServerResponse::Error {
        code: map_error_to_code(&err),
        message: err.to_string(),
    })
}

fn ack(message: &str) -> ServerResponse {
    ServerResponse::Ack {
        message: message.to_string(),
    }
}
