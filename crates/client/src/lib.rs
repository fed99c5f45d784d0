//! Client library for the tenant database gateway.
//!
//! One async method per gateway operation. Every method except
//! [`Client::create_user`] takes a connection string of the form
//! `scheme://username:password/database`.
//!
//! # Example
//!
//! ```no_run
//! use client::{Client, columns};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut client = Client::connect("127.0.0.1:50051").await?;
//!     let template = client.create_user("alice", "secret1").await?;
//!     let cs = template.replace("<dbname>", "orders");
//!
//!     client.create_database(&cs).await?;
//!     client
//!         .create_table(&cs, "orders", columns([("id", "INTEGER PRIMARY KEY"), ("name", "TEXT")]))
//!         .await?;
//!     client
//!         .insert_record(&cs, "orders", columns([("id", "1"), ("name", "widget")]))
//!         .await?;
//!
//!     let batch = client.query_data(&cs, "orders", "*", "").await?;
//!     println!("{} row(s)", batch.len());
//!
//!     client.close().await?;
//!     Ok(())
//! }
//! ```

mod error;

pub use error::{ClientError, Result};
pub use protocol::ColumnMap;

use common::{IndexInfo, RecordBatch};
use protocol::{ClientRequest, ServerResponse, frame};
use tokio::net::TcpStream;

/// Build a [`ColumnMap`] from string pairs.
pub fn columns<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> ColumnMap {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Client for connecting to the gateway server.
pub struct Client {
    socket: TcpStream,
}

impl Client {
    /// Connect to the gateway server at the given address.
    pub async fn connect(addr: &str) -> Result<Self> {
        let socket = TcpStream::connect(addr)
            .await
            .map_err(ClientError::Connect)?;

        Ok(Self { socket })
    }

    /// Register a user. Returns the connection-string template
    /// `scheme://username:password/<dbname>`.
    pub async fn create_user(&mut self, username: &str, password: &str) -> Result<String> {
        let request = ClientRequest::CreateUser {
            username: username.to_string(),
            password: password.to_string(),
        };
        match self.call(request).await? {
            ServerResponse::UserCreated {
                connection_string, ..
            } => Ok(connection_string),
            other => Err(unexpected("create-user", other)),
        }
    }

    pub async fn create_database(&mut self, connection_string: &str) -> Result<String> {
        self.ack(ClientRequest::CreateDatabase {
            connection_string: connection_string.to_string(),
        })
        .await
    }

    pub async fn create_table(
        &mut self,
        connection_string: &str,
        table_name: &str,
        columns: ColumnMap,
    ) -> Result<String> {
        self.ack(ClientRequest::CreateTable {
            connection_string: connection_string.to_string(),
            table_name: table_name.to_string(),
            columns,
        })
        .await
    }

    pub async fn insert_record(
        &mut self,
        connection_string: &str,
        table_name: &str,
        record: ColumnMap,
    ) -> Result<String> {
        self.ack(ClientRequest::InsertRecord {
            connection_string: connection_string.to_string(),
            table_name: table_name.to_string(),
            record,
        })
        .await
    }

    /// Insert all records or none.
    pub async fn insert_multiple_records(
        &mut self,
        connection_string: &str,
        table_name: &str,
        records: Vec<ColumnMap>,
    ) -> Result<String> {
        self.ack(ClientRequest::InsertMultipleRecords {
            connection_string: connection_string.to_string(),
            table_name: table_name.to_string(),
            records,
        })
        .await
    }

    /// Select `columns` from `table_name`. An empty `condition` selects every row.
    pub async fn query_data(
        &mut self,
        connection_string: &str,
        table_name: &str,
        columns: &str,
        condition: &str,
    ) -> Result<RecordBatch> {
        let request = ClientRequest::QueryData {
            connection_string: connection_string.to_string(),
            table_name: table_name.to_string(),
            columns: columns.to_string(),
            condition: condition.to_string(),
        };
        match self.call(request).await? {
            ServerResponse::Rows { batch, .. } => Ok(batch),
            other => Err(unexpected("query-data", other)),
        }
    }

    /// Add a column to an existing table.
    pub async fn update_table(
        &mut self,
        connection_string: &str,
        table_name: &str,
        column_name: &str,
        column_type: &str,
    ) -> Result<String> {
        self.ack(ClientRequest::UpdateTable {
            connection_string: connection_string.to_string(),
            table_name: table_name.to_string(),
            column_name: column_name.to_string(),
            column_type: column_type.to_string(),
        })
        .await
    }

    pub async fn update_record(
        &mut self,
        connection_string: &str,
        table_name: &str,
        updates: ColumnMap,
        condition: &str,
    ) -> Result<String> {
        self.ack(ClientRequest::UpdateRecord {
            connection_string: connection_string.to_string(),
            table_name: table_name.to_string(),
            updates,
            condition: condition.to_string(),
        })
        .await
    }

    /// Create an index. `None` or an empty name lets the server name it
    /// `<table>_<col1>_..._idx`.
    pub async fn add_index(
        &mut self,
        connection_string: &str,
        table_name: &str,
        columns: Vec<String>,
        index_name: Option<&str>,
    ) -> Result<String> {
        self.ack(ClientRequest::AddIndex {
            connection_string: connection_string.to_string(),
            table_name: table_name.to_string(),
            columns,
            index_name: index_name.map(str::to_string),
        })
        .await
    }

    pub async fn delete_index(
        &mut self,
        connection_string: &str,
        index_name: &str,
    ) -> Result<String> {
        self.ack(ClientRequest::DeleteIndex {
            connection_string: connection_string.to_string(),
            index_name: index_name.to_string(),
        })
        .await
    }

    pub async fn list_indexes(&mut self, connection_string: &str) -> Result<Vec<IndexInfo>> {
        let request = ClientRequest::ListIndexes {
            connection_string: connection_string.to_string(),
        };
        match self.call(request).await? {
            ServerResponse::Indexes { indexes } => Ok(indexes),
            other => Err(unexpected("list-indexes", other)),
        }
    }

    /// Close the connection gracefully.
    pub async fn close(&mut self) -> Result<()> {
        let request = ClientRequest::Close;
        frame::write_message_async(&mut self.socket, &request)
            .await
            .map_err(ClientError::Transport)?;
        Ok(())
    }

    async fn ack(&mut self, request: ClientRequest) -> Result<String> {
        let operation = request.operation();
        match self.call(request).await? {
            ServerResponse::Ack { message } => Ok(message),
            other => Err(unexpected(operation, other)),
        }
    }

    /// Send one request and read its response. Server-side errors become
    /// `ClientError::Rejected`.
    async fn call(&mut self, request: ClientRequest) -> Result<ServerResponse> {
        frame::write_message_async(&mut self.socket, &request)
            .await
            .map_err(ClientError::Transport)?;

        let response: ServerResponse = frame::read_message_async(&mut self.socket)
            .await
            .map_err(ClientError::Transport)?;

        match response {
            ServerResponse::Error { code, message } => Err(ClientError::Rejected { code, message }),
            other => Ok(other),
        }
    }
}

fn unexpected(operation: &'static str, response: ServerResponse) -> ClientError {
    ClientError::UnexpectedResponse {
        operation,
        response: format!("{response:?}"),
    }
}
