//! Wire protocol for client-server communication.
//!
//! Defines one request variant per gateway operation, the response shapes, and
//! frame-based serialization. Messages are length-prefixed using bincode
//! encoding.

use common::{IndexInfo, RecordBatch};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Column-name keyed map used for column definitions, records, and updates.
pub type ColumnMap = BTreeMap<String, String>;

/// Request message sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClientRequest {
    /// Register a new credential and receive a connection-string template
    CreateUser { username: String, password: String },
    /// Initialize the tenant database named by the connection string
    CreateDatabase { connection_string: String },
    /// Create a table from a column-name to declared-type map
    CreateTable {
        connection_string: String,
        table_name: String,
        columns: ColumnMap,
    },
    /// Insert a single record
    InsertRecord {
        connection_string: String,
        table_name: String,
        record: ColumnMap,
    },
    /// Insert several records in one call
    InsertMultipleRecords {
        connection_string: String,
        table_name: String,
        records: Vec<ColumnMap>,
    },
    /// Select rows; `columns` is a raw column list, `condition` may be empty
    QueryData {
        connection_string: String,
        table_name: String,
        columns: String,
        condition: String,
    },
    /// Add a column to an existing table
    UpdateTable {
        connection_string: String,
        table_name: String,
        column_name: String,
        column_type: String,
    },
    /// Update rows matching `condition`
    UpdateRecord {
        connection_string: String,
        table_name: String,
        updates: ColumnMap,
        condition: String,
    },
    /// Create an index, synthesizing a name when none is given
    AddIndex {
        connection_string: String,
        table_name: String,
        columns: Vec<String>,
        index_name: Option<String>,
    },
    /// Drop an index tracked in the metadata table
    DeleteIndex {
        connection_string: String,
        index_name: String,
    },
    /// List the metadata table
    ListIndexes { connection_string: String },
    /// Close the connection gracefully
    Close,
}

impl ClientRequest {
    /// Short operation name used in logs.
    pub fn operation(&self) -> &'static str {
        match self {
            ClientRequest::CreateUser { .. } => "create-user",
            ClientRequest::CreateDatabase { .. } => "create-database",
            ClientRequest::CreateTable { .. } => "create-table",
            ClientRequest::InsertRecord { .. } => "insert-record",
            ClientRequest::InsertMultipleRecords { .. } => "insert-multiple-records",
            ClientRequest::QueryData { .. } => "query-data",
            ClientRequest::UpdateTable { .. } => "update-table",
            ClientRequest::UpdateRecord { .. } => "update-record",
            ClientRequest::AddIndex { .. } => "add-index",
            ClientRequest::DeleteIndex { .. } => "delete-index",
            ClientRequest::ListIndexes { .. } => "list-indexes",
            ClientRequest::Close => "close",
        }
    }
}

/// Response message sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ServerResponse {
    /// A user was registered
    UserCreated {
        message: String,
        connection_string: String,
    },
    /// Operation succeeded with nothing but a status message
    Ack { message: String },
    /// Query returned rows
    Rows { message: String, batch: RecordBatch },
    /// Index metadata listing
    Indexes { indexes: Vec<IndexInfo> },
    /// An error occurred
    Error { code: ErrorCode, message: String },
}

/// Error codes for protocol-level errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Connection string lacks the scheme prefix
    MalformedConnectionString,
    /// Connection string lacks a database segment
    MissingDatabaseName,
    /// Credentials lack the `:` separator
    MalformedCredentials,
    /// Unknown user or wrong password
    AuthenticationFailed,
    /// Tenant directory or database file could not be opened
    StorageUnavailable,
    /// Index name absent from the metadata table
    IndexNotFound,
    /// Request failed validation
    InvalidRequest,
    /// Username already registered
    UserAlreadyExists,
    /// The storage engine rejected a generated statement
    ExecutionError,
    /// General I/O error
    IoError,
    /// Unknown error
    Unknown,
}

/// Frame format: [u32 length (little-endian)][bincode payload]
pub mod frame {
    use super::*;
    use bincode::config;
    use std::io::{self, Read, Write};
    use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

    const MAX_FRAME_SIZE: u32 = 64 * 1024 * 1024; // 64 MB

    fn encode<T: Serialize>(message: &T) -> io::Result<Vec<u8>> {
        let encoded = bincode::serde::encode_to_vec(message, config::standard())
            .map_err(|e| io::Error::other(format!("bincode encoding failed: {}", e)))?;
        if encoded.len() > MAX_FRAME_SIZE as usize {
            return Err(io::Error::other(format!(
                "message too large: {} bytes (max {})",
                encoded.len(),
                MAX_FRAME_SIZE
            )));
        }
        Ok(encoded)
    }

    fn decode<T: for<'de> Deserialize<'de>>(payload: &[u8]) -> io::Result<T> {
        let (message, _) = bincode::serde::decode_from_slice(payload, config::standard())
            .map_err(|e| io::Error::other(format!("bincode decoding failed: {}", e)))?;
        Ok(message)
    }

    fn check_len(len: u32) -> io::Result<()> {
        if len > MAX_FRAME_SIZE {
            return Err(io::Error::other(format!(
                "message too large: {} bytes (max {})",
                len, MAX_FRAME_SIZE
            )));
        }
        Ok(())
    }

    /// Write a framed message.
    ///
    /// Format: [u32 length][bincode payload]
    pub fn write_message<W, T>(writer: &mut W, message: &T) -> io::Result<()>
    where
        W: Write,
        T: Serialize,
    {
        let encoded = encode(message)?;
        writer.write_all(&(encoded.len() as u32).to_le_bytes())?;
        writer.write_all(&encoded)?;
        Ok(())
    }

    /// Read a framed message.
    ///
    /// Format: [u32 length][bincode payload]
    pub fn read_message<R, T>(reader: &mut R) -> io::Result<T>
    where
        R: Read,
        T: for<'de> Deserialize<'de>,
    {
        let mut len_buf = [0u8; 4];
        reader.read_exact(&mut len_buf)?;
        let len = u32::from_le_bytes(len_buf);
        check_len(len)?;

        let mut payload = vec![0u8; len as usize];
        reader.read_exact(&mut payload)?;
        decode(&payload)
    }

    /// Async variant of [`write_message`] for tokio streams.
    pub async fn write_message_async<W, T>(writer: &mut W, message: &T) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
        T: Serialize,
    {
        let encoded = encode(message)?;
        writer
            .write_all(&(encoded.len() as u32).to_le_bytes())
            .await?;
        writer.write_all(&encoded).await?;
        writer.flush().await
    }

    /// Async variant of [`read_message`] for tokio streams.
    ///
    /// A peer that disconnects between frames yields `UnexpectedEof`.
    pub async fn read_message_async<R, T>(reader: &mut R) -> io::Result<T>
    where
        R: AsyncRead + Unpin,
        T: for<'de> Deserialize<'de>,
    {
        let mut len_buf = [0u8; 4];
        reader.read_exact(&mut len_buf).await?;
        let len = u32::from_le_bytes(len_buf);
        check_len(len)?;

        let mut payload = vec![0u8; len as usize];
        reader.read_exact(&mut payload).await?;
        decode(&payload)
    }
}
