//! Errors surfaced by [`Client`](crate::Client).
//!
//! Transport failures leave the connection unusable; a [`ClientError::Rejected`]
//! answer does not, and the same client can issue the next request.

use protocol::ErrorCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    /// The TCP connection to the gateway could not be established.
    #[error("cannot reach gateway: {0}")]
    Connect(#[source] std::io::Error),

    /// A frame could not be written, read, or decoded.
    #[error("transport failure: {0}")]
    Transport(#[source] std::io::Error),

    /// The gateway refused the request. `code` says which stage failed:
    /// connection-string parsing, authentication, validation, or execution
    /// against the tenant database.
    #[error("gateway rejected request ({code:?}): {message}")]
    Rejected { code: ErrorCode, message: String },

    /// The gateway answered with a response kind the request never produces.
    #[error("unexpected response to {operation}: {response}")]
    UnexpectedResponse {
        operation: &'static str,
        response: String,
    },
}

impl ClientError {
    /// The gateway's error code, if it rejected the request.
    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            ClientError::Rejected { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, ClientError::Rejected { .. })
    }

    /// Wrong password or unknown user in the connection string.
    pub fn is_authentication_failure(&self) -> bool {
        self.error_code() == Some(ErrorCode::AuthenticationFailed)
    }

    /// True when the connection should be dropped and re-established.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Connect(_) | ClientError::Transport(_))
    }
}
