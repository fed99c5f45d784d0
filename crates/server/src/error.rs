//! Error mapping utilities for converting gateway errors to protocol error codes.

use common::GatewayError;
use protocol::ErrorCode;

/// Map a gateway error to the code sent back in `ServerResponse::Error`.
pub fn map_error_to_code(err: &GatewayError) -> ErrorCode {
    match err {
        GatewayError::MalformedConnectionString(_) => ErrorCode::MalformedConnectionString,
        GatewayError::MissingDatabaseName => ErrorCode::MissingDatabaseName,
        GatewayError::MalformedCredentials => ErrorCode::MalformedCredentials,
        GatewayError::AuthenticationFailed => ErrorCode::AuthenticationFailed,
        GatewayError::StorageUnavailable(_) => ErrorCode::StorageUnavailable,
        GatewayError::IndexNotFound(_) => ErrorCode::IndexNotFound,
        GatewayError::InvalidRequest(_) => ErrorCode::InvalidRequest,
        GatewayError::UserAlreadyExists(_) => ErrorCode::UserAlreadyExists,
        GatewayError::StatementExecutionFailed(_) => ErrorCode::ExecutionError,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_connection_string_errors() {
        assert_eq!(
            map_error_to_code(&GatewayError::MalformedConnectionString("x".into())),
            ErrorCode::MalformedConnectionString
        );
        assert_eq!(
            map_error_to_code(&GatewayError::MissingDatabaseName),
            ErrorCode::MissingDatabaseName
        );
        assert_eq!(
            map_error_to_code(&GatewayError::MalformedCredentials),
            ErrorCode::MalformedCredentials
        );
    }

    #[test]
    fn test_map_auth_error() {
        assert_eq!(
            map_error_to_code(&GatewayError::AuthenticationFailed),
            ErrorCode::AuthenticationFailed
        );
    }

    #[test]
    fn test_map_storage_error() {
        let err = GatewayError::from(std::io::Error::other("disk full"));
        assert_eq!(map_error_to_code(&err), ErrorCode::StorageUnavailable);
    }

    #[test]
    fn test_map_index_not_found() {
        assert_eq!(
            map_error_to_code(&GatewayError::IndexNotFound("orders_name_idx".into())),
            ErrorCode::IndexNotFound
        );
    }

    #[test]
    fn test_map_execution_error() {
        let err = GatewayError::from(rusqlite::Error::InvalidQuery);
        assert_eq!(map_error_to_code(&err), ErrorCode::ExecutionError);
    }

    #[test]
    fn test_map_request_errors() {
        assert_eq!(
            map_error_to_code(&GatewayError::InvalidRequest("empty".into())),
            ErrorCode::InvalidRequest
        );
        assert_eq!(
            map_error_to_code(&GatewayError::UserAlreadyExists("alice".into())),
            ErrorCode::UserAlreadyExists
        );
    }
}
