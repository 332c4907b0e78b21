//! Error mapping to the Rosetta error object.
//!
//! Every failure surfaces as `{code, message, retriable}` with HTTP 500, the
//! shape Rosetta clients key their retry logic on. Codes are stable API;
//! messages are diagnostic only.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use tessera_core::error::{ChainError, TransformError};

/// Stable Rosetta error codes exposed by this middleware.
pub mod codes {
    pub const UNABLE_TO_REACH_OBSERVER: i32 = 1;
    pub const BLOCK_NOT_FOUND: i32 = 2;
    pub const INVALID_INPUT: i32 = 3;
    pub const OFFLINE_MODE: i32 = 4;
    pub const TRANSFORMATION_FAILED: i32 = 5;
    pub const TRANSACTION_NOT_FOUND: i32 = 6;
}

/// An API-level failure, carrying its Rosetta code and retriability.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ApiError {
    pub code: i32,
    pub message: String,
    pub retriable: bool,
}

impl ApiError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self {
            code: codes::INVALID_INPUT,
            message: message.into(),
            retriable: false,
        }
    }

    pub fn transaction_not_found(hash: &str) -> Self {
        Self {
            code: codes::TRANSACTION_NOT_FOUND,
            message: format!("transaction not found: {hash}"),
            retriable: false,
        }
    }
}

impl From<ChainError> for ApiError {
    fn from(err: ChainError) -> Self {
        let (code, retriable) = match &err {
            ChainError::Unreachable(_) => (codes::UNABLE_TO_REACH_OBSERVER, true),
            ChainError::BlockNotFound(_) => (codes::BLOCK_NOT_FOUND, false),
            ChainError::Offline => (codes::OFFLINE_MODE, false),
            ChainError::InvalidInput(_) => (codes::INVALID_INPUT, false),
        };

        Self {
            code,
            message: err.to_string(),
            retriable,
        }
    }
}

impl From<TransformError> for ApiError {
    fn from(err: TransformError) -> Self {
        match err {
            TransformError::Chain(chain) => chain.into(),
            other => Self {
                code: codes::TRANSFORMATION_FAILED,
                message: other.to_string(),
                retriable: false,
            },
        }
    }
}

/// The Rosetta error object on the wire.
#[derive(Debug, Serialize)]
struct ErrorBody {
    code: i32,
    message: String,
    retriable: bool,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code,
            message: self.message,
            retriable: self.retriable,
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_failures_are_retriable() {
        let err: ApiError = ChainError::Unreachable("down".into()).into();
        assert_eq!(err.code, codes::UNABLE_TO_REACH_OBSERVER);
        assert!(err.retriable);
    }

    #[test]
    fn missing_blocks_are_not_retriable() {
        let err: ApiError = ChainError::BlockNotFound("7".into()).into();
        assert_eq!(err.code, codes::BLOCK_NOT_FOUND);
        assert!(!err.retriable);
    }

    #[test]
    fn transform_errors_unwrap_their_chain_cause() {
        let err: ApiError =
            TransformError::Chain(ChainError::BlockNotFound("7".into())).into();
        assert_eq!(err.code, codes::BLOCK_NOT_FOUND);

        let err: ApiError = TransformError::UnknownTransactionType("exotic".into()).into();
        assert_eq!(err.code, codes::TRANSFORMATION_FAILED);
        assert!(err.message.contains("exotic"));
    }
}
