//! Maps the public API's failure modes onto HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(err) => {
                tracing::error!(error = %err, "internal error handling request");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<smartdrive_node::NodeError> for ApiError {
    fn from(err: smartdrive_node::NodeError) -> Self {
        use smartdrive_node::NodeError;
        match err {
            NodeError::TooFewMiners { .. } => ApiError::BadRequest(err.to_string()),
            NodeError::ReplicationQuotaUnmet { .. } => ApiError::Internal(err.into()),
            NodeError::NoValidationResponders => ApiError::NotFound(err.to_string()),
            NodeError::UnknownFile(_) => ApiError::NotFound(err.to_string()),
            NodeError::NoSurvivingReplica(_) => ApiError::NotFound(err.to_string()),
            NodeError::Chain(ref chain_err) => match chain_err {
                smartdrive_chain::ChainError::NetworkUnreachable { .. } => ApiError::NotFound(err.to_string()),
                smartdrive_chain::ChainError::MalformedResponse(_) => ApiError::Internal(err.into()),
            },
            NodeError::Store(_) | NodeError::Crypto(_) | NodeError::Types(_) => {
                ApiError::Internal(err.into())
            }
        }
    }
}

impl From<smartdrive_chain::ChainError> for ApiError {
    fn from(err: smartdrive_chain::ChainError) -> Self {
        match err {
            smartdrive_chain::ChainError::NetworkUnreachable { .. } => ApiError::NotFound(err.to_string()),
            smartdrive_chain::ChainError::MalformedResponse(_) => ApiError::Internal(err.into()),
        }
    }
}

impl From<smartdrive_store::StoreError> for ApiError {
    fn from(err: smartdrive_store::StoreError) -> Self {
        ApiError::Internal(err.into())
    }
}
