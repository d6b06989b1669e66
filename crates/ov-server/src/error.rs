//! JSON response envelope for the HTTP API: `{status: "ok"|"error", ...}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ov_core::error::{ErrorCode, OvError};
use serde::Serialize;
use serde_json::{json, Value};

/// API error carrying the shared taxonomy code, mapped to its HTTP status
/// via [`ErrorCode::http_status`].
#[derive(Debug)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, msg)
    }
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidArgument, msg)
    }
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::AlreadyExists, msg)
    }
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, msg)
    }
    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthenticated, msg)
    }
    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::PermissionDenied, msg)
    }

    fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = json!({
            "status": "error",
            "error": { "code": self.code.as_str(), "message": self.message },
        });
        (status, Json(body)).into_response()
    }
}

impl From<OvError> for ApiError {
    fn from(err: OvError) -> Self {
        Self { code: err.code(), message: err.to_string() }
    }
}

impl From<ov_vectordb::error::VectorDbError> for ApiError {
    fn from(err: ov_vectordb::error::VectorDbError) -> Self {
        use ov_vectordb::error::VectorDbError as E;
        let code = match &err {
            E::CollectionNotFound(_) | E::IndexNotFound(_) | E::ProjectNotFound(_) => ErrorCode::NotFound,
            E::CollectionAlreadyExists(_) | E::IndexAlreadyExists(_) | E::ProjectAlreadyExists(_) => {
                ErrorCode::AlreadyExists
            }
            E::InvalidConfig(_) | E::DimensionMismatch { .. } => ErrorCode::InvalidArgument,
            E::Storage(_) | E::Serialization(_) | E::Io(_) | E::Other(_) => ErrorCode::Internal,
        };
        Self { code, message: err.to_string() }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self { code: ErrorCode::Internal, message: err.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// Wrap a successful handler result in the `{status:"ok", result}` envelope.
pub fn ok_json<T: Serialize>(value: T) -> Json<Value> {
    Json(json!({ "status": "ok", "result": value }))
}
