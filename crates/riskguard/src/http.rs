//! Mapping protection outcomes onto HTTP responses for the web layer.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::ProtectionError;
use crate::protection::Decision;

/// Standardised API error response body.
///
/// Every error serialises as:
/// ```json
/// { "ok": false, "error": { "code": "<code>", "message": "<message>" } }
/// ```
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ApiErrorResponse,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiErrorResponse {
    pub ok: bool,
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ApiErrorResponse {
                ok: false,
                error: ApiErrorBody {
                    code: code.into(),
                    message: message.into(),
                },
            },
        }
    }

    pub fn internal(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, code, message)
    }

    /// A denied action is answered with a bare server error so the client
    /// learns nothing about the verdict.
    pub fn denied() -> Self {
        Self::internal("denied", "request could not be completed")
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &ApiErrorResponse {
        &self.body
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<ProtectionError> for ApiError {
    fn from(err: ProtectionError) -> Self {
        Self::internal(err.code(), err.to_string())
    }
}

/// Turn a decision into the handler's early return.
pub fn ensure_not_blocked(decision: &Decision) -> Result<(), ApiError> {
    if decision.is_blocked() {
        Err(ApiError::denied())
    } else {
        Ok(())
    }
}
