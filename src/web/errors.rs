use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::error::Error;

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self {
            Error::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", self.to_string()),
            Error::Validation(msg) => {
                json_error(StatusCode::BAD_REQUEST, "validation_error", msg.clone())
            }
            Error::Unauthorized => {
                json_error(StatusCode::UNAUTHORIZED, "unauthorized", self.to_string())
            }
            Error::Storage(_) | Error::Migration(_) | Error::PasswordHash(_) => {
                tracing::error!(error = %self, "request failed");
                json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "operation failed",
                )
            }
        }
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
