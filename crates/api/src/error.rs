//! Error responses.
//!
//! Every rejection carries `error` (a stable code), `message`, and `fields`
//! naming the request field(s) that caused it. Server-side failures are
//! logged and returned without detail.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use settla_core::payment::{FieldViolation, PaymentError};
use settla_shared::AppError;
use settla_shared::types::IdCodecError;

/// Maps a payment error to its HTTP response.
pub fn payment_error_response(e: &PaymentError) -> Response {
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    if status.is_server_error() {
        error!(error = %e, code = e.error_code(), "Payment operation failed");
        return (
            status,
            Json(json!({
                "error": e.error_code(),
                "message": "An error occurred",
                "fields": []
            })),
        )
            .into_response();
    }

    (
        status,
        Json(json!({
            "error": e.error_code(),
            "message": e.to_string(),
            "fields": e.violations()
        })),
    )
        .into_response()
}

fn app_error_response(field: &str, reason: &str, e: &AppError) -> Response {
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({
            "error": e.error_code(),
            "message": e.to_string(),
            "fields": [FieldViolation::new(field, reason)]
        })),
    )
        .into_response()
}

/// 400 response for a request field that could not be parsed.
pub fn invalid_field(field: &str, message: &str) -> Response {
    app_error_response(
        field,
        message,
        &AppError::Validation(format!("{field} {message}")),
    )
}

/// 400 response for a document type the client may not reference.
pub fn invalid_reference(field: &str, message: &str) -> Response {
    app_error_response(
        field,
        message,
        &AppError::InvalidReference(format!("{field} {message}")),
    )
}

/// 400 response for an identifier the codec could not decode.
pub fn invalid_id(field: &str, e: &IdCodecError) -> Response {
    app_error_response(field, "is not a valid identifier", &AppError::from(e.clone()))
}
