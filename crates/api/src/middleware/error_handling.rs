//! # Error Handling Middleware
//!
//! Maps domain errors to HTTP status codes and a JSON body of the form
//! `{"error": "<message>"}`, so every handler fails the same way.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use slotbook_core::errors::TimeslotError;
use tracing::error;

/// Application error wrapper that provides HTTP status code mapping
///
/// # Example
///
/// ```
/// use axum::Json;
/// use slotbook_api::middleware::error_handling::AppError;
/// use slotbook_core::errors::TimeslotError;
///
/// async fn handler(id: i64) -> Result<Json<i64>, AppError> {
///     if id < 0 {
///         return Err(AppError(TimeslotError::NotFound(format!("Timeslot with ID {} not found", id))));
///     }
///     Ok(Json(id))
/// }
/// # fn main() {}
/// ```
#[derive(Debug)]
pub struct AppError(pub TimeslotError);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            TimeslotError::NotFound(_) => StatusCode::NOT_FOUND,
            TimeslotError::Validation(_) => StatusCode::BAD_REQUEST,
            TimeslotError::Conflict(_) => StatusCode::CONFLICT,
            TimeslotError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            TimeslotError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }

        let body = Json(json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

/// Allows `?` on `TimeslotResult` inside handlers
impl From<TimeslotError> for AppError {
    fn from(err: TimeslotError) -> Self {
        AppError(err)
    }
}

/// Storage failures reported as `eyre::Report` become `TimeslotError::Database`
impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        AppError(TimeslotError::Database(err))
    }
}

/// Malformed or incomplete JSON bodies
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError(TimeslotError::Validation(rejection.body_text()))
    }
}

/// Missing or malformed query strings
impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError(TimeslotError::Validation(rejection.body_text()))
    }
}

/// Path segments that do not parse, e.g. a non-numeric timeslot id
impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError(TimeslotError::Validation(rejection.body_text()))
    }
}

/// Maps a TimeslotError to an HTTP response
pub fn map_error(err: TimeslotError) -> Response {
    AppError(err).into_response()
}
