pub mod directory;
pub mod health;
pub mod metrics;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Plain-text failure response.
///
/// Only the generic message reaches the caller; details stay in the logs.
#[derive(Debug)]
pub struct ErrorResponse {
    status: StatusCode,
    message: &'static str,
}

impl ErrorResponse {
    pub fn internal(message: &'static str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message,
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}
