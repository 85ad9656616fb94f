//! Error types for the student portal.
//!
//! Validation problems and expected storage failures never reach this type:
//! handlers turn them into notices and re-render the page. What remains are
//! faults the request cannot recover from, answered with the fixed 500 page.

use crate::notice::Notice;
use crate::pages;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;
use tracing::error;

/// Unrecoverable request failures.
#[derive(Debug, Error)]
pub enum PortalError {
    #[error("Storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        error!(error = %self, "Request failed with internal error");
        internal_error_response()
    }
}

/// The fixed 500 page with its generic notice.
pub fn internal_error_response() -> Response {
    let notice = Notice::danger("An internal error occurred. Please try again later.");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(pages::internal_error(&[notice])),
    )
        .into_response()
}
