// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP-facing errors.
//!
//! Every failure of the contact pipeline ends here and becomes exactly one
//! JSON response. Transport detail is logged, never returned.

use crate::handlers::ApiResponse;
use crate::mailer::DispatchError;
use crate::validator::FieldError;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

pub const DISPATCH_FAILED_MESSAGE: &str = "Failed to send message. Please try again shortly.";
pub const NOT_FOUND_MESSAGE: &str = "Route not found.";
pub const INVALID_BODY_MESSAGE: &str = "Invalid request body.";
pub const INTERNAL_MESSAGE: &str = "Internal server error.";

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Rate limit exceeded, retry in {}s", .retry_after.as_secs())]
    RateLimited {
        retry_after: Duration,
        window: Duration,
    },

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("Route not found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;

/// Caller-facing throttle message for a window length.
pub fn rate_limit_message(window: Duration) -> String {
    let minutes = window.as_secs().div_ceil(60).max(1);
    let unit = if minutes == 1 { "minute" } else { "minutes" };
    format!("Too many submissions from this IP. Please try again in {minutes} {unit}.")
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(errors) => {
                debug!(count = errors.len(), first = ?errors.first(), "Validation failed");
                let message = errors
                    .first()
                    .map(|e| e.message.clone())
                    .unwrap_or_else(|| INVALID_BODY_MESSAGE.to_string());
                (
                    StatusCode::BAD_REQUEST,
                    Json(ApiResponse::failure(message).with_errors(errors)),
                )
                    .into_response()
            }
            AppError::InvalidBody(detail) => {
                debug!(detail = %detail, "Rejected request body");
                (
                    StatusCode::BAD_REQUEST,
                    Json(ApiResponse::failure(INVALID_BODY_MESSAGE)),
                )
                    .into_response()
            }
            AppError::RateLimited {
                retry_after,
                window,
            } => {
                info!(retry_after_secs = retry_after.as_secs(), "Submission rate limited");
                let mut response = (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(ApiResponse::failure(rate_limit_message(window))),
                )
                    .into_response();
                response.headers_mut().insert(
                    header::RETRY_AFTER,
                    HeaderValue::from(retry_after.as_secs().max(1)),
                );
                response
            }
            AppError::Dispatch(e) => {
                error!(
                    error = %e,
                    message_kind = %e.kind,
                    other_message_sent = e.other_succeeded,
                    "Email send failed"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::failure(DISPATCH_FAILED_MESSAGE)),
                )
                    .into_response()
            }
            AppError::NotFound => {
                debug!("Route not found");
                (
                    StatusCode::NOT_FOUND,
                    Json(ApiResponse::failure(NOT_FOUND_MESSAGE)),
                )
                    .into_response()
            }
            AppError::Internal(detail) => {
                error!(detail = %detail, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::failure(INTERNAL_MESSAGE)),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailer::{MailError, MessageKind};

    #[test]
    fn test_rate_limit_message() {
        assert_eq!(
            rate_limit_message(Duration::from_secs(900)),
            "Too many submissions from this IP. Please try again in 15 minutes."
        );
        assert_eq!(
            rate_limit_message(Duration::from_secs(30)),
            "Too many submissions from this IP. Please try again in 1 minute."
        );
    }

    #[test]
    fn test_status_codes() {
        let dispatch = AppError::Dispatch(DispatchError {
            kind: MessageKind::Notification,
            source: MailError::Rejected("535 5.7.8 credentials rejected".to_string()),
            other_succeeded: true,
        });
        let limited = AppError::RateLimited {
            retry_after: Duration::from_secs(42),
            window: Duration::from_secs(900),
        };

        assert_eq!(dispatch.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(AppError::NotFound.into_response().status(), StatusCode::NOT_FOUND);

        let response = limited.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "42");
    }
}
