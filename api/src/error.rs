//! Unified error types for the Fieldline API
//!
//! This module defines error types for each layer:
//! - `DomainError`: Core business logic errors
//! - `GatewayError`: Payment gateway adapter errors
//! - `NotifyError`: OTP delivery channel errors
//! - `AppError`: Application layer errors (wraps domain errors for HTTP responses)

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::domain::approval::ApprovalBlocker;

/// Domain layer errors - pure business logic errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Entity already exists: {0}")]
    AlreadyExists(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Payment gateway errors
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Gateway unavailable: {0}")]
    Unavailable(String),

    #[error("Unknown payment reference: {0}")]
    UnknownReference(String),

    #[error("Gateway rejected request: {0}")]
    Rejected(String),
}

/// OTP delivery channel errors
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Failed to deliver OTP: {0}")]
    Delivery(String),
}

/// Application layer errors - used by HTTP handlers
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("Payment gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    /// Approval refused; carries the machine-readable blocker list so the
    /// dashboard can render the disabled-button tooltip.
    #[error("Delivery cannot be approved")]
    ApprovalBlocked(Vec<ApprovalBlocker>),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body for JSON responses
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    blockers: Option<Vec<ApprovalBlocker>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details, blockers) = match &self {
            AppError::Domain(DomainError::NotFound(msg)) => {
                (StatusCode::NOT_FOUND, "Not found", Some(msg.clone()), None)
            }
            AppError::Domain(DomainError::AlreadyExists(msg)) => (
                StatusCode::CONFLICT,
                "Already exists",
                Some(msg.clone()),
                None,
            ),
            AppError::Domain(DomainError::Validation(msg)) => (
                StatusCode::BAD_REQUEST,
                "Validation error",
                Some(msg.clone()),
                None,
            ),
            AppError::Domain(DomainError::Unauthorized(msg)) => (
                StatusCode::UNAUTHORIZED,
                "Unauthorized",
                Some(msg.clone()),
                None,
            ),
            AppError::Domain(DomainError::Forbidden(msg)) => (
                StatusCode::FORBIDDEN,
                "Forbidden",
                Some(msg.clone()),
                None,
            ),
            AppError::Domain(DomainError::Conflict(msg)) => {
                (StatusCode::CONFLICT, "Conflict", Some(msg.clone()), None)
            }
            AppError::Domain(DomainError::Internal(msg)) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    None,
                    None,
                )
            }
            AppError::Gateway(e) => {
                tracing::error!("Payment gateway error: {}", e);
                match e {
                    GatewayError::UnknownReference(msg) => (
                        StatusCode::UNPROCESSABLE_ENTITY,
                        "Unknown payment reference",
                        Some(msg.clone()),
                        None,
                    ),
                    GatewayError::Rejected(msg) => (
                        StatusCode::UNPROCESSABLE_ENTITY,
                        "Payment gateway rejected request",
                        Some(msg.clone()),
                        None,
                    ),
                    GatewayError::Unavailable(_) => (
                        StatusCode::BAD_GATEWAY,
                        "Payment gateway unavailable",
                        None,
                        None,
                    ),
                }
            }
            AppError::Notify(e) => {
                tracing::error!("Notification error: {}", e);
                (StatusCode::BAD_GATEWAY, "OTP delivery failed", None, None)
            }
            AppError::ApprovalBlocked(blockers) => (
                StatusCode::CONFLICT,
                "Delivery cannot be approved",
                None,
                Some(blockers.clone()),
            ),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "Bad request",
                Some(msg.clone()),
                None,
            ),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized", None, None),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden", None, None),
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, "Not found", Some(msg.clone()), None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    None,
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error.to_string(),
            details,
            blockers,
        });

        (status, body).into_response()
    }
}
