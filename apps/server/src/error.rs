//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Error Flow in Mostrador                            │
//! │                                                                         │
//! │  Client                        Rust Backend                             │
//! │  ──────                        ────────────                             │
//! │                                                                         │
//! │  POST /api/sales                                                       │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Handler: Result<T, ApiError>                                    │  │
//! │  │                                                                  │  │
//! │  │  ValidationError ──────────────► 400 { "error": "..." }          │  │
//! │  │  InsufficientStock ────────────► 400 { "error": "..." }          │  │
//! │  │  Sale not found (GET) ─────────► 404 { "error": "..." }          │  │
//! │  │  Anything else ────────────────► 500 { "error": generic }        │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  Internal detail is logged server-side and never leaks to clients.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use mostrador_core::CoreError;
use mostrador_db::{DbError, SaleError};

/// API error returned from HTTP handlers.
///
/// ## Serialization
/// Every variant renders as:
/// ```json
/// { "error": "Insufficient stock for Filter: available 6, requested 7" }
/// ```
#[derive(Debug, Error)]
pub enum ApiError {
    /// Input validation failed (400).
    #[error("{0}")]
    Validation(String),

    /// Requested resource doesn't exist (404).
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Requested more units than available (400).
    #[error("{0}")]
    InsufficientStock(String),

    /// Anything the client can't act on (500). The message is fixed;
    /// whatever caused it was already logged.
    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    /// Creates a not found error.
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        ApiError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    /// The HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::InsufficientStock(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

/// Converts sale transaction errors to API errors.
impl From<SaleError> for ApiError {
    fn from(err: SaleError) -> Self {
        match err {
            SaleError::Core(e @ CoreError::InsufficientStock { .. }) => {
                ApiError::InsufficientStock(e.to_string())
            }
            SaleError::Core(CoreError::Validation(e)) => ApiError::validation(e.to_string()),
            // A sale request naming an unknown product is treated as a server
            // fault: the client only submits ids it previously fetched from us.
            SaleError::Core(CoreError::ProductNotFound(id)) => {
                error!(product_id = %id, "Sale referenced a missing product");
                ApiError::Internal
            }
            SaleError::Core(CoreError::SaleNotFound(id)) => ApiError::not_found("Sale", id),
            SaleError::Db(e) => e.into(),
        }
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, id),
            other => {
                // Conflicts, constraint violations, connection trouble: log
                // the specifics, return a generic failure.
                error!(error = %other, "Database operation failed");
                ApiError::Internal
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
