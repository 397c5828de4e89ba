use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error as ThisError;

use crate::db::errors::DbError;
use crate::gateway::GatewayError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Authentication required but not provided or invalid
    #[error("Unauthorized")]
    Unauthenticated { message: Option<String> },

    /// Invalid request data or business rule violation
    #[error("{message}")]
    BadRequest { message: String },

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Payment gateway error
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::WriteReturnedNoRow { .. } | DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Gateway(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated { message } => message.clone().unwrap_or_else(|| "Unauthorized".to_string()),
            Error::BadRequest { message } => message.clone(),
            Error::NotFound { resource, .. } => format!("{resource} not found"),
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { .. } => "Resource already exists".to_string(),
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::WriteReturnedNoRow { operation } => format!("{operation} succeeded but returned no row"),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
            // Gateway failures surface as-is: the variants are already
            // user-safe and the intake UI shows them to the operator.
            Error::Gateway(gateway_err) => gateway_err.to_string(),
            Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Gateway(_) => {
                tracing::error!("Gateway error: {:#}", self);
            }
            Error::Database(_) => {
                tracing::warn!("Database error: {}", self);
            }
            Error::Unauthenticated { .. } => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::BadRequest { .. } | Error::NotFound { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();
        (status, Json(json!({ "error": self.user_message() }))).into_response()
    }
}

/// Convert from String errors (e.g., from external functions)
impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Internal { operation: msg }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
