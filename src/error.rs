//! Error types for the catalog server

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::{
    models::item::ItemId,
    repository::StoreError,
    validation::ValidationError,
};

/// Numeric error codes carried in every error body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    DbFailure = 3,
    NoSuchItem = 5,
    ItemNotAvailable = 7,
    Duplicate = 8,
    ItemNotBorrowed = 12,
    BadValue = 18,
    InvalidKind = 22,
    MissingFields = 23,
    InvalidId = 24,
    ImmutableField = 25,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid item kind: {0}")]
    InvalidKind(String),

    #[error("Missing required fields: {}", .0.join(", "))]
    ValidationFailed(Vec<&'static str>),

    #[error("Field cannot be changed: {0}")]
    ImmutableField(&'static str),

    #[error("Invalid item id: {0}")]
    InvalidId(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: an item with this {field} already exists")]
    Conflict { field: &'static str },

    #[error("Item {0} is already borrowed")]
    AlreadyBorrowed(ItemId),

    #[error("Item {0} is not currently borrowed")]
    NotCurrentlyBorrowed(ItemId),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::InvalidKind(kind) => AppError::InvalidKind(kind),
            ValidationError::MissingFields(fields) => AppError::ValidationFailed(fields),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation { field } => AppError::Conflict { field },
            other => AppError::Store(other),
        }
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
    /// Offending fields, when the error concerns specific fields
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let mut fields = Vec::new();

        let (status, code, message) = match &self {
            AppError::InvalidKind(_) => (StatusCode::BAD_REQUEST, ErrorCode::InvalidKind, message),
            AppError::ValidationFailed(missing) => {
                fields = missing.iter().map(|f| f.to_string()).collect();
                (StatusCode::BAD_REQUEST, ErrorCode::MissingFields, message)
            }
            AppError::ImmutableField(field) => {
                fields.push(field.to_string());
                (StatusCode::BAD_REQUEST, ErrorCode::ImmutableField, message)
            }
            AppError::InvalidId(_) => (StatusCode::BAD_REQUEST, ErrorCode::InvalidId, message),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NoSuchItem, message),
            AppError::Conflict { field } => {
                fields.push(field.to_string());
                (StatusCode::CONFLICT, ErrorCode::Duplicate, message)
            }
            AppError::AlreadyBorrowed(_) => {
                (StatusCode::CONFLICT, ErrorCode::ItemNotAvailable, message)
            }
            AppError::NotCurrentlyBorrowed(_) => {
                (StatusCode::CONFLICT, ErrorCode::ItemNotBorrowed, message)
            }
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, ErrorCode::BadValue, message),
            AppError::Store(e) => {
                tracing::error!("Store error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    "Database error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
            fields,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
