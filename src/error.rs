//! Error taxonomy shared by the product service and the HTTP layer.
//!
//! Service operations return [`ServiceError`]; callers map it to a status code
//! through [`ErrorKind::status`], a pure lookup.

use axum::http::StatusCode;
use thiserror::Error;

use crate::admission::DenyReason;
use crate::store::StoreError;

/// Input rejected before any statement runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing fields: name, price and image are required")]
    MissingFields,
    #[error("invalid price: must be a number greater than 0")]
    InvalidPrice,
    #[error("invalid id: must be an integer")]
    InvalidId,
    #[error("no fields to update: provide at least one of name, price, image")]
    NoFieldsToUpdate,
}

/// Errors returned by product service operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("product {0} not found")]
    NotFound(i64),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Coarse classification used for status code mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    AdmissionDenied(DenyReason),
    System,
}

impl ErrorKind {
    /// Get the HTTP status code for this kind.
    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::AdmissionDenied(reason) => reason.status(),
            Self::System => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ServiceError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Store(_) => ErrorKind::System,
        }
    }
}
