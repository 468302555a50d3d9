//! JSON response envelope.
//!
//! # Responsibilities
//! - Wrap every body as `{success, message, data?, count?, error?}`
//! - Map service errors and admission denials to status codes
//! - Attach `Retry-After` to rate-limited denials
//!
//! # Design Decisions
//! - Status codes come from `ErrorKind::status`, never chosen ad hoc
//! - Datastore error text is surfaced in `error`, validation text in `message`

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::admission::DenyReason;
use crate::error::{ErrorKind, ServiceError};

/// Message for gate failures. Never leaks internals.
pub const SECURITY_SYSTEM_ERROR: &str = "Security system error.";

/// Response envelope shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            count: None,
            error: None,
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }
}

/// The product operation a response belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Create,
    Get,
    Update,
    Delete,
}

impl Operation {
    pub const fn success_message(self) -> &'static str {
        match self {
            Operation::List => "Products retrieved successfully",
            Operation::Create => "Product created successfully",
            Operation::Get => "Product retrieved successfully",
            Operation::Update => "Product updated successfully",
            Operation::Delete => "Product deleted successfully",
        }
    }

    const fn not_found_message(self) -> &'static str {
        match self {
            Operation::Update => "Product to update not found",
            Operation::Delete => "Product to delete not found",
            _ => "Product not found",
        }
    }

    const fn failure_message(self) -> &'static str {
        match self {
            Operation::List => "Server error while listing products",
            Operation::Create => "Server error while creating product",
            Operation::Get => "Server error while fetching product",
            Operation::Update => "Server error while updating product",
            Operation::Delete => "Server error while deleting product",
        }
    }
}

/// An error response ready to be rendered.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    error: Option<String>,
    retry_after: Option<Duration>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            error: None,
            retry_after: None,
        }
    }

    /// Map a service failure for the given operation.
    pub fn from_service(op: Operation, err: ServiceError) -> Self {
        let kind = err.kind();
        match err {
            ServiceError::Validation(v) => Self::new(kind.status(), v.to_string()),
            ServiceError::NotFound(_) => Self::new(kind.status(), op.not_found_message()),
            ServiceError::Store(e) => Self {
                error: Some(e.to_string()),
                ..Self::new(kind.status(), op.failure_message())
            },
        }
    }

    /// Admission denial with the reason's status and message.
    pub fn denied(reason: DenyReason, retry_after: Option<Duration>) -> Self {
        Self {
            retry_after,
            ..Self::new(ErrorKind::AdmissionDenied(reason).status(), reason.message())
        }
    }

    /// Gate failure. Always 500.
    pub fn security_system() -> Self {
        Self::new(ErrorKind::System.status(), SECURITY_SYSTEM_ERROR)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse::<()> {
            success: false,
            message: self.message,
            data: None,
            count: None,
            error: self.error,
        };
        let mut response = (self.status, Json(body)).into_response();

        if let Some(retry_after) = self.retry_after {
            // Round up so clients never retry before a token exists.
            let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs.max(1)));
        }
        response
    }
}
