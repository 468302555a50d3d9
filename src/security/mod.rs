//! Response hardening.
//!
//! # Data Flow
//! ```text
//! Outgoing response:
//!     → headers.rs (nosniff, frame options, CSP, HSTS, referrer policy)
//!     → headers.rs (CORS preflight and allow-origin)
//! ```
//!
//! Request filtering lives in `admission`.

pub mod headers;

pub use headers::{apply, cors_layer, SECURITY_HEADERS};
