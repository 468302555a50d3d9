//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request id, access span, metrics)
//!     → admission gate (every route except /health)
//!     → handlers.rs (product operations)
//!     → response.rs (JSON envelope, status mapping)
//!     → Send to client
//! ```
//!
//! client.rs holds the settings `product-cli` talks to the server with.

pub mod client;
pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::{ApiError, ApiResponse, Operation};
pub use server::{AppState, HttpServer};
