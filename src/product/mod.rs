//! Product resource subsystem.
//!
//! # Data Flow
//! ```text
//! Handler input (path id, JSON payload)
//!     → validation.rs (id parsing, required fields, positive price)
//!     → query.rs (typed statement, partial-update builder)
//!     → service.rs (one statement per operation via the Datastore)
//!     → Product rows or ServiceError
//! ```

pub mod model;
pub mod query;
pub mod service;
pub mod validation;

pub use model::{NewProduct, PriceInput, Product, ProductPatch, ProductPayload};
pub use query::{Column, Param, Statement, StatementKind, UpdateBuilder};
pub use service::ProductService;
