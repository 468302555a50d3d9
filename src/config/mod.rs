//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) + environment (PORT, DATABASE_URL, PG*)
//!     → loader.rs (parse, deserialize, apply env overrides)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!
//! On file change:
//!     watcher.rs collects the event burst
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → changed admission section sent to the server
//!     → admission policy swapped atomically
//! ```
//!
//! # Design Decisions
//! - Only the admission policy is hot-reloadable; listener and datastore
//!   settings require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, load_from_env, ConfigError};
pub use schema::AppConfig;
pub use schema::{
    AdmissionConfig, BotConfig, CrawlerRanges, DatabaseBackend, DatabaseConfig, ListenerConfig,
    ObservabilityConfig, RateLimitConfig, RuleMode, SecurityConfig, ShieldConfig, TimeoutConfig,
};
