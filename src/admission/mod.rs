//! Admission control subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → middleware.rs (collect RequestFacts, buffer body)
//!     → gate.rs (evaluate every rule, pick reported reason)
//!         → shield.rs (attack signatures)
//!         → bot.rs (user agent classification, spoof check)
//!         → rate_limit.rs (per-IP token bucket, always charged)
//!     → Allowed: pass to product routes
//!     → Denied: 429 / 403 JSON envelope
//!     → Gate error: 500, never allowed
//! ```
//!
//! # Design Decisions
//! - Fail closed: an evaluation error denies the request
//! - Rules are evaluated as a set; reporting follows a fixed priority
//! - Policy is swappable at runtime, bucket state survives the swap

pub mod bot;
pub mod gate;
pub mod middleware;
pub mod rate_limit;
pub mod shield;

use std::net::IpAddr;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::StatusCode;

pub use gate::{spawn_eviction_task, AdmissionGate, AdmissionPolicy};
pub use middleware::{admission_middleware, AdmissionState};

/// Why a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DenyReason {
    RateLimited,
    Bot,
    Spoofed,
    Shielded,
    Other,
}

impl DenyReason {
    /// Lower ranks are reported first when several rules deny.
    pub const fn rank(self) -> u8 {
        match self {
            DenyReason::RateLimited => 0,
            DenyReason::Bot => 1,
            DenyReason::Spoofed => 2,
            DenyReason::Shielded => 3,
            DenyReason::Other => 4,
        }
    }

    pub const fn status(self) -> StatusCode {
        match self {
            DenyReason::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            DenyReason::Bot | DenyReason::Spoofed | DenyReason::Shielded | DenyReason::Other => {
                StatusCode::FORBIDDEN
            }
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            DenyReason::RateLimited => "rate_limited",
            DenyReason::Bot => "bot",
            DenyReason::Spoofed => "spoofed",
            DenyReason::Shielded => "shielded",
            DenyReason::Other => "other",
        }
    }

    /// Client-facing message.
    pub const fn message(self) -> &'static str {
        match self {
            DenyReason::RateLimited => "Too many requests. Please try again later.",
            DenyReason::Bot => "Access denied. Bots are not allowed.",
            DenyReason::Spoofed => "Access denied. Spoofed bot detected.",
            DenyReason::Shielded => "Access denied. Request blocked by shield.",
            DenyReason::Other => "Access denied.",
        }
    }
}

/// Verdict of the admission gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied {
        reason: DenyReason,
        /// Set for rate-limited denials.
        retry_after: Option<Duration>,
    },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }

    pub fn reason(&self) -> Option<DenyReason> {
        match self {
            Decision::Allowed => None,
            Decision::Denied { reason, .. } => Some(*reason),
        }
    }
}

/// What the gate looks at for one request.
#[derive(Debug, Clone, Default)]
pub struct RequestFacts {
    /// Characteristic key source. `None` fails closed.
    pub client_ip: Option<IpAddr>,
    pub path: String,
    pub query: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub cookie: Option<String>,
    /// `None` when the body could not be read for inspection.
    pub body: Option<Bytes>,
}

/// Failures inside the gate itself.
#[derive(Debug, thiserror::Error)]
pub enum AdmissionError {
    #[error("no client address available to key the request")]
    MissingCharacteristic,

    #[error("invalid admission policy: {0}")]
    Policy(String),
}
