//! Error types for the circuit breaker middleware.
//!
//! These are all construction-time failures (malformed predicate, invalid
//! fallback, bad durations) returned from [`crate::breaker::Breaker::new`] or
//! [`crate::config::load_breaker_config`]; once a breaker is built, the
//! request path itself never produces a `BreakerError` (a fallback handler
//! failure, for instance, is surfaced to the client as-is). Represented here
//! as `thiserror`-derived enums, mirroring the gateway lineage's
//! `GatewayError` pattern: each variant carries enough context to render a
//! structured JSON body if it ever needs to cross an HTTP boundary.

use actix_web::HttpResponse;
use serde_json::json;

/// Errors raised while parsing a trip-condition predicate string.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredicateError {
    #[error("unexpected end of predicate input")]
    UnexpectedEnd,

    #[error("unexpected token '{token}' at position {position}")]
    UnexpectedToken { token: String, position: usize },

    #[error("unknown builtin call '{name}' at position {position}")]
    UnknownBuiltin { name: String, position: usize },

    #[error("builtin '{name}' expects {expected} argument(s), got {actual}")]
    ArityMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("invalid number literal '{text}' at position {position}")]
    InvalidNumber { text: String, position: usize },

    #[error("trailing input after a complete expression: '{rest}'")]
    TrailingInput { rest: String },
}

/// Errors raised while constructing a [`crate::fallback::ResponseFallback`] or
/// [`crate::fallback::RedirectFallback`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FallbackError {
    #[error("fallback status code {0} is outside the valid HTTP range 100..599")]
    InvalidStatus(u16),

    #[error("fallback redirect URL '{0}' could not be parsed: {1}")]
    InvalidRedirectUrl(String, String),
}

/// Top-level error type for the breaker: construction-time failures returned
/// to the caller of [`crate::breaker::Breaker::new`] or
/// [`crate::config::load_breaker_config`].
#[derive(Debug, thiserror::Error)]
pub enum BreakerError {
    #[error("invalid trip condition predicate: {0}")]
    Predicate(#[from] PredicateError),

    #[error("invalid fallback configuration: {0}")]
    Fallback(#[from] FallbackError),

    #[error("invalid breaker configuration: {0}")]
    Config(String),
}

impl actix_web::error::ResponseError for BreakerError {
    fn error_response(&self) -> HttpResponse {
        let message = self.to_string();
        HttpResponse::InternalServerError().json(json!({
            "error": message,
            "type": "breaker_config",
        }))
    }
}
