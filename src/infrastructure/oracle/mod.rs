//! Gemini generateContent client
//!
//! - Token bucket rate limiting shared across concurrent generations
//! - Exponential backoff for transient HTTP failures
//! - Prompt rendering and response unpacking per prompt kind

pub mod client;
pub mod errors;
pub mod rate_limiter;
pub mod retry;
pub mod types;

pub use client::{parse_response, redact_api_key, GeminiOracleClient};
pub use errors::OracleApiError;
pub use rate_limiter::TokenBucketRateLimiter;
pub use retry::RetryPolicy;
