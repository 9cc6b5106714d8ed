//! Request middleware and authentication extractors.
//!
//! - [`auth`] -- bearer-session extractor resolving the current user.
//! - [`rate_limit`] -- per-client-IP token bucket.

pub mod auth;
pub mod rate_limit;
