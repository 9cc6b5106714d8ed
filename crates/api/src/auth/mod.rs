//! The authentication and session core.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`purpose_token`] -- single-use, time-boxed tokens for password reset and magic links.
//! - [`session`] -- opaque bearer sessions backed by the session store.
//! - [`oauth`] -- external identity provider bridge (Google).
//! - [`service`] -- the orchestrator composing the above for each auth flow.
//!
//! Nothing in here depends on axum; handlers translate HTTP to these calls.

pub mod oauth;
pub mod password;
pub mod purpose_token;
pub mod service;
pub mod session;
