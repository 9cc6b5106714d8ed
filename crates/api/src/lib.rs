//! Passgate API server library.
//!
//! Exposes the auth core, configuration, state assembly and HTTP routes so
//! integration tests and the binary entrypoint can both access them.

pub mod auth;
pub mod config;
pub mod email;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
