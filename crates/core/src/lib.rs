//! Domain primitives shared by every passgate crate.
//!
//! This crate has no internal dependencies so it can be used by the
//! repository layer and the HTTP layer alike.

pub mod error;
pub mod types;
pub mod validation;
