//! reg-core: shared types, IDs, errors and configuration.
//!
//! This crate is the foundational dependency for the other reg-* crates,
//! providing type-safe integer identifiers, a unified error type, the
//! application configuration, and serde helpers for partial updates.

pub mod config;
pub mod error;
pub mod ids;
pub mod patch;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
pub use ids::*;
