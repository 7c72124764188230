//! # curricula-core
//!
//! Core types, traits, and abstractions for the curricula backend.
//!
//! This crate provides the foundational data structures, the error
//! taxonomy, and the auth primitives (roles, token service, password
//! hashing) that the other curricula crates depend on.

pub mod auth;
pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use auth::{hash_password, verify_password, Claims, Role, TokenService};
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
