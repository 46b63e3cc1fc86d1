//! # teamline-core
//!
//! Core crate for the Teamline real-time hub. Contains configuration
//! schemas, typed identifiers, the room-id model, collaborator traits,
//! and the unified error system.
//!
//! This crate has **no** internal dependencies on other Teamline crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
