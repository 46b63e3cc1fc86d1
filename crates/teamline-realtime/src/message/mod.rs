//! Wire protocol message definitions.

pub mod types;

pub use types::{ClientEvent, ServerEvent};
