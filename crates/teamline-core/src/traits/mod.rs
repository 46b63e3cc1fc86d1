//! Collaborator trait seams.
//!
//! The hub never talks to a database, auth provider, or mailer directly;
//! it reaches them through these traits only.

pub mod identity;
pub mod store;

pub use identity::{IdentityResolver, ResolvedIdentity};
pub use store::{MessageStore, NotificationStore};
