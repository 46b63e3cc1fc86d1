//! Identity resolution seam.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::id::UserId;

/// An identity as resolved by the upstream auth collaborator.
///
/// Authentication policy is out of scope for the hub; by the time a
/// token reaches us it has already been vetted upstream, and the
/// resolver only maps it to a stable identity.
#[derive(Debug, Clone)]
pub struct ResolvedIdentity {
    /// Stable user id.
    pub user_id: UserId,
    /// Display name (cached on the connection for call offers).
    pub display_name: String,
}

/// Resolves a transport credential into a stable identity.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Resolves a token presented at WebSocket upgrade time.
    async fn resolve(&self, token: &str) -> AppResult<ResolvedIdentity>;
}
