//! Development identity resolver.
//!
//! Production deployments sit behind an auth gateway that validates the
//! token before it reaches the hub; this resolver mirrors that contract
//! for local runs by accepting `"{uuid}:{display_name}"` tokens.

use async_trait::async_trait;

use teamline_core::error::AppError;
use teamline_core::result::AppResult;
use teamline_core::traits::identity::{IdentityResolver, ResolvedIdentity};
use teamline_core::types::id::UserId;

/// Resolver for pre-vetted gateway tokens.
#[derive(Debug, Default)]
pub struct GatewayIdentityResolver;

impl GatewayIdentityResolver {
    /// Creates the resolver.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl IdentityResolver for GatewayIdentityResolver {
    async fn resolve(&self, token: &str) -> AppResult<ResolvedIdentity> {
        let (id, name) = token
            .split_once(':')
            .ok_or_else(|| AppError::validation("Malformed identity token"))?;

        let user_id: UserId = id
            .parse()
            .map_err(|_| AppError::validation("Malformed identity token"))?;

        if name.is_empty() {
            return Err(AppError::validation("Missing display name"));
        }

        Ok(ResolvedIdentity {
            user_id,
            display_name: name.to_string(),
        })
    }
}
