use crate::CoreError;
use async_trait::async_trait;
use uuid::Uuid;

/// Resolves an authenticated actor from an opaque credential. The board
/// never authenticates on its own; it only compares the resolved ids for
/// ownership checks.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve_actor(
        &self,
        credential: &str,
    ) -> Result<Uuid, Box<dyn std::error::Error + Send + Sync>>;
}

pub struct MockIdentityProvider;

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn resolve_actor(
        &self,
        credential: &str,
    ) -> Result<Uuid, Box<dyn std::error::Error + Send + Sync>> {
        // In a real deployment this validates a session token against the
        // campus SSO and maps it to the account id.
        tracing::info!("Resolving actor from credential");

        let actor = Uuid::parse_str(credential.trim())
            .map_err(|e| CoreError::IdentityError(e.to_string()))?;
        Ok(actor)
    }
}
