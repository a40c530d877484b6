use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::errors::ProviderError;
use crate::token::CachedToken;

/// Scopes requested from the identity provider. Derived once from the target
/// resource at construction and fixed for the lifetime of the cache.
#[derive(Clone, Debug)]
pub struct ScopeRequest {
    scopes: Vec<String>,
}

impl ScopeRequest {
    /// Builds the single scope for a resource/audience identifier,
    /// e.g. `https://account.example.net` -> `https://account.example.net/.default`.
    pub fn from_resource(resource: &str) -> Self {
        let resource = resource.trim_end_matches('/');
        Self {
            scopes: vec![format!("{resource}/.default")],
        }
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }
}

/// Asynchronous token acquisition, treated by the cache as an opaque
/// operation that can fail. Implementations own the wire protocol and
/// credential handling; the cache only inspects the error's HTTP status.
///
/// Implementations should observe `cancel` cooperatively so that disposing
/// the cache aborts an in-flight fetch.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn fetch_token(
        &self,
        scopes: &ScopeRequest,
        cancel: &CancellationToken,
    ) -> Result<CachedToken, ProviderError>;
}
