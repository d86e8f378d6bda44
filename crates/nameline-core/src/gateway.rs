//! Content-id to URL resolution.

use async_trait::async_trait;

use crate::detail::LookupError;

/// Resolves a content id to a fetchable URL.
#[async_trait]
pub trait ContentLocator: Send + Sync {
    /// The URL where `content_id` can be fetched.
    async fn locate(&self, content_id: &str) -> Result<String, LookupError>;
}

/// Locator that prefixes content ids with a gateway base URL.
#[derive(Debug, Clone)]
pub struct GatewayLocator {
    base: String,
}

impl GatewayLocator {
    /// Locator rooted at `base`; a trailing slash is tolerated.
    #[must_use]
    pub fn new(base: impl Into<String>) -> Self {
        let mut base = base.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self { base }
    }
}

#[async_trait]
impl ContentLocator for GatewayLocator {
    async fn locate(&self, content_id: &str) -> Result<String, LookupError> {
        if content_id.is_empty() {
            return Err(LookupError::NotFound("empty content id".to_string()));
        }
        Ok(format!("{}/{content_id}", self.base))
    }
}
