//! Token-acquisition seam used by the download worker.

use async_trait::async_trait;

use crate::error::TokenError;

/// Source of the catalog access token.
///
/// Implementations:
/// - `StaticTokenProvider`: a token handed in at startup (or none)
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn fetch_token(&self) -> Result<String, TokenError>;

    /// Provider name for logging.
    fn name(&self) -> &str;
}

/// Provider backed by a token fixed at startup.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenProvider {
    token: Option<String>,
}

impl StaticTokenProvider {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn fetch_token(&self) -> Result<String, TokenError> {
        self.token.clone().ok_or(TokenError::Unavailable)
    }

    fn name(&self) -> &str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_token_is_unavailable() {
        let provider = StaticTokenProvider::new(Some("   ".into()));
        assert_eq!(provider.fetch_token().await, Err(TokenError::Unavailable));
        assert_eq!(
            StaticTokenProvider::default().fetch_token().await,
            Err(TokenError::Unavailable)
        );
    }

    #[tokio::test]
    async fn configured_token_is_returned() {
        let provider = StaticTokenProvider::new(Some("eyJ.token".into()));
        assert_eq!(provider.fetch_token().await.unwrap(), "eyJ.token");
        assert_eq!(provider.name(), "static");
    }
}
