use async_trait::async_trait;
use sitegate_core::{AppError, AppResult, NonEmptyString};
use url::Url;

/// Source of bearer tokens for calls against the site directory.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Returns a bearer token valid for the host of `target`.
    async fn access_token(&self, target: &Url) -> AppResult<String>;
}

/// Provider returning one pre-issued token for every host.
#[derive(Debug, Clone)]
pub struct StaticAccessTokenProvider {
    token: NonEmptyString,
}

impl StaticAccessTokenProvider {
    /// Creates a provider from an already issued token.
    pub fn new(token: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            token: NonEmptyString::new(token)?,
        })
    }
}

#[async_trait]
impl AccessTokenProvider for StaticAccessTokenProvider {
    async fn access_token(&self, target: &Url) -> AppResult<String> {
        if target.host_str().is_none() {
            return Err(AppError::Validation(format!(
                "token target '{target}' has no host"
            )));
        }

        Ok(self.token.as_str().to_owned())
    }
}
