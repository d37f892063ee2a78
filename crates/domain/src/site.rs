use serde::{Deserialize, Serialize};
use sitegate_core::{AppError, AppResult};
use url::Url;

/// Absolute URL of a site collection, stored without a trailing slash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SiteUrl {
    value: String,
    host: String,
}

impl SiteUrl {
    /// Parses and normalizes a site URL.
    pub fn parse(value: &str) -> AppResult<Self> {
        let parsed = Url::parse(value.trim())
            .map_err(|error| AppError::Validation(format!("invalid site url '{value}': {error}")))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::Validation(format!(
                "site url '{value}' must use http or https"
            )));
        }

        let host = match parsed.host_str() {
            Some(host) if !host.is_empty() => host.to_lowercase(),
            _ => {
                return Err(AppError::Validation(format!(
                    "site url '{value}' must include a host"
                )));
            }
        };

        if parsed.query().is_some() || parsed.fragment().is_some() {
            return Err(AppError::Validation(format!(
                "site url '{value}' must not carry a query or fragment"
            )));
        }

        Ok(Self {
            value: parsed.as_str().trim_end_matches('/').to_owned(),
            host,
        })
    }

    /// Returns the normalized URL string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.value.as_str()
    }

    /// Returns the parsed URL.
    pub fn to_url(&self) -> AppResult<Url> {
        Url::parse(self.value.as_str())
            .map_err(|error| AppError::Internal(format!("stored site url is invalid: {error}")))
    }

    /// Returns the lower-cased host name.
    #[must_use]
    pub fn host(&self) -> &str {
        self.host.as_str()
    }
}

impl std::fmt::Display for SiteUrl {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.value.as_str())
    }
}
