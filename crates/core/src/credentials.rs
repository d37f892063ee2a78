use crate::{AppResult, NonEmptyString};

/// App-only client credentials registered for the service identity.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    client_id: NonEmptyString,
    client_secret: NonEmptyString,
}

impl ClientCredentials {
    /// Creates validated client credentials.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            client_id: NonEmptyString::new(client_id)?,
            client_secret: NonEmptyString::new(client_secret)?,
        })
    }

    /// Returns the registered client id.
    #[must_use]
    pub fn client_id(&self) -> &str {
        self.client_id.as_str()
    }

    /// Returns the client secret.
    #[must_use]
    pub fn client_secret(&self) -> &str {
        self.client_secret.as_str()
    }
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ClientCredentials")
            .field("client_id", &self.client_id.as_str())
            .field("client_secret", &"<redacted>")
            .finish()
    }
}
