//! App-only token acquisition against the SharePoint access control service.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, WWW_AUTHENTICATE};
use serde::Deserialize;
use sitegate_core::{AppError, AppResult, ClientCredentials};
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

use crate::AccessTokenProvider;
use crate::wire_number::WireNumber;

/// Default access control service endpoint.
pub const DEFAULT_ACS_ACCOUNTS_URL: &str = "https://accounts.accesscontrol.windows.net";

const REFRESH_MARGIN: Duration = Duration::from_secs(5 * 60);

/// Realm and resource principal announced by a site host's bearer challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerChallenge {
    /// Tenant realm id.
    pub realm: String,
    /// Resource principal id of the site service.
    pub resource_principal: String,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: WireNumber,
}

/// Client-credential token provider for app-only site directory access.
///
/// Tokens are cached per host and refreshed shortly before they expire.
pub struct AcsAppOnlyTokenProvider {
    http_client: reqwest::Client,
    credentials: ClientCredentials,
    accounts_url: Url,
    tokens: RwLock<HashMap<String, CachedToken>>,
}

impl AcsAppOnlyTokenProvider {
    /// Creates a token provider for the given service identity.
    #[must_use]
    pub fn new(http_client: reqwest::Client, credentials: ClientCredentials, accounts_url: Url) -> Self {
        Self {
            http_client,
            credentials,
            accounts_url,
            tokens: RwLock::new(HashMap::new()),
        }
    }

    async fn cached(&self, host: &str) -> Option<String> {
        let tokens = self.tokens.read().await;
        tokens
            .get(host)
            .filter(|token| token.expires_at > Instant::now() + REFRESH_MARGIN)
            .map(|token| token.value.clone())
    }

    async fn discover_challenge(&self, target: &Url) -> AppResult<BearerChallenge> {
        let mut endpoint = target.clone();
        endpoint.set_path("/_vti_bin/client.svc");
        endpoint.set_query(None);

        let response = self
            .http_client
            .get(endpoint.clone())
            .header(AUTHORIZATION, "Bearer")
            .send()
            .await
            .map_err(|error| {
                AppError::Upstream(format!("realm discovery against '{endpoint}' failed: {error}"))
            })?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Err(AppError::Upstream(format!(
                "realm discovery against '{endpoint}' returned status {} instead of a bearer challenge",
                response.status()
            )));
        }

        let header = response
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                AppError::Upstream(format!(
                    "realm discovery against '{endpoint}' returned no WWW-Authenticate header"
                ))
            })?;

        parse_bearer_challenge(header)
    }

    async fn request_token(&self, host: &str, challenge: &BearerChallenge) -> AppResult<CachedToken> {
        let mut endpoint = self.accounts_url.clone();
        endpoint
            .path_segments_mut()
            .map_err(|_| AppError::Internal("accounts url cannot be a base".to_owned()))?
            .pop_if_empty()
            .extend([challenge.realm.as_str(), "tokens", "OAuth", "2"]);

        let body = token_request_body(&self.credentials, host, challenge);
        let requested_at = Instant::now();
        let response = self
            .http_client
            .post(endpoint)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(|error| AppError::Upstream(format!("token request failed: {error}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .text()
                .await
                .unwrap_or_else(|_| "<response body unavailable>".to_owned());
            return Err(AppError::Upstream(format!(
                "token request for host '{host}' failed with status {status}: {detail}"
            )));
        }

        let token = response
            .json::<TokenResponse>()
            .await
            .map_err(|error| AppError::Upstream(format!("token response is malformed: {error}")))?;

        let lifetime = token.expires_in.to_u64("expires_in")?;
        let expires_at = requested_at
            .checked_add(Duration::from_secs(lifetime))
            .ok_or_else(|| {
                AppError::Upstream(format!("token lifetime of {lifetime} seconds is out of range"))
            })?;

        Ok(CachedToken {
            value: token.access_token,
            expires_at,
        })
    }
}

#[async_trait]
impl AccessTokenProvider for AcsAppOnlyTokenProvider {
    async fn access_token(&self, target: &Url) -> AppResult<String> {
        let host = target
            .host_str()
            .map(str::to_lowercase)
            .ok_or_else(|| AppError::Validation(format!("token target '{target}' has no host")))?;

        if let Some(token) = self.cached(host.as_str()).await {
            return Ok(token);
        }

        let challenge = self.discover_challenge(target).await?;
        let token = self.request_token(host.as_str(), &challenge).await?;
        debug!(host = %host, realm = %challenge.realm, "acquired app-only access token");

        let value = token.value.clone();
        self.tokens.write().await.insert(host, token);
        Ok(value)
    }
}

/// Parses `Bearer realm="…",client_id="…",…` into its realm and resource principal.
pub fn parse_bearer_challenge(header: &str) -> AppResult<BearerChallenge> {
    let trimmed = header.trim();
    let parameters = trimmed
        .get(..6)
        .filter(|scheme| scheme.eq_ignore_ascii_case("bearer"))
        .map(|_| &trimmed[6..])
        .ok_or_else(|| AppError::Upstream(format!("unsupported auth challenge '{header}'")))?;

    let mut realm = None;
    let mut resource_principal = None;
    for (name, value) in split_challenge_parameters(parameters) {
        match name.to_ascii_lowercase().as_str() {
            "realm" => realm = Some(value),
            "client_id" => resource_principal = Some(value),
            _ => {}
        }
    }

    match (realm, resource_principal) {
        (Some(realm), Some(resource_principal)) if !realm.is_empty() && !resource_principal.is_empty() => {
            Ok(BearerChallenge {
                realm,
                resource_principal,
            })
        }
        _ => Err(AppError::Upstream(format!(
            "bearer challenge '{header}' lacks realm or client_id"
        ))),
    }
}

fn split_challenge_parameters(parameters: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for character in parameters.chars() {
        match character {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                pairs.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(character);
    }
    pairs.push(current);

    pairs
        .into_iter()
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            Some((
                name.trim().to_owned(),
                value.trim().trim_matches('"').to_owned(),
            ))
        })
        .collect()
}

fn token_request_body(credentials: &ClientCredentials, host: &str, challenge: &BearerChallenge) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .append_pair("grant_type", "client_credentials")
        .append_pair(
            "client_id",
            format!("{}@{}", credentials.client_id(), challenge.realm).as_str(),
        )
        .append_pair("client_secret", credentials.client_secret())
        .append_pair(
            "resource",
            format!(
                "{}/{}@{}",
                challenge.resource_principal, host, challenge.realm
            )
            .as_str(),
        )
        .finish()
}
