use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use sitegate_application::{NewRoleDefinition, NewSiteGroup, SiteDirectory};
use sitegate_core::{AppError, AppResult};
use sitegate_domain::{
    EmailAddress, RoleAssignment, RoleDefinition, SiteGroup, SiteSharingSettings, SiteUrl,
    SiteUser,
};
use tracing::{debug, warn};
use url::Url;

use crate::AccessTokenProvider;

mod payloads;


use payloads::{
    CollectionPayload, GroupPayload, RoleAssignmentPayload, RoleDefinitionPayload,
    SitePropertiesPayload, UserPayload,
};

const ODATA_JSON: &str = "application/json;odata=nometadata";
const SITE_PROPERTIES_PATH: &[&str] = &[
    "Microsoft.Online.SharePoint.TenantAdministration.Tenant",
    "GetSitePropertiesByUrl",
];

/// Whether a failed request may be sent again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RetryMode {
    Idempotent,
    Never,
}

/// SharePoint REST implementation of the site directory port.
pub struct SharePointRestDirectory {
    http_client: reqwest::Client,
    token_provider: Arc<dyn AccessTokenProvider>,
    admin_site_url: SiteUrl,
    max_attempts: u8,
    retry_backoff_ms: u64,
}

impl SharePointRestDirectory {
    /// Creates a new REST directory client.
    ///
    /// `admin_site_url` is the tenant administration site used for site
    /// property lookups; read requests are attempted up to `max_attempts` times.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        token_provider: Arc<dyn AccessTokenProvider>,
        admin_site_url: SiteUrl,
        max_attempts: u8,
        retry_backoff_ms: u64,
    ) -> Self {
        Self {
            http_client,
            token_provider,
            admin_site_url,
            max_attempts: max_attempts.max(1),
            retry_backoff_ms: retry_backoff_ms.max(50),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> AppResult<T> {
        let response = self
            .send(Method::GET, url, None, RetryMode::Idempotent)
            .await?;
        read_json(response).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        url: Url,
        body: Value,
        retry: RetryMode,
    ) -> AppResult<T> {
        let response = self.send(Method::POST, url, Some(body), retry).await?;
        read_json(response).await
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
        retry: RetryMode,
    ) -> AppResult<reqwest::Response> {
        let path = url.path().to_owned();
        self.send_optional(method.clone(), url, body, retry)
            .await?
            .ok_or_else(|| {
                AppError::Upstream(format!("{method} {path} failed with status 404 Not Found"))
            })
    }

    /// Sends a request, answering `None` when the remote resource does not exist.
    async fn send_optional(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
        retry: RetryMode,
    ) -> AppResult<Option<reqwest::Response>> {
        let attempts = match retry {
            RetryMode::Idempotent => self.max_attempts,
            RetryMode::Never => 1,
        };
        let payload = body.map(|value| value.to_string());
        let mut attempt = 0_u8;
        let mut last_error: Option<String> = None;

        while attempt < attempts {
            attempt = attempt.saturating_add(1);
            let token = self.token_provider.access_token(&url).await?;

            let mut builder = self
                .http_client
                .request(method.clone(), url.clone())
                .bearer_auth(token)
                .header(ACCEPT, ODATA_JSON);
            builder = match &payload {
                Some(payload) => builder.header(CONTENT_TYPE, ODATA_JSON).body(payload.clone()),
                None if method == Method::POST => builder.body(String::new()),
                None => builder,
            };

            match builder.send().await {
                Ok(response) if response.status().is_success() => return Ok(Some(response)),
                Ok(response) if response.status() == StatusCode::NOT_FOUND => return Ok(None),
                Ok(response)
                    if response.status() == StatusCode::TOO_MANY_REQUESTS
                        || response.status() == StatusCode::SERVICE_UNAVAILABLE =>
                {
                    last_error = Some(format!(
                        "transient HTTP status {} for {method} {}",
                        response.status(),
                        url.path()
                    ));
                }
                Ok(response) => {
                    let status = response.status();
                    let detail = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "<response body unavailable>".to_owned());
                    return Err(AppError::Upstream(format!(
                        "{method} {} failed with status {status}: {detail}",
                        url.path()
                    )));
                }
                Err(error) => {
                    last_error = Some(format!(
                        "{method} {} transport error: {error}",
                        url.path()
                    ));
                }
            }

            if attempt < attempts {
                warn!(
                    attempt,
                    max_attempts = attempts,
                    error = last_error.as_deref().unwrap_or_default(),
                    "retrying site directory request"
                );
                let delay = self.retry_backoff_ms.saturating_mul(u64::from(attempt));
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
        }

        Err(AppError::Upstream(last_error.unwrap_or_else(|| {
            "site directory request exhausted retries".to_owned()
        })))
    }
}

#[async_trait]
impl SiteDirectory for SharePointRestDirectory {
    async fn site_sharing_settings(&self, site: &SiteUrl) -> AppResult<SiteSharingSettings> {
        let url = api_url(&self.admin_site_url, SITE_PROPERTIES_PATH)?;
        let properties: SitePropertiesPayload = self
            .post_json(
                url,
                payloads::site_properties_request(site.as_str()),
                RetryMode::Idempotent,
            )
            .await?;

        let settings = properties.into_settings()?;
        debug!(
            site_url = %site,
            sharing_capability = settings.capability().code(),
            allowed_domains = settings.allowed_domains().domains().len(),
            "loaded site sharing settings"
        );
        Ok(settings)
    }

    async fn find_user_by_email(
        &self,
        site: &SiteUrl,
        email: &EmailAddress,
    ) -> AppResult<Option<SiteUser>> {
        let segment = format!("getbyemail('{}')", odata_quote(email.as_str()));
        let url = api_url(site, &["web", "siteusers", segment.as_str()])?;

        let Some(response) = self
            .send_optional(Method::GET, url, None, RetryMode::Idempotent)
            .await?
        else {
            return Ok(None);
        };

        let user: UserPayload = read_json(response).await?;
        Ok(Some(user.into()))
    }

    async fn ensure_user(&self, site: &SiteUrl, email: &EmailAddress) -> AppResult<SiteUser> {
        let url = api_url(site, &["web", "ensureuser"])?;
        let user: UserPayload = self
            .post_json(
                url,
                payloads::ensure_user_request(email.as_str()),
                RetryMode::Never,
            )
            .await?;

        debug!(site_url = %site, "ensured site user");
        Ok(user.into())
    }

    async fn list_role_assignments(&self, site: &SiteUrl) -> AppResult<Vec<RoleAssignment>> {
        let mut url = api_url(site, &["web", "roleassignments"])?;
        url.query_pairs_mut()
            .append_pair("$expand", "Member,RoleDefinitionBindings");

        let assignments: CollectionPayload<RoleAssignmentPayload> = self.get_json(url).await?;
        assignments
            .value
            .into_iter()
            .map(RoleAssignmentPayload::into_role_assignment)
            .collect()
    }

    async fn list_group_members(
        &self,
        site: &SiteUrl,
        group_id: i64,
    ) -> AppResult<Vec<SiteUser>> {
        let segment = format!("getbyid({group_id})");
        let url = api_url(site, &["web", "sitegroups", segment.as_str(), "users"])?;

        let members: CollectionPayload<UserPayload> = self.get_json(url).await?;
        Ok(members.value.into_iter().map(SiteUser::from).collect())
    }

    async fn list_site_groups(&self, site: &SiteUrl) -> AppResult<Vec<SiteGroup>> {
        let url = api_url(site, &["web", "sitegroups"])?;

        let groups: CollectionPayload<GroupPayload> = self.get_json(url).await?;
        Ok(groups.value.into_iter().map(SiteGroup::from).collect())
    }

    async fn list_role_definitions(&self, site: &SiteUrl) -> AppResult<Vec<RoleDefinition>> {
        let url = api_url(site, &["web", "roledefinitions"])?;

        let definitions: CollectionPayload<RoleDefinitionPayload> = self.get_json(url).await?;
        definitions
            .value
            .into_iter()
            .map(RoleDefinitionPayload::into_role_definition)
            .collect()
    }

    async fn create_role_definition(
        &self,
        site: &SiteUrl,
        role_definition: NewRoleDefinition,
    ) -> AppResult<RoleDefinition> {
        let url = api_url(site, &["web", "roledefinitions"])?;
        let created: RoleDefinitionPayload = self
            .post_json(
                url,
                payloads::role_definition_request(&role_definition),
                RetryMode::Never,
            )
            .await?;

        debug!(site_url = %site, name = %role_definition.name, "created permission level");
        created.into_role_definition()
    }

    async fn create_group(&self, site: &SiteUrl, group: NewSiteGroup) -> AppResult<SiteGroup> {
        let url = api_url(site, &["web", "sitegroups"])?;
        let created: GroupPayload = self
            .post_json(url, payloads::group_request(&group), RetryMode::Never)
            .await?;

        debug!(site_url = %site, title = %group.title, "created site group");
        Ok(created.into())
    }

    async fn add_role_assignment(
        &self,
        site: &SiteUrl,
        principal_id: i64,
        role_definition_id: i64,
    ) -> AppResult<()> {
        let segment =
            format!("addroleassignment(principalid={principal_id},roledefid={role_definition_id})");
        let url = api_url(site, &["web", "roleassignments", segment.as_str()])?;

        self.send(Method::POST, url, None, RetryMode::Never).await?;
        debug!(
            site_url = %site,
            principal_id,
            role_definition_id,
            "added role assignment"
        );
        Ok(())
    }

    async fn add_user_to_group(
        &self,
        site: &SiteUrl,
        group_id: i64,
        login_name: &str,
    ) -> AppResult<()> {
        let segment = format!("getbyid({group_id})");
        let url = api_url(site, &["web", "sitegroups", segment.as_str(), "users"])?;

        self.send(
            Method::POST,
            url,
            Some(payloads::add_member_request(login_name)),
            RetryMode::Never,
        )
        .await?;
        debug!(site_url = %site, group_id, "added user to site group");
        Ok(())
    }
}

/// Builds `{site}/_api/{segments…}` with each segment percent-encoded.
fn api_url(site: &SiteUrl, segments: &[&str]) -> AppResult<Url> {
    let mut url = site.to_url()?;
    url.path_segments_mut()
        .map_err(|_| AppError::Internal(format!("site url '{site}' cannot be a base")))?
        .pop_if_empty()
        .push("_api")
        .extend(segments);

    Ok(url)
}

/// Escapes a value for use inside an OData single-quoted literal.
fn odata_quote(value: &str) -> String {
    value.replace('\'', "''")
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> AppResult<T> {
    let url = response.url().path().to_owned();
    response.json::<T>().await.map_err(|error| {
        AppError::Upstream(format!("response from '{url}' is malformed: {error}"))
    })
}
