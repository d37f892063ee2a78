use std::sync::Arc;

use async_trait::async_trait;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::Value;
use sitegate_application::{
    ExternalAccessService, NewRoleDefinition, NewSiteGroup, SiteDirectory, SitePermissionService,
};
use sitegate_core::{AppError, AppResult};
use sitegate_domain::{
    EmailAddress, RoleAssignment, RoleDefinition, SiteGroup, SiteSharingSettings, SiteUrl,
    SiteUser,
};
use sitegate_infrastructure::{InMemorySiteDirectory, SiteSeed};

use crate::dto::{AddExternalUserRequest, HavePermissionRequest};
use crate::error::ApiError;
use crate::state::AppState;

use super::external_access::add_external_user_handler;
use super::health::health_handler;
use super::permissions::have_permission_handler;

const SITE: &str = "https://contoso.sharepoint.com/sites/legal";
const DISABLED_SITE: &str = "https://contoso.sharepoint.com/sites/internal";

fn seeds() -> Vec<SiteSeed> {
    serde_json::from_str(
        r#"[
            {
                "site_url": "https://contoso.sharepoint.com/sites/legal",
                "sharing_capability": 1,
                "allowed_domains": "fabrikam.com",
                "users": [{ "email": "admin@contoso.com", "is_site_admin": true }],
                "groups": [
                    {
                        "title": "Legal Owners",
                        "members": ["owner@contoso.com"],
                        "role_definitions": ["Full Control"]
                    },
                    {
                        "title": "Legal Visitors",
                        "members": ["reader@contoso.com"],
                        "role_definitions": ["Read"]
                    }
                ]
            },
            {
                "site_url": "https://contoso.sharepoint.com/sites/internal",
                "sharing_capability": 0,
                "allowed_domains": "fabrikam.com",
                "users": [{ "email": "admin@contoso.com", "is_site_admin": true }]
            }
        ]"#,
    )
    .unwrap_or_else(|error| panic!("seeds must deserialize: {error}"))
}

fn state_with(directory: Arc<dyn SiteDirectory>) -> AppState {
    AppState {
        site_permission_service: SitePermissionService::new(directory.clone()),
        external_access_service: ExternalAccessService::new(directory),
    }
}

fn seeded() -> (Arc<InMemorySiteDirectory>, AppState) {
    let directory = Arc::new(
        InMemorySiteDirectory::from_seeds(seeds())
            .unwrap_or_else(|error| panic!("seeds must load: {error}")),
    );
    let state = state_with(directory.clone());
    (directory, state)
}

fn permission_request(site_url: Option<&str>, email: Option<&str>) -> HavePermissionRequest {
    HavePermissionRequest {
        site_url: site_url.map(str::to_owned),
        current_user_email_address: email.map(str::to_owned),
    }
}

fn external_user_request(email: &str, group_name: Option<&str>) -> AddExternalUserRequest {
    AddExternalUserRequest {
        site_url: Some(SITE.to_owned()),
        current_user_email_address: Some(email.to_owned()),
        group_name: group_name.map(str::to_owned),
    }
}

async fn error_body(error: ApiError) -> (StatusCode, Value) {
    let response = error.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap_or_else(|_| panic!("error body must be readable"));
    let body = serde_json::from_slice(&bytes).unwrap_or_else(|_| panic!("error body must be json"));
    (status, body)
}

async fn has_permission(state: &AppState, site_url: &str, email: &str) -> bool {
    let Json(granted) = have_permission_handler(
        State(state.clone()),
        Ok(Json(permission_request(Some(site_url), Some(email)))),
    )
    .await
    .unwrap_or_else(|error| panic!("permission check must succeed: {error:?}"));
    granted
}

struct FailingSiteDirectory;

#[async_trait]
impl SiteDirectory for FailingSiteDirectory {
    async fn site_sharing_settings(&self, _site: &SiteUrl) -> AppResult<SiteSharingSettings> {
        Err(AppError::Upstream(
            "GetSitePropertiesByUrl failed with status 500: tenant secret detail".to_owned(),
        ))
    }

    async fn find_user_by_email(
        &self,
        _site: &SiteUrl,
        _email: &EmailAddress,
    ) -> AppResult<Option<SiteUser>> {
        unreachable!("settings fail first")
    }

    async fn ensure_user(&self, _site: &SiteUrl, _email: &EmailAddress) -> AppResult<SiteUser> {
        unreachable!("settings fail first")
    }

    async fn list_role_assignments(&self, _site: &SiteUrl) -> AppResult<Vec<RoleAssignment>> {
        unreachable!("settings fail first")
    }

    async fn list_group_members(
        &self,
        _site: &SiteUrl,
        _group_id: i64,
    ) -> AppResult<Vec<SiteUser>> {
        unreachable!("settings fail first")
    }

    async fn list_site_groups(&self, _site: &SiteUrl) -> AppResult<Vec<SiteGroup>> {
        unreachable!("settings fail first")
    }

    async fn list_role_definitions(&self, _site: &SiteUrl) -> AppResult<Vec<RoleDefinition>> {
        unreachable!("settings fail first")
    }

    async fn create_role_definition(
        &self,
        _site: &SiteUrl,
        _role_definition: NewRoleDefinition,
    ) -> AppResult<RoleDefinition> {
        unreachable!("settings fail first")
    }

    async fn create_group(&self, _site: &SiteUrl, _group: NewSiteGroup) -> AppResult<SiteGroup> {
        unreachable!("settings fail first")
    }

    async fn add_role_assignment(
        &self,
        _site: &SiteUrl,
        _principal_id: i64,
        _role_definition_id: i64,
    ) -> AppResult<()> {
        unreachable!("settings fail first")
    }

    async fn add_user_to_group(
        &self,
        _site: &SiteUrl,
        _group_id: i64,
        _login_name: &str,
    ) -> AppResult<()> {
        unreachable!("settings fail first")
    }
}

#[tokio::test]
async fn health_reports_ok() {
    let Json(response) = health_handler().await;
    assert_eq!(response.status, "ok");
}

#[tokio::test]
async fn missing_site_url_is_rejected_with_fixed_message() {
    let (_, state) = seeded();

    let result = have_permission_handler(
        State(state),
        Ok(Json(permission_request(None, Some("owner@contoso.com")))),
    )
    .await;
    let error = result.err().unwrap_or_else(|| panic!("request must be rejected"));

    let (status, body) = error_body(error).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Please pass the site URL and email address in the request body"
    );
}

#[tokio::test]
async fn blank_email_is_treated_as_missing() {
    let (_, state) = seeded();

    let result = add_external_user_handler(
        State(state),
        Ok(Json(external_user_request("   ", Some("SCJ External Read")))),
    )
    .await;
    let error = result.err().unwrap_or_else(|| panic!("request must be rejected"));

    let (status, body) = error_body(error).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Please pass the site URL and email address in the request body"
    );
}

#[tokio::test]
async fn missing_group_name_is_rejected() {
    let (directory, state) = seeded();

    let result =
        add_external_user_handler(State(state), Ok(Json(external_user_request("ann@fabrikam.com", None))))
            .await;
    let error = result.err().unwrap_or_else(|| panic!("request must be rejected"));

    let (status, body) = error_body(error).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Please pass the group name in the request body");

    let site = SiteUrl::parse(SITE).unwrap_or_else(|_| unreachable!());
    let user = directory
        .find_user_by_email(&site, &EmailAddress::new("ann@fabrikam.com").unwrap_or_else(|_| unreachable!()))
        .await;
    assert!(matches!(user, Ok(None)));
}

#[tokio::test]
async fn full_control_is_reported_per_user() {
    let (_, state) = seeded();

    assert!(has_permission(&state, SITE, "admin@contoso.com").await);
    assert!(has_permission(&state, SITE, "Owner@Contoso.com").await);
    assert!(!has_permission(&state, SITE, "reader@contoso.com").await);
    assert!(!has_permission(&state, SITE, "nobody@contoso.com").await);
}

#[tokio::test]
async fn disabled_sharing_denies_even_site_admins() {
    let (_, state) = seeded();

    assert!(!has_permission(&state, DISABLED_SITE, "admin@contoso.com").await);
}

#[tokio::test]
async fn allowed_external_user_is_provisioned() {
    let (directory, state) = seeded();

    let Json(granted) = add_external_user_handler(
        State(state),
        Ok(Json(external_user_request(
            "ann@fabrikam.com",
            Some("SCJ External Contribute"),
        ))),
    )
    .await
    .unwrap_or_else(|error| panic!("provisioning must succeed: {error:?}"));
    assert!(granted);

    let site = SiteUrl::parse(SITE).unwrap_or_else(|_| unreachable!());
    let groups = directory
        .list_site_groups(&site)
        .await
        .unwrap_or_else(|_| unreachable!());
    let group = groups
        .iter()
        .find(|group| group.has_title("SCJ External Contribute"))
        .unwrap_or_else(|| panic!("profile group must exist"));
    let members = directory
        .list_group_members(&site, group.id)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].email, "ann@fabrikam.com");
}

#[tokio::test]
async fn disallowed_domain_returns_false_without_changes() {
    let (directory, state) = seeded();

    let Json(granted) = add_external_user_handler(
        State(state),
        Ok(Json(external_user_request(
            "eve@contoso-evil.com",
            Some("SCJ External Read"),
        ))),
    )
    .await
    .unwrap_or_else(|error| panic!("request must succeed: {error:?}"));
    assert!(!granted);

    let site = SiteUrl::parse(SITE).unwrap_or_else(|_| unreachable!());
    let groups = directory
        .list_site_groups(&site)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(groups.len(), 2);
}

#[tokio::test]
async fn unrecognized_group_name_is_a_bad_request() {
    let (_, state) = seeded();

    let result = add_external_user_handler(
        State(state),
        Ok(Json(external_user_request("ann@fabrikam.com", Some("Guests")))),
    )
    .await;
    let error = result.err().unwrap_or_else(|| panic!("request must be rejected"));

    let (status, _) = error_body(error).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_site_is_a_server_error() {
    let (_, state) = seeded();

    let result = have_permission_handler(
        State(state),
        Ok(Json(permission_request(
            Some("https://contoso.sharepoint.com/sites/missing"),
            Some("owner@contoso.com"),
        ))),
    )
    .await;
    let error = result.err().unwrap_or_else(|| panic!("request must fail"));

    let (status, body) = error_body(error).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body.to_string().contains("/sites/missing"));
}

#[tokio::test]
async fn remote_failures_hide_their_detail() {
    let state = state_with(Arc::new(FailingSiteDirectory));

    let result = have_permission_handler(
        State(state),
        Ok(Json(permission_request(Some(SITE), Some("owner@contoso.com")))),
    )
    .await;
    let error = result.err().unwrap_or_else(|| panic!("request must fail"));

    let (status, body) = error_body(error).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "internal server error");
    assert!(body["reference"].is_string());
    assert!(!body.to_string().contains("secret"));
}
