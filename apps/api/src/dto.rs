use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Health response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Incoming payload for the full control check.
#[derive(Debug, Default, Deserialize)]
pub struct HavePermissionRequest {
    #[serde(rename = "SiteUrl")]
    pub site_url: Option<String>,
    #[serde(rename = "CurrentUser_EmailAddress")]
    pub current_user_email_address: Option<String>,
}

/// Incoming payload for external user provisioning.
#[derive(Debug, Default, Deserialize)]
pub struct AddExternalUserRequest {
    #[serde(rename = "SiteUrl")]
    pub site_url: Option<String>,
    #[serde(rename = "CurrentUser_EmailAddress")]
    pub current_user_email_address: Option<String>,
    #[serde(rename = "GroupName")]
    pub group_name: Option<String>,
}

/// API error payload.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<Uuid>,
}
