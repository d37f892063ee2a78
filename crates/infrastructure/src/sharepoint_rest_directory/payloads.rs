use serde::Deserialize;
use serde_json::{Value, json};
use sitegate_application::{NewRoleDefinition, NewSiteGroup};
use sitegate_core::{AppError, AppResult};
use sitegate_domain::{
    AllowedDomainList, BasePermissions, Principal, PrincipalType, RoleAssignment, RoleDefinition,
    SharingCapability, SiteGroup, SiteSharingSettings, SiteUser,
};

use crate::wire_number::WireNumber;

#[derive(Debug, Deserialize)]
pub(super) struct CollectionPayload<T> {
    pub(super) value: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct SitePropertiesPayload {
    sharing_capability: i64,
    #[serde(default)]
    sharing_allowed_domain_list: Option<String>,
}

impl SitePropertiesPayload {
    pub(super) fn into_settings(self) -> AppResult<SiteSharingSettings> {
        let capability = SharingCapability::from_code(self.sharing_capability).map_err(|_| {
            AppError::Upstream(format!(
                "site properties carry unknown SharingCapability {}",
                self.sharing_capability
            ))
        })?;

        Ok(SiteSharingSettings::new(
            capability,
            AllowedDomainList::parse(self.sharing_allowed_domain_list.as_deref().unwrap_or_default()),
        ))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct UserPayload {
    id: i64,
    login_name: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    is_site_admin: bool,
}

impl From<UserPayload> for SiteUser {
    fn from(value: UserPayload) -> Self {
        Self {
            id: value.id,
            login_name: value.login_name,
            email: value.email.unwrap_or_default(),
            is_site_admin: value.is_site_admin,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct GroupPayload {
    id: i64,
    title: String,
    #[serde(default)]
    description: Option<String>,
}

impl From<GroupPayload> for SiteGroup {
    fn from(value: GroupPayload) -> Self {
        Self {
            id: value.id,
            title: value.title,
            description: value.description.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct BasePermissionsPayload {
    low: WireNumber,
    high: WireNumber,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct RoleDefinitionPayload {
    id: i64,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    base_permissions: Option<BasePermissionsPayload>,
}

impl RoleDefinitionPayload {
    pub(super) fn into_role_definition(self) -> AppResult<RoleDefinition> {
        let base_permissions = match self.base_permissions {
            Some(mask) => BasePermissions::from_parts(
                mask.low.to_u32("BasePermissions.Low")?,
                mask.high.to_u32("BasePermissions.High")?,
            ),
            None => BasePermissions::default(),
        };

        Ok(RoleDefinition {
            id: self.id,
            name: self.name,
            description: self.description.unwrap_or_default(),
            base_permissions,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PrincipalPayload {
    id: i64,
    title: String,
    principal_type: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct RoleAssignmentPayload {
    member: PrincipalPayload,
    #[serde(default)]
    role_definition_bindings: Vec<RoleDefinitionPayload>,
}

impl RoleAssignmentPayload {
    pub(super) fn into_role_assignment(self) -> AppResult<RoleAssignment> {
        Ok(RoleAssignment {
            member: Principal {
                id: self.member.id,
                title: self.member.title,
                principal_type: PrincipalType::from_code(self.member.principal_type),
            },
            role_definitions: self
                .role_definition_bindings
                .into_iter()
                .map(RoleDefinitionPayload::into_role_definition)
                .collect::<AppResult<Vec<_>>>()?,
        })
    }
}

pub(super) fn site_properties_request(site_url: &str) -> Value {
    json!({
        "url": site_url,
        "includeDetail": true,
    })
}

pub(super) fn ensure_user_request(logon_name: &str) -> Value {
    json!({ "logonName": logon_name })
}

pub(super) fn add_member_request(login_name: &str) -> Value {
    json!({ "LoginName": login_name })
}

pub(super) fn role_definition_request(role_definition: &NewRoleDefinition) -> Value {
    json!({
        "Name": role_definition.name,
        "Description": role_definition.description,
        "Order": 0,
        "BasePermissions": {
            "Low": role_definition.base_permissions.low().to_string(),
            "High": role_definition.base_permissions.high().to_string(),
        },
    })
}

pub(super) fn group_request(group: &NewSiteGroup) -> Value {
    json!({
        "Title": group.title,
        "Description": group.description,
        "OnlyAllowMembersViewMembership": group.only_members_view_membership,
    })
}
