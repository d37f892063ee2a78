//! Remote site directory objects as seen by Sitegate.

use serde::{Deserialize, Serialize};

use crate::BasePermissions;

/// Role definition name that identifies administrative rights.
pub const FULL_CONTROL_ROLE_NAME: &str = "Full Control";

/// Kind of principal a role assignment binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalType {
    /// An individual user.
    User,
    /// A distribution list.
    DistributionList,
    /// A directory security group.
    SecurityGroup,
    /// A site permission group.
    SharePointGroup,
    /// Any other principal kind.
    Other,
}

impl PrincipalType {
    /// Maps the numeric principal type reported by the site directory.
    #[must_use]
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::User,
            2 => Self::DistributionList,
            4 => Self::SecurityGroup,
            8 => Self::SharePointGroup,
            _ => Self::Other,
        }
    }
}

/// Principal bound by a role assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Site-scoped principal id.
    pub id: i64,
    /// Display title (group name for site groups).
    pub title: String,
    /// Principal kind.
    pub principal_type: PrincipalType,
}

/// User resolved on a site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteUser {
    /// Site-scoped user id.
    pub id: i64,
    /// Claims login name.
    pub login_name: String,
    /// Email, empty when the directory has none.
    pub email: String,
    /// Whether the user is a site collection administrator.
    pub is_site_admin: bool,
}

/// Permission group on a site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteGroup {
    /// Site-scoped group id.
    pub id: i64,
    /// Group title.
    pub title: String,
    /// Group description.
    pub description: String,
}

impl SiteGroup {
    /// Group titles compare case-insensitively.
    #[must_use]
    pub fn has_title(&self, title: &str) -> bool {
        self.title.to_lowercase() == title.to_lowercase()
    }
}

/// Named permission level on a site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDefinition {
    /// Site-scoped role definition id.
    pub id: i64,
    /// Permission level name.
    pub name: String,
    /// Permission level description.
    pub description: String,
    /// Granted permission mask.
    pub base_permissions: BasePermissions,
}

impl RoleDefinition {
    /// Permission level names compare case-insensitively when checking existence.
    #[must_use]
    pub fn has_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }

    /// Exact name match against the administrative role.
    #[must_use]
    pub fn is_full_control(&self) -> bool {
        self.name == FULL_CONTROL_ROLE_NAME
    }
}

/// Binding of one principal to role definitions on the root web.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// Bound principal.
    pub member: Principal,
    /// Role definitions bound to the principal.
    pub role_definitions: Vec<RoleDefinition>,
}

impl RoleAssignment {
    /// Returns whether the assignment grants "Full Control" to a site group.
    #[must_use]
    pub fn grants_full_control_to_group(&self) -> bool {
        self.member.principal_type == PrincipalType::SharePointGroup
            && self
                .role_definitions
                .iter()
                .any(RoleDefinition::is_full_control)
    }
}
