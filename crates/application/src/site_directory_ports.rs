use async_trait::async_trait;
use sitegate_core::AppResult;
use sitegate_domain::{
    BasePermissions, EmailAddress, RoleAssignment, RoleDefinition, SiteGroup,
    SiteSharingSettings, SiteUrl, SiteUser,
};

/// Input payload for permission level creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRoleDefinition {
    /// Permission level name.
    pub name: String,
    /// Permission level description.
    pub description: String,
    /// Granted permission mask.
    pub base_permissions: BasePermissions,
}

/// Input payload for site group creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSiteGroup {
    /// Group title.
    pub title: String,
    /// Group description.
    pub description: String,
    /// Restricts membership visibility to group members.
    pub only_members_view_membership: bool,
}

/// Port over the remote site directory object graph.
///
/// Every call is one or more remote round trips scoped to a site collection.
#[async_trait]
pub trait SiteDirectory: Send + Sync {
    /// Loads the external sharing configuration of a site.
    async fn site_sharing_settings(&self, site: &SiteUrl) -> AppResult<SiteSharingSettings>;

    /// Finds a user already known to the site by email.
    async fn find_user_by_email(
        &self,
        site: &SiteUrl,
        email: &EmailAddress,
    ) -> AppResult<Option<SiteUser>>;

    /// Resolves a user on the site, registering them when unknown.
    async fn ensure_user(&self, site: &SiteUrl, email: &EmailAddress) -> AppResult<SiteUser>;

    /// Lists role assignments of the root web with members and bindings.
    async fn list_role_assignments(&self, site: &SiteUrl) -> AppResult<Vec<RoleAssignment>>;

    /// Lists members of one site group.
    async fn list_group_members(&self, site: &SiteUrl, group_id: i64)
    -> AppResult<Vec<SiteUser>>;

    /// Lists site groups.
    async fn list_site_groups(&self, site: &SiteUrl) -> AppResult<Vec<SiteGroup>>;

    /// Lists permission levels of the root web.
    async fn list_role_definitions(&self, site: &SiteUrl) -> AppResult<Vec<RoleDefinition>>;

    /// Creates a permission level on the root web.
    async fn create_role_definition(
        &self,
        site: &SiteUrl,
        role_definition: NewRoleDefinition,
    ) -> AppResult<RoleDefinition>;

    /// Creates a site group.
    async fn create_group(&self, site: &SiteUrl, group: NewSiteGroup) -> AppResult<SiteGroup>;

    /// Binds a permission level to a principal on the root web.
    async fn add_role_assignment(
        &self,
        site: &SiteUrl,
        principal_id: i64,
        role_definition_id: i64,
    ) -> AppResult<()>;

    /// Adds a user to a site group.
    async fn add_user_to_group(
        &self,
        site: &SiteUrl,
        group_id: i64,
        login_name: &str,
    ) -> AppResult<()>;
}
