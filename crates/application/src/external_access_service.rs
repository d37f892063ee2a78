use std::sync::Arc;

use sitegate_core::AppResult;
use sitegate_domain::{
    EmailAddress, PermissionProfile, RoleDefinition, SiteGroup, SiteUrl,
};

use crate::{NewRoleDefinition, NewSiteGroup, SiteDirectory};

/// Input payload for granting an external user scoped access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantExternalAccessInput {
    /// Site collection URL.
    pub site_url: String,
    /// Email of the user to grant access to.
    pub email: String,
    /// Name of the profile group to join.
    pub group_name: String,
}

/// Result of an external access request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalAccessOutcome {
    /// The email host is not on the site's allow-list; nothing was changed.
    DomainNotAllowed,
    /// The profile group was created and the user added to it.
    Provisioned {
        /// Newly created group.
        group: SiteGroup,
        /// Whether the permission level had to be created as well.
        permission_level_created: bool,
    },
    /// The profile group already existed and the user was added to it.
    JoinedExistingGroup {
        /// Existing group.
        group: SiteGroup,
    },
}

impl ExternalAccessOutcome {
    /// Returns whether access was granted.
    #[must_use]
    pub fn is_granted(&self) -> bool {
        !matches!(self, Self::DomainNotAllowed)
    }

    /// Returns a stable label for logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DomainNotAllowed => "domain_not_allowed",
            Self::Provisioned { .. } => "provisioned",
            Self::JoinedExistingGroup { .. } => "joined_existing_group",
        }
    }
}

/// Application service provisioning external access groups and permission levels.
#[derive(Clone)]
pub struct ExternalAccessService {
    directory: Arc<dyn SiteDirectory>,
}

impl ExternalAccessService {
    /// Creates a new external access service from a site directory implementation.
    #[must_use]
    pub fn new(directory: Arc<dyn SiteDirectory>) -> Self {
        Self { directory }
    }

    /// Adds the user to the profile group, creating the group and its
    /// permission level first when the group does not exist yet.
    pub async fn grant_external_access(
        &self,
        input: GrantExternalAccessInput,
    ) -> AppResult<ExternalAccessOutcome> {
        let site = SiteUrl::parse(input.site_url.as_str())?;
        let email = EmailAddress::new(input.email)?;
        let profile = PermissionProfile::from_group_name(input.group_name.as_str())?;

        let settings = self.directory.site_sharing_settings(&site).await?;
        if !settings.allowed_domains().allows_host(email.host()) {
            return Ok(ExternalAccessOutcome::DomainNotAllowed);
        }

        let existing_group = self
            .directory
            .list_site_groups(&site)
            .await?
            .into_iter()
            .find(|group| group.has_title(profile.group_name()));

        match existing_group {
            Some(group) => {
                self.add_user(&site, &email, &group).await?;
                Ok(ExternalAccessOutcome::JoinedExistingGroup { group })
            }
            None => {
                let (permission_level, permission_level_created) =
                    self.ensure_permission_level(&site, profile).await?;

                let group = self
                    .directory
                    .create_group(
                        &site,
                        NewSiteGroup {
                            title: profile.group_name().to_owned(),
                            description: profile.group_description().to_owned(),
                            only_members_view_membership: false,
                        },
                    )
                    .await?;

                self.directory
                    .add_role_assignment(&site, group.id, permission_level.id)
                    .await?;

                self.add_user(&site, &email, &group).await?;

                Ok(ExternalAccessOutcome::Provisioned {
                    group,
                    permission_level_created,
                })
            }
        }
    }

    async fn ensure_permission_level(
        &self,
        site: &SiteUrl,
        profile: PermissionProfile,
    ) -> AppResult<(RoleDefinition, bool)> {
        let existing = self
            .directory
            .list_role_definitions(site)
            .await?
            .into_iter()
            .find(|definition| definition.has_name(profile.permission_level_name()));

        if let Some(definition) = existing {
            return Ok((definition, false));
        }

        let created = self
            .directory
            .create_role_definition(
                site,
                NewRoleDefinition {
                    name: profile.permission_level_name().to_owned(),
                    description: profile.permission_level_description().to_owned(),
                    base_permissions: profile.base_permissions(),
                },
            )
            .await?;

        Ok((created, true))
    }

    async fn add_user(
        &self,
        site: &SiteUrl,
        email: &EmailAddress,
        group: &SiteGroup,
    ) -> AppResult<()> {
        let user = self.directory.ensure_user(site, email).await?;
        self.directory
            .add_user_to_group(site, group.id, user.login_name.as_str())
            .await
    }
}
