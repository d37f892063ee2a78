use std::sync::Arc;

use sitegate_core::AppResult;
use sitegate_domain::{EmailAddress, SiteUrl};

use crate::SiteDirectory;

/// Application service answering effective administrative access questions.
#[derive(Clone)]
pub struct SitePermissionService {
    directory: Arc<dyn SiteDirectory>,
}

impl SitePermissionService {
    /// Creates a new permission service from a site directory implementation.
    #[must_use]
    pub fn new(directory: Arc<dyn SiteDirectory>) -> Self {
        Self { directory }
    }

    /// Returns whether the user holds Full Control on a site that shares
    /// externally with a domain allow-list.
    pub async fn has_full_control(&self, site_url: &str, email: &str) -> AppResult<bool> {
        let site = SiteUrl::parse(site_url)?;
        let email = EmailAddress::new(email)?;

        let settings = self.directory.site_sharing_settings(&site).await?;
        if !settings.is_domain_restricted_sharing() {
            return Ok(false);
        }

        let Some(user) = self.directory.find_user_by_email(&site, &email).await? else {
            return Ok(false);
        };

        if user.is_site_admin {
            return Ok(true);
        }

        self.is_member_of_full_control_group(&site, &email).await
    }

    async fn is_member_of_full_control_group(
        &self,
        site: &SiteUrl,
        email: &EmailAddress,
    ) -> AppResult<bool> {
        let assignments = self.directory.list_role_assignments(site).await?;

        for assignment in assignments
            .iter()
            .filter(|assignment| assignment.grants_full_control_to_group())
        {
            let members = self
                .directory
                .list_group_members(site, assignment.member.id)
                .await?;

            if members
                .iter()
                .any(|member| email.matches(member.email.as_str()))
            {
                return Ok(true);
            }
        }

        Ok(false)
    }
}
