use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use serde::Deserialize;
use sitegate_application::{NewRoleDefinition, NewSiteGroup, SiteDirectory};
use sitegate_core::{AppError, AppResult};
use sitegate_domain::{
    AllowedDomainList, BasePermissions, EmailAddress, FULL_CONTROL_ROLE_NAME, PermissionKind,
    Principal, PrincipalType, RoleAssignment, RoleDefinition, SharingCapability, SiteGroup,
    SiteSharingSettings, SiteUrl, SiteUser,
};
use tokio::sync::RwLock;


const FULL_CONTROL_ROLE_ID: i64 = 1_073_741_829;
const READ_ROLE_ID: i64 = 1_073_741_826;
const FIRST_PRINCIPAL_ID: i64 = 100;

/// Seed describing one site collection held by [`InMemorySiteDirectory`].
#[derive(Debug, Clone, Deserialize)]
pub struct SiteSeed {
    /// Absolute site URL.
    pub site_url: String,
    /// Tenant sharing capability code (0 to 3).
    pub sharing_capability: i64,
    /// Comma-separated allowed domain list.
    #[serde(default)]
    pub allowed_domains: String,
    /// Users known to the site.
    #[serde(default)]
    pub users: Vec<SiteUserSeed>,
    /// Custom permission levels added next to Full Control and Read.
    #[serde(default)]
    pub role_definitions: Vec<RoleDefinitionSeed>,
    /// Site groups with their members and role bindings.
    #[serde(default)]
    pub groups: Vec<SiteGroupSeed>,
}

/// Seeded site user.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteUserSeed {
    /// User email.
    pub email: String,
    /// Site collection administrator flag.
    #[serde(default)]
    pub is_site_admin: bool,
}

/// Seeded custom permission level.
#[derive(Debug, Clone, Deserialize)]
pub struct RoleDefinitionSeed {
    /// Level name.
    pub name: String,
    /// Level description.
    #[serde(default)]
    pub description: String,
    /// Permission kind names, matched case-insensitively.
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Seeded site group.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteGroupSeed {
    /// Group title.
    pub title: String,
    /// Member emails; unknown emails become site users.
    #[serde(default)]
    pub members: Vec<String>,
    /// Names of role definitions bound to the group.
    #[serde(default)]
    pub role_definitions: Vec<String>,
}

#[derive(Debug, Clone)]
struct InMemorySite {
    settings: SiteSharingSettings,
    users: Vec<SiteUser>,
    groups: Vec<SiteGroup>,
    group_members: HashMap<i64, Vec<i64>>,
    role_definitions: Vec<RoleDefinition>,
    assignments: Vec<(i64, Vec<i64>)>,
    next_id: i64,
}

impl InMemorySite {
    fn new(settings: SiteSharingSettings) -> Self {
        Self {
            settings,
            users: Vec::new(),
            groups: Vec::new(),
            group_members: HashMap::new(),
            role_definitions: default_role_definitions(),
            assignments: Vec::new(),
            next_id: FIRST_PRINCIPAL_ID,
        }
    }

    fn from_seed(seed: SiteSeed) -> AppResult<(SiteUrl, Self)> {
        let site_url = SiteUrl::parse(seed.site_url.as_str())?;
        let settings = SiteSharingSettings::new(
            SharingCapability::from_code(seed.sharing_capability)?,
            AllowedDomainList::parse(seed.allowed_domains.as_str()),
        );
        let mut site = Self::new(settings);

        for user in seed.users {
            let email = EmailAddress::new(user.email)?;
            let user_id = site.ensure_user(&email).id;
            if let Some(stored) = site.users.iter_mut().find(|stored| stored.id == user_id) {
                stored.is_site_admin = user.is_site_admin;
            }
        }

        for definition in seed.role_definitions {
            let kinds = definition
                .permissions
                .iter()
                .map(|name| PermissionKind::from_str(name))
                .collect::<AppResult<Vec<_>>>()?;
            site.create_role_definition(NewRoleDefinition {
                name: definition.name,
                description: definition.description,
                base_permissions: BasePermissions::from_kinds(&kinds),
            })?;
        }

        for group_seed in seed.groups {
            let group = site.create_group(NewSiteGroup {
                title: group_seed.title,
                description: String::new(),
                only_members_view_membership: false,
            })?;

            for role_name in &group_seed.role_definitions {
                let role_definition_id = site
                    .role_definitions
                    .iter()
                    .find(|definition| definition.has_name(role_name))
                    .map(|definition| definition.id)
                    .ok_or_else(|| {
                        AppError::Validation(format!(
                            "seeded group '{}' references unknown role definition '{role_name}'",
                            group.title
                        ))
                    })?;
                site.add_role_assignment(group.id, role_definition_id)?;
            }

            for member in group_seed.members {
                let email = EmailAddress::new(member)?;
                let login_name = site.ensure_user(&email).login_name;
                site.add_user_to_group(group.id, login_name.as_str())?;
            }
        }

        Ok((site_url, site))
    }

    fn allocate_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn find_user(&self, email: &EmailAddress) -> Option<&SiteUser> {
        self.users.iter().find(|user| email.matches(&user.email))
    }

    fn ensure_user(&mut self, email: &EmailAddress) -> SiteUser {
        if let Some(user) = self.find_user(email) {
            return user.clone();
        }

        let user = SiteUser {
            id: self.allocate_id(),
            login_name: format!("i:0#.f|membership|{}", email.as_str()),
            email: email.as_str().to_owned(),
            is_site_admin: false,
        };
        self.users.push(user.clone());
        user
    }

    fn group(&self, group_id: i64) -> AppResult<&SiteGroup> {
        self.groups
            .iter()
            .find(|group| group.id == group_id)
            .ok_or_else(|| AppError::Upstream(format!("site group '{group_id}' does not exist")))
    }

    fn create_group(&mut self, group: NewSiteGroup) -> AppResult<SiteGroup> {
        if self.groups.iter().any(|stored| stored.has_title(&group.title)) {
            return Err(AppError::Upstream(format!(
                "site group '{}' already exists",
                group.title
            )));
        }

        let created = SiteGroup {
            id: self.allocate_id(),
            title: group.title,
            description: group.description,
        };
        self.groups.push(created.clone());
        self.group_members.insert(created.id, Vec::new());
        Ok(created)
    }

    fn create_role_definition(
        &mut self,
        role_definition: NewRoleDefinition,
    ) -> AppResult<RoleDefinition> {
        if self
            .role_definitions
            .iter()
            .any(|definition| definition.has_name(&role_definition.name))
        {
            return Err(AppError::Upstream(format!(
                "role definition '{}' already exists",
                role_definition.name
            )));
        }

        let created = RoleDefinition {
            id: self.allocate_id(),
            name: role_definition.name,
            description: role_definition.description,
            base_permissions: role_definition.base_permissions,
        };
        self.role_definitions.push(created.clone());
        Ok(created)
    }

    fn add_role_assignment(&mut self, principal_id: i64, role_definition_id: i64) -> AppResult<()> {
        let principal_exists = self.groups.iter().any(|group| group.id == principal_id)
            || self.users.iter().any(|user| user.id == principal_id);
        if !principal_exists {
            return Err(AppError::Upstream(format!(
                "principal '{principal_id}' does not exist"
            )));
        }
        if !self
            .role_definitions
            .iter()
            .any(|definition| definition.id == role_definition_id)
        {
            return Err(AppError::Upstream(format!(
                "role definition '{role_definition_id}' does not exist"
            )));
        }

        match self
            .assignments
            .iter_mut()
            .find(|(stored_principal_id, _)| *stored_principal_id == principal_id)
        {
            Some((_, bindings)) => {
                if !bindings.contains(&role_definition_id) {
                    bindings.push(role_definition_id);
                }
            }
            None => self
                .assignments
                .push((principal_id, vec![role_definition_id])),
        }

        Ok(())
    }

    fn add_user_to_group(&mut self, group_id: i64, login_name: &str) -> AppResult<()> {
        self.group(group_id)?;
        let user_id = self
            .users
            .iter()
            .find(|user| user.login_name.eq_ignore_ascii_case(login_name))
            .map(|user| user.id)
            .ok_or_else(|| AppError::Upstream(format!("user '{login_name}' is not on the site")))?;

        let members = self.group_members.entry(group_id).or_default();
        if !members.contains(&user_id) {
            members.push(user_id);
        }

        Ok(())
    }

    fn principal(&self, principal_id: i64) -> Principal {
        if let Some(group) = self.groups.iter().find(|group| group.id == principal_id) {
            return Principal {
                id: group.id,
                title: group.title.clone(),
                principal_type: PrincipalType::SharePointGroup,
            };
        }

        let title = self
            .users
            .iter()
            .find(|user| user.id == principal_id)
            .map(|user| user.email.clone())
            .unwrap_or_default();
        Principal {
            id: principal_id,
            title,
            principal_type: PrincipalType::User,
        }
    }
}

/// In-memory site directory for local development and tests.
#[derive(Debug, Default)]
pub struct InMemorySiteDirectory {
    sites: RwLock<HashMap<String, InMemorySite>>,
}

impl InMemorySiteDirectory {
    /// Creates an empty directory with no registered sites.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sites: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a directory pre-populated from seeds.
    pub fn from_seeds(seeds: Vec<SiteSeed>) -> AppResult<Self> {
        let mut sites = HashMap::new();
        for seed in seeds {
            let (site_url, site) = InMemorySite::from_seed(seed)?;
            sites.insert(site_url.as_str().to_owned(), site);
        }

        Ok(Self {
            sites: RwLock::new(sites),
        })
    }

    /// Registers or replaces one site.
    pub async fn register_site(&self, seed: SiteSeed) -> AppResult<()> {
        let (site_url, site) = InMemorySite::from_seed(seed)?;
        self.sites
            .write()
            .await
            .insert(site_url.as_str().to_owned(), site);
        Ok(())
    }

    async fn read_site<T>(
        &self,
        site: &SiteUrl,
        read: impl FnOnce(&InMemorySite) -> AppResult<T>,
    ) -> AppResult<T> {
        let sites = self.sites.read().await;
        let stored = sites
            .get(site.as_str())
            .ok_or_else(|| unregistered_site(site))?;
        read(stored)
    }

    async fn write_site<T>(
        &self,
        site: &SiteUrl,
        write: impl FnOnce(&mut InMemorySite) -> AppResult<T>,
    ) -> AppResult<T> {
        let mut sites = self.sites.write().await;
        let stored = sites
            .get_mut(site.as_str())
            .ok_or_else(|| unregistered_site(site))?;
        write(stored)
    }
}

#[async_trait]
impl SiteDirectory for InMemorySiteDirectory {
    async fn site_sharing_settings(&self, site: &SiteUrl) -> AppResult<SiteSharingSettings> {
        self.read_site(site, |stored| Ok(stored.settings.clone()))
            .await
    }

    async fn find_user_by_email(
        &self,
        site: &SiteUrl,
        email: &EmailAddress,
    ) -> AppResult<Option<SiteUser>> {
        self.read_site(site, |stored| Ok(stored.find_user(email).cloned()))
            .await
    }

    async fn ensure_user(&self, site: &SiteUrl, email: &EmailAddress) -> AppResult<SiteUser> {
        self.write_site(site, |stored| Ok(stored.ensure_user(email)))
            .await
    }

    async fn list_role_assignments(&self, site: &SiteUrl) -> AppResult<Vec<RoleAssignment>> {
        self.read_site(site, |stored| {
            Ok(stored
                .assignments
                .iter()
                .map(|(principal_id, bindings)| RoleAssignment {
                    member: stored.principal(*principal_id),
                    role_definitions: stored
                        .role_definitions
                        .iter()
                        .filter(|definition| bindings.contains(&definition.id))
                        .cloned()
                        .collect(),
                })
                .collect())
        })
        .await
    }

    async fn list_group_members(
        &self,
        site: &SiteUrl,
        group_id: i64,
    ) -> AppResult<Vec<SiteUser>> {
        self.read_site(site, |stored| {
            stored.group(group_id)?;
            let member_ids = stored
                .group_members
                .get(&group_id)
                .cloned()
                .unwrap_or_default();

            Ok(member_ids
                .iter()
                .filter_map(|member_id| stored.users.iter().find(|user| user.id == *member_id))
                .cloned()
                .collect())
        })
        .await
    }

    async fn list_site_groups(&self, site: &SiteUrl) -> AppResult<Vec<SiteGroup>> {
        self.read_site(site, |stored| Ok(stored.groups.clone()))
            .await
    }

    async fn list_role_definitions(&self, site: &SiteUrl) -> AppResult<Vec<RoleDefinition>> {
        self.read_site(site, |stored| Ok(stored.role_definitions.clone()))
            .await
    }

    async fn create_role_definition(
        &self,
        site: &SiteUrl,
        role_definition: NewRoleDefinition,
    ) -> AppResult<RoleDefinition> {
        self.write_site(site, |stored| stored.create_role_definition(role_definition))
            .await
    }

    async fn create_group(&self, site: &SiteUrl, group: NewSiteGroup) -> AppResult<SiteGroup> {
        self.write_site(site, |stored| stored.create_group(group))
            .await
    }

    async fn add_role_assignment(
        &self,
        site: &SiteUrl,
        principal_id: i64,
        role_definition_id: i64,
    ) -> AppResult<()> {
        self.write_site(site, |stored| {
            stored.add_role_assignment(principal_id, role_definition_id)
        })
        .await
    }

    async fn add_user_to_group(
        &self,
        site: &SiteUrl,
        group_id: i64,
        login_name: &str,
    ) -> AppResult<()> {
        self.write_site(site, |stored| stored.add_user_to_group(group_id, login_name))
            .await
    }
}

fn unregistered_site(site: &SiteUrl) -> AppError {
    AppError::Upstream(format!("site '{site}' is not registered"))
}

fn default_role_definitions() -> Vec<RoleDefinition> {
    vec![
        RoleDefinition {
            id: FULL_CONTROL_ROLE_ID,
            name: FULL_CONTROL_ROLE_NAME.to_owned(),
            description: "Has full control.".to_owned(),
            base_permissions: BasePermissions::from_kinds(&[PermissionKind::FullMask]),
        },
        RoleDefinition {
            id: READ_ROLE_ID,
            name: "Read".to_owned(),
            description: "Can view pages and list items and download documents.".to_owned(),
            base_permissions: BasePermissions::from_kinds(&[
                PermissionKind::ViewListItems,
                PermissionKind::OpenItems,
                PermissionKind::ViewVersions,
                PermissionKind::CreateAlerts,
                PermissionKind::ViewPages,
                PermissionKind::BrowseUserInfo,
                PermissionKind::UseClientIntegration,
                PermissionKind::Open,
            ]),
        },
    ]
}
