use std::collections::HashMap;

use async_trait::async_trait;
use sitegate_core::{AppError, AppResult};
use sitegate_domain::{
    AllowedDomainList, BasePermissions, EmailAddress, Principal, PrincipalType, RoleAssignment,
    RoleDefinition, SharingCapability, SiteGroup, SiteSharingSettings, SiteUrl, SiteUser,
};
use tokio::sync::Mutex;

use crate::{NewRoleDefinition, NewSiteGroup, SiteDirectory};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Mutation {
    EnsureUser(String),
    CreateRoleDefinition(String),
    CreateGroup(String),
    AddRoleAssignment {
        principal_id: i64,
        role_definition_id: i64,
    },
    AddUserToGroup {
        group_id: i64,
        login_name: String,
    },
}

pub(crate) struct FakeSite {
    settings: SiteSharingSettings,
    users: Vec<SiteUser>,
    groups: Vec<SiteGroup>,
    members: HashMap<i64, Vec<SiteUser>>,
    role_definitions: Vec<RoleDefinition>,
    assignments: Vec<RoleAssignment>,
    next_id: i64,
    fail_group_creation: bool,
}

impl FakeSite {
    pub(crate) fn new(capability: SharingCapability, allowed_domains: &str) -> Self {
        Self {
            settings: SiteSharingSettings::new(
                capability,
                AllowedDomainList::parse(allowed_domains),
            ),
            users: Vec::new(),
            groups: Vec::new(),
            members: HashMap::new(),
            role_definitions: vec![role_definition(1073741829, "Full Control")],
            assignments: Vec::new(),
            next_id: 100,
            fail_group_creation: false,
        }
    }

    pub(crate) fn with_user(mut self, id: i64, email: &str, is_site_admin: bool) -> Self {
        self.users.push(site_user(id, email, is_site_admin));
        self
    }

    pub(crate) fn with_group(mut self, id: i64, title: &str, member_emails: &[&str]) -> Self {
        self.groups.push(SiteGroup {
            id,
            title: title.to_owned(),
            description: String::new(),
        });
        let members = member_emails
            .iter()
            .enumerate()
            .map(|(index, email)| site_user(id * 1000 + index as i64, email, false))
            .collect();
        self.members.insert(id, members);
        self
    }

    pub(crate) fn with_role_definition(mut self, id: i64, name: &str) -> Self {
        self.role_definitions.push(role_definition(id, name));
        self
    }

    pub(crate) fn with_assignment(
        mut self,
        principal_id: i64,
        principal_type: PrincipalType,
        role_names: &[&str],
    ) -> Self {
        let title = self
            .groups
            .iter()
            .find(|group| group.id == principal_id)
            .map(|group| group.title.clone())
            .unwrap_or_else(|| format!("principal-{principal_id}"));
        self.assignments.push(RoleAssignment {
            member: Principal {
                id: principal_id,
                title,
                principal_type,
            },
            role_definitions: role_names
                .iter()
                .map(|name| role_definition(0, name))
                .collect(),
        });
        self
    }

    pub(crate) fn failing_group_creation(mut self) -> Self {
        self.fail_group_creation = true;
        self
    }
}

pub(crate) struct FakeSiteDirectory {
    site: Mutex<FakeSite>,
    mutations: Mutex<Vec<Mutation>>,
    member_lookups: Mutex<Vec<i64>>,
}

impl FakeSiteDirectory {
    pub(crate) fn new(site: FakeSite) -> Self {
        Self {
            site: Mutex::new(site),
            mutations: Mutex::new(Vec::new()),
            member_lookups: Mutex::new(Vec::new()),
        }
    }

    pub(crate) async fn mutations(&self) -> Vec<Mutation> {
        self.mutations.lock().await.clone()
    }

    pub(crate) async fn member_lookups(&self) -> Vec<i64> {
        self.member_lookups.lock().await.clone()
    }

    pub(crate) async fn groups_titled(&self, title: &str) -> usize {
        self.site
            .lock()
            .await
            .groups
            .iter()
            .filter(|group| group.has_title(title))
            .count()
    }

    pub(crate) async fn role_definitions_named(&self, name: &str) -> usize {
        self.site
            .lock()
            .await
            .role_definitions
            .iter()
            .filter(|definition| definition.has_name(name))
            .count()
    }

    pub(crate) async fn group_member_emails(&self, title: &str) -> Vec<String> {
        let site = self.site.lock().await;
        site.groups
            .iter()
            .find(|group| group.has_title(title))
            .and_then(|group| site.members.get(&group.id))
            .map(|members| members.iter().map(|member| member.email.clone()).collect())
            .unwrap_or_default()
    }

    async fn record(&self, mutation: Mutation) {
        self.mutations.lock().await.push(mutation);
    }
}

#[async_trait]
impl SiteDirectory for FakeSiteDirectory {
    async fn site_sharing_settings(&self, _site: &SiteUrl) -> AppResult<SiteSharingSettings> {
        Ok(self.site.lock().await.settings.clone())
    }

    async fn find_user_by_email(
        &self,
        _site: &SiteUrl,
        email: &EmailAddress,
    ) -> AppResult<Option<SiteUser>> {
        Ok(self
            .site
            .lock()
            .await
            .users
            .iter()
            .find(|user| email.matches(user.email.as_str()))
            .cloned())
    }

    async fn ensure_user(&self, _site: &SiteUrl, email: &EmailAddress) -> AppResult<SiteUser> {
        self.record(Mutation::EnsureUser(email.as_str().to_owned()))
            .await;
        let mut site = self.site.lock().await;
        if let Some(user) = site
            .users
            .iter()
            .find(|user| email.matches(user.email.as_str()))
        {
            return Ok(user.clone());
        }

        site.next_id += 1;
        let user = site_user(site.next_id, email.as_str(), false);
        site.users.push(user.clone());
        Ok(user)
    }

    async fn list_role_assignments(&self, _site: &SiteUrl) -> AppResult<Vec<RoleAssignment>> {
        Ok(self.site.lock().await.assignments.clone())
    }

    async fn list_group_members(
        &self,
        _site: &SiteUrl,
        group_id: i64,
    ) -> AppResult<Vec<SiteUser>> {
        self.member_lookups.lock().await.push(group_id);
        self.site
            .lock()
            .await
            .members
            .get(&group_id)
            .cloned()
            .ok_or_else(|| AppError::Upstream(format!("group '{group_id}' does not exist")))
    }

    async fn list_site_groups(&self, _site: &SiteUrl) -> AppResult<Vec<SiteGroup>> {
        Ok(self.site.lock().await.groups.clone())
    }

    async fn list_role_definitions(&self, _site: &SiteUrl) -> AppResult<Vec<RoleDefinition>> {
        Ok(self.site.lock().await.role_definitions.clone())
    }

    async fn create_role_definition(
        &self,
        _site: &SiteUrl,
        role_definition: NewRoleDefinition,
    ) -> AppResult<RoleDefinition> {
        self.record(Mutation::CreateRoleDefinition(role_definition.name.clone()))
            .await;
        let mut site = self.site.lock().await;
        site.next_id += 1;
        let created = RoleDefinition {
            id: site.next_id,
            name: role_definition.name,
            description: role_definition.description,
            base_permissions: role_definition.base_permissions,
        };
        site.role_definitions.push(created.clone());
        Ok(created)
    }

    async fn create_group(&self, _site: &SiteUrl, group: NewSiteGroup) -> AppResult<SiteGroup> {
        let mut site = self.site.lock().await;
        if site.fail_group_creation {
            return Err(AppError::Upstream(
                "remote group creation failed".to_owned(),
            ));
        }
        self.record(Mutation::CreateGroup(group.title.clone())).await;
        site.next_id += 1;
        let created = SiteGroup {
            id: site.next_id,
            title: group.title,
            description: group.description,
        };
        site.groups.push(created.clone());
        site.members.insert(created.id, Vec::new());
        Ok(created)
    }

    async fn add_role_assignment(
        &self,
        _site: &SiteUrl,
        principal_id: i64,
        role_definition_id: i64,
    ) -> AppResult<()> {
        self.record(Mutation::AddRoleAssignment {
            principal_id,
            role_definition_id,
        })
        .await;
        Ok(())
    }

    async fn add_user_to_group(
        &self,
        _site: &SiteUrl,
        group_id: i64,
        login_name: &str,
    ) -> AppResult<()> {
        self.record(Mutation::AddUserToGroup {
            group_id,
            login_name: login_name.to_owned(),
        })
        .await;
        let mut site = self.site.lock().await;
        let Some(user) = site
            .users
            .iter()
            .find(|user| user.login_name == login_name)
            .cloned()
        else {
            return Err(AppError::Upstream(format!("user '{login_name}' does not exist")));
        };
        let members = site.members.entry(group_id).or_default();
        if !members.iter().any(|member| member.login_name == login_name) {
            members.push(user);
        }
        Ok(())
    }
}

fn site_user(id: i64, email: &str, is_site_admin: bool) -> SiteUser {
    SiteUser {
        id,
        login_name: format!("i:0#.f|membership|{email}"),
        email: email.to_owned(),
        is_site_admin,
    }
}

fn role_definition(id: i64, name: &str) -> RoleDefinition {
    RoleDefinition {
        id,
        name: name.to_owned(),
        description: String::new(),
        base_permissions: BasePermissions::default(),
    }
}
