use sitegate_core::{AppError, AppResult};

use crate::{BasePermissions, PermissionKind};

/// Permission templates granted to external users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionProfile {
    /// Edit access to list content.
    ExternalContribute,
    /// Read access to list content.
    ExternalRead,
}

const CONTRIBUTE_KINDS: &[PermissionKind] = &[
    PermissionKind::AddListItems,
    PermissionKind::EditListItems,
    PermissionKind::DeleteListItems,
    PermissionKind::ViewListItems,
    PermissionKind::ApproveItems,
    PermissionKind::OpenItems,
    PermissionKind::ViewVersions,
    PermissionKind::DeleteVersions,
    PermissionKind::CreateAlerts,
    PermissionKind::ViewPages,
    PermissionKind::BrowseDirectories,
    PermissionKind::BrowseUserInfo,
    PermissionKind::UseClientIntegration,
    PermissionKind::Open,
    PermissionKind::EditMyUserInfo,
    PermissionKind::ManagePersonalViews,
    PermissionKind::AddDelPrivateWebParts,
    PermissionKind::UpdatePersonalWebParts,
];

const READ_KINDS: &[PermissionKind] = &[
    PermissionKind::ViewListItems,
    PermissionKind::ApproveItems,
    PermissionKind::OpenItems,
    PermissionKind::ViewVersions,
    PermissionKind::DeleteVersions,
    PermissionKind::CreateAlerts,
    PermissionKind::ViewFormPages,
    PermissionKind::ViewPages,
    PermissionKind::BrowseUserInfo,
    PermissionKind::UseClientIntegration,
    PermissionKind::Open,
];

impl PermissionProfile {
    /// Resolves a profile from the exact group name it provisions.
    pub fn from_group_name(value: &str) -> AppResult<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|profile| profile.group_name() == value)
            .ok_or_else(|| {
                AppError::Validation(format!("unrecognized permission profile '{value}'"))
            })
    }

    /// Returns all known profiles.
    #[must_use]
    pub fn all() -> &'static [Self] {
        &[Self::ExternalContribute, Self::ExternalRead]
    }

    /// Name shared by the provisioned group and permission level.
    #[must_use]
    pub fn group_name(&self) -> &'static str {
        match self {
            Self::ExternalContribute => "SCJ External Contribute",
            Self::ExternalRead => "SCJ External Read",
        }
    }

    /// Name of the custom permission level.
    #[must_use]
    pub fn permission_level_name(&self) -> &'static str {
        self.group_name()
    }

    /// Description stored on the custom permission level.
    #[must_use]
    pub fn permission_level_description(&self) -> &'static str {
        match self {
            Self::ExternalContribute => "Custom Permission Level - SCJ External Contribute",
            Self::ExternalRead => "Custom Permission Level - SCJ External Read",
        }
    }

    /// Description stored on the provisioned group.
    #[must_use]
    pub fn group_description(&self) -> &'static str {
        match self {
            Self::ExternalContribute => {
                "Permission Control - Custom Contribute Group for External User"
            }
            Self::ExternalRead => "Permission Control - Custom Read Group for External User",
        }
    }

    /// Granular permission kinds granted by the profile.
    #[must_use]
    pub fn permission_kinds(&self) -> &'static [PermissionKind] {
        match self {
            Self::ExternalContribute => CONTRIBUTE_KINDS,
            Self::ExternalRead => READ_KINDS,
        }
    }

    /// Permission mask granted by the profile.
    #[must_use]
    pub fn base_permissions(&self) -> BasePermissions {
        BasePermissions::from_kinds(self.permission_kinds())
    }
}
