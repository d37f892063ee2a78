use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sitegate_core::AppError;

/// Granular site permission kinds and their bit numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PermissionKind {
    /// No permissions.
    EmptyMask,
    /// View items in lists and documents in libraries.
    ViewListItems,
    /// Add items to lists and documents to libraries.
    AddListItems,
    /// Edit items in lists and documents in libraries.
    EditListItems,
    /// Delete items and documents.
    DeleteListItems,
    /// Approve minor versions of items.
    ApproveItems,
    /// View the source of documents with server-side handlers.
    OpenItems,
    /// View past versions of items.
    ViewVersions,
    /// Delete past versions of items.
    DeleteVersions,
    /// Discard or check in documents checked out to other users.
    CancelCheckout,
    /// Create, change and delete personal views.
    ManagePersonalViews,
    /// Create and delete lists and change list settings.
    ManageLists,
    /// View forms, views and application pages.
    ViewFormPages,
    /// Make list content reachable by anonymous search.
    AnonymousSearchAccessList,
    /// Open a site, list or folder.
    Open,
    /// View pages in a site.
    ViewPages,
    /// Add, change or delete pages.
    AddAndCustomizePages,
    /// Apply a theme or borders.
    ApplyThemeAndBorder,
    /// Apply style sheets.
    ApplyStyleSheets,
    /// View usage reports.
    ViewUsageData,
    /// Create a site with self-service site creation.
    CreateSscSite,
    /// Create subsites.
    ManageSubwebs,
    /// Create groups of users.
    CreateGroups,
    /// Create and change permission levels and assign permissions.
    ManagePermissions,
    /// Enumerate files and folders through remote interfaces.
    BrowseDirectories,
    /// View information about site users.
    BrowseUserInfo,
    /// Add or remove personal web parts.
    AddDelPrivateWebParts,
    /// Update personal web parts.
    UpdatePersonalWebParts,
    /// Grant the ability to perform all administration tasks for the site.
    ManageWeb,
    /// Make all site content reachable by anonymous search.
    AnonymousSearchAccessWebLists,
    /// Use features that launch client applications.
    UseClientIntegration,
    /// Use remote APIs to access the site.
    UseRemoteApis,
    /// Manage alerts for all users.
    ManageAlerts,
    /// Create alerts.
    CreateAlerts,
    /// Edit one's own user information.
    EditMyUserInfo,
    /// Enumerate permissions on the site, list, folder or item.
    EnumeratePermissions,
    /// All permissions.
    FullMask,
}

impl PermissionKind {
    /// Returns the SharePoint permission kind number.
    #[must_use]
    pub fn code(&self) -> u32 {
        match self {
            Self::EmptyMask => 0,
            Self::ViewListItems => 1,
            Self::AddListItems => 2,
            Self::EditListItems => 3,
            Self::DeleteListItems => 4,
            Self::ApproveItems => 5,
            Self::OpenItems => 6,
            Self::ViewVersions => 7,
            Self::DeleteVersions => 8,
            Self::CancelCheckout => 9,
            Self::ManagePersonalViews => 10,
            Self::ManageLists => 12,
            Self::ViewFormPages => 13,
            Self::AnonymousSearchAccessList => 14,
            Self::Open => 17,
            Self::ViewPages => 18,
            Self::AddAndCustomizePages => 19,
            Self::ApplyThemeAndBorder => 20,
            Self::ApplyStyleSheets => 21,
            Self::ViewUsageData => 22,
            Self::CreateSscSite => 23,
            Self::ManageSubwebs => 24,
            Self::CreateGroups => 25,
            Self::ManagePermissions => 26,
            Self::BrowseDirectories => 27,
            Self::BrowseUserInfo => 28,
            Self::AddDelPrivateWebParts => 29,
            Self::UpdatePersonalWebParts => 30,
            Self::ManageWeb => 31,
            Self::AnonymousSearchAccessWebLists => 32,
            Self::UseClientIntegration => 37,
            Self::UseRemoteApis => 38,
            Self::ManageAlerts => 39,
            Self::CreateAlerts => 40,
            Self::EditMyUserInfo => 41,
            Self::EnumeratePermissions => 63,
            Self::FullMask => 65,
        }
    }

    /// Returns the transport name of the permission kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmptyMask => "EmptyMask",
            Self::ViewListItems => "ViewListItems",
            Self::AddListItems => "AddListItems",
            Self::EditListItems => "EditListItems",
            Self::DeleteListItems => "DeleteListItems",
            Self::ApproveItems => "ApproveItems",
            Self::OpenItems => "OpenItems",
            Self::ViewVersions => "ViewVersions",
            Self::DeleteVersions => "DeleteVersions",
            Self::CancelCheckout => "CancelCheckout",
            Self::ManagePersonalViews => "ManagePersonalViews",
            Self::ManageLists => "ManageLists",
            Self::ViewFormPages => "ViewFormPages",
            Self::AnonymousSearchAccessList => "AnonymousSearchAccessList",
            Self::Open => "Open",
            Self::ViewPages => "ViewPages",
            Self::AddAndCustomizePages => "AddAndCustomizePages",
            Self::ApplyThemeAndBorder => "ApplyThemeAndBorder",
            Self::ApplyStyleSheets => "ApplyStyleSheets",
            Self::ViewUsageData => "ViewUsageData",
            Self::CreateSscSite => "CreateSSCSite",
            Self::ManageSubwebs => "ManageSubwebs",
            Self::CreateGroups => "CreateGroups",
            Self::ManagePermissions => "ManagePermissions",
            Self::BrowseDirectories => "BrowseDirectories",
            Self::BrowseUserInfo => "BrowseUserInfo",
            Self::AddDelPrivateWebParts => "AddDelPrivateWebParts",
            Self::UpdatePersonalWebParts => "UpdatePersonalWebParts",
            Self::ManageWeb => "ManageWeb",
            Self::AnonymousSearchAccessWebLists => "AnonymousSearchAccessWebLists",
            Self::UseClientIntegration => "UseClientIntegration",
            Self::UseRemoteApis => "UseRemoteAPIs",
            Self::ManageAlerts => "ManageAlerts",
            Self::CreateAlerts => "CreateAlerts",
            Self::EditMyUserInfo => "EditMyUserInfo",
            Self::EnumeratePermissions => "EnumeratePermissions",
            Self::FullMask => "FullMask",
        }
    }

    /// Returns all known permission kinds.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[PermissionKind] = &[
            PermissionKind::EmptyMask,
            PermissionKind::ViewListItems,
            PermissionKind::AddListItems,
            PermissionKind::EditListItems,
            PermissionKind::DeleteListItems,
            PermissionKind::ApproveItems,
            PermissionKind::OpenItems,
            PermissionKind::ViewVersions,
            PermissionKind::DeleteVersions,
            PermissionKind::CancelCheckout,
            PermissionKind::ManagePersonalViews,
            PermissionKind::ManageLists,
            PermissionKind::ViewFormPages,
            PermissionKind::AnonymousSearchAccessList,
            PermissionKind::Open,
            PermissionKind::ViewPages,
            PermissionKind::AddAndCustomizePages,
            PermissionKind::ApplyThemeAndBorder,
            PermissionKind::ApplyStyleSheets,
            PermissionKind::ViewUsageData,
            PermissionKind::CreateSscSite,
            PermissionKind::ManageSubwebs,
            PermissionKind::CreateGroups,
            PermissionKind::ManagePermissions,
            PermissionKind::BrowseDirectories,
            PermissionKind::BrowseUserInfo,
            PermissionKind::AddDelPrivateWebParts,
            PermissionKind::UpdatePersonalWebParts,
            PermissionKind::ManageWeb,
            PermissionKind::AnonymousSearchAccessWebLists,
            PermissionKind::UseClientIntegration,
            PermissionKind::UseRemoteApis,
            PermissionKind::ManageAlerts,
            PermissionKind::CreateAlerts,
            PermissionKind::EditMyUserInfo,
            PermissionKind::EnumeratePermissions,
            PermissionKind::FullMask,
        ];

        ALL
    }
}

impl FromStr for PermissionKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| AppError::Validation(format!("unknown permission kind '{value}'")))
    }
}

/// 64-bit permission mask, split the way the site directory transports it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BasePermissions {
    low: u32,
    high: u32,
}

impl BasePermissions {
    /// Creates a mask from its transport halves.
    #[must_use]
    pub fn from_parts(low: u32, high: u32) -> Self {
        Self { low, high }
    }

    /// Creates a mask with every listed kind set.
    #[must_use]
    pub fn from_kinds(kinds: &[PermissionKind]) -> Self {
        let mut permissions = Self::default();
        for kind in kinds {
            permissions.set(*kind);
        }

        permissions
    }

    /// Sets one permission kind.
    pub fn set(&mut self, kind: PermissionKind) {
        match kind {
            PermissionKind::EmptyMask => {
                self.low = 0;
                self.high = 0;
            }
            PermissionKind::FullMask => {
                self.low = u32::MAX;
                self.high = u32::MAX;
            }
            other => {
                let bit = other.code() - 1;
                if bit < 32 {
                    self.low |= 1 << bit;
                } else {
                    self.high |= 1 << (bit - 32);
                }
            }
        }
    }

    /// Lower 32 bits.
    #[must_use]
    pub fn low(&self) -> u32 {
        self.low
    }

    /// Upper 32 bits.
    #[must_use]
    pub fn high(&self) -> u32 {
        self.high
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{BasePermissions, PermissionKind};

    #[test]
    fn low_and_high_bits_are_split_at_thirty_two() {
        let permissions = BasePermissions::from_kinds(&[
            PermissionKind::ViewListItems,
            PermissionKind::AnonymousSearchAccessWebLists,
            PermissionKind::UseClientIntegration,
        ]);

        assert_eq!(permissions.low(), 0x8000_0001);
        assert_eq!(permissions.high(), 0x10);
    }

    #[test]
    fn single_kind_sets_one_bit() {
        let permissions = BasePermissions::from_kinds(&[PermissionKind::CreateAlerts]);
        assert_eq!(permissions.low(), 0);
        assert_eq!(permissions.high(), 0x80);
    }

    #[test]
    fn full_mask_sets_both_halves() {
        let permissions =
            BasePermissions::from_kinds(&[PermissionKind::ViewPages, PermissionKind::FullMask]);
        assert_eq!(permissions, BasePermissions::from_parts(u32::MAX, u32::MAX));
    }

    #[test]
    fn empty_mask_clears_earlier_kinds() {
        let permissions =
            BasePermissions::from_kinds(&[PermissionKind::ManageWeb, PermissionKind::EmptyMask]);
        assert_eq!(permissions, BasePermissions::default());
    }

    #[test]
    fn kind_names_parse_case_insensitively() {
        assert_eq!(
            PermissionKind::from_str("usERemoteapis").ok(),
            Some(PermissionKind::UseRemoteApis)
        );
        assert!(PermissionKind::from_str("TakeOwnership").is_err());
    }
}
