use serde::{Deserialize, Serialize};
use sitegate_core::{AppError, AppResult};

/// External sharing level configured for a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharingCapability {
    /// External sharing is turned off.
    Disabled,
    /// Only authenticated external users may be invited.
    ExternalUserSharingOnly,
    /// Authenticated external users and anonymous links are allowed.
    ExternalUserAndGuestSharing,
    /// Only external users already in the directory may be shared with.
    ExistingExternalUserSharingOnly,
}

impl SharingCapability {
    /// Returns the numeric code used by the tenant administration API.
    #[must_use]
    pub fn code(&self) -> i64 {
        match self {
            Self::Disabled => 0,
            Self::ExternalUserSharingOnly => 1,
            Self::ExternalUserAndGuestSharing => 2,
            Self::ExistingExternalUserSharingOnly => 3,
        }
    }

    /// Parses a numeric tenant administration code.
    pub fn from_code(code: i64) -> AppResult<Self> {
        match code {
            0 => Ok(Self::Disabled),
            1 => Ok(Self::ExternalUserSharingOnly),
            2 => Ok(Self::ExternalUserAndGuestSharing),
            3 => Ok(Self::ExistingExternalUserSharingOnly),
            _ => Err(AppError::Validation(format!(
                "unknown sharing capability code '{code}'"
            ))),
        }
    }

    /// Returns whether any form of external sharing is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

/// Email domains a site allows external users to come from.
///
/// Entries are trimmed and lower-cased; blank entries are dropped, so an
/// unset or whitespace-only list is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedDomainList(Vec<String>);

impl AllowedDomainList {
    /// Parses the comma-separated form stored on the site.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        Self(
            raw.split(',')
                .map(|entry| entry.trim().to_lowercase())
                .filter(|entry| !entry.is_empty())
                .collect(),
        )
    }

    /// Returns whether no domain is allowed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns whether the email host exactly matches an allowed domain.
    #[must_use]
    pub fn allows_host(&self, host: &str) -> bool {
        let host = host.trim().to_lowercase();
        self.0.iter().any(|domain| *domain == host)
    }

    /// Returns the normalized domain entries.
    #[must_use]
    pub fn domains(&self) -> &[String] {
        self.0.as_slice()
    }
}

/// Sharing configuration resolved for one site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSharingSettings {
    capability: SharingCapability,
    allowed_domains: AllowedDomainList,
}

impl SiteSharingSettings {
    /// Creates sharing settings.
    #[must_use]
    pub fn new(capability: SharingCapability, allowed_domains: AllowedDomainList) -> Self {
        Self {
            capability,
            allowed_domains,
        }
    }

    /// Returns the configured sharing capability.
    #[must_use]
    pub fn capability(&self) -> SharingCapability {
        self.capability
    }

    /// Returns the allowed domain list.
    #[must_use]
    pub fn allowed_domains(&self) -> &AllowedDomainList {
        &self.allowed_domains
    }

    /// Sharing is on and restricted to at least one domain.
    #[must_use]
    pub fn is_domain_restricted_sharing(&self) -> bool {
        self.capability.is_enabled() && !self.allowed_domains.is_empty()
    }
}
