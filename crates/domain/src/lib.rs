//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod directory;
mod email;
mod permission;
mod profile;
mod sharing;
mod site;

pub use directory::{
    FULL_CONTROL_ROLE_NAME, Principal, PrincipalType, RoleAssignment, RoleDefinition, SiteGroup,
    SiteUser,
};
pub use email::EmailAddress;
pub use permission::{BasePermissions, PermissionKind};
pub use profile::PermissionProfile;
pub use sharing::{AllowedDomainList, SharingCapability, SiteSharingSettings};
pub use site::SiteUrl;
