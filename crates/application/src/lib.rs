//! Application services and ports.

#![forbid(unsafe_code)]

mod external_access_service;
mod site_directory_ports;
mod site_permission_service;

#[cfg(test)]
mod fake_site_directory;

pub use external_access_service::{
    ExternalAccessOutcome, ExternalAccessService, GrantExternalAccessInput,
};
pub use site_directory_ports::{NewRoleDefinition, NewSiteGroup, SiteDirectory};
pub use site_permission_service::SitePermissionService;
