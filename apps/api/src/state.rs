use sitegate_application::{ExternalAccessService, SitePermissionService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub site_permission_service: SitePermissionService,
    pub external_access_service: ExternalAccessService,
}
