use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use sitegate_application::{ExternalAccessService, SiteDirectory, SitePermissionService};
use sitegate_core::{AppError, AppResult};
use sitegate_infrastructure::{
    AcsAppOnlyTokenProvider, DEFAULT_ACS_ACCOUNTS_URL, InMemorySiteDirectory,
    SharePointRestDirectory, SiteSeed,
};
use tracing::{info, warn};
use url::Url;

use crate::api_config::{ApiConfig, SiteDirectoryProviderConfig};
use crate::state::AppState;

pub fn build_app_state(config: &ApiConfig) -> AppResult<AppState> {
    let directory = build_site_directory(&config.site_directory)?;

    Ok(AppState {
        site_permission_service: SitePermissionService::new(directory.clone()),
        external_access_service: ExternalAccessService::new(directory),
    })
}

fn build_site_directory(
    provider: &SiteDirectoryProviderConfig,
) -> AppResult<Arc<dyn SiteDirectory>> {
    match provider {
        SiteDirectoryProviderConfig::SharePoint {
            credentials,
            admin_site_url,
            client,
        } => {
            let http_client = reqwest::Client::builder()
                .timeout(Duration::from_secs(client.request_timeout_secs))
                .build()
                .map_err(|error| {
                    AppError::Internal(format!("failed to build sharepoint http client: {error}"))
                })?;
            let accounts_url = Url::parse(DEFAULT_ACS_ACCOUNTS_URL).map_err(|error| {
                AppError::Internal(format!("invalid access control service url: {error}"))
            })?;
            let token_provider = Arc::new(AcsAppOnlyTokenProvider::new(
                http_client.clone(),
                credentials.clone(),
                accounts_url,
            ));

            Ok(Arc::new(SharePointRestDirectory::new(
                http_client,
                token_provider,
                admin_site_url.clone(),
                client.max_attempts,
                client.retry_backoff_ms,
            )))
        }
        SiteDirectoryProviderConfig::InMemory { seed_path } => {
            let directory = match seed_path {
                Some(path) => InMemorySiteDirectory::from_seeds(load_seeds(path)?)?,
                None => {
                    warn!("in-memory site directory started without seed; every site is unknown");
                    InMemorySiteDirectory::new()
                }
            };
            Ok(Arc::new(directory))
        }
    }
}

fn load_seeds(path: &Path) -> AppResult<Vec<SiteSeed>> {
    let raw = std::fs::read_to_string(path).map_err(|error| {
        AppError::Validation(format!(
            "failed to read SITE_DIRECTORY_SEED_PATH '{}': {error}",
            path.display()
        ))
    })?;
    let seeds: Vec<SiteSeed> = serde_json::from_str(raw.as_str()).map_err(|error| {
        AppError::Validation(format!(
            "invalid site seed file '{}': {error}",
            path.display()
        ))
    })?;

    info!(path = %path.display(), sites = seeds.len(), "loaded in-memory site seed");
    Ok(seeds)
}
