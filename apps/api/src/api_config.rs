use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use sitegate_core::{AppError, ClientCredentials};
use sitegate_domain::SiteUrl;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePointClientConfig {
    pub request_timeout_secs: u64,
    pub max_attempts: u8,
    pub retry_backoff_ms: u64,
}

#[derive(Debug, Clone)]
pub enum SiteDirectoryProviderConfig {
    SharePoint {
        credentials: ClientCredentials,
        admin_site_url: SiteUrl,
        client: SharePointClientConfig,
    },
    InMemory {
        seed_path: Option<PathBuf>,
    },
}

impl SiteDirectoryProviderConfig {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SharePoint { .. } => "sharepoint",
            Self::InMemory { .. } => "in_memory",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_host: String,
    pub api_port: u16,
    pub cors_allowed_origin: Option<String>,
    pub site_directory: SiteDirectoryProviderConfig,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let api_host = lookup("API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned());
        let api_port = lookup("API_PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(7071);
        let cors_allowed_origin =
            lookup("CORS_ALLOWED_ORIGIN").filter(|value| !value.trim().is_empty());

        let site_directory = match lookup("SITE_DIRECTORY_PROVIDER")
            .unwrap_or_else(|| "sharepoint".to_owned())
            .as_str()
        {
            "sharepoint" => {
                let credentials = ClientCredentials::new(
                    required_non_empty_env(&lookup, "ClientId")?,
                    required_non_empty_env(&lookup, "ClientSecret")?,
                )?;
                let admin_site_url =
                    SiteUrl::parse(required_non_empty_env(&lookup, "UrlAdminSite")?.as_str())?;

                SiteDirectoryProviderConfig::SharePoint {
                    credentials,
                    admin_site_url,
                    client: SharePointClientConfig {
                        request_timeout_secs: parsed_env(
                            &lookup,
                            "SHAREPOINT_REQUEST_TIMEOUT_SECS",
                            30,
                        )?,
                        max_attempts: parsed_env(&lookup, "SHAREPOINT_MAX_ATTEMPTS", 3)?,
                        retry_backoff_ms: parsed_env(&lookup, "SHAREPOINT_RETRY_BACKOFF_MS", 250)?,
                    },
                }
            }
            "in_memory" => SiteDirectoryProviderConfig::InMemory {
                seed_path: lookup("SITE_DIRECTORY_SEED_PATH")
                    .filter(|value| !value.trim().is_empty())
                    .map(PathBuf::from),
            },
            other => {
                return Err(AppError::Validation(format!(
                    "SITE_DIRECTORY_PROVIDER must be either 'sharepoint' or 'in_memory', got '{other}'"
                )));
            }
        };

        Ok(Self {
            api_host,
            api_port,
            cors_allowed_origin,
            site_directory,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<String, AppError> {
    lookup(name).ok_or_else(|| AppError::Validation(format!("{name} is required")))
}

fn required_non_empty_env(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<String, AppError> {
    let value = required_env(lookup, name)?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}

fn parsed_env<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name).filter(|value| !value.trim().is_empty()) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|error| AppError::Validation(format!("invalid {name}: {error}"))),
        None => Ok(default),
    }
}
