//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod access_token_provider;
mod acs_app_only_token_provider;
mod in_memory_site_directory;
#[cfg(test)]
mod mock_sharepoint;
mod sharepoint_rest_directory;
mod wire_number;

pub use access_token_provider::{AccessTokenProvider, StaticAccessTokenProvider};
pub use acs_app_only_token_provider::{
    AcsAppOnlyTokenProvider, BearerChallenge, DEFAULT_ACS_ACCOUNTS_URL, parse_bearer_challenge,
};
pub use in_memory_site_directory::{
    InMemorySiteDirectory, RoleDefinitionSeed, SiteGroupSeed, SiteSeed, SiteUserSeed,
};
pub use sharepoint_rest_directory::SharePointRestDirectory;
