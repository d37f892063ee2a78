pub mod external_access;
pub mod health;
pub mod permissions;

#[cfg(test)]
mod tests;

use sitegate_core::AppError;

const MISSING_SITE_OR_EMAIL: &str =
    "Please pass the site URL and email address in the request body";
const MISSING_GROUP_NAME: &str = "Please pass the group name in the request body";

/// Returns the trimmed value, treating blank strings as absent.
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn required_site_and_email(
    site_url: Option<String>,
    email: Option<String>,
) -> Result<(String, String), AppError> {
    match (present(site_url), present(email)) {
        (Some(site_url), Some(email)) => Ok((site_url, email)),
        _ => Err(AppError::Validation(MISSING_SITE_OR_EMAIL.to_owned())),
    }
}

fn required_group_name(group_name: Option<String>) -> Result<String, AppError> {
    present(group_name).ok_or_else(|| AppError::Validation(MISSING_GROUP_NAME.to_owned()))
}
