use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use sitegate_application::GrantExternalAccessInput;
use tracing::info;

use crate::dto::AddExternalUserRequest;
use crate::error::ApiResult;
use crate::state::AppState;

use super::{required_group_name, required_site_and_email};

pub async fn add_external_user_handler(
    State(state): State<AppState>,
    payload: Result<Json<AddExternalUserRequest>, JsonRejection>,
) -> ApiResult<Json<bool>> {
    let Json(payload) = payload?;
    let (site_url, email) =
        required_site_and_email(payload.site_url, payload.current_user_email_address)?;
    let group_name = required_group_name(payload.group_name)?;

    let outcome = state
        .external_access_service
        .grant_external_access(GrantExternalAccessInput {
            site_url: site_url.clone(),
            email,
            group_name: group_name.clone(),
        })
        .await?;

    info!(
        site_url = %site_url,
        group_name = %group_name,
        outcome = outcome.as_str(),
        "processed external access request"
    );
    Ok(Json(outcome.is_granted()))
}
