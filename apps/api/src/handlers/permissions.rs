use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use tracing::info;

use crate::dto::HavePermissionRequest;
use crate::error::ApiResult;
use crate::state::AppState;

use super::required_site_and_email;

pub async fn have_permission_handler(
    State(state): State<AppState>,
    payload: Result<Json<HavePermissionRequest>, JsonRejection>,
) -> ApiResult<Json<bool>> {
    let Json(payload) = payload?;
    let (site_url, email) =
        required_site_and_email(payload.site_url, payload.current_user_email_address)?;

    let granted = state
        .site_permission_service
        .has_full_control(site_url.as_str(), email.as_str())
        .await?;

    info!(site_url = %site_url, granted, "evaluated full control permission");
    Ok(Json(granted))
}
