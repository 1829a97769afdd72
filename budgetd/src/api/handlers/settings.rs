use axum::{Json, extract::State};

use crate::api::json::ApiJson;
use crate::{
    AppState,
    api::models::{
        settings::{SettingsResponse, SettingsUpdate},
        users::CurrentUser,
    },
    db::{handlers::UserSettings, models::settings::UserSettingsUpdateDBRequest},
    errors::{Error, Result},
};

#[utoipa::path(
    get,
    path = "/api/settings",
    tag = "settings",
    summary = "Get display settings",
    responses(
        (status = 200, description = "Stored settings, or the defaults", body = SettingsResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_settings(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<SettingsResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let settings = UserSettings::new(&mut conn).get(current_user.id).await?;

    Ok(Json(settings.map(SettingsResponse::from).unwrap_or_default()))
}

#[utoipa::path(
    put,
    path = "/api/settings",
    tag = "settings",
    summary = "Update display settings",
    request_body = SettingsUpdate,
    responses(
        (status = 200, description = "Settings after the update", body = SettingsResponse),
        (status = 400, description = "Invalid theme or tab"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_settings(
    State(state): State<AppState>,
    current_user: CurrentUser,
    ApiJson(update): ApiJson<SettingsUpdate>,
) -> Result<Json<SettingsResponse>> {
    let request = UserSettingsUpdateDBRequest::try_from(update)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let settings = UserSettings::new(&mut conn).upsert(current_user.id, &request).await?;

    Ok(Json(SettingsResponse::from(settings)))
}
