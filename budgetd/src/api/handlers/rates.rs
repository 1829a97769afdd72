use axum::{Json, extract::State};

use crate::{
    AppState,
    api::models::users::CurrentUser,
    errors::Result,
    rates::RateSnapshot,
};

#[utoipa::path(
    get,
    path = "/api/rate",
    tag = "rates",
    summary = "Current exchange rate",
    description = "Returns the cached KRW/USD rate, refreshing it first when it is older than the configured maximum age. \
                   A failed refresh is reported in `notice` and does not fail the request.",
    responses(
        (status = 200, description = "The rate in effect", body = RateSnapshot),
        (status = 401, description = "Unauthorized"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_rate(State(state): State<AppState>, _: CurrentUser) -> Result<Json<RateSnapshot>> {
    Ok(Json(state.rates.current(&state.db).await?))
}

#[utoipa::path(
    post,
    path = "/api/rate/refresh",
    tag = "rates",
    summary = "Refresh the exchange rate now",
    responses(
        (status = 200, description = "The rate in effect after the refresh attempt", body = RateSnapshot),
        (status = 401, description = "Unauthorized"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn refresh_rate(State(state): State<AppState>, _: CurrentUser) -> Result<Json<RateSnapshot>> {
    Ok(Json(state.rates.refresh(&state.db).await?))
}
