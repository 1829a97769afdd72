use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};

use crate::api::json::ApiJson;
use crate::{
    AppState,
    api::models::{
        income::{IncomeCreate, IncomeResponse, IncomeUpdate, ListIncomeQuery},
        records::RecordIdQuery,
        users::CurrentUser,
    },
    db::{
        errors::DbError,
        handlers::{IncomeRecords, Repository},
    },
    errors::{Error, Result},
    types::RecordKey,
};

#[utoipa::path(
    get,
    path = "/api/income",
    tag = "income",
    summary = "List income",
    params(ListIncomeQuery),
    responses(
        (status = 200, description = "The caller's income, newest first", body = Vec<IncomeResponse>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_income(
    State(state): State<AppState>,
    Query(query): Query<ListIncomeQuery>,
    current_user: CurrentUser,
) -> Result<Json<Vec<IncomeResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let records = IncomeRecords::new(&mut conn).list(&query.into_filter(current_user.id)).await?;

    Ok(Json(records.into_iter().map(IncomeResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/income",
    tag = "income",
    summary = "Add an income record",
    request_body = IncomeCreate,
    responses(
        (status = 201, description = "Income record created", body = IncomeResponse),
        (status = 400, description = "Missing or invalid date or amount"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "A record with this id already exists"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_income(
    State(state): State<AppState>,
    current_user: CurrentUser,
    ApiJson(create): ApiJson<IncomeCreate>,
) -> Result<(StatusCode, Json<IncomeResponse>)> {
    let request = create.into_db_request(current_user.id)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let record = IncomeRecords::new(&mut conn).create(&request).await?;

    Ok((StatusCode::CREATED, Json(IncomeResponse::from(record))))
}

#[utoipa::path(
    put,
    path = "/api/income",
    tag = "income",
    summary = "Replace an income record",
    request_body = IncomeUpdate,
    responses(
        (status = 200, description = "Income record updated", body = IncomeResponse),
        (status = 400, description = "Missing id, or invalid date or amount"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No such income record"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_income(
    State(state): State<AppState>,
    current_user: CurrentUser,
    ApiJson(update): ApiJson<IncomeUpdate>,
) -> Result<Json<IncomeResponse>> {
    let (id, request) = update.into_db_request()?;
    let key = RecordKey::new(current_user.id, id.clone());

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let record = IncomeRecords::new(&mut conn).update(key, &request).await.map_err(|e| match e {
        DbError::NotFound => not_found(id),
        other => other.into(),
    })?;

    Ok(Json(IncomeResponse::from(record)))
}

#[utoipa::path(
    delete,
    path = "/api/income",
    tag = "income",
    summary = "Delete an income record",
    params(RecordIdQuery),
    responses(
        (status = 204, description = "Income record deleted"),
        (status = 400, description = "Missing id"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No such income record"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_income(
    State(state): State<AppState>,
    Query(query): Query<RecordIdQuery>,
    current_user: CurrentUser,
) -> Result<StatusCode> {
    let id = query.require()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if IncomeRecords::new(&mut conn).delete(RecordKey::new(current_user.id, id.clone())).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

fn not_found(id: String) -> Error {
    Error::NotFound {
        resource: "Income".to_string(),
        id,
    }
}
