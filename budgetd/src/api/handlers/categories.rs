use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use sqlx::SqliteConnection;

use crate::api::json::ApiJson;
use crate::{
    AppState,
    api::models::{
        categories::{CategoryCreate, CategoryQuery},
        records::optional_text,
        users::CurrentUser,
    },
    db::handlers::{Categories, ExpenseRecords},
    errors::{Error, Result},
    ledger::merge_categories,
    types::UserId,
};

const MAX_CATEGORY_LENGTH: usize = 64;

/// Defaults first, then explicitly added names, then names only seen on expenses.
pub(crate) async fn known_categories(conn: &mut SqliteConnection, owner: UserId, defaults: &[String]) -> Result<Vec<String>> {
    let stored = Categories::new(&mut *conn).list_names(owner).await?;
    let observed = ExpenseRecords::new(&mut *conn).observed_categories(owner).await?;

    Ok(merge_categories(defaults.iter().chain(stored.iter()).chain(observed.iter())))
}

#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "categories",
    summary = "List known categories",
    responses(
        (status = 200, description = "Category names", body = Vec<String>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_categories(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<Vec<String>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let names = known_categories(&mut conn, current_user.id, &state.config.ledger.default_categories).await?;

    Ok(Json(names))
}

#[utoipa::path(
    post,
    path = "/api/categories",
    tag = "categories",
    summary = "Add a category",
    request_body = CategoryCreate,
    responses(
        (status = 201, description = "Category added; the full list is returned", body = Vec<String>),
        (status = 200, description = "Category was already stored; the full list is returned", body = Vec<String>),
        (status = 400, description = "Blank or overlong name"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_category(
    State(state): State<AppState>,
    current_user: CurrentUser,
    ApiJson(create): ApiJson<CategoryCreate>,
) -> Result<(StatusCode, Json<Vec<String>>)> {
    let name = optional_text(Some(create.name)).ok_or_else(|| Error::BadRequest {
        message: "name is required".to_string(),
    })?;
    if name.chars().count() > MAX_CATEGORY_LENGTH {
        return Err(Error::BadRequest {
            message: format!("name must be at most {MAX_CATEGORY_LENGTH} characters"),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let added = Categories::new(&mut conn).add(current_user.id, &name).await?;
    let names = known_categories(&mut conn, current_user.id, &state.config.ledger.default_categories).await?;

    let status = if added { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(names)))
}

/// Only explicitly added names can be removed; defaults and names in use on expenses stay listed.
#[utoipa::path(
    delete,
    path = "/api/categories",
    tag = "categories",
    summary = "Remove an added category",
    params(CategoryQuery),
    responses(
        (status = 204, description = "Category removed"),
        (status = 400, description = "Missing name"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No such added category"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_category(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
    current_user: CurrentUser,
) -> Result<StatusCode> {
    let name = optional_text(query.name).ok_or_else(|| Error::BadRequest {
        message: "name is required".to_string(),
    })?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if Categories::new(&mut conn).remove(current_user.id, &name).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::NotFound {
            resource: "Category".to_string(),
            id: name,
        })
    }
}
