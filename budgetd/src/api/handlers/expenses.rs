use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};

use crate::api::json::ApiJson;
use crate::{
    AppState,
    api::models::{
        expenses::{ExpenseCreate, ExpenseResponse, ExpenseUpdate, ListExpensesQuery},
        records::RecordIdQuery,
        users::CurrentUser,
    },
    db::{
        errors::DbError,
        handlers::{ExpenseRecords, Repository},
    },
    errors::{Error, Result},
    types::RecordKey,
};

#[utoipa::path(
    get,
    path = "/api/expenses",
    tag = "expenses",
    summary = "List expenses",
    params(ListExpensesQuery),
    responses(
        (status = 200, description = "The caller's expenses, newest first", body = Vec<ExpenseResponse>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_expenses(
    State(state): State<AppState>,
    Query(query): Query<ListExpensesQuery>,
    current_user: CurrentUser,
) -> Result<Json<Vec<ExpenseResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let records = ExpenseRecords::new(&mut conn).list(&query.into_filter(current_user.id)).await?;

    Ok(Json(records.into_iter().map(ExpenseResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/expenses",
    tag = "expenses",
    summary = "Add an expense",
    request_body = ExpenseCreate,
    responses(
        (status = 201, description = "Expense created", body = ExpenseResponse),
        (status = 400, description = "Missing or invalid date or amount"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "A record with this id already exists"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_expense(
    State(state): State<AppState>,
    current_user: CurrentUser,
    ApiJson(create): ApiJson<ExpenseCreate>,
) -> Result<(StatusCode, Json<ExpenseResponse>)> {
    let request = create.into_db_request(current_user.id)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let record = ExpenseRecords::new(&mut conn).create(&request).await?;

    Ok((StatusCode::CREATED, Json(ExpenseResponse::from(record))))
}

#[utoipa::path(
    put,
    path = "/api/expenses",
    tag = "expenses",
    summary = "Replace an expense",
    request_body = ExpenseUpdate,
    responses(
        (status = 200, description = "Expense updated", body = ExpenseResponse),
        (status = 400, description = "Missing id, or invalid date or amount"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No such expense"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_expense(
    State(state): State<AppState>,
    current_user: CurrentUser,
    ApiJson(update): ApiJson<ExpenseUpdate>,
) -> Result<Json<ExpenseResponse>> {
    let (id, request) = update.into_db_request()?;
    let key = RecordKey::new(current_user.id, id.clone());

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let record = ExpenseRecords::new(&mut conn).update(key, &request).await.map_err(|e| match e {
        DbError::NotFound => not_found(id),
        other => other.into(),
    })?;

    Ok(Json(ExpenseResponse::from(record)))
}

#[utoipa::path(
    delete,
    path = "/api/expenses",
    tag = "expenses",
    summary = "Delete an expense",
    params(RecordIdQuery),
    responses(
        (status = 204, description = "Expense deleted"),
        (status = 400, description = "Missing id"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No such expense"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_expense(
    State(state): State<AppState>,
    Query(query): Query<RecordIdQuery>,
    current_user: CurrentUser,
) -> Result<StatusCode> {
    let id = query.require()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if ExpenseRecords::new(&mut conn).delete(RecordKey::new(current_user.id, id.clone())).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

fn not_found(id: String) -> Error {
    Error::NotFound {
        resource: "Expense".to_string(),
        id,
    }
}

#[cfg(test)]
mod tests {
    use crate::api::models::expenses::ExpenseResponse;
    use crate::test_utils::{create_test_app, create_test_user, session_cookie};
    use axum::http::StatusCode;
    use rust_decimal::Decimal;
    use serde_json::json;
    use sqlx::SqlitePool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_requires_session(pool: SqlitePool) {
        let (server, _state) = create_test_app(pool).await;

        server.get("/api/expenses").await.assert_status(StatusCode::UNAUTHORIZED);
        server
            .put("/api/expenses")
            .json(&json!({ "id": "x", "date": "2024-01-01", "amount": 1000 }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_defaults_category(pool: SqlitePool) {
        let (server, state) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool).await;

        let created = server
            .post("/api/expenses")
            .add_header("cookie", session_cookie(&user, &state.config))
            .json(&json!({ "date": "2024-01-02", "amount": 12000, "category": "" }))
            .await;
        created.assert_status(StatusCode::CREATED);

        let created: ExpenseResponse = created.json();
        assert_eq!(created.category, "Other");
        assert_eq!(created.description, "Expense");
        assert_eq!(created.amount, Decimal::from(12_000));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_and_delete(pool: SqlitePool) {
        let (server, state) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool).await;
        let cookie = session_cookie(&user, &state.config);

        server
            .post("/api/expenses")
            .add_header("cookie", cookie.clone())
            .json(&json!({ "id": "rent", "date": "2024-01-05", "amount": 700000, "category": "Housing" }))
            .await
            .assert_status(StatusCode::CREATED);

        let updated = server
            .put("/api/expenses")
            .add_header("cookie", cookie.clone())
            .json(&json!({
                "id": "rent",
                "date": "2024-01-05",
                "description": "Monthly rent",
                "amount": 750000,
                "category": "Housing"
            }))
            .await;
        updated.assert_status_ok();
        let updated: ExpenseResponse = updated.json();
        assert_eq!(updated.amount, Decimal::from(750_000));
        assert_eq!(updated.description, "Monthly rent");

        server
            .delete("/api/expenses?id=rent")
            .add_header("cookie", cookie.clone())
            .await
            .assert_status(StatusCode::NO_CONTENT);
        server
            .delete("/api/expenses?id=rent")
            .add_header("cookie", cookie)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_validation_and_missing(pool: SqlitePool) {
        let (server, state) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool).await;
        let cookie = session_cookie(&user, &state.config);

        server
            .put("/api/expenses")
            .add_header("cookie", cookie.clone())
            .json(&json!({ "date": "2024-01-01", "amount": 1000 }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
        server
            .put("/api/expenses")
            .add_header("cookie", cookie.clone())
            .json(&json!({ "id": "ghost", "date": "2024-01-01", "amount": 1000 }))
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .delete("/api/expenses?id=")
            .add_header("cookie", cookie)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_category_filter(pool: SqlitePool) {
        let (server, state) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool).await;
        let cookie = session_cookie(&user, &state.config);

        for (id, category) in [("lunch", "Food & Drinks"), ("bus", "Transport"), ("dinner", "Food & Drinks")] {
            server
                .post("/api/expenses")
                .add_header("cookie", cookie.clone())
                .json(&json!({ "id": id, "date": "2024-01-02", "amount": 10000, "category": category }))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let food: Vec<ExpenseResponse> = server
            .get("/api/expenses")
            .add_query_param("category", "Food & Drinks")
            .add_header("cookie", cookie.clone())
            .await
            .json();
        assert_eq!(food.len(), 2);
        assert!(food.iter().all(|e| e.category == "Food & Drinks"));

        let all: Vec<ExpenseResponse> = server.get("/api/expenses").add_header("cookie", cookie).await.json();
        assert_eq!(all.len(), 3);
    }
}
