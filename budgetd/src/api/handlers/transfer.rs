//! Ledger export and import.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderName, header},
};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::{
    AppState,
    api::{
        handlers::categories::known_categories,
        models::{ledger::ImportResponse, users::CurrentUser},
    },
    db::{
        handlers::{Categories, ExpenseRecords, IncomeRecords, Repository, expenses::ExpenseFilter, income::IncomeFilter},
        models::{expenses::ExpenseCreateDBRequest, income::IncomeCreateDBRequest},
    },
    errors::{Error, Result},
    ledger::{ExpenseEntry, ExportDocument, ImportDocument, IncomeEntry},
    types::{UserId, abbrev_uuid},
};

#[utoipa::path(
    get,
    path = "/api/ledger/export",
    tag = "ledger",
    summary = "Download the ledger as JSON",
    responses(
        (status = 200, description = "Export document, served as an attachment", body = ExportDocument),
        (status = 401, description = "Unauthorized"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn export_ledger(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<([(HeaderName, String); 1], Json<ExportDocument>)> {
    let rate = state.rates.current(&state.db).await?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let income = IncomeRecords::new(&mut conn).list(&IncomeFilter::new(current_user.id)).await?;
    let expenses = ExpenseRecords::new(&mut conn).list(&ExpenseFilter::new(current_user.id)).await?;
    let categories = known_categories(&mut conn, current_user.id, &state.config.ledger.default_categories).await?;

    let document = ExportDocument::build(
        rate.krw_per_usd,
        income.into_iter().map(IncomeEntry::from).collect(),
        expenses.into_iter().map(ExpenseEntry::from).collect(),
        categories,
    );

    let disposition = format!("attachment; filename=\"{}\"", export_filename(document.exported_at));
    Ok(([(header::CONTENT_DISPOSITION, disposition)], Json(document)))
}

#[utoipa::path(
    post,
    path = "/api/ledger/import",
    tag = "ledger",
    summary = "Replace the ledger from an export file",
    description = "The file must be a JSON object with `income` and `expenses` lists. Record fields are coerced: \
                   missing ids are generated, amounts are clamped to be non-negative and blank categories become \
                   \"Other\". The caller's income, expenses and added categories are replaced in one transaction; \
                   a rejected file changes nothing.",
    request_body(content = ExportDocument, content_type = "application/json"),
    responses(
        (status = 200, description = "Ledger replaced", body = ImportResponse),
        (status = 400, description = "The file is not a usable export"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn import_ledger(State(state): State<AppState>, current_user: CurrentUser, body: Bytes) -> Result<Json<ImportResponse>> {
    let document = ImportDocument::parse(&body).map_err(|e| Error::BadRequest {
        message: format!("Invalid import file: {e}"),
    })?;
    debug!(
        income = document.income_count(),
        expenses = document.expense_count(),
        "Parsed import file"
    );
    let imported = document.normalize(&state.config.ledger.default_categories);

    let owner = current_user.id;
    let income: Vec<IncomeCreateDBRequest> = imported.income.into_iter().map(|entry| income_request(owner, entry)).collect();
    let expenses: Vec<ExpenseCreateDBRequest> = imported.expenses.into_iter().map(|entry| expense_request(owner, entry)).collect();

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let income = IncomeRecords::new(&mut tx).replace_all(owner, &income).await?;
    let expenses = ExpenseRecords::new(&mut tx).replace_all(owner, &expenses).await?;
    Categories::new(&mut tx).replace_all(owner, &imported.categories).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    info!(
        user_id = %abbrev_uuid(&owner),
        income = income.len(),
        expenses = expenses.len(),
        "Ledger imported"
    );

    Ok(Json(ImportResponse {
        income: income.len(),
        expenses: expenses.len(),
        categories: imported.categories,
    }))
}

fn income_request(owner: UserId, entry: IncomeEntry) -> IncomeCreateDBRequest {
    IncomeCreateDBRequest {
        owner,
        id: entry.id,
        date: entry.date,
        description: entry.description,
        amount: entry.amount,
        notes: entry.notes,
    }
}

fn expense_request(owner: UserId, entry: ExpenseEntry) -> ExpenseCreateDBRequest {
    ExpenseCreateDBRequest {
        owner,
        id: entry.id,
        date: entry.date,
        description: entry.description,
        category: entry.category,
        amount: entry.amount,
        notes: entry.notes,
    }
}

fn export_filename(exported_at: DateTime<Utc>) -> String {
    format!("budget-export-{}.json", exported_at.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use crate::api::models::{expenses::ExpenseResponse, income::IncomeResponse, ledger::ImportResponse};
    use crate::ledger::ExportDocument;
    use crate::test_utils::{create_test_app, create_test_user, session_cookie};
    use axum::http::StatusCode;
    use rust_decimal::Decimal;
    use serde_json::json;
    use sqlx::SqlitePool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_export_then_import_round_trip(pool: SqlitePool) {
        let (server, state) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool).await;
        let cookie = session_cookie(&user, &state.config);

        server
            .post("/api/income")
            .add_header("cookie", cookie.clone())
            .json(&json!({ "id": "salary", "date": "2024-01-01", "amount": 3000000 }))
            .await
            .assert_status(StatusCode::CREATED);
        server
            .post("/api/expenses")
            .add_header("cookie", cookie.clone())
            .json(&json!({ "id": "groceries", "date": "2024-01-02", "amount": 1200000, "category": "Food & Drinks", "notes": "mart" }))
            .await
            .assert_status(StatusCode::CREATED);
        server
            .post("/api/categories")
            .add_header("cookie", cookie.clone())
            .json(&json!({ "name": "Pets" }))
            .await
            .assert_status(StatusCode::CREATED);

        let export = server.get("/api/ledger/export").add_header("cookie", cookie.clone()).await;
        export.assert_status_ok();
        let disposition = export.headers().get("content-disposition").unwrap().to_str().unwrap().to_string();
        let document: ExportDocument = export.json();
        assert!(disposition.contains(&super::export_filename(document.exported_at)));
        assert_eq!(document.version, 1);
        assert_eq!(document.rate, 1024.0);
        assert!(document.categories.contains(&"Pets".to_string()));

        // Wipe the ledger, then restore it from the export
        for (path, id) in [("/api/income", "salary"), ("/api/expenses", "groceries")] {
            server
                .delete(path)
                .add_query_param("id", id)
                .add_header("cookie", cookie.clone())
                .await
                .assert_status(StatusCode::NO_CONTENT);
        }

        let imported = server
            .post("/api/ledger/import")
            .add_header("cookie", cookie.clone())
            .bytes(export.text().into_bytes().into())
            .await;
        imported.assert_status_ok();
        let imported: ImportResponse = imported.json();
        assert_eq!(imported.income, 1);
        assert_eq!(imported.expenses, 1);

        let income: Vec<IncomeResponse> = server.get("/api/income").add_header("cookie", cookie.clone()).await.json();
        assert_eq!(income.len(), 1);
        assert_eq!(income[0].id, "salary");
        assert_eq!(income[0].date, "2024-01-01");
        assert_eq!(income[0].amount, Decimal::from(3_000_000));

        let expenses: Vec<ExpenseResponse> = server.get("/api/expenses").add_header("cookie", cookie.clone()).await.json();
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].id, "groceries");
        assert_eq!(expenses[0].category, "Food & Drinks");
        assert_eq!(expenses[0].notes.as_deref(), Some("mart"));

        let categories: Vec<String> = server.get("/api/categories").add_header("cookie", cookie).await.json();
        assert!(categories.contains(&"Pets".to_string()));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_import_keeps_category_order(pool: SqlitePool) {
        let (server, state) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool).await;
        let cookie = session_cookie(&user, &state.config);

        server
            .post("/api/ledger/import")
            .add_header("cookie", cookie.clone())
            .json(&json!({ "income": [], "expenses": [], "categories": ["Zoo", "Gifts", "Apple"] }))
            .await
            .assert_status_ok();

        let defaults = &state.config.ledger.default_categories;
        let categories: Vec<String> = server.get("/api/categories").add_header("cookie", cookie).await.json();
        let added: Vec<&str> = categories
            .iter()
            .filter(|name| !defaults.contains(name))
            .map(String::as_str)
            .collect();
        assert_eq!(added, vec!["Zoo", "Gifts", "Apple"]);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_import_replaces_and_coerces(pool: SqlitePool) {
        let (server, state) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool).await;
        let cookie = session_cookie(&user, &state.config);

        server
            .post("/api/income")
            .add_header("cookie", cookie.clone())
            .json(&json!({ "id": "old", "date": "2023-12-01", "amount": 100 }))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .post("/api/ledger/import")
            .add_header("cookie", cookie.clone())
            .json(&json!({
                "income": [{ "date": "2024-01-01", "amount": "2500000" }],
                "expenses": [
                    { "id": 7, "date": "2024-01-03", "amount": -50, "category": "" },
                    { "id": "taxi", "date": "2024-01-04", "amount": 15000, "category": "Taxi" }
                ]
            }))
            .await;
        response.assert_status_ok();
        let imported: ImportResponse = response.json();
        assert_eq!(imported.income, 1);
        assert_eq!(imported.expenses, 2);
        assert!(imported.categories.contains(&"Taxi".to_string()));
        assert!(imported.categories.contains(&"Food & Drinks".to_string()));

        let income: Vec<IncomeResponse> = server.get("/api/income").add_header("cookie", cookie.clone()).await.json();
        assert_eq!(income.len(), 1);
        assert_ne!(income[0].id, "old");
        assert_eq!(income[0].amount, Decimal::from(2_500_000));

        let expenses: Vec<ExpenseResponse> = server.get("/api/expenses").add_header("cookie", cookie).await.json();
        let coerced = expenses.iter().find(|e| e.id == "7").unwrap();
        assert_eq!(coerced.amount, Decimal::ZERO);
        assert_eq!(coerced.category, "Other");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_rejected_import_leaves_ledger_untouched(pool: SqlitePool) {
        let (server, state) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool).await;
        let cookie = session_cookie(&user, &state.config);

        server
            .post("/api/income")
            .add_header("cookie", cookie.clone())
            .json(&json!({ "id": "kept", "date": "2024-01-01", "amount": 1000 }))
            .await
            .assert_status(StatusCode::CREATED);

        for body in [
            json!({ "income": [] }),
            json!({ "expenses": [] }),
            json!({ "income": {}, "expenses": [] }),
            json!({ "income": [1], "expenses": [] }),
            json!([1, 2, 3]),
        ] {
            let response = server
                .post("/api/ledger/import")
                .add_header("cookie", cookie.clone())
                .json(&body)
                .await;
            response.assert_status(StatusCode::BAD_REQUEST);
            assert!(response.text().starts_with("Invalid import file"));
        }

        let garbage = server
            .post("/api/ledger/import")
            .add_header("cookie", cookie.clone())
            .text("{ not json")
            .await;
        garbage.assert_status(StatusCode::BAD_REQUEST);

        let income: Vec<IncomeResponse> = server.get("/api/income").add_header("cookie", cookie).await.json();
        assert_eq!(income.len(), 1);
        assert_eq!(income[0].id, "kept");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_import_is_per_user(pool: SqlitePool) {
        let (server, state) = create_test_app(pool.clone()).await;
        let first = create_test_user(&pool).await;
        let second = create_test_user(&pool).await;

        server
            .post("/api/income")
            .add_header("cookie", session_cookie(&second, &state.config))
            .json(&json!({ "id": "theirs", "date": "2024-01-01", "amount": 1000 }))
            .await
            .assert_status(StatusCode::CREATED);

        server
            .post("/api/ledger/import")
            .add_header("cookie", session_cookie(&first, &state.config))
            .json(&json!({ "income": [], "expenses": [] }))
            .await
            .assert_status_ok();

        let income: Vec<IncomeResponse> = server
            .get("/api/income")
            .add_header("cookie", session_cookie(&second, &state.config))
            .await
            .json();
        assert_eq!(income.len(), 1);
    }
}
