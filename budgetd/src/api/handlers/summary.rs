use axum::{
    Json,
    extract::{Query, State},
};

use crate::{
    AppState,
    api::models::{
        ledger::{SummaryQuery, SummaryResponse},
        users::CurrentUser,
    },
    db::handlers::{ExpenseRecords, IncomeRecords, Repository, expenses::ExpenseFilter, income::IncomeFilter},
    errors::{Error, Result},
    ledger::{CategoryBreakdown, LedgerTotals},
    rates::RateSnapshot,
};

/// Source reported when the caller supplies `?rate=`
pub const OVERRIDE_SOURCE: &str = "override";

#[utoipa::path(
    get,
    path = "/api/summary",
    tag = "ledger",
    summary = "Totals and category breakdown",
    params(SummaryQuery),
    responses(
        (status = 200, description = "Totals in KRW and USD with the spending breakdown", body = SummaryResponse),
        (status = 400, description = "Rate override is not a positive number"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
    current_user: CurrentUser,
) -> Result<Json<SummaryResponse>> {
    let rate = match query.rate {
        Some(rate) if rate.is_finite() && rate > 0.0 => RateSnapshot {
            krw_per_usd: rate,
            fetched_at: None,
            source: OVERRIDE_SOURCE.to_string(),
            stale: false,
            notice: None,
        },
        Some(rate) => {
            return Err(Error::BadRequest {
                message: format!("rate must be a positive number, got {rate}"),
            });
        }
        None => state.rates.current(&state.db).await?,
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let income = IncomeRecords::new(&mut conn).list(&IncomeFilter::new(current_user.id)).await?;
    let expenses = ExpenseRecords::new(&mut conn).list(&ExpenseFilter::new(current_user.id)).await?;

    let totals = LedgerTotals::compute(income.iter().map(|r| r.amount), expenses.iter().map(|r| r.amount))?;
    let breakdown = CategoryBreakdown::compute(expenses.iter().map(|r| (r.category.as_str(), r.amount)))?;

    Ok(Json(SummaryResponse::build(totals, breakdown, rate)))
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{create_test_app, create_test_user, session_cookie};
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use sqlx::SqlitePool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_summary_example_ledger(pool: SqlitePool) {
        let (server, state) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool).await;
        let cookie = session_cookie(&user, &state.config);

        server
            .post("/api/income")
            .add_header("cookie", cookie.clone())
            .json(&json!({ "date": "2024-01-01", "amount": 3000000 }))
            .await
            .assert_status(StatusCode::CREATED);
        server
            .post("/api/expenses")
            .add_header("cookie", cookie.clone())
            .json(&json!({ "date": "2024-01-02", "amount": 1200000, "category": "Food & Drinks" }))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server.get("/api/summary?rate=1200").add_header("cookie", cookie).await;
        response.assert_status_ok();
        let summary: Value = response.json();

        assert_eq!(summary["income"]["krw"], 3_000_000.0);
        assert_eq!(summary["expense"]["krw"], 1_200_000.0);
        assert_eq!(summary["remaining"]["krw"], 1_800_000.0);
        assert_eq!(summary["remaining"]["usd"], 1500.0);
        assert_eq!(summary["remaining"]["usd_display"], "$1,500.00");
        assert_eq!(summary["remaining"]["krw_display"], "₩1,800,000");
        assert_eq!(summary["breakdown"][0]["category"], "Food & Drinks");
        assert_eq!(summary["breakdown"][0]["pct"], 100.0);
        assert_eq!(summary["rate"]["source"], "override");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_summary_uses_cached_rate(pool: SqlitePool) {
        let (server, state) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool).await;

        let response = server.get("/api/summary").add_header("cookie", session_cookie(&user, &state.config)).await;
        response.assert_status_ok();
        let summary: Value = response.json();

        // The test app uses the fixed source at 1/1024 USD per KRW
        assert_eq!(summary["rate"]["krw_per_usd"], 1024.0);
        assert_eq!(summary["rate"]["source"], "fixed");
        assert_eq!(summary["rate"]["stale"], false);
        assert_eq!(summary["income"]["krw"], 0.0);
        assert_eq!(summary["breakdown"], json!([]));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_summary_rejects_bad_override(pool: SqlitePool) {
        let (server, state) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool).await;
        let cookie = session_cookie(&user, &state.config);

        for rate in ["0", "-1200"] {
            server
                .get("/api/summary")
                .add_query_param("rate", rate)
                .add_header("cookie", cookie.clone())
                .await
                .assert_status(StatusCode::BAD_REQUEST);
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_huge_amounts_cannot_break_the_summary(pool: SqlitePool) {
        let (server, state) = create_test_app(pool.clone()).await;
        let user = create_test_user(&pool).await;
        let cookie = session_cookie(&user, &state.config);

        for _ in 0..2 {
            server
                .post("/api/expenses")
                .add_header("cookie", cookie.clone())
                .json(&json!({ "date": "2024-01-02", "amount": "79228162514264337593543950335" }))
                .await
                .assert_status(StatusCode::BAD_REQUEST);
        }

        // Many records at the cap still sum without overflow
        for _ in 0..3 {
            server
                .post("/api/expenses")
                .add_header("cookie", cookie.clone())
                .json(&json!({ "date": "2024-01-02", "amount": "1000000000000000" }))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let response = server.get("/api/summary?rate=1200").add_header("cookie", cookie).await;
        response.assert_status_ok();
        let summary: Value = response.json();
        assert_eq!(summary["expense"]["krw"], 3e15);
        assert_eq!(summary["breakdown"][0]["pct"], 100.0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_summary_requires_session(pool: SqlitePool) {
        let (server, _state) = create_test_app(pool).await;
        server.get("/api/summary").await.assert_status(StatusCode::UNAUTHORIZED);
    }
}
