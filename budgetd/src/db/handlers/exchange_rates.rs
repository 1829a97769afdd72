//! Database repository for the cached exchange rate.

use crate::db::{
    errors::Result,
    models::exchange_rates::{ExchangeRateDBResponse, ExchangeRateStoreDBRequest},
};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection};
use tracing::instrument;

#[derive(Debug, Clone, FromRow)]
struct ExchangeRate {
    pub krw_per_usd: f64,
    pub source: String,
    pub fetched_at: DateTime<Utc>,
}

impl From<ExchangeRate> for ExchangeRateDBResponse {
    fn from(rate: ExchangeRate) -> Self {
        Self {
            krw_per_usd: rate.krw_per_usd,
            source: rate.source,
            fetched_at: rate.fetched_at,
        }
    }
}

/// The table holds at most one row; storing a rate overwrites the previous one.
pub struct ExchangeRates<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> ExchangeRates<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn latest(&mut self) -> Result<Option<ExchangeRateDBResponse>> {
        let rate = sqlx::query_as::<_, ExchangeRate>("SELECT krw_per_usd, source, fetched_at FROM exchange_rates WHERE id = 1")
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(rate.map(Into::into))
    }

    #[instrument(skip(self, request), fields(krw_per_usd = request.krw_per_usd, source = %request.source), err)]
    pub async fn store(&mut self, request: &ExchangeRateStoreDBRequest) -> Result<ExchangeRateDBResponse> {
        let rate = sqlx::query_as::<_, ExchangeRate>(
            r#"
            INSERT INTO exchange_rates (id, krw_per_usd, source, fetched_at)
            VALUES (1, ?1, ?2, ?3)
            ON CONFLICT (id) DO UPDATE SET
                krw_per_usd = excluded.krw_per_usd,
                source = excluded.source,
                fetched_at = excluded.fetched_at
            RETURNING krw_per_usd, source, fetched_at
            "#,
        )
        .bind(request.krw_per_usd)
        .bind(&request.source)
        .bind(request.fetched_at)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(rate.into())
    }
}
