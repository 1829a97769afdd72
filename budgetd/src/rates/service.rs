//! Cached exchange rate with a staleness-driven refresh.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use super::{RateSource, invert};
use crate::config::RatesConfig;
use crate::db::{
    errors::Result,
    handlers::ExchangeRates,
    models::exchange_rates::{ExchangeRateDBResponse, ExchangeRateStoreDBRequest},
};

/// Source name reported when no rate has ever been fetched
pub const DEFAULT_SOURCE: &str = "default";

/// The rate in effect for a request.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RateSnapshot {
    /// KRW per 1 USD
    pub krw_per_usd: f64,
    /// When the rate was fetched; absent for the configured default
    pub fetched_at: Option<DateTime<Utc>>,
    /// Where the rate came from
    pub source: String,
    /// True when a refresh was due but failed, so an older rate (or the default) is in use
    pub stale: bool,
    /// Human-readable explanation of a failed refresh
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

impl RateSnapshot {
    fn fresh(rate: ExchangeRateDBResponse) -> Self {
        Self {
            krw_per_usd: rate.krw_per_usd,
            fetched_at: Some(rate.fetched_at),
            source: rate.source,
            stale: false,
            notice: None,
        }
    }
}

#[derive(Clone)]
pub struct RateService {
    source: Arc<dyn RateSource>,
    max_age: Duration,
    default_krw_per_usd: f64,
}

impl RateService {
    pub fn new(source: Arc<dyn RateSource>, config: &RatesConfig) -> Self {
        Self {
            source,
            max_age: config.max_age,
            default_krw_per_usd: config.default_krw_per_usd,
        }
    }

    /// Return the cached rate, refreshing it first if it is missing or older than `max_age`.
    ///
    /// Only database failures are errors; a failed fetch yields a stale snapshot with a notice.
    /// No pooled connection is held while the source is being queried.
    #[instrument(skip_all, err)]
    pub async fn current(&self, db: &SqlitePool) -> Result<RateSnapshot> {
        match self.cached(db).await? {
            Some(rate) if !self.is_stale(rate.fetched_at, Utc::now()) => Ok(RateSnapshot::fresh(rate)),
            cached => self.refresh_from(db, cached).await,
        }
    }

    /// Fetch a new rate regardless of the cached one's age.
    #[instrument(skip_all, err)]
    pub async fn refresh(&self, db: &SqlitePool) -> Result<RateSnapshot> {
        let cached = self.cached(db).await?;
        self.refresh_from(db, cached).await
    }

    async fn cached(&self, db: &SqlitePool) -> Result<Option<ExchangeRateDBResponse>> {
        let mut conn = db.acquire().await?;
        let latest = ExchangeRates::new(&mut conn).latest().await?;
        Ok(latest)
    }

    fn is_stale(&self, fetched_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        // A timestamp in the future (clock skew) counts as fresh
        (now - fetched_at).to_std().map(|age| age > self.max_age).unwrap_or(false)
    }

    async fn refresh_from(&self, db: &SqlitePool, cached: Option<ExchangeRateDBResponse>) -> Result<RateSnapshot> {
        match self.source.fetch_usd_per_krw().await.and_then(invert) {
            Ok(krw_per_usd) => {
                let mut conn = db.acquire().await?;
                let stored = ExchangeRates::new(&mut conn)
                    .store(&ExchangeRateStoreDBRequest {
                        krw_per_usd,
                        source: self.source.name().to_string(),
                        fetched_at: Utc::now(),
                    })
                    .await?;
                info!(krw_per_usd, source = %stored.source, "Exchange rate refreshed");
                Ok(RateSnapshot::fresh(stored))
            }
            Err(e) => {
                warn!(error = %e, source = self.source.name(), "Exchange rate refresh failed");
                Ok(match cached {
                    Some(rate) => RateSnapshot {
                        notice: Some(format!(
                            "Could not refresh the exchange rate ({e}); using the rate from {}",
                            rate.fetched_at.format("%Y-%m-%d %H:%M UTC")
                        )),
                        stale: true,
                        ..RateSnapshot::fresh(rate)
                    },
                    None => RateSnapshot {
                        krw_per_usd: self.default_krw_per_usd,
                        fetched_at: None,
                        source: DEFAULT_SOURCE.to_string(),
                        stale: true,
                        notice: Some(format!("Could not fetch the exchange rate ({e}); using the default rate")),
                    },
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::{RateError, Result as RateResult};
    use async_trait::async_trait;
    use sqlx::SqlitePool;
    use std::sync::Mutex;
    use tokio::sync::Notify;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Source that replays a scripted sequence of answers and counts calls.
    struct ScriptedSource {
        answers: Mutex<Vec<Option<f64>>>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(answers: Vec<Option<f64>>) -> Arc<Self> {
            Arc::new(Self {
                answers: Mutex::new(answers),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RateSource for ScriptedSource {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn fetch_usd_per_krw(&self) -> RateResult<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut answers = self.answers.lock().unwrap();
            match answers.remove(0) {
                Some(rate) => Ok(rate),
                None => Err(RateError::Status {
                    status: 500,
                    body: "down".to_string(),
                }),
            }
        }
    }

    fn service(source: Arc<dyn RateSource>, max_age: Duration) -> RateService {
        let config = RatesConfig {
            max_age,
            default_krw_per_usd: 1350.0,
            ..Default::default()
        };
        RateService::new(source, &config)
    }

    async fn store_old_rate(pool: &SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        ExchangeRates::new(&mut conn)
            .store(&ExchangeRateStoreDBRequest {
                krw_per_usd: 1300.0,
                source: "old".to_string(),
                fetched_at: Utc::now() - chrono::Duration::hours(13),
            })
            .await
            .unwrap();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_first_request_fetches_and_caches(pool: SqlitePool) {
        let source = ScriptedSource::new(vec![Some(0.0009765625)]);
        let rates = service(source.clone(), Duration::from_secs(3600));

        let first = rates.current(&pool).await.unwrap();
        assert_eq!(first.krw_per_usd, 1024.0);
        assert_eq!(first.source, "scripted");
        assert!(!first.stale);
        assert!(first.notice.is_none());

        // Second call is served from the cache
        let second = rates.current(&pool).await.unwrap();
        assert_eq!(second, first);
        assert_eq!(source.calls(), 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_failure_without_cache_uses_default(pool: SqlitePool) {
        let source = ScriptedSource::new(vec![None]);
        let rates = service(source.clone(), Duration::from_secs(3600));

        let snapshot = rates.current(&pool).await.unwrap();
        assert_eq!(snapshot.krw_per_usd, 1350.0);
        assert_eq!(snapshot.source, DEFAULT_SOURCE);
        assert!(snapshot.stale);
        assert!(snapshot.fetched_at.is_none());
        assert!(snapshot.notice.unwrap().contains("using the default rate"));

        // Nothing was cached
        let mut conn = pool.acquire().await.unwrap();
        assert!(ExchangeRates::new(&mut conn).latest().await.unwrap().is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_stale_rate_refreshes(pool: SqlitePool) {
        store_old_rate(&pool).await;
        let source = ScriptedSource::new(vec![Some(0.0009765625)]);
        let rates = service(source.clone(), Duration::from_secs(12 * 60 * 60));

        let snapshot = rates.current(&pool).await.unwrap();
        assert_eq!(snapshot.krw_per_usd, 1024.0);
        assert!(!snapshot.stale);
        assert_eq!(source.calls(), 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_stale_rate_kept_when_refresh_fails(pool: SqlitePool) {
        store_old_rate(&pool).await;
        let source = ScriptedSource::new(vec![None, Some(0.0)]);
        let rates = service(source.clone(), Duration::from_secs(12 * 60 * 60));

        let snapshot = rates.current(&pool).await.unwrap();
        assert_eq!(snapshot.krw_per_usd, 1300.0);
        assert_eq!(snapshot.source, "old");
        assert!(snapshot.stale);
        assert!(snapshot.notice.as_deref().unwrap().starts_with("Could not refresh the exchange rate"));

        // A zero quote is rejected the same way as a network failure
        let snapshot = rates.current(&pool).await.unwrap();
        assert_eq!(snapshot.krw_per_usd, 1300.0);
        assert!(snapshot.stale);
        assert_eq!(source.calls(), 2);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_refresh_ignores_age(pool: SqlitePool) {
        let source = ScriptedSource::new(vec![Some(0.0009765625), Some(0.001953125)]);
        let rates = service(source.clone(), Duration::from_secs(3600));

        rates.current(&pool).await.unwrap();
        let refreshed = rates.refresh(&pool).await.unwrap();
        assert_eq!(refreshed.krw_per_usd, 512.0);
        assert_eq!(source.calls(), 2);

        let mut conn = pool.acquire().await.unwrap();
        let latest = ExchangeRates::new(&mut conn).latest().await.unwrap().unwrap();
        assert_eq!(latest.krw_per_usd, 512.0);
    }

    /// Source that blocks inside the fetch until released.
    struct GatedSource {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl RateSource for GatedSource {
        fn name(&self) -> &str {
            "gated"
        }

        async fn fetch_usd_per_krw(&self) -> RateResult<f64> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(0.0009765625)
        }
    }

    async fn single_connection_pool(dir: &tempfile::TempDir) -> SqlitePool {
        let mut config = crate::test_utils::create_test_config();
        config.database.url = format!("sqlite://{}", dir.path().join("rates.db").display());
        config.database.max_connections = 1;
        config.database.acquire_timeout = Duration::from_secs(5);
        crate::setup_database(&config).await.unwrap()
    }

    #[tokio::test]
    async fn test_fetch_does_not_hold_a_connection() {
        let dir = tempfile::tempdir().unwrap();
        let pool = single_connection_pool(&dir).await;
        let source = Arc::new(GatedSource {
            entered: Notify::new(),
            release: Notify::new(),
        });
        let rates = service(source.clone(), Duration::from_secs(3600));

        let pending = tokio::spawn({
            let pool = pool.clone();
            async move { rates.current(&pool).await }
        });
        source.entered.notified().await;

        // The only connection is free while the source is still answering
        let mut conn = tokio::time::timeout(Duration::from_secs(2), pool.acquire())
            .await
            .expect("connection held across the rate fetch")
            .unwrap();
        let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users").fetch_one(&mut *conn).await.unwrap();
        assert_eq!(users, 0);
        drop(conn);

        source.release.notify_one();
        let snapshot = pending.await.unwrap().unwrap();
        assert_eq!(snapshot.krw_per_usd, 1024.0);
        assert_eq!(snapshot.source, "gated");
    }

    /// Source that takes a while to answer.
    struct SlowSource;

    #[async_trait]
    impl RateSource for SlowSource {
        fn name(&self) -> &str {
            "slow"
        }

        async fn fetch_usd_per_krw(&self) -> RateResult<f64> {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok(0.0009765625)
        }
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_share_one_connection() {
        let dir = tempfile::tempdir().unwrap();
        let pool = single_connection_pool(&dir).await;
        let rates = service(Arc::new(SlowSource), Duration::from_secs(3600));

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..8 {
            let rates = rates.clone();
            let pool = pool.clone();
            tasks.spawn(async move { rates.refresh(&pool).await });
        }

        let answers = tokio::time::timeout(Duration::from_secs(3), tasks.join_all())
            .await
            .expect("refreshes starved the pool");
        assert_eq!(answers.len(), 8);
        assert!(answers.into_iter().all(|a| a.unwrap().krw_per_usd == 1024.0));
    }
}
