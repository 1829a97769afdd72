//! Exchange rate lookup.
//!
//! A [`RateSource`] knows how to obtain the current USD-per-KRW rate. [`RateService`] sits in front of
//! it, caching the inverted rate (KRW per USD) in the database and refreshing it when it is older
//! than the configured maximum age. Failures to refresh are reported on the returned
//! [`RateSnapshot`] instead of failing the request.

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::RateSourceConfig;

pub mod fixed;
pub mod http;
pub mod service;

pub use service::{RateService, RateSnapshot};

/// Create a rate source from configuration
///
/// This is the single point where we convert config into source instances.
pub fn create_source(config: RateSourceConfig) -> Result<Arc<dyn RateSource>> {
    match config {
        RateSourceConfig::Http(http_config) => Ok(Arc::new(http::HttpRateSource::new(http_config)?)),
        RateSourceConfig::Fixed(fixed_config) => Ok(Arc::new(fixed::FixedRateSource::from(fixed_config))),
    }
}

/// Result type for rate source operations
pub type Result<T> = std::result::Result<T, RateError>;

/// Errors that can occur while fetching a rate
#[derive(Debug, thiserror::Error)]
pub enum RateError {
    #[error("rate request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("rate service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("rate service response has no {0} rate")]
    MissingCurrency(String),

    #[error("rate service returned an unusable rate: {0}")]
    InvalidRate(f64),
}

/// Something that can report how many US dollars one won buys.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Short name stored alongside cached rates, e.g. the service host
    fn name(&self) -> &str;

    async fn fetch_usd_per_krw(&self) -> Result<f64>;
}

/// Turn a USD-per-KRW quote into KRW per USD, rejecting values that cannot be a rate.
pub fn invert(usd_per_krw: f64) -> Result<f64> {
    if !usd_per_krw.is_finite() || usd_per_krw <= 0.0 {
        return Err(RateError::InvalidRate(usd_per_krw));
    }
    let krw_per_usd = 1.0 / usd_per_krw;
    if !krw_per_usd.is_finite() {
        return Err(RateError::InvalidRate(usd_per_krw));
    }
    Ok(krw_per_usd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FixedRateSourceConfig;

    #[test]
    fn test_invert() {
        assert_eq!(invert(0.0009765625).unwrap(), 1024.0);
        assert!(matches!(invert(0.0), Err(RateError::InvalidRate(_))));
        assert!(matches!(invert(-0.1), Err(RateError::InvalidRate(_))));
        assert!(matches!(invert(f64::NAN), Err(RateError::InvalidRate(_))));
        assert!(matches!(invert(f64::MIN_POSITIVE / 4.0), Err(RateError::InvalidRate(_))));
    }

    #[tokio::test]
    async fn test_create_fixed_source() {
        let source = create_source(RateSourceConfig::Fixed(FixedRateSourceConfig { usd_per_krw: 0.001 })).unwrap();
        assert_eq!(source.name(), "fixed");
        assert_eq!(source.fetch_usd_per_krw().await.unwrap(), 0.001);
    }
}
