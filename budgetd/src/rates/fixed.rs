//! A rate source that never leaves the process.

use async_trait::async_trait;

use super::{RateSource, Result};
use crate::config::FixedRateSourceConfig;

pub struct FixedRateSource {
    usd_per_krw: f64,
}

impl From<FixedRateSourceConfig> for FixedRateSource {
    fn from(config: FixedRateSourceConfig) -> Self {
        Self {
            usd_per_krw: config.usd_per_krw,
        }
    }
}

#[async_trait]
impl RateSource for FixedRateSource {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn fetch_usd_per_krw(&self) -> Result<f64> {
        Ok(self.usd_per_krw)
    }
}
