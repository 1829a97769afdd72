//! Rate lookup over HTTP.
//!
//! The service is expected to answer `GET <url>` with a body of the form
//! `{ "rates": { "USD": 0.00074, ... } }`, quoting how much of each currency one KRW buys.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument};
use url::Url;

use super::{RateError, RateSource, Result};
use crate::config::HttpRateSourceConfig;

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    rates: HashMap<String, f64>,
}

pub struct HttpRateSource {
    client: Client,
    url: Url,
    currency: String,
    name: String,
}

impl HttpRateSource {
    pub fn new(config: HttpRateSourceConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        let name = config.url.host_str().unwrap_or("http").to_string();
        Ok(Self {
            client,
            url: config.url,
            currency: config.currency,
            name,
        })
    }
}

#[async_trait]
impl RateSource for HttpRateSource {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self), fields(url = %self.url), err)]
    async fn fetch_usd_per_krw(&self) -> Result<f64> {
        let response = self.client.get(self.url.clone()).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RateError::Status { status, body });
        }

        let latest: LatestRatesResponse = response.json().await?;
        let rate = latest
            .rates
            .get(&self.currency)
            .copied()
            .ok_or_else(|| RateError::MissingCurrency(self.currency.clone()))?;

        debug!(rate, currency = %self.currency, "Fetched exchange rate");
        Ok(rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source_for(server: &MockServer) -> HttpRateSource {
        HttpRateSource::new(HttpRateSourceConfig {
            url: Url::parse(&format!("{}/v6/latest/KRW", server.uri())).unwrap(),
            currency: "USD".to_string(),
            timeout: Duration::from_secs(2),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_reads_currency() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v6/latest/KRW"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": "success",
                "base_code": "KRW",
                "rates": { "KRW": 1.0, "USD": 0.00074, "EUR": 0.00068 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let source = source_for(&server);
        assert_eq!(source.name(), "127.0.0.1");
        assert_eq!(source.fetch_usd_per_krw().await.unwrap(), 0.00074);
    }

    #[tokio::test]
    async fn test_fetch_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        match source_for(&server).fetch_usd_per_krw().await {
            Err(RateError::Status { status, body }) => {
                assert_eq!(status, 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_missing_currency() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "rates": { "EUR": 0.00068 } })))
            .mount(&server)
            .await;

        let result = source_for(&server).fetch_usd_per_krw().await;
        assert!(matches!(result, Err(RateError::MissingCurrency(c)) if c == "USD"));
    }

    #[tokio::test]
    async fn test_fetch_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
            .mount(&server)
            .await;

        let result = source_for(&server).fetch_usd_per_krw().await;
        assert!(matches!(result, Err(RateError::Request(_))));
    }
}
