use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use sitepulse_core::analytics::DateRange;
use sitepulse_core::config::Config;
use sitepulse_core::report::{ReportFetcher, RunReportRequest};

use super::auth::TokenSource;
use super::credentials::ServiceAccountKey;
use super::error::Ga4Error;

const GA4_HTTP_TIMEOUT_SECONDS: u64 = 30;

/// GA4 Data API client for the daily page report.
///
/// One request per call: no retry, no backoff. Errors propagate to the sync
/// pipeline, which aborts the run.
pub struct Ga4Client {
    client: reqwest::Client,
    api_base: String,
    tokens: TokenSource,
}

impl Ga4Client {
    pub fn new(key: ServiceAccountKey, api_base: &str) -> Result<Self, Ga4Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("sitepulse/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(GA4_HTTP_TIMEOUT_SECONDS))
            .build()
            .map_err(|e| Ga4Error::Init(format!("GA4 HTTP client: {e}")))?;
        let tokens = TokenSource::new(key, client.clone())?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    /// Build a client from `GA4_SERVICE_ACCOUNT_KEY`. `Ok(None)` when unset.
    pub fn from_config(config: &Config) -> Result<Option<Self>, Ga4Error> {
        let Some(raw) = config.ga4_service_account_key.as_deref() else {
            return Ok(None);
        };
        let key = ServiceAccountKey::parse(raw)?;
        Self::new(key, &config.ga4_api_base).map(Some)
    }

    fn report_url(&self, property_id: &str) -> String {
        let id = property_id.trim_start_matches("properties/");
        format!("{}/v1beta/properties/{}:runReport", self.api_base, id)
    }

    async fn run_report_once(
        &self,
        property_id: &str,
        range: &DateRange,
    ) -> Result<Value, Ga4Error> {
        let token = self.tokens.access_token().await?;
        let url = self.report_url(property_id);
        debug!(%url, start = %range.start, end = %range.end, "requesting GA4 report");

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&RunReportRequest::daily_pages(range))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Ga4Error::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl ReportFetcher for Ga4Client {
    async fn run_report(&self, property_id: &str, range: &DateRange) -> anyhow::Result<Value> {
        Ok(self.run_report_once(property_id, range).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRIVATE_PEM: &str = include_str!("../../tests/fixtures/test_key.pem");

    fn client(api_base: &str) -> Ga4Client {
        let key = ServiceAccountKey {
            key_type: Some("service_account".to_string()),
            client_email: "sync@demo.iam.gserviceaccount.com".to_string(),
            private_key: PRIVATE_PEM.to_string(),
            private_key_id: None,
            token_uri: "https://oauth2.googleapis.com/token".to_string(),
        };
        Ga4Client::new(key, api_base).expect("client")
    }

    #[test]
    fn test_report_url_accepts_bare_and_prefixed_ids() {
        let c = client("https://analyticsdata.googleapis.com/");
        assert_eq!(
            c.report_url("123456"),
            "https://analyticsdata.googleapis.com/v1beta/properties/123456:runReport"
        );
        assert_eq!(c.report_url("properties/123456"), c.report_url("123456"));
    }
}
