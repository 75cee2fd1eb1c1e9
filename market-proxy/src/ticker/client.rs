//! Yahoo Finance quote-summary adapter.
//!
//! `GET {base_url}/v10/finance/quoteSummary/{symbol}?modules=a,b`
//!
//! Numeric fields arrive as `{"raw": 1.5, "fmt": "1.50"}`; they are unwrapped
//! to the raw value, empty objects become `null`, and `maxAge` bookkeeping
//! keys are dropped.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, Instrument};
use url::Url;

use market_common::config::TickerProviderConfig;

use super::TickerProvider;
use crate::provider::{build_http_client, ProviderError};

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "quoteSummary")]
    quote_summary: QuoteSummary,
}

#[derive(Debug, Deserialize)]
struct QuoteSummary {
    #[serde(default)]
    result: Option<Vec<Map<String, Value>>>,
    #[serde(default)]
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

/// Yahoo Finance adapter.
pub struct YahooFinanceClient {
    base_url: String,
    client: reqwest::Client,
}

impl YahooFinanceClient {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            base_url: base_url.into(),
            client: build_http_client(timeout_secs),
        }
    }

    /// Create from config; `None` when the provider is disabled.
    pub fn from_config(config: &TickerProviderConfig) -> Option<Self> {
        config
            .enabled
            .then(|| Self::new(config.base_url.clone(), config.timeout_secs))
    }

    fn summary_url(&self, symbol: &str, modules: &[String]) -> Result<Url, ProviderError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ProviderError::Network(format!("Invalid base URL: {}", e)))?;

        url.path_segments_mut()
            .map_err(|_| ProviderError::Network("Invalid base URL".into()))?
            .pop_if_empty()
            .extend(["v10", "finance", "quoteSummary", symbol]);

        url.query_pairs_mut()
            .append_pair("modules", &modules.join(","));

        Ok(url)
    }

    async fn fetch(
        &self,
        symbol: &str,
        modules: &[String],
    ) -> Result<Map<String, Value>, ProviderError> {
        let url = self.summary_url(symbol, modules)?;
        debug!(url = %url, "Fetching quote summary");

        let response = self
            .client
            .get(url)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(ProviderError::from_transport)?;

        let status = response.status();
        let text = response.text().await.map_err(ProviderError::from_transport)?;
        let envelope: Result<Envelope, _> = serde_json::from_str(&text);

        if let Ok(Envelope {
            quote_summary: QuoteSummary {
                error: Some(error), ..
            },
        }) = &envelope
        {
            if status == reqwest::StatusCode::NOT_FOUND || error.code == "Not Found" {
                return Err(ProviderError::DataNotAvailable(error.description.clone()));
            }
            return Err(ProviderError::Upstream {
                status: status.as_u16(),
                message: error.description.clone(),
            });
        }

        if !status.is_success() {
            return Err(ProviderError::Upstream {
                status: status.as_u16(),
                message: text.trim().to_string(),
            });
        }

        let envelope = envelope.map_err(|e| ProviderError::Decode(e.to_string()))?;
        let data = envelope
            .quote_summary
            .result
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| {
                ProviderError::DataNotAvailable(format!(
                    "Quote not found for ticker symbol: {}",
                    symbol
                ))
            })?;

        Ok(data
            .into_iter()
            .map(|(module, value)| (module, flatten_raw(value)))
            .collect())
    }
}

/// Unwrap `{"raw": .., "fmt": ..}` pairs and drop provider bookkeeping.
fn flatten_raw(value: Value) -> Value {
    match value {
        Value::Object(mut map) => {
            if let Some(raw) = map.remove("raw") {
                return raw;
            }
            map.shift_remove("maxAge");
            if map.is_empty() {
                return Value::Null;
            }
            Value::Object(map.into_iter().map(|(k, v)| (k, flatten_raw(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(flatten_raw).collect()),
        other => other,
    }
}

#[async_trait]
impl TickerProvider for YahooFinanceClient {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn quote_summary(
        &self,
        symbol: &str,
        modules: &[String],
    ) -> Result<Map<String, Value>, ProviderError> {
        let span = market_common::provider_span!("yahoo", symbol = %symbol);
        self.fetch(symbol, modules).instrument(span).await
    }
}
