//! HTTP client for the TradingView market scanner.
//!
//! A scan is a single `POST {base_url}/{market}/scan` carrying the rendered
//! [`ScanRequest`](super::ScanRequest). Multi-market scans go to `/global/scan`.
//!
//! Response shape:
//!
//! ```text
//! {"totalCount": 1234, "data": [{"s": "NASDAQ:AAPL", "d": ["Apple Inc.", 190.5]}]}
//! ```

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, Instrument};

use market_common::config::ScreenerProviderConfig;

use super::{ScanTable, ScreenerProvider, ScreenerQuery, TICKER_COLUMN};
use crate::provider::{build_http_client, join_url, ProviderError};

#[derive(Debug, Deserialize)]
struct ScanResponse {
    #[serde(rename = "totalCount", default)]
    total_count: u64,
    #[serde(default)]
    data: Option<Vec<ScanRow>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScanRow {
    s: String,
    #[serde(default)]
    d: Vec<Value>,
}

/// TradingView scanner adapter.
pub struct TradingViewClient {
    base_url: String,
    default_markets: Vec<String>,
    client: reqwest::Client,
}

impl TradingViewClient {
    pub fn new(base_url: impl Into<String>, default_markets: Vec<String>, timeout_secs: u64) -> Self {
        Self {
            base_url: base_url.into(),
            default_markets,
            client: build_http_client(timeout_secs),
        }
    }

    /// Create from config; `None` when the provider is disabled.
    pub fn from_config(config: &ScreenerProviderConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        Some(Self::new(
            config.base_url.clone(),
            config.default_markets.clone(),
            config.timeout_secs,
        ))
    }

    fn scan_url(&self, markets: &[String]) -> String {
        match markets {
            [market] => join_url(&self.base_url, &format!("{}/scan", market)),
            _ => join_url(&self.base_url, "global/scan"),
        }
    }

    async fn post_scan(&self, query: &ScreenerQuery) -> Result<ScanTable, ProviderError> {
        let url = self.scan_url(query.market_list());
        let body = query.to_request();

        debug!(url = %url, filters = body.filter.len(), range = ?body.range, "Posting scan");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(ProviderError::from_transport)?;

        let status = response.status();
        let text = response.text().await.map_err(ProviderError::from_transport)?;

        // Error responses usually still carry a JSON body with an "error" message
        let parsed: Result<ScanResponse, _> = serde_json::from_str(&text);

        if !status.is_success() {
            let message = parsed
                .ok()
                .and_then(|r| r.error)
                .unwrap_or_else(|| text.trim().to_string());
            return Err(ProviderError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let parsed = parsed.map_err(|e| ProviderError::Decode(e.to_string()))?;
        if let Some(message) = parsed.error {
            return Err(ProviderError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let columns = std::iter::once(TICKER_COLUMN.to_string())
            .chain(query.columns().iter().map(|f| f.wire_name().to_string()))
            .collect();

        let rows = parsed
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|row| {
                let mut values = Vec::with_capacity(row.d.len() + 1);
                values.push(Value::String(row.s));
                values.extend(row.d);
                values
            })
            .collect();

        Ok(ScanTable::new(parsed.total_count, columns, rows))
    }
}

#[async_trait]
impl ScreenerProvider for TradingViewClient {
    fn name(&self) -> &'static str {
        "tradingview"
    }

    fn default_markets(&self) -> &[String] {
        &self.default_markets
    }

    async fn scan(&self, query: &ScreenerQuery) -> Result<ScanTable, ProviderError> {
        let span = market_common::provider_span!("tradingview", markets = ?query.market_list());
        self.post_scan(query).instrument(span).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screener::{Field, Filter, FilterOp};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> TradingViewClient {
        TradingViewClient::new(server.uri(), vec!["america".into()], 5)
    }

    #[test]
    fn test_scan_url() {
        let client = TradingViewClient::new("https://scanner.example.com/", vec![], 5);
        assert_eq!(
            client.scan_url(&["america".to_string()]),
            "https://scanner.example.com/america/scan"
        );
        assert_eq!(
            client.scan_url(&["america".to_string(), "uk".to_string()]),
            "https://scanner.example.com/global/scan"
        );
    }

    #[test]
    fn test_disabled_config() {
        let config = ScreenerProviderConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(TradingViewClient::from_config(&config).is_none());
    }

    #[tokio::test]
    async fn test_scan_builds_table() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/america/scan"))
            .and(body_partial_json(json!({
                "columns": ["name", "close"],
                "filter": [{"left": "close", "operation": "greater", "right": 100}],
                "range": [0, 2]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "totalCount": 812,
                "data": [
                    {"s": "NASDAQ:AAPL", "d": ["AAPL", 190.5]},
                    {"s": "NASDAQ:MSFT", "d": ["MSFT", 410.1]}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let query = ScreenerQuery::default()
            .select([Field::Name, Field::Close])
            .filter(Filter::new(Field::Close, FilterOp::Greater, json!(100)).unwrap())
            .limit(2);

        let table = client(&server).scan(&query).await.unwrap();
        assert_eq!(table.total_count, 812);
        assert_eq!(table.columns, ["ticker", "name", "close"]);
        assert_eq!(table.rows[1], vec![json!("NASDAQ:MSFT"), json!("MSFT"), json!(410.1)]);
    }

    #[tokio::test]
    async fn test_upstream_error_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "totalCount": 0,
                "error": "Unknown field \"foo\"",
                "data": null
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .scan(&ScreenerQuery::default())
            .await
            .unwrap_err();
        match err {
            ProviderError::Upstream { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Unknown field \"foo\"");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client(&server)
            .scan(&ScreenerQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Decode(_)));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let client = TradingViewClient::new("http://127.0.0.1:9", vec!["america".into()], 2);
        let err = client.scan(&ScreenerQuery::default()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Network(_)));
    }
}
