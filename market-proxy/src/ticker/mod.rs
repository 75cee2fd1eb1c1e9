//! Per-symbol quote summaries.
//!
//! The ticker provider answers "give me these modules for this symbol". A
//! symbol the provider does not know becomes an error string under that
//! symbol's key; any other failure fails the whole request.

mod client;

pub use client::YahooFinanceClient;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::provider::ProviderError;

/// Module returned when a request names no modules.
pub const SUMMARY_DETAIL: &str = "summaryDetail";

/// Quote-summary modules the provider understands.
pub const QUOTE_SUMMARY_MODULES: &[&str] = &[
    "assetProfile",
    "balanceSheetHistory",
    "balanceSheetHistoryQuarterly",
    "calendarEvents",
    "cashflowStatementHistory",
    "cashflowStatementHistoryQuarterly",
    "defaultKeyStatistics",
    "earnings",
    "earningsHistory",
    "earningsTrend",
    "esgScores",
    "financialData",
    "fundOwnership",
    "fundPerformance",
    "fundProfile",
    "incomeStatementHistory",
    "incomeStatementHistoryQuarterly",
    "indexTrend",
    "industryTrend",
    "insiderHolders",
    "insiderTransactions",
    "institutionOwnership",
    "majorHoldersBreakdown",
    "netSharePurchaseActivity",
    "price",
    "quoteType",
    "recommendationTrend",
    "secFilings",
    "sectorTrend",
    "summaryDetail",
    "summaryProfile",
    "topHoldings",
    "upgradeDowngradeHistory",
];

/// A quote-summary source.
#[async_trait]
pub trait TickerProvider: Send + Sync {
    /// Provider name (e.g., "yahoo")
    fn name(&self) -> &'static str;

    /// Fetch `modules` for one symbol, keyed by module name.
    ///
    /// Unknown symbols are reported as [`ProviderError::DataNotAvailable`].
    async fn quote_summary(
        &self,
        symbol: &str,
        modules: &[String],
    ) -> Result<Map<String, Value>, ProviderError>;
}

/// Trim, uppercase and de-duplicate symbols, keeping first-seen order.
pub fn normalize_symbols<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut symbols: Vec<String> = Vec::with_capacity(raw.len());
    for symbol in raw {
        let symbol = symbol.as_ref().trim().to_uppercase();
        if !symbol.is_empty() && !symbols.contains(&symbol) {
            symbols.push(symbol);
        }
    }
    symbols
}

/// Fetch the requested modules for every symbol.
///
/// Module names the provider does not know are dropped. The result maps each
/// symbol to `{module: data}` holding only modules the provider returned.
pub async fn fetch_modules(
    provider: &dyn TickerProvider,
    symbols: &[String],
    modules: &[String],
) -> Result<Map<String, Value>, ProviderError> {
    let known: Vec<String> = modules
        .iter()
        .filter(|m| QUOTE_SUMMARY_MODULES.contains(&m.as_str()))
        .cloned()
        .collect();

    let mut out = Map::new();
    for symbol in symbols {
        if known.is_empty() {
            out.insert(symbol.clone(), Value::Object(Map::new()));
            continue;
        }

        let value = match provider.quote_summary(symbol, &known).await {
            Ok(mut data) => Value::Object(
                known
                    .iter()
                    .filter_map(|m| data.remove(m).map(|v| (m.clone(), v)))
                    .collect(),
            ),
            Err(ProviderError::DataNotAvailable(message)) => Value::String(message),
            Err(e) => return Err(e),
        };
        out.insert(symbol.clone(), value);
    }
    Ok(out)
}

/// Fetch the `summaryDetail` module for every symbol, unwrapped.
pub async fn fetch_summary_detail(
    provider: &dyn TickerProvider,
    symbols: &[String],
) -> Result<Map<String, Value>, ProviderError> {
    let modules = [SUMMARY_DETAIL.to_string()];

    let mut out = Map::new();
    for symbol in symbols {
        let value = match provider.quote_summary(symbol, &modules).await {
            Ok(mut data) => data.remove(SUMMARY_DETAIL).unwrap_or_else(|| {
                Value::String(format!("No {} data found for {}", SUMMARY_DETAIL, symbol))
            }),
            Err(ProviderError::DataNotAvailable(message)) => Value::String(message),
            Err(e) => return Err(e),
        };
        out.insert(symbol.clone(), value);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    /// Serves canned modules for AAPL, fails everything else.
    struct StaticProvider {
        calls: Mutex<Vec<(String, Vec<String>)>>,
        network_down: bool,
    }

    impl StaticProvider {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                network_down: false,
            }
        }
    }

    #[async_trait]
    impl TickerProvider for StaticProvider {
        fn name(&self) -> &'static str {
            "static"
        }

        async fn quote_summary(
            &self,
            symbol: &str,
            modules: &[String],
        ) -> Result<Map<String, Value>, ProviderError> {
            self.calls
                .lock()
                .unwrap()
                .push((symbol.to_string(), modules.to_vec()));

            if self.network_down {
                return Err(ProviderError::Network("Connection failed".into()));
            }
            if symbol != "AAPL" {
                return Err(ProviderError::DataNotAvailable(format!(
                    "Quote not found for ticker symbol: {}",
                    symbol
                )));
            }

            let all = json!({
                "summaryDetail": {"previousClose": 189.2},
                "price": {"regularMarketPrice": 190.5}
            });
            let Value::Object(mut all) = all else { unreachable!() };
            all.retain(|k, _| modules.contains(k));
            Ok(all)
        }
    }

    #[test]
    fn test_normalize_symbols() {
        let symbols = normalize_symbols(&["aapl", " MSFT ", "AAPL", "", "brk-b"]);
        assert_eq!(symbols, ["AAPL", "MSFT", "BRK-B"]);
    }

    #[tokio::test]
    async fn test_fetch_modules_filters_and_reports_missing_symbols() {
        let provider = StaticProvider::new();
        let result = fetch_modules(
            &provider,
            &["AAPL".to_string(), "ZZZZ".to_string()],
            &["price".to_string(), "notAModule".to_string()],
        )
        .await
        .unwrap();

        assert_eq!(
            Value::Object(result),
            json!({
                "AAPL": {"price": {"regularMarketPrice": 190.5}},
                "ZZZZ": "Quote not found for ticker symbol: ZZZZ"
            })
        );

        let calls = provider.calls.lock().unwrap();
        assert!(calls.iter().all(|(_, modules)| modules == &["price".to_string()]));
    }

    #[tokio::test]
    async fn test_fetch_modules_without_known_modules_skips_provider() {
        let provider = StaticProvider::new();
        let result = fetch_modules(&provider, &["AAPL".to_string()], &["bogus".to_string()])
            .await
            .unwrap();

        assert_eq!(Value::Object(result), json!({"AAPL": {}}));
        assert!(provider.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_summary_detail_unwrapped() {
        let provider = StaticProvider::new();
        let result = fetch_summary_detail(&provider, &["AAPL".to_string()])
            .await
            .unwrap();
        assert_eq!(Value::Object(result), json!({"AAPL": {"previousClose": 189.2}}));
    }

    #[tokio::test]
    async fn test_network_failure_fails_request() {
        let provider = StaticProvider {
            network_down: true,
            ..StaticProvider::new()
        };
        let err = fetch_summary_detail(&provider, &["AAPL".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Network(_)));
    }
}
