//! Market screener: typed query building and translation.
//!
//! # Flow
//!
//! ```text
//! QueryDescription (JSON) ──translate──▶ ScreenerQuery ──ScreenerProvider::scan──▶ ScanTable ──▶ Vec<Record>
//! ```
//!
//! Column names are resolved against the [`Field`] registry before anything
//! is sent upstream, so a bad name never produces a partial result.

mod client;
mod field;
mod filter;
pub mod markets;
mod predefined;
mod query;
mod rating;
mod table;
mod translate;

pub use client::TradingViewClient;
pub use field::Field;
pub use filter::{Filter, FilterOp, ValueShape};
pub use predefined::{PredefinedScreen, DEFAULT_SCREEN_COUNT};
pub use query::{ScanRequest, ScreenerQuery, Sort, SortOrder, DEFAULT_COLUMNS, DEFAULT_LIMIT};
pub use rating::TechnicalRating;
pub use table::{Record, ScanTable, TICKER_COLUMN};
pub use translate::{run_query, translate, translate_and_run, Condition, OrderBy, QueryDescription};

use async_trait::async_trait;

use crate::provider::ProviderError;

/// Errors raised while turning a request into a scan, or running it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum QueryError {
    #[error("Unknown column: {0}")]
    UnknownField(String),

    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    #[error("Invalid value for operator '{op}': {reason}")]
    InvalidFilterValue { op: String, reason: String },

    #[error("Unknown market: {0}")]
    UnknownMarket(String),

    #[error("Unknown predefined screen: {0}")]
    UnknownScreen(String),

    #[error("Invalid query: {0}")]
    InvalidDescription(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl QueryError {
    /// True when the failure came from the upstream provider rather than the request.
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Provider(_))
    }
}

/// A market scanner that can execute composed queries.
#[async_trait]
pub trait ScreenerProvider: Send + Sync {
    /// Provider name (e.g., "tradingview")
    fn name(&self) -> &'static str;

    /// Markets scanned when a query does not name any.
    fn default_markets(&self) -> &[String];

    /// Execute a query and return the result table.
    async fn scan(&self, query: &ScreenerQuery) -> Result<ScanTable, ProviderError>;
}
