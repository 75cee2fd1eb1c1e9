//! Scanner query builder.
//!
//! `ScreenerQuery` is built by chaining `select`, `filter`, `order_by`,
//! `limit` and `offset`, then rendered into the scanner's JSON request body
//! with [`ScreenerQuery::to_request`].

use serde::Serialize;
use serde_json::{json, Value};

use super::{Field, Filter};

/// Columns requested when a query never calls `select`.
pub const DEFAULT_COLUMNS: &[Field] = &[Field::Name, Field::Close, Field::Volume, Field::MarketCap];

/// Result window size when a query never calls `limit`.
pub const DEFAULT_LIMIT: usize = 50;

/// Sort direction and key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sort {
    pub sort_by: Field,
    pub sort_order: SortOrder,
    pub nulls_first: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// A composed scanner query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenerQuery {
    markets: Vec<String>,
    columns: Option<Vec<Field>>,
    filters: Vec<Filter>,
    sort: Option<Sort>,
    limit: Option<usize>,
    offset: Option<usize>,
}

impl Default for ScreenerQuery {
    fn default() -> Self {
        Self::new(vec!["america".to_string()])
    }
}

impl ScreenerQuery {
    /// Start an empty query over the given markets.
    pub fn new(markets: Vec<String>) -> Self {
        Self {
            markets,
            columns: None,
            filters: Vec::new(),
            sort: None,
            limit: None,
            offset: None,
        }
    }

    /// Replace the market scope.
    pub fn markets(mut self, markets: Vec<String>) -> Self {
        self.markets = markets;
        self
    }

    /// Project the given columns, in order. Replaces any earlier projection.
    pub fn select(mut self, columns: impl IntoIterator<Item = Field>) -> Self {
        self.columns = Some(columns.into_iter().collect());
        self
    }

    /// Add a filter. Filters combine with AND in the order added.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, field: Field, ascending: bool) -> Self {
        self.sort = Some(Sort {
            sort_by: field,
            sort_order: if ascending {
                SortOrder::Asc
            } else {
                SortOrder::Desc
            },
            nulls_first: false,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn market_list(&self) -> &[String] {
        &self.markets
    }

    /// Columns that will be requested, falling back to [`DEFAULT_COLUMNS`].
    pub fn columns(&self) -> &[Field] {
        self.columns.as_deref().unwrap_or(DEFAULT_COLUMNS)
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn sort(&self) -> Option<&Sort> {
        self.sort.as_ref()
    }

    /// The explicit limit, if one was set.
    pub fn explicit_limit(&self) -> Option<usize> {
        self.limit
    }

    /// Half-open result window `[offset, offset + limit)`.
    pub fn range(&self) -> [usize; 2] {
        let offset = self.offset.unwrap_or(0);
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);
        [offset, offset.saturating_add(limit)]
    }

    /// Render the scanner request body.
    pub fn to_request(&self) -> ScanRequest {
        ScanRequest {
            markets: self.markets.clone(),
            symbols: json!({ "query": { "types": [] }, "tickers": [] }),
            options: json!({ "lang": "en" }),
            columns: self.columns().to_vec(),
            filter: self.filters.clone(),
            sort: self.sort,
            range: self.range(),
        }
    }
}

/// Scanner request body.
#[derive(Debug, Clone, Serialize)]
pub struct ScanRequest {
    pub markets: Vec<String>,
    pub symbols: Value,
    pub options: Value,
    pub columns: Vec<Field>,
    pub filter: Vec<Filter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<Sort>,
    pub range: [usize; 2],
}
