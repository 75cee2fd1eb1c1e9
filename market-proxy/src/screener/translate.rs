//! Translation of declarative query descriptions into scanner queries.
//!
//! A description is applied in a fixed order: markets, `select`, every
//! `where` condition in listed order, `order_by`, then `limit`/`offset`.
//! Any column, operator, or market that fails to resolve aborts the
//! translation before the provider is called.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{markets, Field, Filter, FilterOp, QueryError, Record, ScreenerProvider, ScreenerQuery};

/// Declarative query, as posted to `/api/screener/query`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryDescription {
    #[serde(default)]
    pub select: Option<Vec<String>>,

    #[serde(rename = "where", default)]
    pub conditions: Option<Vec<Condition>>,

    #[serde(default)]
    pub order_by: Option<OrderBy>,

    #[serde(default)]
    pub limit: Option<usize>,

    #[serde(default)]
    pub offset: Option<usize>,

    #[serde(default)]
    pub markets: Option<Vec<String>>,
}

impl QueryDescription {
    /// Parse a raw JSON body.
    pub fn from_value(value: Value) -> Result<Self, QueryError> {
        serde_json::from_value(value).map_err(|e| QueryError::InvalidDescription(e.to_string()))
    }
}

/// One `where` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct Condition {
    pub column: String,
    pub op: String,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderBy {
    pub column: String,
    #[serde(default)]
    pub ascending: bool,
}

/// Translate a description into a scanner query.
pub fn translate(
    description: &QueryDescription,
    default_markets: &[String],
) -> Result<ScreenerQuery, QueryError> {
    let market_list = match &description.markets {
        Some(requested) if !requested.is_empty() => {
            for market in requested {
                markets::validate(market)?;
            }
            requested.clone()
        }
        _ => default_markets.to_vec(),
    };

    let mut query = ScreenerQuery::new(market_list);

    if let Some(select) = &description.select {
        let columns = select
            .iter()
            .map(|name| Field::resolve(name))
            .collect::<Result<Vec<_>, _>>()?;
        query = query.select(columns);
    }

    if let Some(conditions) = &description.conditions {
        for condition in conditions {
            let field = Field::resolve(&condition.column)?;
            let op: FilterOp = condition.op.parse()?;
            query = query.filter(Filter::new(field, op, condition.value.clone())?);
        }
    }

    if let Some(order_by) = &description.order_by {
        let field = Field::resolve(&order_by.column)?;
        query = query.order_by(field, order_by.ascending);
    }

    if let Some(limit) = description.limit {
        query = query.limit(limit);
    }
    if let Some(offset) = description.offset {
        query = query.offset(offset);
    }

    Ok(query)
}

/// Execute a composed query and flatten the result.
///
/// When the query carries an explicit limit, at most that many rows are returned
/// even if the provider sends more.
pub async fn run_query(
    query: &ScreenerQuery,
    provider: &dyn ScreenerProvider,
) -> Result<Vec<Record>, QueryError> {
    let table = provider.scan(query).await?;

    debug!(
        provider = provider.name(),
        rows = table.len(),
        total = table.total_count,
        "Scan completed"
    );

    let mut records = table.into_records();
    if let Some(limit) = query.explicit_limit() {
        records.truncate(limit);
    }
    Ok(records)
}

/// Translate a description, run it against the provider, and flatten the rows.
pub async fn translate_and_run(
    description: &QueryDescription,
    provider: &dyn ScreenerProvider,
) -> Result<Vec<Record>, QueryError> {
    let query = translate(description, provider.default_markets())?;
    let records = run_query(&query, provider).await?;

    Ok(match &description.select {
        Some(selected) => key_by_selected_names(records, selected, query.columns()),
        None => records,
    })
}

/// Re-key record columns from scanner names to the names the caller selected.
///
/// `selected` and `fields` are parallel: `fields[i]` was resolved from `selected[i]`.
fn key_by_selected_names(records: Vec<Record>, selected: &[String], fields: &[Field]) -> Vec<Record> {
    let renames: Vec<(&str, &str)> = fields
        .iter()
        .zip(selected)
        .map(|(field, name)| (field.wire_name(), name.as_str()))
        .filter(|(wire, name)| wire != name)
        .collect();
    if renames.is_empty() {
        return records;
    }

    records
        .into_iter()
        .map(|record| {
            record
                .into_iter()
                .map(|(column, value)| {
                    let column = renames
                        .iter()
                        .find(|(wire, _)| *wire == column)
                        .map_or(column, |(_, name)| name.to_string());
                    (column, value)
                })
                .collect()
        })
        .collect()
}
