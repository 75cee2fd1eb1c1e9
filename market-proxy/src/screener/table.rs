//! Tabular scan results and their row-oriented form.

use serde::Serialize;
use serde_json::{Map, Value};

/// One result row keyed by column name, in table column order.
pub type Record = Map<String, Value>;

/// Column name of the symbol column every scan result starts with.
pub const TICKER_COLUMN: &str = "ticker";

/// Result of executing a scan: a header plus positional rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanTable {
    /// Number of matches upstream, before the result window was applied
    pub total_count: u64,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ScanTable {
    pub fn new(total_count: u64, columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            total_count,
            columns,
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Flatten into records, keeping row and column order.
    ///
    /// Short rows are padded with `null`; values past the last column are dropped.
    pub fn into_records(self) -> Vec<Record> {
        let columns = self.columns;
        self.rows
            .into_iter()
            .map(|row| {
                let mut values = row.into_iter();
                columns
                    .iter()
                    .map(|column| (column.clone(), values.next().unwrap_or(Value::Null)))
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_into_records_keeps_column_order() {
        let table = ScanTable::new(
            2,
            vec!["ticker".into(), "name".into(), "close".into()],
            vec![
                vec![json!("NASDAQ:AAPL"), json!("AAPL"), json!(190.5)],
                vec![json!("NASDAQ:MSFT"), json!("MSFT"), json!(410.1)],
            ],
        );

        let records = table.into_records();
        assert_eq!(records.len(), 2);

        let keys: Vec<_> = records[0].keys().map(String::as_str).collect();
        assert_eq!(keys, ["ticker", "name", "close"]);
        assert_eq!(records[1]["name"], "MSFT");
    }

    #[test]
    fn test_ragged_rows() {
        let table = ScanTable::new(
            1,
            vec!["a".into(), "b".into()],
            vec![vec![json!(1)], vec![json!(1), json!(2), json!(3)]],
        );

        let records = table.into_records();
        assert_eq!(serde_json::to_value(&records).unwrap(), json!([{"a": 1, "b": null}, {"a": 1, "b": 2}]));
    }
}
