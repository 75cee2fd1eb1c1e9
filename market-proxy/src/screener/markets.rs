//! Market scopes accepted by the scanner.

use super::QueryError;

/// Asset-class scopes that are not tied to a country.
pub const ASSET_CLASSES: &[&str] = &["crypto", "coin", "forex", "futures", "bonds", "cfd"];

/// Country stock markets.
pub const STOCK_MARKETS: &[&str] = &[
    "america",
    "argentina",
    "australia",
    "austria",
    "belgium",
    "brazil",
    "canada",
    "chile",
    "china",
    "colombia",
    "denmark",
    "egypt",
    "finland",
    "france",
    "germany",
    "greece",
    "hongkong",
    "india",
    "indonesia",
    "israel",
    "italy",
    "japan",
    "korea",
    "ksa",
    "malaysia",
    "mexico",
    "netherlands",
    "newzealand",
    "norway",
    "philippines",
    "poland",
    "portugal",
    "rsa",
    "singapore",
    "spain",
    "sweden",
    "switzerland",
    "taiwan",
    "thailand",
    "turkey",
    "uae",
    "uk",
    "vietnam",
];

/// Every market scope, stock markets first.
pub fn all() -> impl Iterator<Item = &'static str> {
    STOCK_MARKETS.iter().chain(ASSET_CLASSES).copied()
}

/// Check that a market name is known to the scanner.
pub fn validate(market: &str) -> Result<(), QueryError> {
    if all().any(|m| m == market) {
        Ok(())
    } else {
        Err(QueryError::UnknownMarket(market.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(validate("america").is_ok());
        assert!(validate("crypto").is_ok());
        assert!(matches!(
            validate("atlantis"),
            Err(QueryError::UnknownMarket(ref m)) if m == "atlantis"
        ));
    }

    #[test]
    fn test_all_lists_both_groups() {
        let markets: Vec<_> = all().collect();
        assert_eq!(markets.first(), Some(&"america"));
        assert_eq!(markets.len(), STOCK_MARKETS.len() + ASSET_CLASSES.len());
    }
}
