//! Predefined screens.
//!
//! Canned queries addressable by identifier, e.g. `most_actives`.

use serde_json::json;
use std::str::FromStr;

use super::{Field, Filter, FilterOp, QueryError, ScreenerQuery};

/// Default row count for predefined screens.
pub const DEFAULT_SCREEN_COUNT: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredefinedScreen {
    MostActives,
    DayGainers,
    DayLosers,
    MostVolatile,
    Overbought,
    Oversold,
    TopMarketCap,
    StrongBuy,
}

impl PredefinedScreen {
    pub const ALL: &'static [PredefinedScreen] = &[
        Self::MostActives,
        Self::DayGainers,
        Self::DayLosers,
        Self::MostVolatile,
        Self::Overbought,
        Self::Oversold,
        Self::TopMarketCap,
        Self::StrongBuy,
    ];

    pub const fn id(self) -> &'static str {
        match self {
            Self::MostActives => "most_actives",
            Self::DayGainers => "day_gainers",
            Self::DayLosers => "day_losers",
            Self::MostVolatile => "most_volatile",
            Self::Overbought => "overbought",
            Self::Oversold => "oversold",
            Self::TopMarketCap => "top_market_cap",
            Self::StrongBuy => "strong_buy",
        }
    }

    /// Build the screen's query over `markets`, returning at most `count` rows.
    pub fn query(self, markets: Vec<String>, count: usize) -> ScreenerQuery {
        let base = ScreenerQuery::new(markets)
            .select([
                Field::Name,
                Field::Close,
                Field::Change,
                Field::Volume,
                Field::MarketCap,
            ])
            .limit(count);

        // Thresholds are constants; Filter::new cannot fail on them
        let filter = |field, op, value| Filter {
            left: field,
            op,
            right: value,
        };
        let large_cap = filter(Field::MarketCap, FilterOp::GreaterOrEqual, json!(2_000_000_000u64));
        let priced = filter(Field::Close, FilterOp::GreaterOrEqual, json!(5));

        match self {
            Self::MostActives => base
                .filter(large_cap)
                .order_by(Field::Volume, false),
            Self::DayGainers => base
                .filter(filter(Field::Change, FilterOp::Greater, json!(3)))
                .filter(priced)
                .filter(large_cap)
                .order_by(Field::Change, false),
            Self::DayLosers => base
                .filter(filter(Field::Change, FilterOp::Less, json!(-2.5)))
                .filter(priced)
                .filter(large_cap)
                .order_by(Field::Change, true),
            Self::MostVolatile => base
                .select([
                    Field::Name,
                    Field::Close,
                    Field::Change,
                    Field::VolatilityDay,
                    Field::Volume,
                ])
                .filter(filter(Field::Volume, FilterOp::Greater, json!(1_000_000)))
                .order_by(Field::VolatilityDay, false),
            Self::Overbought => base
                .select([Field::Name, Field::Close, Field::Change, Field::Rsi, Field::Volume])
                .filter(filter(Field::Rsi, FilterOp::Greater, json!(70)))
                .order_by(Field::Rsi, false),
            Self::Oversold => base
                .select([Field::Name, Field::Close, Field::Change, Field::Rsi, Field::Volume])
                .filter(filter(Field::Rsi, FilterOp::Less, json!(30)))
                .order_by(Field::Rsi, true),
            Self::TopMarketCap => base.order_by(Field::MarketCap, false),
            Self::StrongBuy => base
                .select([
                    Field::Name,
                    Field::Close,
                    Field::Change,
                    Field::RecommendAll,
                    Field::MarketCap,
                ])
                .filter(filter(Field::RecommendAll, FilterOp::GreaterOrEqual, json!(0.5)))
                .order_by(Field::MarketCap, false),
        }
    }
}

impl FromStr for PredefinedScreen {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|screen| screen.id() == s)
            .ok_or_else(|| QueryError::UnknownScreen(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screener::SortOrder;

    fn america() -> Vec<String> {
        vec!["america".to_string()]
    }

    #[test]
    fn test_parse_round_trip_ids() {
        for screen in PredefinedScreen::ALL {
            assert_eq!(screen.id().parse::<PredefinedScreen>().unwrap(), *screen);
        }
        assert!(matches!(
            "penny_stocks".parse::<PredefinedScreen>(),
            Err(QueryError::UnknownScreen(_))
        ));
    }

    #[test]
    fn test_count_becomes_limit() {
        for screen in PredefinedScreen::ALL {
            let query = screen.query(america(), 7);
            assert_eq!(query.range(), [0, 7]);
        }
    }

    #[test]
    fn test_day_losers_sorts_ascending() {
        let query = PredefinedScreen::DayLosers.query(america(), DEFAULT_SCREEN_COUNT);
        let sort = query.sort().unwrap();
        assert_eq!(sort.sort_by, Field::Change);
        assert_eq!(sort.sort_order, SortOrder::Asc);
        assert_eq!(query.filters().len(), 3);
    }

    #[test]
    fn test_filters_pass_value_checks() {
        for screen in PredefinedScreen::ALL {
            for filter in screen.query(america(), 10).filters() {
                assert!(filter.op.check_value(filter.right.clone()).is_ok());
            }
        }
    }
}
