//! Registry of scanner fields.
//!
//! Every column the proxy can select, filter, or sort by is listed here. A
//! field can be named either by its identifier (`market_cap_basic`,
//! `recommend_all`) or by the scanner's own column name (`Recommend.All`).

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::QueryError;

macro_rules! fields {
    ($($variant:ident => $ident:literal, $wire:literal;)+) => {
        /// A known scanner column.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Field {
            $($variant,)+
        }

        impl Field {
            /// Every registered field, in registry order.
            pub const ALL: &'static [Field] = &[$(Field::$variant,)+];

            /// Identifier accepted in query descriptions.
            pub const fn ident(self) -> &'static str {
                match self {
                    $(Field::$variant => $ident,)+
                }
            }

            /// Column name sent to the scanner.
            ///
            /// Scan results come back keyed by this name; the translator
            /// re-keys selected columns to the name the caller used.
            pub const fn wire_name(self) -> &'static str {
                match self {
                    $(Field::$variant => $wire,)+
                }
            }
        }
    };
}

fields! {
    // Descriptive
    Name => "name", "name";
    Description => "description", "description";
    Exchange => "exchange", "exchange";
    Type => "type", "type";
    Subtype => "subtype", "subtype";
    Currency => "currency", "currency";
    Sector => "sector", "sector";
    Industry => "industry", "industry";
    Country => "country", "country";
    Logoid => "logoid", "logoid";

    // Price and volume
    Close => "close", "close";
    Open => "open", "open";
    High => "high", "high";
    Low => "low", "low";
    Volume => "volume", "volume";
    Change => "change", "change";
    ChangeAbs => "change_abs", "change_abs";
    ChangeFromOpen => "change_from_open", "change_from_open";
    Gap => "gap", "gap";
    PremarketChange => "premarket_change", "premarket_change";
    PostmarketChange => "postmarket_change", "postmarket_change";
    RelativeVolume => "relative_volume_10d_calc", "relative_volume_10d_calc";
    AverageVolume10d => "average_volume_10d_calc", "average_volume_10d_calc";
    AverageVolume30d => "average_volume_30d_calc", "average_volume_30d_calc";
    Vwap => "vwap", "VWAP";
    Atr => "atr", "ATR";
    VolatilityDay => "volatility_d", "Volatility.D";
    High52Week => "price_52_week_high", "price_52_week_high";
    Low52Week => "price_52_week_low", "price_52_week_low";
    HighAllTime => "high_all", "High.All";
    LowAllTime => "low_all", "Low.All";

    // Fundamentals
    MarketCap => "market_cap_basic", "market_cap_basic";
    PriceEarnings => "price_earnings_ttm", "price_earnings_ttm";
    EarningsPerShare => "earnings_per_share_basic_ttm", "earnings_per_share_basic_ttm";
    PriceBook => "price_book_ratio", "price_book_ratio";
    DividendYield => "dividend_yield_recent", "dividend_yield_recent";
    ReturnOnEquity => "return_on_equity", "return_on_equity";
    GrossMargin => "gross_margin", "gross_margin";
    NetMargin => "net_margin", "net_margin";
    DebtToEquity => "debt_to_equity", "debt_to_equity";
    TotalRevenue => "total_revenue", "total_revenue";
    NumberOfEmployees => "number_of_employees", "number_of_employees";
    Beta1Year => "beta_1_year", "beta_1_year";

    // Ratings and oscillators
    RecommendAll => "recommend_all", "Recommend.All";
    RecommendMa => "recommend_ma", "Recommend.MA";
    RecommendOther => "recommend_other", "Recommend.Other";
    Rsi => "rsi", "RSI";
    Rsi7 => "rsi7", "RSI7";
    MacdMacd => "macd_macd", "MACD.macd";
    MacdSignal => "macd_signal", "MACD.signal";
    Adx => "adx", "ADX";
    StochK => "stoch_k", "Stoch.K";
    StochD => "stoch_d", "Stoch.D";
    Cci20 => "cci20", "CCI20";
    Momentum => "mom", "Mom";

    // Moving averages and bands
    Ema20 => "ema20", "EMA20";
    Ema50 => "ema50", "EMA50";
    Ema200 => "ema200", "EMA200";
    Sma20 => "sma20", "SMA20";
    Sma50 => "sma50", "SMA50";
    Sma200 => "sma200", "SMA200";
    BbUpper => "bb_upper", "BB.upper";
    BbLower => "bb_lower", "BB.lower";

    // Performance
    PerfWeek => "perf_w", "Perf.W";
    Perf1Month => "perf_1m", "Perf.1M";
    Perf3Month => "perf_3m", "Perf.3M";
    Perf6Month => "perf_6m", "Perf.6M";
    PerfYtd => "perf_ytd", "Perf.YTD";
    PerfYear => "perf_y", "Perf.Y";
}

impl Field {
    /// Resolve a user-supplied column name.
    pub fn resolve(name: &str) -> Result<Self, QueryError> {
        name.parse()
    }
}

impl FromStr for Field {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .iter()
            .copied()
            .find(|f| f.ident() == s || f.wire_name() == s)
            .ok_or_else(|| QueryError::UnknownField(s.to_string()))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wire_name())
    }
}
