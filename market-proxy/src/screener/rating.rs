//! Technical rating labels.
//!
//! The scanner's `Recommend.*` columns are scores in `[-1, 1]`. These map to
//! five labels with fixed thresholds.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TechnicalRating {
    #[serde(rename = "Strong Buy")]
    StrongBuy,
    Buy,
    Neutral,
    Sell,
    #[serde(rename = "Strong Sell")]
    StrongSell,
}

impl TechnicalRating {
    /// Classify a score. `None` for NaN or infinite input.
    pub fn from_score(score: f64) -> Option<Self> {
        if !score.is_finite() {
            return None;
        }

        let rating = if score >= 0.5 {
            Self::StrongBuy
        } else if score >= 0.1 {
            Self::Buy
        } else if score >= -0.1 {
            Self::Neutral
        } else if score >= -0.5 {
            Self::Sell
        } else {
            Self::StrongSell
        };
        Some(rating)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::StrongBuy => "Strong Buy",
            Self::Buy => "Buy",
            Self::Neutral => "Neutral",
            Self::Sell => "Sell",
            Self::StrongSell => "Strong Sell",
        }
    }
}

impl fmt::Display for TechnicalRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(1.0, "Strong Buy")]
    #[test_case(0.5, "Strong Buy")]
    #[test_case(0.49, "Buy")]
    #[test_case(0.1, "Buy")]
    #[test_case(0.0, "Neutral")]
    #[test_case(-0.1, "Neutral")]
    #[test_case(-0.3, "Sell")]
    #[test_case(-0.5, "Sell")]
    #[test_case(-0.51, "Strong Sell")]
    #[test_case(-1.0, "Strong Sell")]
    fn test_thresholds(score: f64, expected: &str) {
        assert_eq!(TechnicalRating::from_score(score).unwrap().label(), expected);
    }

    #[test]
    fn test_non_finite() {
        assert!(TechnicalRating::from_score(f64::NAN).is_none());
        assert!(TechnicalRating::from_score(f64::INFINITY).is_none());
    }

    #[test]
    fn test_serializes_as_label() {
        assert_eq!(
            serde_json::to_string(&TechnicalRating::StrongSell).unwrap(),
            r#""Strong Sell""#
        );
    }
}
