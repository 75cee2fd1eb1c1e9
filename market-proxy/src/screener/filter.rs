//! Filter operators and filter expressions.

use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use super::{Field, QueryError};

/// Shape of the right-hand value an operator expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    /// No value; anything supplied is dropped
    None,
    /// Any non-null value
    Scalar,
    /// Array of exactly two elements
    Pair,
    /// Non-empty array
    List,
}

/// Comparison operator understood by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
    Equal,
    NotEqual,
    InRange,
    NotInRange,
    Empty,
    NotEmpty,
    Crosses,
    CrossesAbove,
    CrossesBelow,
    Match,
    NotMatch,
    Has,
    HasNoneOf,
    AbovePercent,
    BelowPercent,
    InRangePercent,
    NotInRangePercent,
}

impl FilterOp {
    /// Operator name sent to the scanner.
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Greater => "greater",
            Self::GreaterOrEqual => "egreater",
            Self::Less => "less",
            Self::LessOrEqual => "eless",
            Self::Equal => "equal",
            Self::NotEqual => "nequal",
            Self::InRange => "in_range",
            Self::NotInRange => "not_in_range",
            Self::Empty => "empty",
            Self::NotEmpty => "nempty",
            Self::Crosses => "crosses",
            Self::CrossesAbove => "crosses_above",
            Self::CrossesBelow => "crosses_below",
            Self::Match => "match",
            Self::NotMatch => "nmatch",
            Self::Has => "has",
            Self::HasNoneOf => "has_none_of",
            Self::AbovePercent => "above%",
            Self::BelowPercent => "below%",
            Self::InRangePercent => "in_range%",
            Self::NotInRangePercent => "not_in_range%",
        }
    }

    pub const fn value_shape(self) -> ValueShape {
        match self {
            Self::Empty | Self::NotEmpty => ValueShape::None,
            Self::InRange | Self::NotInRange | Self::InRangePercent | Self::NotInRangePercent => {
                ValueShape::Pair
            }
            Self::Has | Self::HasNoneOf => ValueShape::List,
            _ => ValueShape::Scalar,
        }
    }

    /// Check a right-hand value against this operator and normalize it.
    pub fn check_value(self, value: Value) -> Result<Value, QueryError> {
        let invalid = |reason: &str| QueryError::InvalidFilterValue {
            op: self.wire_name().to_string(),
            reason: reason.to_string(),
        };

        match (self.value_shape(), value) {
            (ValueShape::None, _) => Ok(Value::Null),
            (ValueShape::Scalar, Value::Null) => Err(invalid("a value is required")),
            (ValueShape::Pair, Value::Array(items)) if items.len() == 2 => Ok(Value::Array(items)),
            (ValueShape::Pair, _) => Err(invalid("expected an array of two values")),
            (ValueShape::List, Value::Array(items)) if !items.is_empty() => {
                Ok(Value::Array(items))
            }
            (ValueShape::List, _) => Err(invalid("expected a non-empty array")),
            (ValueShape::Scalar, value) => Ok(value),
        }
    }
}

impl FromStr for FilterOp {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s {
            ">" | "greater" => Self::Greater,
            ">=" | "egreater" => Self::GreaterOrEqual,
            "<" | "less" => Self::Less,
            "<=" | "eless" => Self::LessOrEqual,
            "==" | "=" | "equal" => Self::Equal,
            "!=" | "nequal" => Self::NotEqual,
            "in_range" | "between" => Self::InRange,
            "not_in_range" | "not_between" => Self::NotInRange,
            "empty" => Self::Empty,
            "nempty" | "not_empty" => Self::NotEmpty,
            "crosses" => Self::Crosses,
            "crosses_above" => Self::CrossesAbove,
            "crosses_below" => Self::CrossesBelow,
            "match" | "like" => Self::Match,
            "nmatch" | "not_like" => Self::NotMatch,
            "has" | "in" | "isin" => Self::Has,
            "has_none_of" | "not_in" => Self::HasNoneOf,
            "above%" => Self::AbovePercent,
            "below%" => Self::BelowPercent,
            "in_range%" => Self::InRangePercent,
            "not_in_range%" => Self::NotInRangePercent,
            other => return Err(QueryError::UnknownOperator(other.to_string())),
        };
        Ok(op)
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl Serialize for FilterOp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wire_name())
    }
}

/// One `left <op> right` filter expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Filter {
    pub left: Field,
    #[serde(rename = "operation")]
    pub op: FilterOp,
    pub right: Value,
}

impl Filter {
    /// Build a filter, checking the value against the operator.
    pub fn new(left: Field, op: FilterOp, right: Value) -> Result<Self, QueryError> {
        let right = op.check_value(right)?;
        Ok(Self { left, op, right })
    }
}
