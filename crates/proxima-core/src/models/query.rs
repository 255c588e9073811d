//! Dialect-neutral description of what a proximity search adds to a query.
//!
//! Storage adapters translate these nodes into their own syntax.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::coords::Coordinates;
use super::options::Units;

/// Alias of the computed distance column
pub const DISTANCE_COLUMN: &str = "distance";

/// A literal value compared against a stored subfield
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Number(f64),
}

impl Scalar {
    /// Strings and finite numbers are scalars; everything else is not
    pub fn from_value(value: &Value) -> Option<Scalar> {
        match value {
            Value::String(s) => Some(Scalar::Text(s.clone())),
            Value::Number(n) => n.as_f64().filter(|n| n.is_finite()).map(Scalar::Number),
            _ => None,
        }
    }

    /// Equality as a storage engine would evaluate `column = value`.
    ///
    /// Numbers compare numerically, also against numeric text.
    pub fn matches(&self, stored: &Scalar) -> bool {
        match (self, stored) {
            (Scalar::Text(a), Scalar::Text(b)) => a == b,
            (Scalar::Number(a), Scalar::Number(b)) => a == b,
            (Scalar::Number(n), Scalar::Text(t)) | (Scalar::Text(t), Scalar::Number(n)) => {
                t.trim().parse::<f64>().is_ok_and(|parsed| parsed == *n)
            }
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(s) => write!(f, "{}", s),
            Scalar::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Great-circle distance from a fixed centre to each record's coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceExpr {
    pub center: Coordinates,
    pub units: Units,

    /// Sphere radius in `units`
    pub radius: f64,
}

/// Expression of a computed column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnExpr {
    /// Always NULL
    Null,

    /// Distance from the search centre
    Distance(DistanceExpr),

    /// Another computed column, by alias
    Alias(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedColumn {
    pub alias: String,
    pub expr: ColumnExpr,
}

impl ComputedColumn {
    pub fn new(alias: impl Into<String>, expr: ColumnExpr) -> Self {
        Self { alias: alias.into(), expr }
    }
}

/// Restricts candidate records to rows of one address field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Join {
    pub field_id: u64,

    /// Also require the address row's site to match the element's site
    pub match_element_site: bool,
}

/// Upper bound of a distance predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Bound {
    /// Fixed range
    Fixed(f64),

    /// Per-record value of a numeric column
    Column(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    /// `distance <= bound`
    DistanceWithin(Bound),

    /// `subfield = v1 OR subfield = v2 ...`
    SubfieldIn { subfield: String, values: Vec<Scalar> },

    /// `NOT (lat IS NULL OR lng IS NULL)`
    HasCoordinates,
}

/// Where a predicate is evaluated relative to aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Placement {
    /// On raw rows (a WHERE clause)
    PreAggregation,

    /// On the grouped result (a HAVING clause)
    PostAggregation,
}

impl Placement {
    /// Placement of predicates on computed columns for a storage dialect
    pub fn for_computed_columns(post_aggregation_only: bool) -> Self {
        if post_aggregation_only {
            Placement::PostAggregation
        } else {
            Placement::PreAggregation
        }
    }
}
