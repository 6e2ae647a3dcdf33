use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use super::filter::Filter;

/// The `{type, name, fieldName}` aggregator family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregationKind {
    LongSum,
    DoubleSum,
    LongMin,
    LongMax,
    DoubleMin,
    DoubleMax,
    LongFirst,
    LongLast,
    DoubleFirst,
    DoubleLast,
}

impl AggregationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationKind::LongSum => "longSum",
            AggregationKind::DoubleSum => "doubleSum",
            AggregationKind::LongMin => "longMin",
            AggregationKind::LongMax => "longMax",
            AggregationKind::DoubleMin => "doubleMin",
            AggregationKind::DoubleMax => "doubleMax",
            AggregationKind::LongFirst => "longFirst",
            AggregationKind::LongLast => "longLast",
            AggregationKind::DoubleFirst => "doubleFirst",
            AggregationKind::DoubleLast => "doubleLast",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Aggregation {
    Count {
        name: String,
    },
    Simple {
        kind: AggregationKind,
        name: String,
        field_name: String,
    },
    Cardinality {
        name: String,
        fields: Vec<String>,
    },
    Filtered {
        filter: Filter,
        aggregator: Box<Aggregation>,
    },
}

impl Aggregation {
    pub fn count(name: impl Into<String>) -> Self {
        Aggregation::Count { name: name.into() }
    }

    pub fn simple(
        kind: AggregationKind,
        name: impl Into<String>,
        field_name: impl Into<String>,
    ) -> Self {
        Aggregation::Simple {
            kind,
            name: name.into(),
            field_name: field_name.into(),
        }
    }

    pub fn long_sum(name: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self::simple(AggregationKind::LongSum, name, field_name)
    }

    pub fn double_sum(name: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self::simple(AggregationKind::DoubleSum, name, field_name)
    }

    pub fn long_min(name: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self::simple(AggregationKind::LongMin, name, field_name)
    }

    pub fn long_max(name: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self::simple(AggregationKind::LongMax, name, field_name)
    }

    pub fn double_min(name: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self::simple(AggregationKind::DoubleMin, name, field_name)
    }

    pub fn double_max(name: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self::simple(AggregationKind::DoubleMax, name, field_name)
    }

    pub fn long_first(name: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self::simple(AggregationKind::LongFirst, name, field_name)
    }

    pub fn long_last(name: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self::simple(AggregationKind::LongLast, name, field_name)
    }

    pub fn double_first(name: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self::simple(AggregationKind::DoubleFirst, name, field_name)
    }

    pub fn double_last(name: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self::simple(AggregationKind::DoubleLast, name, field_name)
    }

    pub fn cardinality(name: impl Into<String>, fields: Vec<String>) -> Self {
        Aggregation::Cardinality {
            name: name.into(),
            fields,
        }
    }

    pub fn filtered(filter: Filter, aggregator: Aggregation) -> Self {
        Aggregation::Filtered {
            filter,
            aggregator: Box::new(aggregator),
        }
    }

    /// Output name, looking through `filtered` wrappers.
    pub fn name(&self) -> &str {
        match self {
            Aggregation::Count { name }
            | Aggregation::Simple { name, .. }
            | Aggregation::Cardinality { name, .. } => name,
            Aggregation::Filtered { aggregator, .. } => aggregator.name(),
        }
    }
}

impl Serialize for Aggregation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Aggregation::Count { name } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "count")?;
                map.serialize_entry("name", name)?;
                map.end()
            }
            Aggregation::Simple {
                kind,
                name,
                field_name,
            } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("type", kind.as_str())?;
                map.serialize_entry("name", name)?;
                map.serialize_entry("fieldName", field_name)?;
                map.end()
            }
            Aggregation::Cardinality { name, fields } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("type", "cardinality")?;
                map.serialize_entry("name", name)?;
                map.serialize_entry("fields", fields)?;
                map.end()
            }
            Aggregation::Filtered { filter, aggregator } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("type", "filtered")?;
                map.serialize_entry("filter", filter)?;
                map.serialize_entry("aggregator", aggregator)?;
                map.end()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArithmeticFn {
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "-")]
    Minus,
    #[serde(rename = "*")]
    Times,
    #[serde(rename = "/")]
    Divide,
    #[serde(rename = "quotient")]
    Quotient,
}

/// Values computed from already aggregated fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum PostAggregation {
    #[serde(rename = "fieldAccess")]
    FieldAccess {
        #[serde(rename = "fieldName")]
        field_name: String,
    },
    #[serde(rename = "arithmetic")]
    Arithmetic {
        name: String,
        #[serde(rename = "fn")]
        func: ArithmeticFn,
        fields: Vec<PostAggregation>,
    },
}

impl PostAggregation {
    pub fn field_access(field_name: impl Into<String>) -> Self {
        PostAggregation::FieldAccess {
            field_name: field_name.into(),
        }
    }

    pub fn arithmetic(
        func: ArithmeticFn,
        name: impl Into<String>,
        fields: Vec<PostAggregation>,
    ) -> Self {
        PostAggregation::Arithmetic {
            name: name.into(),
            func,
            fields,
        }
    }

    pub fn plus(name: impl Into<String>, fields: Vec<PostAggregation>) -> Self {
        Self::arithmetic(ArithmeticFn::Plus, name, fields)
    }

    pub fn minus(name: impl Into<String>, fields: Vec<PostAggregation>) -> Self {
        Self::arithmetic(ArithmeticFn::Minus, name, fields)
    }

    pub fn times(name: impl Into<String>, fields: Vec<PostAggregation>) -> Self {
        Self::arithmetic(ArithmeticFn::Times, name, fields)
    }

    pub fn divide(name: impl Into<String>, fields: Vec<PostAggregation>) -> Self {
        Self::arithmetic(ArithmeticFn::Divide, name, fields)
    }

    pub fn quotient(name: impl Into<String>, fields: Vec<PostAggregation>) -> Self {
        Self::arithmetic(ArithmeticFn::Quotient, name, fields)
    }
}
