use serde::{Deserialize, Serialize};

/// Druid filter tree, serialized with its `type` tag first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Filter {
    Selector { dimension: String, value: String },
    Regex { dimension: String, pattern: String },
    And { fields: Vec<Filter> },
    Or { fields: Vec<Filter> },
    Not { field: Box<Filter> },
}

impl Filter {
    pub fn selector(dimension: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Selector {
            dimension: dimension.into(),
            value: value.into(),
        }
    }

    pub fn regex(dimension: impl Into<String>, pattern: impl Into<String>) -> Self {
        Filter::Regex {
            dimension: dimension.into(),
            pattern: pattern.into(),
        }
    }

    pub fn and(fields: Vec<Filter>) -> Self {
        Filter::And { fields }
    }

    pub fn or(fields: Vec<Filter>) -> Self {
        Filter::Or { fields }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(field: Filter) -> Self {
        Filter::Not {
            field: Box::new(field),
        }
    }
}
