use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::aggregation::{Aggregation, PostAggregation};
use super::filter::Filter;

/// Transport timeout attached to every analytical request.
pub const DRUID_TIMEOUT: Duration = Duration::from_secs(10);

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Druid expects a list of intervals even for a single `start/end` span.
pub fn interval(start: &str, end: &str) -> Vec<String> {
    vec![format!("{start}/{end}")]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryType {
    #[serde(rename = "timeseries")]
    Timeseries,
    #[serde(rename = "topN")]
    TopN,
}

/// Query body. Field order is the wire order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DruidQuery {
    pub query_type: QueryType,
    pub data_source: String,
    pub granularity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    pub filter: Filter,
    pub aggregations: Vec<Aggregation>,
    pub post_aggregations: Vec<PostAggregation>,
    pub intervals: Vec<String>,
}

/// A query plus where and how to send it.
#[derive(Debug, Clone, PartialEq)]
pub struct DruidRequest {
    pub uri: String,
    pub headers: BTreeMap<String, String>,
    pub body: DruidQuery,
    pub timeout: Duration,
}

impl DruidRequest {
    fn new(uri: impl Into<String>, body: DruidQuery) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), JSON_CONTENT_TYPE.to_string());
        Self {
            uri: uri.into(),
            headers,
            body,
            timeout: DRUID_TIMEOUT,
        }
    }

    pub fn body_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.body)
    }
}

pub fn timeseries_query(
    uri: impl Into<String>,
    data_source: impl Into<String>,
    granularity: impl Into<String>,
    filter: Filter,
    aggregations: Vec<Aggregation>,
    post_aggregations: Vec<PostAggregation>,
    intervals: Vec<String>,
) -> DruidRequest {
    DruidRequest::new(
        uri,
        DruidQuery {
            query_type: QueryType::Timeseries,
            data_source: data_source.into(),
            granularity: granularity.into(),
            dimension: None,
            threshold: None,
            metric: None,
            filter,
            aggregations,
            post_aggregations,
            intervals,
        },
    )
}

#[allow(clippy::too_many_arguments)]
pub fn top_n_query(
    uri: impl Into<String>,
    data_source: impl Into<String>,
    granularity: impl Into<String>,
    dimension: impl Into<String>,
    threshold: u32,
    metric: impl Into<String>,
    filter: Filter,
    aggregations: Vec<Aggregation>,
    post_aggregations: Vec<PostAggregation>,
    intervals: Vec<String>,
) -> DruidRequest {
    DruidRequest::new(
        uri,
        DruidQuery {
            query_type: QueryType::TopN,
            data_source: data_source.into(),
            granularity: granularity.into(),
            dimension: Some(dimension.into()),
            threshold: Some(threshold),
            metric: Some(metric.into()),
            filter,
            aggregations,
            post_aggregations,
            intervals,
        },
    )
}
