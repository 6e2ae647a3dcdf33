//! Druid query construction and transport

pub mod aggregation;
pub mod client;
pub mod filter;
pub mod query;

pub use aggregation::{Aggregation, AggregationKind, ArithmeticFn, PostAggregation};
pub use client::{DruidBackend, DruidResponse, HttpDruidClient};
pub use filter::Filter;
pub use query::{
    interval, timeseries_query, top_n_query, DruidQuery, DruidRequest, QueryType, DRUID_TIMEOUT,
};
