//! MediaWiki history API integration tests
//!
//! The router is driven end to end with an in-process Druid stand-in that
//! records every query it receives and answers with a canned reply.

use anyhow::anyhow;
use aqs::api::{create_api_router, AppState, CACHE_CONTROL};
use aqs::config::{DruidConfig, DruidDatasources};
use aqs::druid::{DruidBackend, DruidRequest, DruidResponse};
use aqs::history::MetricsQueryBuilder;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

enum Reply {
    Answer(DruidResponse),
    Unreachable,
}

struct FakeDruid {
    reply: Reply,
    seen: Mutex<Vec<Value>>,
}

impl FakeDruid {
    fn answering(status: u16, body: Value) -> Arc<Self> {
        Arc::new(Self {
            reply: Reply::Answer(DruidResponse { status, body }),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn unreachable() -> Arc<Self> {
        Arc::new(Self {
            reply: Reply::Unreachable,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn queries(&self) -> Vec<Value> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl DruidBackend for FakeDruid {
    async fn query(&self, request: &DruidRequest) -> anyhow::Result<DruidResponse> {
        self.seen
            .lock()
            .unwrap()
            .push(serde_json::to_value(&request.body).unwrap());
        match &self.reply {
            Reply::Answer(response) => Ok(response.clone()),
            Reply::Unreachable => Err(anyhow!("connection refused")),
        }
    }
}

fn druid_config() -> DruidConfig {
    DruidConfig {
        scheme: Some("http".to_string()),
        host: Some("druid.test".to_string()),
        port: Some(8082),
        query_path: Some("/druid/v2/".to_string()),
        datasources: DruidDatasources {
            mediawiki_history: Some("mediawiki_history_reduced".to_string()),
        },
    }
}

fn app(backend: Arc<FakeDruid>, druid: DruidConfig) -> Router {
    create_api_router(Arc::new(AppState {
        backend,
        builder: MetricsQueryBuilder::new(druid),
    }))
}

async fn get(router: Router, uri: &str) -> (StatusCode, Option<String>, Value) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let cache_control = response
        .headers()
        .get(header::CACHE_CONTROL)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, cache_control, body)
}

#[tokio::test]
async fn test_health() {
    let (status, _, body) = get(app(FakeDruid::unreachable(), druid_config()), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "OK");
}

#[tokio::test]
async fn test_both_dates_invalid_reports_both() {
    let druid = FakeDruid::answering(200, json!([]));
    let (status, _, body) = get(
        app(Arc::clone(&druid), druid_config()),
        "/edits/aggregate/en.wikipedia/all-editor-types/all-page-types/daily/2017-01-01/garbage",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["type"], "invalid_request");
    assert_eq!(
        body["detail"],
        json!([
            "start timestamp is invalid, must be a valid date in YYYYMMDD format",
            "end timestamp is invalid, must be a valid date in YYYYMMDD format"
        ])
    );
    assert!(druid.queries().is_empty());
}

#[tokio::test]
async fn test_unknown_granularity_and_editor_type() {
    let druid = FakeDruid::answering(200, json!([]));
    let (status, _, body) = get(
        app(Arc::clone(&druid), druid_config()),
        "/edited-pages/new/en.wikipedia/robots/all-page-types/weekly/20170101/20170102",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"].as_array().unwrap().len(), 2);
    assert!(druid.queries().is_empty());
}

#[tokio::test]
async fn test_new_pages_keeps_only_the_metric() {
    let druid = FakeDruid::answering(
        200,
        json!([
            {"timestamp": "2017-01-01T00:00:00.000Z",
             "result": {"new_pages": 12, "tmp": 14, "pages_created": 13,
                        "pages_deleted": 2, "pages_restored": 1}}
        ]),
    );
    let (status, cache_control, body) = get(
        app(Arc::clone(&druid), druid_config()),
        "/edited-pages/new/EN.wikipedia.org/user/content/daily/20170101/2017010200",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(cache_control.as_deref(), Some(CACHE_CONTROL));
    assert_eq!(
        body,
        json!({"items": [{
            "project": "en.wikipedia",
            "editor-type": "user",
            "page-type": "content",
            "granularity": "daily",
            "results": [{"timestamp": "2017-01-01T00:00:00.000Z", "new_pages": 12}]
        }]})
    );

    let queries = druid.queries();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0]["dataSource"], "mediawiki_history_reduced");
    assert_eq!(queries[0]["intervals"], json!(["2017-01-01/2017-01-02"]));
}

#[tokio::test]
async fn test_all_values_filter_differently_for_events_and_digests() {
    let events = FakeDruid::answering(200, json!([]));
    let (status, _, _) = get(
        app(Arc::clone(&events), druid_config()),
        "/edits/aggregate/all-projects/all-editor-types/all-page-types/daily/20170101/20170102",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        events.queries()[0]["filter"]["fields"],
        json!([
            {"type": "selector", "dimension": "event_entity", "value": "revision"},
            {"type": "selector", "dimension": "event_type", "value": "create"}
        ])
    );

    let digests = FakeDruid::answering(200, json!([]));
    let (status, _, _) = get(
        app(Arc::clone(&digests), druid_config()),
        "/editors/aggregate/en.wikipedia/all-editor-types/all-page-types/all-activity-levels/monthly/20170101/20170301",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let query = &digests.queries()[0];
    assert_eq!(query["granularity"], "month");
    assert_eq!(query["intervals"], json!(["2017-01-01/2017-04-01"]));
    assert_eq!(
        query["filter"]["fields"],
        json!([
            {"type": "selector", "dimension": "event_entity", "value": "user"},
            {"type": "selector", "dimension": "event_type", "value": "monthly_digest"},
            {"type": "selector", "dimension": "project", "value": "en.wikipedia"},
            {"type": "selector", "dimension": "user_type", "value": "all"},
            {"type": "selector", "dimension": "page_type", "value": "all"}
        ])
    );
}

#[tokio::test]
async fn test_digest_rejects_aggregated_projects() {
    let druid = FakeDruid::answering(200, json!([]));
    let (status, _, body) = get(
        app(Arc::clone(&druid), druid_config()),
        "/edited-pages/aggregate/all-wikipedia-projects/all-editor-types/all-page-types/all-activity-levels/daily/20170101/20170102",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["type"], "invalid_request");
    assert!(druid.queries().is_empty());
}

#[tokio::test]
async fn test_top_editors_are_ranked_and_ips_hidden() {
    let druid = FakeDruid::answering(
        200,
        json!([
            {"timestamp": "2017-01-01T00:00:00.000Z", "result": [
                {"user_text": "Alice", "edits": 40},
                {"user_text": "10.0.0.7", "edits": 12}
            ]}
        ]),
    );
    let (status, _, body) = get(
        app(Arc::clone(&druid), druid_config()),
        "/editors/top-by-edits/en.wikipedia/all-editor-types/content/2017/01/all-days",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let item = &body["items"][0];
    assert_eq!(item["granularity"], "monthly");
    assert_eq!(
        item["results"][0]["top"],
        json!([
            {"user_text": "Alice", "edits": 40, "rank": 1},
            {"user_text": null, "edits": 12, "rank": 2}
        ])
    );

    let query = &druid.queries()[0];
    assert_eq!(query["queryType"], "topN");
    assert_eq!(query["dimension"], "user_text");
    assert_eq!(query["intervals"], json!(["2017-01-01/2017-02-01"]));
}

#[tokio::test]
async fn test_per_page_route_uses_title() {
    let druid = FakeDruid::answering(200, json!([]));
    let (status, _, body) = get(
        app(Arc::clone(&druid), druid_config()),
        "/bytes-difference/net/per-page/en.wikipedia/Main%20Page/all-editor-types/daily/20170101/20170102",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"][0]["page-title"], "Main_Page");
    let query = &druid.queries()[0];
    assert_eq!(query["aggregations"][0]["name"], "net_bytes_diff");
}

#[tokio::test]
async fn test_engine_not_found_is_explained() {
    let druid = FakeDruid::answering(404, Value::Null);
    let (status, cache_control, body) = get(
        app(druid, druid_config()),
        "/registered-users/new/en.wikipedia/daily/20170101/20170102",
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(cache_control.is_none());
    assert_eq!(body["type"], "not_found");
    assert!(body["description"]
        .as_str()
        .unwrap()
        .starts_with("The date(s) you used are valid"));
}

#[tokio::test]
async fn test_engine_error_status_is_passed_through() {
    let druid = FakeDruid::answering(500, json!("out of memory"));
    let (status, _, body) = get(
        app(druid, druid_config()),
        "/registered-users/new/en.wikipedia/daily/20170101/20170102",
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let text = body.as_str().unwrap();
    assert!(text.contains("analytics@wikimedia.org"));
    assert!(text.ends_with("out of memory"));
}

#[tokio::test]
async fn test_unreachable_engine_is_service_unavailable() {
    let (status, _, body) = get(
        app(FakeDruid::unreachable(), druid_config()),
        "/registered-users/new/en.wikipedia/daily/20170101/20170102",
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["type"], "server_error");
}

#[tokio::test]
async fn test_unconfigured_engine_is_internal_error() {
    let druid = FakeDruid::answering(200, json!([]));
    let (status, _, body) = get(
        app(Arc::clone(&druid), DruidConfig::default()),
        "/registered-users/new/en.wikipedia/daily/20170101/20170102",
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["type"], "internal_error");
    assert_eq!(body["detail"], "Druid configuration not set");
    assert!(druid.queries().is_empty());
}
