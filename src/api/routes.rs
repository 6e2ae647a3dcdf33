use axum::{
    extract::{Path, State},
    routing::{get, MethodRouter},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::history::{DigestType, RevisionMetric, TimeseriesRequest, TopRequest, TopType};

use super::handlers::{
    digests, health_check, new_pages, newly_registered_users, revisions, revisions_top, AppState,
};

const AGGREGATE: &str = "{project}/{editor_type}/{page_type}/{granularity}/{start}/{end}";
const PER_PAGE: &str = "{project}/{page_title}/{editor_type}/{granularity}/{start}/{end}";
const PER_EDITOR: &str = "{project}/{user_text}/{page_type}/{granularity}/{start}/{end}";
const DIGEST: &str =
    "{project}/{editor_type}/{page_type}/{activity_level}/{granularity}/{start}/{end}";
const TOP: &str = "{project}/{editor_type}/{page_type}/{year}/{month}/{day}";

fn digest_route(digest: DigestType) -> MethodRouter<Arc<AppState>> {
    get(
        move |State(state): State<Arc<AppState>>, Path(req): Path<TimeseriesRequest>| async move {
            digests(state, digest, req).await
        },
    )
}

fn revisions_route(metric: RevisionMetric) -> MethodRouter<Arc<AppState>> {
    get(
        move |State(state): State<Arc<AppState>>, Path(req): Path<TimeseriesRequest>| async move {
            revisions(state, metric, req).await
        },
    )
}

fn top_route(top: TopType, metric: RevisionMetric) -> MethodRouter<Arc<AppState>> {
    get(
        move |State(state): State<Arc<AppState>>, Path(req): Path<TopRequest>| async move {
            revisions_top(state, top, metric, req).await
        },
    )
}

/// Path prefixes of the revision metrics and the metric each serves.
const REVISION_METRICS: [(&str, RevisionMetric); 3] = [
    ("/edits", RevisionMetric::Edits),
    ("/bytes-difference/net", RevisionMetric::NetBytesDiff),
    ("/bytes-difference/absolute", RevisionMetric::AbsBytesDiff),
];

const TOP_METRICS: [(&str, RevisionMetric); 3] = [
    ("top-by-edits", RevisionMetric::Edits),
    ("top-by-net-bytes-difference", RevisionMetric::NetBytesDiff),
    ("top-by-absolute-bytes-difference", RevisionMetric::AbsBytesDiff),
];

const TOP_TYPES: [(&str, TopType); 2] = [
    ("/editors", TopType::Editors),
    ("/edited-pages", TopType::EditedPages),
];

pub fn create_api_router(state: Arc<AppState>) -> Router {
    let mut metrics = Router::new()
        .route(&format!("/edited-pages/new/{AGGREGATE}"), get(new_pages))
        .route(
            "/registered-users/new/{project}/{granularity}/{start}/{end}",
            get(newly_registered_users),
        )
        .route(
            &format!("/editors/aggregate/{DIGEST}"),
            digest_route(DigestType::Editors),
        )
        .route(
            &format!("/edited-pages/aggregate/{DIGEST}"),
            digest_route(DigestType::EditedPages),
        );

    for (prefix, metric) in REVISION_METRICS {
        metrics = metrics
            .route(&format!("{prefix}/aggregate/{AGGREGATE}"), revisions_route(metric))
            .route(&format!("{prefix}/per-page/{PER_PAGE}"), revisions_route(metric))
            .route(&format!("{prefix}/per-editor/{PER_EDITOR}"), revisions_route(metric));
    }

    for (prefix, top) in TOP_TYPES {
        for (suffix, metric) in TOP_METRICS {
            metrics = metrics.route(&format!("{prefix}/{suffix}/{TOP}"), top_route(top, metric));
        }
    }

    Router::new()
        .route("/health", get(health_check))
        .merge(metrics.with_state(state))
        .layer(CorsLayer::permissive())
}
