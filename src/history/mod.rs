//! MediaWiki history metrics served from Druid
//!
//! Each metric validates its raw path parameters, then assembles a Druid
//! query. The prepared query carries everything needed to reshape the
//! engine's answer afterwards.

pub mod params;
pub mod result;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::DruidConfig;
use crate::druid::{
    interval, timeseries_query, top_n_query, Aggregation, DruidBackend, DruidRequest, Filter,
    PostAggregation,
};
use crate::error::{fail_if_any, AqsError, AqsResult};
use crate::validation::{
    normalize_page_title, validate_range, validate_year_month_day, RangeParams, ValidationOptions,
    YearMonthDay,
};

pub use params::{
    digests_filters, events_filters, AqsParam, AqsParams, DigestType, Granularity, RevisionMetric,
    TopType, AQS_PARAMS,
};
pub use result::{convert_druid_result, ApiResponse};

/// Size of every top list.
pub const TOP_THRESHOLD: u32 = 100;

const NEW_PAGES: &str = "new_pages";
const NEW_PAGES_KEYS: &[&str] = &[NEW_PAGES];

/// Raw parameters of a start/end addressed metric.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimeseriesRequest {
    pub project: String,
    pub editor_type: Option<String>,
    pub page_type: Option<String>,
    pub activity_level: Option<String>,
    pub page_title: Option<String>,
    pub user_text: Option<String>,
    pub granularity: String,
    pub start: String,
    pub end: String,
}

/// Raw parameters of a year/month/day addressed top list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopRequest {
    pub project: String,
    pub editor_type: Option<String>,
    pub page_type: Option<String>,
    pub year: String,
    pub month: String,
    pub day: String,
}

/// A Druid request ready to send, and how to read its answer.
#[derive(Debug, Clone)]
pub struct PreparedQuery {
    pub request: DruidRequest,
    pub params: AqsParams,
    pub key_filters: Option<&'static [&'static str]>,
    pub is_top: bool,
}

impl PreparedQuery {
    pub async fn execute(&self, backend: &dyn DruidBackend) -> AqsResult<ApiResponse> {
        let response = backend.query(&self.request).await.map_err(|e| {
            warn!(error = %e, uri = %self.request.uri, "Druid query failed");
            AqsError::Backend(e)
        })?;
        convert_druid_result(response, &self.params, self.key_filters, self.is_top)
    }
}

/// Validated timeseries parameters with an ISO `[start, end)` range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTimeseries {
    pub params: AqsParams,
    pub granularity: Granularity,
    pub start: String,
    pub end: String,
}

fn enumerated(raw_editor: &Option<String>, raw_page: &Option<String>) -> AqsParams {
    AqsParams {
        editor_type: raw_editor.clone(),
        page_type: raw_page.clone(),
        ..Default::default()
    }
}

/// Validate a timeseries request, reporting every problem at once.
///
/// Dates may come as `YYYYMMDD` or `YYYYMMDDHH`; the hour is dropped and
/// monthly requests are clipped to full months.
pub fn validate_timeseries(
    req: &TimeseriesRequest,
    no_all_projects: bool,
) -> AqsResult<ValidatedTimeseries> {
    let mut errors = Vec::new();

    let granularity = match req.granularity.parse::<Granularity>() {
        Ok(granularity) => Some(granularity),
        Err(message) => {
            errors.push(message);
            None
        }
    };

    let mut raw = enumerated(&req.editor_type, &req.page_type);
    raw.activity_level = req.activity_level.clone();
    errors.extend(raw.enumeration_errors());

    let opts = ValidationOptions {
        fake_hour: true,
        strip_hour: true,
        full_months_druid: granularity == Some(Granularity::Monthly),
        iso_date_format: true,
        no_all_projects,
        ..Default::default()
    };
    let range = RangeParams::new(&req.start, &req.end).with_project(&req.project);
    let range = match validate_range(&range, &opts) {
        Ok(range) => Some(range),
        Err(AqsError::InvalidRequest(messages)) => {
            errors.extend(messages);
            None
        }
        Err(other) => return Err(other),
    };

    fail_if_any(errors)?;
    let (Some(range), Some(granularity)) = (range, granularity) else {
        return Err(AqsError::Internal("validated request lost its range".to_string()));
    };

    let params = AqsParams {
        project: range.project,
        page_title: req.page_title.as_deref().map(normalize_page_title),
        user_text: req.user_text.clone(),
        granularity: Some(granularity),
        ..raw
    };
    debug!(
        project = ?params.project,
        start = %range.start,
        end = %range.end,
        "validated timeseries request"
    );

    Ok(ValidatedTimeseries {
        params,
        granularity,
        start: range.start,
        end: range.end,
    })
}

/// Validate a top request; an `all-days` day asks for a monthly list.
pub fn validate_top(req: &TopRequest) -> AqsResult<ValidatedTimeseries> {
    let mut errors = Vec::new();
    let raw = enumerated(&req.editor_type, &req.page_type);
    errors.extend(raw.enumeration_errors());

    let opts = ValidationOptions {
        druid_range: true,
        ..Default::default()
    };
    let address = YearMonthDay {
        year: req.year.clone(),
        month: req.month.clone(),
        day: req.day.clone(),
        project: Some(req.project.clone()),
    };
    let validated = match validate_year_month_day(&address, &opts) {
        Ok(validated) => Some(validated),
        Err(AqsError::InvalidRequest(messages)) => {
            errors.extend(messages);
            None
        }
        Err(other) => return Err(other),
    };

    fail_if_any(errors)?;
    let Some(validated) = validated else {
        return Err(AqsError::Internal("validated request lost its date".to_string()));
    };
    let granularity = if validated.is_all_days() {
        Granularity::Monthly
    } else {
        Granularity::Daily
    };
    let (start, end) = validated
        .range
        .clone()
        .ok_or_else(|| AqsError::Internal("top request without a Druid range".to_string()))?;

    Ok(ValidatedTimeseries {
        params: AqsParams {
            project: validated.project,
            granularity: Some(granularity),
            ..raw
        },
        granularity,
        start,
        end,
    })
}

fn event_entity(entity: &str) -> Filter {
    Filter::selector("event_entity", entity)
}

fn event_type(kind: &str) -> Filter {
    Filter::selector("event_type", kind)
}

fn events_count(output: &str) -> Aggregation {
    Aggregation::long_sum(output, "events")
}

/// Assembles MediaWiki history queries against the configured datasource.
#[derive(Debug, Clone)]
pub struct MetricsQueryBuilder {
    druid: DruidConfig,
}

impl MetricsQueryBuilder {
    pub fn new(druid: DruidConfig) -> Self {
        Self { druid }
    }

    fn target(&self) -> AqsResult<(String, String)> {
        Ok((
            self.druid.request_uri()?,
            self.druid.mediawiki_history_datasource()?,
        ))
    }

    fn timeseries(
        &self,
        validated: ValidatedTimeseries,
        base_filters: Vec<Filter>,
        dimension_filters: Vec<Filter>,
        aggregations: Vec<Aggregation>,
        post_aggregations: Vec<PostAggregation>,
        key_filters: Option<&'static [&'static str]>,
    ) -> AqsResult<PreparedQuery> {
        let (uri, datasource) = self.target()?;
        let mut fields = base_filters;
        fields.extend(dimension_filters);

        let request = timeseries_query(
            uri,
            datasource,
            validated.granularity.druid(),
            Filter::and(fields),
            aggregations,
            post_aggregations,
            interval(&validated.start, &validated.end),
        );
        Ok(PreparedQuery {
            request,
            params: validated.params,
            key_filters,
            is_top: false,
        })
    }

    /// Pages created plus restored minus deleted, redirects included.
    pub fn new_pages(&self, req: &TimeseriesRequest) -> AqsResult<PreparedQuery> {
        let validated = validate_timeseries(req, false)?;
        let filters = events_filters(&validated.params)?;

        let created =
            Aggregation::filtered(event_type("create"), Aggregation::count("pages_created"));
        let deleted =
            Aggregation::filtered(event_type("delete"), Aggregation::count("pages_deleted"));
        let restored =
            Aggregation::filtered(event_type("restore"), Aggregation::count("pages_restored"));
        let new_pages = PostAggregation::minus(
            NEW_PAGES,
            vec![
                PostAggregation::plus(
                    "tmp",
                    vec![
                        PostAggregation::field_access("pages_created"),
                        PostAggregation::field_access("pages_restored"),
                    ],
                ),
                PostAggregation::field_access("pages_deleted"),
            ],
        );

        self.timeseries(
            validated,
            vec![event_entity("page")],
            filters,
            vec![created, deleted, restored],
            vec![new_pages],
            Some(NEW_PAGES_KEYS),
        )
    }

    pub fn newly_registered_users(&self, req: &TimeseriesRequest) -> AqsResult<PreparedQuery> {
        let validated = validate_timeseries(req, false)?;
        let filters = events_filters(&validated.params)?;
        self.timeseries(
            validated,
            vec![
                event_entity("user"),
                event_type("create"),
                Filter::selector("other_tags", "self_created"),
            ],
            filters,
            vec![events_count("new_registered_users")],
            vec![],
            None,
        )
    }

    /// Editors or edited pages, read from per-project digest rows.
    pub fn digests(&self, digest: DigestType, req: &TimeseriesRequest) -> AqsResult<PreparedQuery> {
        let validated = validate_timeseries(req, true)?;
        let filters = digests_filters(&validated.params)?;
        let (entity, output) = match digest {
            DigestType::Editors => ("user", "editors"),
            DigestType::EditedPages => ("page", "edited_pages"),
        };
        let digest_rows = event_type(validated.granularity.digest_event_type());
        self.timeseries(
            validated,
            vec![event_entity(entity), digest_rows],
            filters,
            vec![events_count(output)],
            vec![],
            None,
        )
    }

    pub fn revisions(
        &self,
        metric: RevisionMetric,
        req: &TimeseriesRequest,
    ) -> AqsResult<PreparedQuery> {
        let validated = validate_timeseries(req, false)?;
        let filters = events_filters(&validated.params)?;
        self.timeseries(
            validated,
            vec![event_entity("revision"), event_type("create")],
            filters,
            vec![Aggregation::long_sum(metric.output(), metric.source_field())],
            vec![],
            None,
        )
    }

    /// Top editors or pages of a day (or a month with `all-days`).
    pub fn revisions_top(
        &self,
        top: TopType,
        metric: RevisionMetric,
        req: &TopRequest,
    ) -> AqsResult<PreparedQuery> {
        let validated = validate_top(req)?;
        let mut fields = vec![event_entity("revision"), event_type("create")];
        fields.extend(events_filters(&validated.params)?);

        let (uri, datasource) = self.target()?;
        let request = top_n_query(
            uri,
            datasource,
            validated.granularity.druid(),
            top.dimension(),
            TOP_THRESHOLD,
            metric.output(),
            Filter::and(fields),
            vec![Aggregation::long_sum(metric.output(), metric.source_field())],
            vec![],
            interval(&validated.start, &validated.end),
        );
        Ok(PreparedQuery {
            request,
            params: validated.params,
            key_filters: None,
            is_top: true,
        })
    }
}
