//! Key/range table store queries for the Cassandra backed endpoints
//!
//! Every builder validates its raw path parameters and produces the
//! `{table, attributes}` lookup the storage collaborator expects, with the
//! range field rendered as `{between: [start, end]}`.

pub mod response;

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::AqsResult;
use crate::validation::{
    normalize_file_uri, normalize_page_title, normalize_project, normalize_referer,
    validate_range, validate_year_month, validate_year_month_day, RangeParams, ValidationOptions,
    YearMonthDay,
};

pub use response::{
    bucket_country_views, coerce_integer_fields, get_interval_for_ceiled_value,
    prefer_long_views, rank_top_articles, roll_up_article_views,
};

pub const PAGEVIEWS_PER_ARTICLE: &str = "pageviews.per.article.flat";
pub const PAGEVIEWS_PER_PROJECT: &str = "pageviews.per.project.v2";
pub const TOP_PAGEVIEWS: &str = "top.pageviews";
pub const TOP_BY_COUNTRY: &str = "top.bycountry";
pub const TOP_PER_COUNTRY: &str = "top.percountry";
pub const UNIQUE_DEVICES: &str = "unique.devices";
pub const MEDIAREQUESTS_PER_FILE: &str = "mediarequest.per.file";
pub const MEDIAREQUESTS_PER_REFERER: &str = "mediarequest.per.referer";
pub const KNOWLEDGE_GAP: &str = "knowledge.gap.by.category";
pub const LEGACY_PAGEVIEWS_PER_PROJECT: &str = "lgc.pageviews.per.project";
pub const LEGACY_PAGECOUNTS_PER_PROJECT: &str = "lgc.pagecounts.per.project";

/// Integer columns the unique devices table hands back as strings.
pub const UNIQUE_DEVICES_COUNTS: &[&str] = &["devices", "underestimate", "offset"];

const DAILY: &str = "daily";
const MONTHLY: &str = "monthly";
const HOURLY: &str = "hourly";

/// A single table lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableQuery {
    pub table: &'static str,
    pub attributes: Map<String, Value>,
}

impl TableQuery {
    fn new(table: &'static str) -> Self {
        Self {
            table,
            attributes: Map::new(),
        }
    }

    fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(name.to_string(), Value::String(value.into()));
        self
    }

    fn between(mut self, field: &str, start: String, end: String) -> Self {
        self.attributes
            .insert(field.to_string(), json!({ "between": [start, end] }));
        self
    }
}

/// Per-article and per-file data is stored daily with an hour suffix.
fn daily_stored_options(granularity: &str) -> ValidationOptions {
    ValidationOptions {
        fake_hour: true,
        zero_hour: true,
        full_months: granularity == MONTHLY,
        ..Default::default()
    }
}

/// Aggregate tables also store hourly rows, addressed with a real hour.
fn aggregate_options(granularity: &str) -> ValidationOptions {
    let day_level = granularity == DAILY || granularity == MONTHLY;
    ValidationOptions {
        fake_hour: day_level,
        zero_hour: day_level,
        full_months: granularity == MONTHLY,
        ..Default::default()
    }
}

/// Legacy tables are always addressed with an hour, zeroed unless hourly.
fn legacy_options(granularity: &str) -> ValidationOptions {
    ValidationOptions {
        zero_hour: granularity != HOURLY,
        full_months: granularity == MONTHLY,
        ..Default::default()
    }
}

pub struct RangeArgs<'a> {
    pub granularity: &'a str,
    pub start: &'a str,
    pub end: &'a str,
}

fn range(
    args: &RangeArgs<'_>,
    project: Option<&str>,
    opts: &ValidationOptions,
) -> AqsResult<RangeParams> {
    let mut params = RangeParams::new(args.start, args.end);
    params.project = project.map(str::to_string);
    validate_range(&params, opts)
}

pub fn pageviews_per_article(
    project: &str,
    article: &str,
    args: &RangeArgs<'_>,
) -> AqsResult<TableQuery> {
    let validated = range(args, Some(project), &daily_stored_options(args.granularity))?;
    Ok(TableQuery::new(PAGEVIEWS_PER_ARTICLE)
        .with("project", validated.project.unwrap_or_default())
        .with("article", normalize_page_title(article))
        .with("granularity", DAILY)
        .between("timestamp", validated.start, validated.end))
}

pub fn pageviews_per_project(
    project: &str,
    access: &str,
    agent: &str,
    args: &RangeArgs<'_>,
) -> AqsResult<TableQuery> {
    let validated = range(args, Some(project), &aggregate_options(args.granularity))?;
    Ok(TableQuery::new(PAGEVIEWS_PER_PROJECT)
        .with("project", validated.project.unwrap_or_default())
        .with("access", access)
        .with("agent", agent)
        .with("granularity", args.granularity)
        .between("timestamp", validated.start, validated.end))
}

pub fn top_articles(
    project: &str,
    access: &str,
    year: &str,
    month: &str,
    day: &str,
) -> AqsResult<TableQuery> {
    let address = YearMonthDay {
        year: year.to_string(),
        month: month.to_string(),
        day: day.to_string(),
        project: Some(project.to_string()),
    };
    let validated = validate_year_month_day(&address, &ValidationOptions::default())?;
    Ok(TableQuery::new(TOP_PAGEVIEWS)
        .with("project", validated.project.unwrap_or_default())
        .with("access", access)
        .with("year", validated.year)
        .with("month", validated.month)
        .with("day", validated.day))
}

pub fn top_by_country(
    project: &str,
    access: &str,
    year: &str,
    month: &str,
) -> AqsResult<TableQuery> {
    let (year, month, project) =
        validate_year_month(year, month, Some(project), &ValidationOptions::default())?;
    Ok(TableQuery::new(TOP_BY_COUNTRY)
        .with("project", project.unwrap_or_default())
        .with("access", access)
        .with("year", year)
        .with("month", month))
}

/// Top articles of one country for a day, or a whole month with `all-days`.
pub fn pageviews_per_country(
    country: &str,
    access: &str,
    year: &str,
    month: &str,
    day: &str,
) -> AqsResult<TableQuery> {
    let address = YearMonthDay {
        year: year.to_string(),
        month: month.to_string(),
        day: day.to_string(),
        project: None,
    };
    let validated = validate_year_month_day(&address, &ValidationOptions::default())?;
    Ok(TableQuery::new(TOP_PER_COUNTRY)
        .with("country", country)
        .with("access", access)
        .with("year", validated.year)
        .with("month", validated.month)
        .with("day", validated.day))
}

/// Unique devices are stored per day without hour.
pub fn unique_devices(
    project: &str,
    access_site: &str,
    args: &RangeArgs<'_>,
) -> AqsResult<TableQuery> {
    let opts = ValidationOptions {
        fake_hour: true,
        strip_hour: true,
        ..Default::default()
    };
    let validated = range(args, None, &opts)?;
    Ok(TableQuery::new(UNIQUE_DEVICES)
        .with("project", project)
        .with("access-site", access_site)
        .with("granularity", args.granularity)
        .between("timestamp", validated.start, validated.end))
}

pub fn mediarequests_per_file(
    referer: &str,
    file_path: &str,
    args: &RangeArgs<'_>,
) -> AqsResult<TableQuery> {
    let referer = normalize_referer(referer)?;
    let file_path = normalize_file_uri(file_path)?;
    let validated = range(args, None, &daily_stored_options(args.granularity))?;
    Ok(TableQuery::new(MEDIAREQUESTS_PER_FILE)
        .with("referer", referer)
        .with("file_path", file_path)
        .with("granularity", DAILY)
        .between("timestamp", validated.start, validated.end))
}

pub fn mediarequests_per_referer(
    referer: &str,
    media_type: &str,
    agent: &str,
    args: &RangeArgs<'_>,
) -> AqsResult<TableQuery> {
    let referer = normalize_referer(referer)?;
    let validated = range(args, None, &aggregate_options(args.granularity))?;
    Ok(TableQuery::new(MEDIAREQUESTS_PER_REFERER)
        .with("referer", referer)
        .with("media_type", media_type)
        .with("agent", agent)
        .with("granularity", args.granularity)
        .between("timestamp", validated.start, validated.end))
}

fn legacy_per_project(
    table: &'static str,
    project: &str,
    access_site: &str,
    args: &RangeArgs<'_>,
) -> AqsResult<TableQuery> {
    let validated = range(args, None, &legacy_options(args.granularity))?;
    Ok(TableQuery::new(table)
        .with("project", project)
        .with("access-site", access_site)
        .with("granularity", args.granularity)
        .between("timestamp", validated.start, validated.end))
}

/// Legacy pageviews; rows carry their `views` as strings.
pub fn legacy_pageviews_per_project(
    project: &str,
    access_site: &str,
    args: &RangeArgs<'_>,
) -> AqsResult<TableQuery> {
    legacy_per_project(LEGACY_PAGEVIEWS_PER_PROJECT, project, access_site, args)
}

/// Legacy pagecounts; rows carry their `count` as strings.
pub fn pagecounts_per_project(
    project: &str,
    access_site: &str,
    args: &RangeArgs<'_>,
) -> AqsResult<TableQuery> {
    legacy_per_project(LEGACY_PAGECOUNTS_PER_PROJECT, project, access_site, args)
}

pub fn knowledge_gap(
    project: &str,
    content_gap: &str,
    category: &str,
    start: &str,
    end: &str,
) -> AqsResult<TableQuery> {
    let project = normalize_project(project, false)?;
    let opts = ValidationOptions {
        fake_hour: true,
        zero_hour: true,
        ..Default::default()
    };
    let validated = validate_range(&RangeParams::new(start, end), &opts)?;
    Ok(TableQuery::new(KNOWLEDGE_GAP)
        .with("project", project)
        .with("content_gap", content_gap)
        .with("category", category)
        .between("dt", validated.start, validated.end))
}
