//! Start/end range validation and normalization

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::normalize::normalize_project;
use super::options::ValidationOptions;
use super::timestamp::{
    day_after_last_full_month, first_full_month_first_day, last_full_month_last_day,
    parse_timestamp, to_iso_date, to_iso_date_time,
};
use crate::error::{fail_if_any, AqsError, AqsResult};

pub const START_AFTER_END: &str = "start timestamp should be before the end timestamp";
pub const NO_FULL_MONTHS: &str = "no full months found in specified date range";

/// A request's date range, optionally scoped to a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeParams {
    pub start: String,
    pub end: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

impl RangeParams {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            project: None,
        }
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }
}

/// Validate a range and return its normalized form.
///
/// Every applicable problem is reported at once: a request with both ends
/// malformed gets two messages. The input is left untouched.
pub fn validate_range(params: &RangeParams, opts: &ValidationOptions) -> AqsResult<RangeParams> {
    let mut errors = Vec::new();

    let project = match params.project.as_deref() {
        Some(raw) => match normalize_project(raw, opts.no_all_projects) {
            Ok(project) => Some(project),
            Err(err) => {
                errors.extend(err.messages().iter().cloned());
                None
            }
        },
        None => None,
    };

    let invalid = format!(
        "invalid, must be a valid date in {} format",
        opts.timestamp_format()
    );
    let start_instant = parse_timestamp(&params.start, opts);
    let end_instant = parse_timestamp(&params.end, opts);
    if start_instant.is_none() {
        errors.push(format!("start timestamp is {invalid}"));
    }
    if end_instant.is_none() {
        errors.push(format!("end timestamp is {invalid}"));
    }

    let mut start = params.start.clone();
    let mut end = params.end.clone();

    if let (Some(start_instant), Some(end_instant)) = (start_instant, end_instant) {
        if start_instant > end_instant {
            errors.push(START_AFTER_END.to_string());
        }

        if let Some(max_span) = opts.max_span_seconds {
            let span = (end_instant - start_instant).num_milliseconds() / 1000;
            if span > max_span {
                errors.push(format!(
                    "date range is too long, it must not span more than {max_span} seconds"
                ));
            }
        }

        if opts.full_months {
            start = clip(first_full_month_first_day(&start))?;
            end = clip(last_full_month_last_day(&end))?;
            if date_part(&start) > date_part(&end) {
                errors.push(NO_FULL_MONTHS.to_string());
            }
        }

        if opts.full_months_druid {
            start = clip(first_full_month_first_day(&start))?;
            end = clip(day_after_last_full_month(&end))?;
            if date_part(&start) >= date_part(&end) {
                errors.push(NO_FULL_MONTHS.to_string());
            }
        }
    }

    if !errors.is_empty() {
        debug!(start = %params.start, end = %params.end, ?errors, "rejected date range");
    }
    fail_if_any(errors)?;

    if opts.zero_hour || opts.strip_hour {
        start.truncate(8);
        end.truncate(8);
    }
    if opts.zero_hour {
        start.push_str("00");
        end.push_str("00");
    }
    if opts.iso_date_format {
        start = render(to_iso_date(&start))?;
        end = render(to_iso_date(&end))?;
    }
    if opts.iso_date_time_format {
        start = render(to_iso_date_time(&start))?;
        end = render(to_iso_date_time(&end))?;
    }

    Ok(RangeParams {
        start,
        end,
        project,
    })
}

fn date_part(timestamp: &str) -> &str {
    timestamp.get(..8).unwrap_or(timestamp)
}

// Both ends already parsed, so month arithmetic cannot fail on them.
fn clip(value: Option<String>) -> AqsResult<String> {
    value.ok_or_else(|| AqsError::Internal("month clipping on an unparsed timestamp".to_string()))
}

fn render(value: Option<String>) -> AqsResult<String> {
    value.ok_or_else(|| AqsError::Internal("ISO rendering of an unparsed timestamp".to_string()))
}
