//! Year/month/day addressed requests (top lists, per-month rankings)

use chrono::{Days, Months};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::normalize::normalize_project;
use super::options::ValidationOptions;
use super::timestamp::{parse_timestamp, timestamp_to_date};
use crate::error::{fail_if_any, AqsError, AqsResult};

/// Day value meaning "the whole month".
pub const ALL_DAYS: &str = "all-days";

pub const INVALID_YEAR_MONTH_DAY: &str = "Given year/month/day is invalid date";
pub const INVALID_YEAR_MONTH: &str = "Given year/month is invalid date";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearMonthDay {
    pub year: String,
    pub month: String,
    pub day: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

/// A validated calendar address. `range` is only derived when
/// `druid_range` was requested: `[start, end)` as ISO dates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedDay {
    pub year: String,
    pub month: String,
    pub day: String,
    pub project: Option<String>,
    pub range: Option<(String, String)>,
}

impl ValidatedDay {
    pub fn is_all_days(&self) -> bool {
        self.day == ALL_DAYS
    }
}

fn project_errors(
    project: Option<&str>,
    opts: &ValidationOptions,
    errors: &mut Vec<String>,
) -> Option<String> {
    match project.map(|raw| normalize_project(raw, opts.no_all_projects)) {
        Some(Ok(project)) => Some(project),
        Some(Err(err)) => {
            errors.extend(err.messages().iter().cloned());
            None
        }
        None => None,
    }
}

/// Validate a `year`/`month`/`day` triple. `all-days` validates as day 01.
pub fn validate_year_month_day(
    params: &YearMonthDay,
    opts: &ValidationOptions,
) -> AqsResult<ValidatedDay> {
    let mut errors = Vec::new();
    let project = project_errors(params.project.as_deref(), opts, &mut errors);

    let all_days = params.day == ALL_DAYS;
    let day = if all_days { "01" } else { params.day.as_str() };
    let synthetic = format!("{}{}{}00", params.year, params.month, day);

    let strict = ValidationOptions::default();
    if parse_timestamp(&synthetic, &strict).is_none() {
        errors.push(INVALID_YEAR_MONTH_DAY.to_string());
    }

    if !errors.is_empty() {
        debug!(timestamp = %synthetic, ?errors, "rejected year/month/day");
    }
    fail_if_any(errors)?;

    let range = if opts.druid_range {
        Some(druid_range(&synthetic, all_days)?)
    } else {
        None
    };

    Ok(ValidatedDay {
        year: params.year.clone(),
        month: params.month.clone(),
        day: params.day.clone(),
        project,
        range,
    })
}

/// Validate a `year`/`month` pair, day fixed to 01.
pub fn validate_year_month(
    year: &str,
    month: &str,
    project: Option<&str>,
    opts: &ValidationOptions,
) -> AqsResult<(String, String, Option<String>)> {
    let mut errors = Vec::new();
    let project = project_errors(project, opts, &mut errors);

    let synthetic = format!("{year}{month}0100");
    if parse_timestamp(&synthetic, &ValidationOptions::default()).is_none() {
        errors.push(INVALID_YEAR_MONTH.to_string());
    }
    fail_if_any(errors)?;

    Ok((year.to_string(), month.to_string(), project))
}

fn druid_range(timestamp: &str, all_days: bool) -> AqsResult<(String, String)> {
    let start = timestamp_to_date(timestamp)
        .ok_or_else(|| AqsError::Internal(format!("unparsable validated date {timestamp}")))?;
    let end = if all_days {
        start.checked_add_months(Months::new(1))
    } else {
        start.checked_add_days(Days::new(1))
    }
    .ok_or_else(|| AqsError::Internal(format!("date overflow after {timestamp}")))?;

    Ok((
        start.format("%Y-%m-%d").to_string(),
        end.format("%Y-%m-%d").to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(year: &str, month: &str, day: &str) -> YearMonthDay {
        YearMonthDay {
            year: year.to_string(),
            month: month.to_string(),
            day: day.to_string(),
            project: None,
        }
    }

    fn druid() -> ValidationOptions {
        ValidationOptions {
            druid_range: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_day() {
        let validated =
            validate_year_month_day(&ymd("2017", "01", "15"), &Default::default()).unwrap();
        assert_eq!(validated.day, "15");
        assert!(validated.range.is_none());
        assert!(!validated.is_all_days());
    }

    #[test]
    fn test_invalid_day() {
        let err =
            validate_year_month_day(&ymd("2017", "02", "29"), &Default::default()).unwrap_err();
        assert_eq!(err.messages(), [INVALID_YEAR_MONTH_DAY]);
        assert!(validate_year_month_day(&ymd("2017", "13", "01"), &Default::default()).is_err());
        assert!(validate_year_month_day(&ymd("2017", "1", "01"), &Default::default()).is_err());
    }

    #[test]
    fn test_all_days_validates_as_first_day() {
        let validated =
            validate_year_month_day(&ymd("2016", "02", ALL_DAYS), &Default::default()).unwrap();
        assert!(validated.is_all_days());
        assert_eq!(validated.day, ALL_DAYS);
    }

    #[test]
    fn test_druid_range_single_day() {
        let validated = validate_year_month_day(&ymd("2016", "12", "31"), &druid()).unwrap();
        assert_eq!(
            validated.range,
            Some(("2016-12-31".to_string(), "2017-01-01".to_string()))
        );
    }

    #[test]
    fn test_druid_range_all_days() {
        let validated = validate_year_month_day(&ymd("2017", "02", ALL_DAYS), &druid()).unwrap();
        assert_eq!(
            validated.range,
            Some(("2017-02-01".to_string(), "2017-03-01".to_string()))
        );
    }

    #[test]
    fn test_project_and_date_errors_accumulate() {
        let mut params = ymd("2017", "02", "30");
        params.project = Some("bad project".to_string());
        let err = validate_year_month_day(&params, &druid()).unwrap_err();
        assert_eq!(err.messages().len(), 2);
    }

    #[test]
    fn test_year_month() {
        let (year, month, project) =
            validate_year_month("2017", "12", Some("www.de.wikipedia.org"), &Default::default())
                .unwrap();
        assert_eq!((year.as_str(), month.as_str()), ("2017", "12"));
        assert_eq!(project.as_deref(), Some("de.wikipedia"));

        let err = validate_year_month("2017", "00", None, &Default::default()).unwrap_err();
        assert_eq!(err.messages(), [INVALID_YEAR_MONTH]);
    }
}
