//! Date validation integration tests
//!
//! Exercises the public validation surface the way request handlers use it.

use aqs::druid::Filter;
use aqs::error::AqsError;
use aqs::history::{digests_filters, events_filters, AqsParams};
use aqs::tables::get_interval_for_ceiled_value;
use aqs::validation::timestamp::first_full_month_first_day;
use aqs::validation::{
    normalize_project, parse_timestamp, validate_range, validate_year_month_day, RangeParams,
    ValidationOptions, YearMonthDay,
};
use chrono::{Datelike, NaiveDate};

fn plain() -> ValidationOptions {
    ValidationOptions::default()
}

#[test]
fn test_every_day_of_a_leap_year_round_trips() {
    let mut day = NaiveDate::from_ymd_opt(2016, 1, 1).unwrap();
    while day.year() == 2016 {
        let raw = format!("{}00", day.format("%Y%m%d"));
        let instant = parse_timestamp(&raw, &plain()).unwrap();
        assert_eq!(instant.date_naive(), day, "{raw}");
        day = day.succ_opt().unwrap();
    }
}

#[test]
fn test_calendar_rollover_is_rejected() {
    for raw in ["2017023000", "2017022900", "2017043100", "2017133100", "2017010124"] {
        assert!(parse_timestamp(raw, &plain()).is_none(), "{raw}");
    }
    assert!(parse_timestamp("2016022900", &plain()).is_some());
    assert!(parse_timestamp("2017010a00", &plain()).is_none());
}

#[test]
fn test_range_order() {
    let ok = validate_range(&RangeParams::new("2017010100", "2017010200"), &plain()).unwrap();
    assert_eq!((ok.start.as_str(), ok.end.as_str()), ("2017010100", "2017010200"));

    let same = validate_range(&RangeParams::new("2017010100", "2017010100"), &plain());
    assert!(same.is_ok());

    let err = validate_range(&RangeParams::new("2017010200", "2017010100"), &plain()).unwrap_err();
    assert_eq!(err.messages(), ["start timestamp should be before the end timestamp"]);
}

#[test]
fn test_both_ends_wrong_give_two_messages() {
    let err = validate_range(&RangeParams::new("2017133100", "2017023000"), &plain()).unwrap_err();
    assert_eq!(err.messages().len(), 2);
    assert!(err.messages()[0].starts_with("start timestamp is invalid"));
    assert!(err.messages()[1].starts_with("end timestamp is invalid"));
}

#[test]
fn test_full_month_clipping() {
    let opts = ValidationOptions {
        fake_hour: true,
        full_months: true,
        ..Default::default()
    };

    let inside = validate_range(&RangeParams::new("20170105", "20170125"), &opts).unwrap_err();
    assert_eq!(inside.messages(), ["no full months found in specified date range"]);

    let clipped = validate_range(&RangeParams::new("20170102", "20170310"), &opts).unwrap();
    assert_eq!((clipped.start.as_str(), clipped.end.as_str()), ("20170201", "20170228"));

    let druid = ValidationOptions {
        fake_hour: true,
        full_months_druid: true,
        iso_date_format: true,
        ..Default::default()
    };
    let exclusive = validate_range(&RangeParams::new("20170101", "20170201"), &druid).unwrap();
    assert_eq!(
        (exclusive.start.as_str(), exclusive.end.as_str()),
        ("2017-01-01", "2017-03-01")
    );
}

#[test]
fn test_first_full_month_is_idempotent_on_day_one() {
    for raw in ["20170115", "20171220", "20160201"] {
        let once = first_full_month_first_day(raw).unwrap();
        assert_eq!(first_full_month_first_day(&once).unwrap(), once);
    }
}

#[test]
fn test_span_limit_counts_seconds() {
    let opts = ValidationOptions {
        max_span_seconds: Some(86_400),
        ..Default::default()
    };
    assert!(validate_range(&RangeParams::new("2017010100", "2017010200"), &opts).is_ok());
    let err = validate_range(&RangeParams::new("2017010100", "2017010201"), &opts).unwrap_err();
    assert_eq!(err.messages().len(), 1);
}

#[test]
fn test_project_normalization() {
    assert_eq!(normalize_project("WWW.EN.WIKIPEDIA.ORG", false).unwrap(), "en.wikipedia");
    let canonical = normalize_project("de.wikipedia", false).unwrap();
    assert_eq!(normalize_project(&canonical, false).unwrap(), canonical);

    assert_eq!(normalize_project("all-projects", false).unwrap(), "all-projects");
    assert!(matches!(
        normalize_project("all-projects", true),
        Err(AqsError::InvalidRequest(_))
    ));
    assert!(normalize_project("en wikipedia", false).is_err());
}

#[test]
fn test_year_month_day_druid_range() {
    let opts = ValidationOptions {
        druid_range: true,
        ..Default::default()
    };
    let day = YearMonthDay {
        year: "2016".to_string(),
        month: "02".to_string(),
        day: "29".to_string(),
        project: None,
    };
    let validated = validate_year_month_day(&day, &opts).unwrap();
    assert_eq!(
        validated.range,
        Some(("2016-02-29".to_string(), "2016-03-01".to_string()))
    );

    let invalid = YearMonthDay {
        year: "2017".to_string(),
        ..day
    };
    assert!(validate_year_month_day(&invalid, &opts).is_err());
}

#[test]
fn test_filter_policy_asymmetry() {
    let params = AqsParams {
        project: Some("all-projects".to_string()),
        page_type: Some("all-page-types".to_string()),
        activity_level: Some("all-activity-levels".to_string()),
        ..Default::default()
    };

    assert!(events_filters(&params).unwrap().is_empty());
    assert_eq!(
        digests_filters(&params).unwrap(),
        vec![Filter::selector("page_type", "all")]
    );
}

#[test]
fn test_ceiled_value_buckets() {
    assert_eq!(get_interval_for_ceiled_value(1000), "100-999");
    assert_eq!(get_interval_for_ceiled_value(1001), "1000-9999");
}
