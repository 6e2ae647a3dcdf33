//! `YYYYMMDD[HH]` timestamp parsing and month-boundary arithmetic
//!
//! Timestamps are fixed-width and zero-padded, so string order and
//! chronological order agree. All instants are UTC.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, TimeZone, Timelike, Utc};

use super::options::ValidationOptions;

/// Longest accepted timestamp (`YYYYMMDDHH`).
pub const MAX_TIMESTAMP_LEN: usize = 10;

/// Parse a `YYYYMMDDHH` timestamp (or `YYYYMMDD` when `fake_hour` is set)
/// into a UTC instant.
///
/// The components are split at fixed offsets and the resulting instant must
/// report back the very same year, month, day and hour. Anything that does
/// not survive that round trip (day 32, month 13, Feb 30, hour 24, non-digit
/// characters) yields `None`.
pub fn parse_timestamp(raw: &str, opts: &ValidationOptions) -> Option<DateTime<Utc>> {
    if raw.len() > MAX_TIMESTAMP_LEN || !raw.is_ascii() {
        return None;
    }

    let year = digits(raw, 0, 4)? as i32;
    let month = digits(raw, 4, 6)?;
    let day = digits(raw, 6, 8)?;
    let hour = if opts.fake_hour {
        0
    } else {
        digits(raw, 8, 10)?
    };

    let instant = Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).single()?;

    let round_trips = instant.year() == year
        && instant.month() == month
        && instant.day() == day
        && instant.hour() == hour;

    round_trips.then_some(instant)
}

/// Fixed-offset numeric field; every character must be an ASCII digit.
fn digits(raw: &str, from: usize, to: usize) -> Option<u32> {
    let field = raw.get(from..to)?;
    if !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

/// Calendar date of the `YYYYMMDD` prefix of a timestamp, hour ignored.
pub fn timestamp_to_date(timestamp: &str) -> Option<NaiveDate> {
    let year = digits(timestamp, 0, 4)? as i32;
    let month = digits(timestamp, 4, 6)?;
    let day = digits(timestamp, 6, 8)?;
    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn date_to_timestamp(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

fn first_of_next_month(date: NaiveDate) -> Option<NaiveDate> {
    date.with_day(1)?.checked_add_months(Months::new(1))
}

fn last_of_month(date: NaiveDate) -> Option<NaiveDate> {
    first_of_next_month(date)?.checked_sub_days(Days::new(1))
}

/// First day of the first month fully covered by a range starting here.
///
/// A start already on day 1 is returned untouched (hour suffix included);
/// otherwise the first day of the following month, as `YYYYMMDD`.
pub fn first_full_month_first_day(start: &str) -> Option<String> {
    let date = timestamp_to_date(start)?;
    if date.day() == 1 {
        return Some(start.to_string());
    }
    first_of_next_month(date).map(date_to_timestamp)
}

/// Last day of the last month fully covered by a range ending here
/// (inclusive end).
///
/// An end already on the last day of its month is returned untouched;
/// otherwise the last day of the previous month, as `YYYYMMDD`.
pub fn last_full_month_last_day(end: &str) -> Option<String> {
    let date = timestamp_to_date(end)?;
    if Some(date) == last_of_month(date) {
        return Some(end.to_string());
    }
    date.with_day(1)?
        .checked_sub_days(Days::new(1))
        .map(date_to_timestamp)
}

/// Exclusive end for month-granular analytical queries: always the first
/// day of the month after `end`'s month, even when `end` is itself a day 1.
pub fn day_after_last_full_month(end: &str) -> Option<String> {
    let date = timestamp_to_date(end)?;
    first_of_next_month(date).map(date_to_timestamp)
}

/// `YYYY-MM-DD` rendering of a timestamp's date.
pub fn to_iso_date(timestamp: &str) -> Option<String> {
    timestamp_to_date(timestamp).map(|d| d.format("%Y-%m-%d").to_string())
}

/// Full ISO-8601 instant at midnight UTC of the timestamp's date.
pub fn to_iso_date_time(timestamp: &str) -> Option<String> {
    timestamp_to_date(timestamp).map(|d| d.format("%Y-%m-%dT00:00:00.000Z").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strict() -> ValidationOptions {
        ValidationOptions::default()
    }

    fn fake_hour() -> ValidationOptions {
        ValidationOptions {
            fake_hour: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_timestamp_round_trips() {
        for date in ["20170101", "20160229", "19991231", "20201130"] {
            let parsed = parse_timestamp(&format!("{date}00"), &strict()).unwrap();
            assert_eq!(date_to_timestamp(parsed.date_naive()), date);
        }
    }

    #[test]
    fn test_rollover_dates_are_rejected() {
        assert!(parse_timestamp("2017023000", &strict()).is_none());
        assert!(parse_timestamp("2017022900", &strict()).is_none());
        assert!(parse_timestamp("2017013200", &strict()).is_none());
        assert!(parse_timestamp("2017130100", &strict()).is_none());
        assert!(parse_timestamp("2017000100", &strict()).is_none());
        assert!(parse_timestamp("2017010124", &strict()).is_none());
    }

    #[test]
    fn test_non_numeric_and_oversized_input() {
        assert!(parse_timestamp("2017010a00", &strict()).is_none());
        assert!(parse_timestamp("201701010000", &strict()).is_none());
        assert!(parse_timestamp("", &strict()).is_none());
        assert!(parse_timestamp("2017-01-01", &fake_hour()).is_none());
        assert!(parse_timestamp("２０１７0101", &fake_hour()).is_none());
    }

    #[test]
    fn test_hour_is_required_unless_faked() {
        assert!(parse_timestamp("20170101", &strict()).is_none());
        assert!(parse_timestamp("20170101", &fake_hour()).is_some());

        let parsed = parse_timestamp("2017010113", &strict()).unwrap();
        assert_eq!(parsed.hour(), 13);

        // A faked hour ignores whatever follows the date.
        let parsed = parse_timestamp("2017010113", &fake_hour()).unwrap();
        assert_eq!(parsed.hour(), 0);
    }

    #[test]
    fn test_first_full_month_first_day() {
        assert_eq!(first_full_month_first_day("20170101").unwrap(), "20170101");
        assert_eq!(first_full_month_first_day("2017010100").unwrap(), "2017010100");
        assert_eq!(first_full_month_first_day("20170102").unwrap(), "20170201");
        assert_eq!(first_full_month_first_day("20171215").unwrap(), "20180101");
    }

    #[test]
    fn test_first_full_month_first_day_is_idempotent() {
        for start in ["20170102", "20171231", "20160229", "20170301"] {
            let once = first_full_month_first_day(start).unwrap();
            let twice = first_full_month_first_day(&once).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_last_full_month_last_day() {
        assert_eq!(last_full_month_last_day("20170131").unwrap(), "20170131");
        assert_eq!(last_full_month_last_day("20170210").unwrap(), "20170131");
        assert_eq!(last_full_month_last_day("20160229").unwrap(), "20160229");
        assert_eq!(last_full_month_last_day("20170228").unwrap(), "20170228");
        assert_eq!(last_full_month_last_day("20180115").unwrap(), "20171231");
    }

    #[test]
    fn test_day_after_last_full_month_always_advances() {
        assert_eq!(day_after_last_full_month("20170210").unwrap(), "20170301");
        assert_eq!(day_after_last_full_month("20170201").unwrap(), "20170301");
        assert_eq!(day_after_last_full_month("20171231").unwrap(), "20180101");
    }

    #[test]
    fn test_iso_rendering() {
        assert_eq!(to_iso_date("20170105").unwrap(), "2017-01-05");
        assert_eq!(to_iso_date("2017010513").unwrap(), "2017-01-05");
        assert_eq!(
            to_iso_date_time("20170105").unwrap(),
            "2017-01-05T00:00:00.000Z"
        );
        assert!(to_iso_date("2017").is_none());
    }
}
