/// Flags controlling how a start/end range is validated and rewritten.
///
/// Flags compose. They are applied in a fixed order: validate, span check,
/// month clipping, hour stripping/zeroing, ISO rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Accept `YYYYMMDD` input by validating it as if the hour were `00`.
    pub fake_hour: bool,
    /// Rewrite both ends to `YYYYMMDD00` after validation.
    pub zero_hour: bool,
    /// Truncate both ends to `YYYYMMDD` after validation.
    pub strip_hour: bool,
    /// Clip to the fully covered months, end inclusive.
    pub full_months: bool,
    /// Clip to the fully covered months with an exclusive end.
    pub full_months_druid: bool,
    /// Render both ends as `YYYY-MM-DD`.
    pub iso_date_format: bool,
    /// Render both ends as `YYYY-MM-DDT00:00:00.000Z`.
    pub iso_date_time_format: bool,
    /// Reject ranges longer than this many seconds.
    pub max_span_seconds: Option<i64>,
    /// Reject `all-...` project values.
    pub no_all_projects: bool,
    /// Derive an exclusive-end ISO date range from year/month/day input.
    pub druid_range: bool,
}

impl ValidationOptions {
    /// The timestamp layout quoted back in error messages.
    pub fn timestamp_format(&self) -> &'static str {
        if self.fake_hour {
            "YYYYMMDD"
        } else {
            "YYYYMMDDHH"
        }
    }
}
