//! Temporal validation and request parameter normalization

pub mod calendar;
pub mod normalize;
pub mod options;
pub mod range;
pub mod timestamp;

pub use calendar::{
    validate_year_month, validate_year_month_day, ValidatedDay, YearMonthDay, ALL_DAYS,
};
pub use normalize::{
    normalize_file_uri, normalize_page_title, normalize_project, normalize_referer,
};
pub use options::ValidationOptions;
pub use range::{validate_range, RangeParams};
pub use timestamp::parse_timestamp;
