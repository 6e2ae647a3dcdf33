//! Request parameter to Druid dimension mapping
//!
//! Every recognized parameter maps to a dimension, a filter constructor and
//! optionally a value translation. Two policies turn parameters into
//! filters: additive event entities treat `all-*` values as "no filter",
//! digest rows select an explicit `all` row for most dimensions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::druid::Filter;
use crate::error::{AqsError, AqsResult};

pub const ALL_PROJECTS: &str = "all-projects";
pub const ALL_EDITOR_TYPES: &str = "all-editor-types";
pub const ALL_PAGE_TYPES: &str = "all-page-types";
pub const ALL_ACTIVITY_LEVELS: &str = "all-activity-levels";

const ALL_VALUES: &[&str] = &[
    ALL_PROJECTS,
    ALL_EDITOR_TYPES,
    ALL_PAGE_TYPES,
    ALL_ACTIVITY_LEVELS,
];

pub fn is_all_value(value: &str) -> bool {
    ALL_VALUES.contains(&value)
}

const PROJECT_FAMILIES: &[&str] = &[
    "wikipedia",
    "wiktionary",
    "wikibooks",
    "wikinews",
    "wikiquote",
    "wikisource",
    "wikiversity",
    "wikivoyage",
];

/// Regex selecting every project of a family, for `all-<family>-projects`.
pub fn project_family_pattern(value: &str) -> Option<String> {
    let family = value.strip_prefix("all-")?.strip_suffix("-projects")?;
    PROJECT_FAMILIES
        .contains(&family)
        .then(|| format!(r"^[a-z0-9-]+\.{family}$"))
}

const EDITOR_TYPES: &[(&str, &str)] = &[
    ("anonymous", "anonymous"),
    ("group-bot", "group_bot"),
    ("name-bot", "name_bot"),
    ("user", "user"),
    (ALL_EDITOR_TYPES, "all"),
];

const PAGE_TYPES: &[(&str, &str)] = &[
    ("content", "content"),
    ("non-content", "non_content"),
    (ALL_PAGE_TYPES, "all"),
];

const ACTIVITY_LEVELS: &[(&str, &str)] = &[
    ("1..4-edits", r"^[1-4]$"),
    ("5..24-edits", r"^([5-9]|1\d|2[0-4])$"),
    ("25..99-edits", r"^(2[5-9]|[3-9]\d)$"),
    ("100..-edits", r"^(\d{3,})$"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Selector,
    Regex,
}

impl FilterKind {
    fn build(&self, dimension: &str, value: &str) -> Filter {
        match self {
            FilterKind::Selector => Filter::selector(dimension, value),
            FilterKind::Regex => Filter::regex(dimension, value),
        }
    }
}

/// How one request parameter is expressed against the datasource.
#[derive(Debug, Clone, Copy)]
pub struct ParamMapping {
    pub dimension: &'static str,
    pub kind: FilterKind,
    pub values: Option<&'static [(&'static str, &'static str)]>,
}

impl ParamMapping {
    fn translate(&self, param: AqsParam, value: &str) -> AqsResult<String> {
        match self.values {
            None => Ok(value.to_string()),
            Some(table) => table
                .iter()
                .find(|(from, _)| *from == value)
                .map(|(_, to)| to.to_string())
                .ok_or_else(|| {
                    AqsError::Internal(format!(
                        "no Druid value for `{}` = `{value}`",
                        param.name()
                    ))
                }),
        }
    }

    fn filter(&self, param: AqsParam, value: &str) -> AqsResult<Filter> {
        Ok(self.kind.build(self.dimension, &self.translate(param, value)?))
    }
}

const PROJECT_FAMILY: ParamMapping = ParamMapping {
    dimension: "project",
    kind: FilterKind::Regex,
    values: None,
};

/// Parameters in the order their filters are emitted and echoed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AqsParam {
    Project,
    EditorType,
    PageType,
    ActivityLevel,
    PageTitle,
    UserText,
    Granularity,
}

pub const AQS_PARAMS: [AqsParam; 7] = [
    AqsParam::Project,
    AqsParam::EditorType,
    AqsParam::PageType,
    AqsParam::ActivityLevel,
    AqsParam::PageTitle,
    AqsParam::UserText,
    AqsParam::Granularity,
];

impl AqsParam {
    pub fn name(&self) -> &'static str {
        match self {
            AqsParam::Project => "project",
            AqsParam::EditorType => "editor-type",
            AqsParam::PageType => "page-type",
            AqsParam::ActivityLevel => "activity-level",
            AqsParam::PageTitle => "page-title",
            AqsParam::UserText => "user-text",
            AqsParam::Granularity => "granularity",
        }
    }

    /// `None` for parameters that never become a filter.
    pub fn mapping(&self) -> Option<ParamMapping> {
        let mapping = match self {
            AqsParam::Project => ParamMapping {
                dimension: "project",
                kind: FilterKind::Selector,
                values: None,
            },
            AqsParam::EditorType => ParamMapping {
                dimension: "user_type",
                kind: FilterKind::Selector,
                values: Some(EDITOR_TYPES),
            },
            AqsParam::PageType => ParamMapping {
                dimension: "page_type",
                kind: FilterKind::Selector,
                values: Some(PAGE_TYPES),
            },
            AqsParam::ActivityLevel => ParamMapping {
                dimension: "revisions",
                kind: FilterKind::Regex,
                values: Some(ACTIVITY_LEVELS),
            },
            AqsParam::PageTitle => ParamMapping {
                dimension: "page_title",
                kind: FilterKind::Selector,
                values: None,
            },
            AqsParam::UserText => ParamMapping {
                dimension: "user_text",
                kind: FilterKind::Selector,
                values: None,
            },
            AqsParam::Granularity => return None,
        };
        Some(mapping)
    }

    /// Accepted values for enumerated parameters, sentinel included.
    fn accepted_values(&self) -> Option<Vec<&'static str>> {
        let table = match self {
            AqsParam::EditorType => EDITOR_TYPES,
            AqsParam::PageType => PAGE_TYPES,
            AqsParam::ActivityLevel => {
                let mut values: Vec<_> = ACTIVITY_LEVELS.iter().map(|(v, _)| *v).collect();
                values.push(ALL_ACTIVITY_LEVELS);
                return Some(values);
            }
            _ => return None,
        };
        Some(table.iter().map(|(v, _)| *v).collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Daily,
    Monthly,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Daily => "daily",
            Granularity::Monthly => "monthly",
        }
    }

    /// Druid's own granularity name.
    pub fn druid(&self) -> &'static str {
        match self {
            Granularity::Daily => "day",
            Granularity::Monthly => "month",
        }
    }

    /// `event_type` of the digest rows computed at this granularity.
    pub fn digest_event_type(&self) -> &'static str {
        match self {
            Granularity::Daily => "daily_digest",
            Granularity::Monthly => "monthly_digest",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Granularity::Daily),
            "monthly" => Ok(Granularity::Monthly),
            other => Err(format!(
                "The parameter `granularity` has an invalid value `{other}`, \
                 expected daily or monthly."
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestType {
    Editors,
    EditedPages,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionMetric {
    Edits,
    NetBytesDiff,
    AbsBytesDiff,
}

impl RevisionMetric {
    /// Output metric name.
    pub fn output(&self) -> &'static str {
        match self {
            RevisionMetric::Edits => "edits",
            RevisionMetric::NetBytesDiff => "net_bytes_diff",
            RevisionMetric::AbsBytesDiff => "abs_bytes_diff",
        }
    }

    /// Datasource metric summed into the output.
    pub fn source_field(&self) -> &'static str {
        match self {
            RevisionMetric::Edits => "events",
            RevisionMetric::NetBytesDiff => "text_bytes_diff_sum",
            RevisionMetric::AbsBytesDiff => "text_bytes_diff_abs_sum",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopType {
    Editors,
    EditedPages,
}

impl TopType {
    pub fn dimension(&self) -> &'static str {
        match self {
            TopType::Editors => "user_text",
            TopType::EditedPages => "page_title",
        }
    }
}

/// Validated, normalized request parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AqsParams {
    pub project: Option<String>,
    pub editor_type: Option<String>,
    pub page_type: Option<String>,
    pub activity_level: Option<String>,
    pub page_title: Option<String>,
    pub user_text: Option<String>,
    pub granularity: Option<Granularity>,
}

impl AqsParams {
    pub fn value(&self, param: AqsParam) -> Option<&str> {
        match param {
            AqsParam::Project => self.project.as_deref(),
            AqsParam::EditorType => self.editor_type.as_deref(),
            AqsParam::PageType => self.page_type.as_deref(),
            AqsParam::ActivityLevel => self.activity_level.as_deref(),
            AqsParam::PageTitle => self.page_title.as_deref(),
            AqsParam::UserText => self.user_text.as_deref(),
            AqsParam::Granularity => self.granularity.as_ref().map(Granularity::as_str),
        }
    }

    /// Present parameters with their values, in emission order.
    pub fn present(&self) -> impl Iterator<Item = (AqsParam, &str)> + '_ {
        AQS_PARAMS
            .into_iter()
            .filter_map(move |p| self.value(p).map(|v| (p, v)))
    }

    /// One message per enumerated parameter carrying an unknown value.
    pub fn enumeration_errors(&self) -> Vec<String> {
        self.present()
            .filter_map(|(param, value)| {
                let accepted = param.accepted_values()?;
                (!accepted.contains(&value)).then(|| {
                    format!(
                        "The parameter `{}` has an invalid value `{value}`, expected one of: {}.",
                        param.name(),
                        accepted.join(", ")
                    )
                })
            })
            .collect()
    }
}

/// Filters for additive event entities (pages, users, revisions).
///
/// `all-*` values produce no filter. A project naming a family is matched by
/// regex on `project`.
pub fn events_filters(params: &AqsParams) -> AqsResult<Vec<Filter>> {
    let mut filters = Vec::new();
    for (param, value) in params.present() {
        let Some(mapping) = param.mapping() else {
            continue;
        };
        if is_all_value(value) {
            continue;
        }
        if param == AqsParam::Project {
            if let Some(pattern) = project_family_pattern(value) {
                filters.push(PROJECT_FAMILY.kind.build(PROJECT_FAMILY.dimension, &pattern));
                continue;
            }
        }
        filters.push(mapping.filter(param, value)?);
    }
    Ok(filters)
}

/// Filters for digest rows: every mapped parameter filters, `all-*`
/// included, except `project` and `activity-level` which skip their
/// sentinel like additive entities do.
pub fn digests_filters(params: &AqsParams) -> AqsResult<Vec<Filter>> {
    let mut filters = Vec::new();
    for (param, value) in params.present() {
        let Some(mapping) = param.mapping() else {
            continue;
        };
        let skips_sentinel = matches!(param, AqsParam::Project | AqsParam::ActivityLevel);
        if skips_sentinel && is_all_value(value) {
            continue;
        }
        filters.push(mapping.filter(param, value)?);
    }
    Ok(filters)
}
