//! Request parameter normalization (projects, referers, titles, file paths)

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{AqsError, AqsResult};

/// Referer values that name a traffic source rather than a project.
pub const REFERER_SENTINELS: &[&str] =
    &["internal", "external", "search-engine", "unknown", "none"];

static PROJECT_PATTERN: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_.\-]+$"));

fn project_pattern() -> AqsResult<&'static Regex> {
    PROJECT_PATTERN
        .as_ref()
        .map_err(|e| AqsError::Internal(format!("invalid project pattern: {e}")))
}

/// Normalize a project to its canonical `en.wikipedia` form.
///
/// Accepts `en.wikipedia.org`, `EN.WIKIPEDIA.ORG` or `www.en.wikipedia.org`.
/// When `reject_all_prefix` is set, `all-...` aggregate values are refused.
pub fn normalize_project(raw: &str, reject_all_prefix: bool) -> AqsResult<String> {
    let lowered = raw.trim().to_lowercase();
    let without_www = lowered.strip_prefix("www.").unwrap_or(&lowered);
    let project = without_www.strip_suffix(".org").unwrap_or(without_www);

    if !project_pattern()?.is_match(project) {
        return Err(AqsError::invalid(
            "The parameter `project` contains invalid characters.",
        ));
    }
    if reject_all_prefix && project.starts_with("all-") {
        return Err(AqsError::invalid(format!(
            "`{project}` is not accepted for this metric, a single project is required."
        )));
    }

    Ok(project.to_string())
}

/// Normalize a referer: traffic-source sentinels are only trimmed and
/// lowercased, anything else is treated as a project.
pub fn normalize_referer(raw: &str) -> AqsResult<String> {
    let lowered = raw.trim().to_lowercase();
    if REFERER_SENTINELS.contains(&lowered.as_str()) {
        return Ok(lowered);
    }
    normalize_project(&lowered, false)
}

/// MediaWiki stores titles with underscores instead of spaces.
pub fn normalize_page_title(raw: &str) -> String {
    raw.replace(' ', "_")
}

/// Re-encode the file name of a `/dir/.../file` path.
///
/// The upstream router decodes the whole path, so a file name containing
/// `/` or `%` would no longer match storage keys. Only the final segment is
/// encoded again; the directory part is kept as is.
pub fn normalize_file_uri(raw: &str) -> AqsResult<String> {
    if !raw.starts_with('/') {
        return Err(AqsError::NotFound(format!(
            "Invalid file path `{raw}`, file paths must start with '/'."
        )));
    }
    let (directory, file_name) = raw.rsplit_once('/').unwrap_or(("", raw));
    Ok(format!("{directory}/{}", urlencoding::encode(file_name)))
}
