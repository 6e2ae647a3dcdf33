//! Post-processing of table store rows

use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

use crate::error::{AqsError, AqsResult};

/// Denormalized per-article view columns, keyed by `access_agent`.
const ARTICLE_VIEW_COLUMNS: &[(&str, &str)] = &[
    ("all_access_all_agents", "aa"),
    ("all_access_automated", "ab"),
    ("all_access_spider", "as"),
    ("all_access_user", "au"),
    ("desktop_all_agents", "da"),
    ("desktop_automated", "db"),
    ("desktop_spider", "ds"),
    ("desktop_user", "du"),
    ("mobile_app_all_agents", "maa"),
    ("mobile_app_automated", "mab"),
    ("mobile_app_spider", "mas"),
    ("mobile_app_user", "mau"),
    ("mobile_web_all_agents", "mwa"),
    ("mobile_web_automated", "mwb"),
    ("mobile_web_spider", "mws"),
    ("mobile_web_user", "mwu"),
];

fn article_view_column(access: &str, agent: &str) -> Option<&'static str> {
    let key = format!("{access}_{agent}").replace('-', "_");
    ARTICLE_VIEW_COLUMNS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, column)| *column)
}

/// Pick the requested access/agent views out of daily per-article rows,
/// optionally summing them per month (`YYYYMM0100`, ascending).
pub fn roll_up_article_views(
    items: Vec<Value>,
    access: &str,
    agent: &str,
    monthly: bool,
) -> AqsResult<Vec<Value>> {
    let column = article_view_column(access, agent).ok_or_else(|| {
        AqsError::invalid(format!("unknown access/agent combination `{access}`/`{agent}`"))
    })?;

    let mut daily = Vec::with_capacity(items.len());
    let mut months: BTreeMap<String, Map<String, Value>> = BTreeMap::new();

    for item in items {
        let Value::Object(mut row) = item else {
            continue;
        };
        let views = row.get(column).and_then(Value::as_i64).unwrap_or(0);
        for (_, denormalized) in ARTICLE_VIEW_COLUMNS {
            row.remove(*denormalized);
        }
        row.insert("access".to_string(), json!(access));
        row.insert("agent".to_string(), json!(agent));
        row.insert("views".to_string(), json!(views));

        if !monthly {
            daily.push(Value::Object(row));
            continue;
        }

        let timestamp = row.get("timestamp").and_then(Value::as_str).unwrap_or("");
        let Some(year_month) = timestamp.get(..6) else {
            continue;
        };
        let month = months.entry(year_month.to_string()).or_insert_with(|| {
            let mut month = Map::new();
            for key in ["project", "article"] {
                month.insert(key.to_string(), row.get(key).cloned().unwrap_or(Value::Null));
            }
            month.insert("granularity".to_string(), json!("monthly"));
            month.insert("timestamp".to_string(), json!(format!("{year_month}0100")));
            month.insert("access".to_string(), json!(access));
            month.insert("agent".to_string(), json!(agent));
            month.insert("views".to_string(), json!(0));
            month
        });
        let total = month.get("views").and_then(Value::as_i64).unwrap_or(0) + views;
        month.insert("views".to_string(), json!(total));
    }

    if monthly {
        Ok(months.into_values().map(Value::Object).collect())
    } else {
        Ok(daily)
    }
}

/// Bucket label for a ceiled view count: the decade-wide range it falls in,
/// an exact power of ten belonging to the lower bucket.
pub fn get_interval_for_ceiled_value(value: u64) -> String {
    if value == 0 {
        return "0-0".to_string();
    }
    let mut upper_bound: u64 = 1;
    let mut exponent = 0u32;
    while upper_bound < value {
        upper_bound = upper_bound.saturating_mul(10);
        exponent += 1;
    }
    let lower = 10u64.pow(exponent.saturating_sub(1));
    format!("{lower}-{}", lower.saturating_mul(10) - 1)
}

/// Replace each country's ceiled views with its bucket label, keeping the
/// number as `views_ceil`.
pub fn bucket_country_views(items: Vec<Value>) -> Vec<Value> {
    items
        .into_iter()
        .map(|item| {
            let mut row = match item {
                Value::Object(row) => row,
                other => return other,
            };
            let countries = row.remove("countriesJSON").unwrap_or(Value::Array(vec![]));
            let countries = match countries {
                Value::Array(list) => list.into_iter().map(bucket_country).collect(),
                other => other,
            };
            row.insert("countries".to_string(), countries);
            Value::Object(row)
        })
        .collect()
}

fn bucket_country(country: Value) -> Value {
    let mut country = match country {
        Value::Object(country) => country,
        other => return other,
    };
    if let Some(ceiled) = country.get("views").and_then(Value::as_u64) {
        country.insert("views_ceil".to_string(), json!(ceiled));
        country.insert("views".to_string(), json!(get_interval_for_ceiled_value(ceiled)));
    }
    Value::Object(country)
}

/// Integer reading of a stored long: numbers are truncated, strings read
/// up to the first non-digit, anything unreadable becomes null.
fn to_integer(value: &Value) -> Value {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!(i),
            None => n.as_f64().map_or(Value::Null, |f| json!(f.trunc() as i64)),
        },
        Value::String(text) => {
            let text = text.trim_start();
            let sign_len = usize::from(text.starts_with(['-', '+']));
            let digits_len = text[sign_len..]
                .bytes()
                .take_while(u8::is_ascii_digit)
                .count();
            text[..sign_len + digits_len]
                .parse::<i64>()
                .map_or(Value::Null, |i| json!(i))
        }
        _ => Value::Null,
    }
}

/// Coerce the named columns of every row to integers. Null and missing
/// columns are left alone.
pub fn coerce_integer_fields(items: Vec<Value>, fields: &[&str]) -> Vec<Value> {
    items
        .into_iter()
        .map(|item| {
            let mut row = match item {
                Value::Object(row) => row,
                other => return other,
            };
            for field in fields {
                if let Some(value) = row.get_mut(*field) {
                    if !value.is_null() {
                        *value = to_integer(value);
                    }
                }
            }
            Value::Object(row)
        })
        .collect()
}

/// Per-project rows: the `v` long column wins over `views` when loaded.
pub fn prefer_long_views(items: Vec<Value>) -> Vec<Value> {
    items
        .into_iter()
        .map(|item| {
            let mut row = match item {
                Value::Object(row) => row,
                other => return other,
            };
            match row.remove("v") {
                Some(Value::Null) | None => {}
                Some(long) => {
                    row.insert("views".to_string(), to_integer(&long));
                }
            }
            Value::Object(row)
        })
        .collect()
}

pub const INVALID_TOP_JSON: &str = "This response contained invalid JSON, we are working on \
fixing the problem, but until then you can try a different date.";

/// Top article rows: take `articlesJSON` when loaded, otherwise decode the
/// `articles` text column, then order the list by `rank`.
pub fn rank_top_articles(items: Vec<Value>) -> AqsResult<Vec<Value>> {
    items
        .into_iter()
        .map(|item| {
            let mut row = match item {
                Value::Object(row) => row,
                other => return Ok(other),
            };
            let articles = match row.remove("articlesJSON") {
                Some(Value::Null) | None => match row.remove("articles") {
                    Some(Value::String(text)) => serde_json::from_str(&text)
                        .map_err(|_| AqsError::Internal(INVALID_TOP_JSON.to_string()))?,
                    _ => return Err(AqsError::Internal(INVALID_TOP_JSON.to_string())),
                },
                Some(loaded) => loaded,
            };
            let articles = match articles {
                Value::Array(mut list) => {
                    list.sort_by_key(|article| {
                        article.get("rank").and_then(Value::as_i64).unwrap_or(i64::MAX)
                    });
                    Value::Array(list)
                }
                _ => return Err(AqsError::Internal(INVALID_TOP_JSON.to_string())),
            };
            row.insert("articles".to_string(), articles);
            Ok(Value::Object(row))
        })
        .collect()
}
