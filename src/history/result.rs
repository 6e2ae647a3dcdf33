//! Reshaping Druid answers into API items

use serde_json::{json, Map, Value};
use std::net::IpAddr;

use super::params::AqsParams;
use crate::druid::DruidResponse;
use crate::error::{AqsError, AqsResult};

pub const NOT_FOUND_DESCRIPTION: &str = "The date(s) you used are valid, but we either do not \
have data for those date(s), or the project you asked for is not loaded yet.  Please check \
https://wikimedia.org/api/rest_v1/?doc for more information.";

/// Final status and JSON body of an API call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

fn body_text(body: &Value) -> String {
    match body {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

pub fn druid_error_message(body: &Value) -> String {
    format!(
        "Druid server error.\n\
         It would be great if you could send us an email (analytics@wikimedia.org)\n\
         with a copy of this message.\n\
         Thanks a lot!\n\
         {}",
        body_text(body)
    )
}

/// An engine 404 means valid dates with no loaded data.
pub fn annotate_not_found(response: DruidResponse) -> DruidResponse {
    if response.status != 404 {
        return response;
    }
    let mut body = match response.body {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("detail".to_string(), other);
            map
        }
    };
    body.insert("description".to_string(), json!(NOT_FOUND_DESCRIPTION));
    body.insert("type".to_string(), json!("not_found"));
    DruidResponse {
        status: 404,
        body: Value::Object(body),
    }
}

fn is_ip_literal(value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|text| text.parse::<IpAddr>().is_ok())
}

/// Fractional values come from approximate count-distinct aggregators.
fn floor_value(value: &Value) -> Value {
    match value {
        Value::Number(n) if n.is_f64() => n
            .as_f64()
            .map(|f| json!(f.floor() as i64))
            .unwrap_or_else(|| value.clone()),
        other => other.clone(),
    }
}

fn reshape_entry(entry: &Value, key_filters: Option<&[&str]>, is_top: bool) -> AqsResult<Value> {
    let unexpected = || AqsError::Internal(format!("unexpected Druid result entry: {entry}"));
    let timestamp = entry.get("timestamp").cloned().ok_or_else(unexpected)?;
    let result = entry.get("result").ok_or_else(unexpected)?;

    let mut item = Map::new();
    item.insert("timestamp".to_string(), timestamp);

    if is_top {
        let ranked = result.as_array().ok_or_else(unexpected)?;
        let top: Vec<Value> = ranked
            .iter()
            .enumerate()
            .map(|(idx, row)| {
                let mut row = row.as_object().cloned().unwrap_or_default();
                for value in row.values_mut() {
                    if is_ip_literal(value) {
                        *value = Value::Null;
                    }
                }
                row.insert("rank".to_string(), json!(idx + 1));
                Value::Object(row)
            })
            .collect();
        item.insert("top".to_string(), Value::Array(top));
    } else {
        let fields = result.as_object().ok_or_else(unexpected)?;
        for (key, value) in fields {
            if key_filters.map_or(true, |keys| keys.contains(&key.as_str())) {
                item.insert(key.clone(), floor_value(value));
            }
        }
    }

    Ok(Value::Object(item))
}

/// Turn a Druid answer into the API response.
///
/// Success collapses the per-interval array into one item echoing the
/// request parameters. Other statuses keep their code with the contact
/// template as body, except 404 which keeps its annotation.
pub fn convert_druid_result(
    response: DruidResponse,
    params: &AqsParams,
    key_filters: Option<&[&str]>,
    is_top: bool,
) -> AqsResult<ApiResponse> {
    if response.status == 404 {
        let annotated = annotate_not_found(response);
        return Ok(ApiResponse {
            status: annotated.status,
            body: annotated.body,
        });
    }
    if response.status != 200 {
        return Ok(ApiResponse {
            status: response.status,
            body: Value::String(druid_error_message(&response.body)),
        });
    }

    let entries = response.body.as_array().ok_or_else(|| {
        AqsError::Internal("Druid result is not an array of intervals".to_string())
    })?;

    let mut core = Map::new();
    for (param, value) in params.present() {
        core.insert(param.name().to_string(), json!(value));
    }
    let results = entries
        .iter()
        .map(|entry| reshape_entry(entry, key_filters, is_top))
        .collect::<AqsResult<Vec<_>>>()?;
    core.insert("results".to_string(), Value::Array(results));

    Ok(ApiResponse {
        status: 200,
        body: json!({ "items": [core] }),
    })
}
