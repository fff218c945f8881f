//! Response validation: body → result list, or a parse/service error.

use serde_json::Value;

use crate::error::{HarvestError, ServiceError};
use crate::types::{HttpResponse, Query};

/// Turn a successful HTTP response into its `results` array.
///
/// * empty or non-JSON body, non-object body, missing `results` → [`HarvestError::Parse`]
/// * body carrying an `error` member → [`HarvestError::Service`]
pub fn parse_results(query: &Query, response: &HttpResponse) -> Result<Vec<Value>, HarvestError> {
    let parse_failure = |reason: String| HarvestError::Parse {
        url: query.url.to_string(),
        reason,
    };

    if response.body.trim().is_empty() {
        return Err(parse_failure("empty body".to_string()));
    }

    let parsed: Value = serde_json::from_str(&response.body)
        .map_err(|e| parse_failure(format!("invalid JSON: {e}")))?;

    let Value::Object(mut body) = parsed else {
        return Err(parse_failure("body is not a JSON object".to_string()));
    };

    if let Some(error) = body.get("error") {
        return Err(HarvestError::Service {
            url: query.url.to_string(),
            source: service_error(error),
        });
    }

    match body.remove("results") {
        Some(Value::Array(results)) => Ok(results),
        Some(_) => Err(parse_failure("`results` is not an array".to_string())),
        None => Err(parse_failure("no `results` member".to_string())),
    }
}

/// Read the service's error payload, tolerating partial shapes.
fn service_error(error: &Value) -> ServiceError {
    match error {
        Value::Object(obj) => ServiceError {
            code: obj.get("code").and_then(Value::as_i64).unwrap_or(0),
            message: obj
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            details: obj
                .get("details")
                .and_then(Value::as_array)
                .map(|d| {
                    d.iter()
                        .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                        .collect()
                })
                .unwrap_or_default(),
        },
        Value::String(s) => ServiceError {
            code: 0,
            message: s.clone(),
            details: Vec::new(),
        },
        other => ServiceError {
            code: 0,
            message: other.to_string(),
            details: Vec::new(),
        },
    }
}
