//! Post-merge service augmentation.
//!
//! After reconciliation the final record may be enriched from a chain of
//! service endpoints (hosting APIs and the like). Each URL is fetched as
//! JSON and the response object is deep-merged over the current record,
//! service fields winning. Services are applied strictly left to right, so
//! each one builds on the cumulative output of its predecessors. A failing
//! service is recoverable: the chain continues with the record unchanged.

use serde_json::Value;

use crate::error::HarvestError;
use crate::logging::HarvestLog;

/// Run the record through each service URL in order.
pub fn augment(
    record: Value,
    services: &[String],
    strict: bool,
    log: &mut HarvestLog,
) -> Result<Value, HarvestError> {
    if services.is_empty() {
        return Ok(record);
    }

    // Blocking I/O throughout; no internal timeout is imposed.
    let client = reqwest::blocking::Client::builder()
        .timeout(None)
        .build()
        .map_err(|e| HarvestError::ServiceFailed {
            url: services[0].clone(),
            detail: format!("cannot build HTTP client: {e}"),
        })?;

    let mut current = record;
    for url in services {
        log.debug(format!("querying service {url}"));
        match call_service(&client, url) {
            Ok(response) => {
                current = deep_merge(current, response);
            }
            Err(err) => {
                if strict {
                    log.error(err.to_string());
                    return Err(err);
                }
                log.warn(format!("{err} (service skipped)"));
            }
        }
    }
    Ok(current)
}

fn call_service(client: &reqwest::blocking::Client, url: &str) -> Result<Value, HarvestError> {
    let response = client
        .get(url)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .map_err(|e| HarvestError::ServiceFailed {
            url: url.to_string(),
            detail: e.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(HarvestError::ServiceFailed {
            url: url.to_string(),
            detail: format!("HTTP {status}"),
        });
    }

    let body: Value = response.json().map_err(|e| HarvestError::ServiceFailed {
        url: url.to_string(),
        detail: format!("invalid JSON response: {e}"),
    })?;
    if !body.is_object() {
        return Err(HarvestError::ServiceFailed {
            url: url.to_string(),
            detail: "service response is not a JSON object".to_string(),
        });
    }
    Ok(body)
}

/// Merge `incoming` over `base`. Objects merge recursively; any other value
/// from `incoming` replaces the one in `base`.
pub fn deep_merge(base: Value, incoming: Value) -> Value {
    match (base, incoming) {
        (Value::Object(mut base_map), Value::Object(incoming_map)) => {
            for (key, incoming_value) in incoming_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, incoming_value),
                    None => incoming_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (_, incoming) => incoming,
    }
}
