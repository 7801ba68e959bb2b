//! Request helpers shared by the provider clients.

use biominer_core::{AppError, AppResult};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::client::{ClientOptions, ExtraOptions};
use crate::types::FieldMap;

/// Place model, temperature and token limit where `fields` says.
pub(crate) fn apply_fields(body: &mut Map<String, Value>, fields: FieldMap, options: &ClientOptions) {
    if let Some(path) = fields.model {
        insert_path(body, path, Value::from(options.model.as_str()));
    }
    if let Some(temperature) = options.temperature {
        insert_path(body, fields.temperature, temperature_value(temperature));
    }
    if let Some(path) = fields.max_tokens {
        insert_path(body, path, Value::from(options.max_tokens));
    }
}

/// JSON number for an `f32` without widening noise (0.7, not 0.699999988).
pub(crate) fn temperature_value(temperature: f32) -> Value {
    let widened = temperature
        .to_string()
        .parse::<f64>()
        .unwrap_or_else(|_| f64::from(temperature));
    Value::from(widened)
}

/// Insert `value` at a dotted `path`, creating intermediate objects.
pub(crate) fn insert_path(body: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            body.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let child = body
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(child) = child {
                insert_path(child, rest, value);
            }
        }
    }
}

/// Merge extra options over the body. Extra keys replace generated ones;
/// where both sides hold an object the two are merged key by key, so
/// `{"options": {"num_ctx": 4096}}` keeps a generated `options.temperature`.
pub(crate) fn merge_extra(body: &mut Map<String, Value>, extra: &ExtraOptions) {
    for (key, value) in extra {
        if let (Some(Value::Object(existing)), Value::Object(overrides)) =
            (body.get_mut(key), value)
        {
            merge_extra(existing, overrides);
            continue;
        }
        body.insert(key.clone(), value.clone());
    }
}

/// Send a JSON body and decode the JSON reply.
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: &str,
    request: reqwest::RequestBuilder,
    body: &Value,
    verbose: bool,
) -> AppResult<T> {
    if verbose {
        tracing::debug!("{} request body: {}", provider, body);
    }

    let response = request.json(body).send().await.map_err(|e| {
        AppError::Llm(format!("Failed to send request to {}: {}", provider, e))
    })?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(AppError::Llm(format!(
            "{} API error ({}): {}",
            provider, status, error_text
        )));
    }

    let payload: Value = response
        .json()
        .await
        .map_err(|e| AppError::Llm(format!("Failed to read {} response: {}", provider, e)))?;

    if verbose {
        tracing::debug!("{} response body: {}", provider, payload);
    }

    serde_json::from_value(payload)
        .map_err(|e| AppError::Llm(format!("Failed to parse {} response: {}", provider, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_path_nests() {
        let mut body = Map::new();
        insert_path(&mut body, "generationConfig.temperature", json!(0.5));
        insert_path(&mut body, "generationConfig.maxOutputTokens", json!(10));
        insert_path(&mut body, "model", json!("m"));

        assert_eq!(
            Value::Object(body),
            json!({
                "model": "m",
                "generationConfig": { "temperature": 0.5, "maxOutputTokens": 10 }
            })
        );
    }

    #[test]
    fn test_temperature_value_is_exact() {
        assert_eq!(temperature_value(0.7), json!(0.7));
        assert_eq!(temperature_value(1.0), json!(1.0));
    }

    #[test]
    fn test_merge_extra_overrides() {
        let mut body = Map::new();
        body.insert("temperature".to_string(), json!(0.7));

        let mut extra = ExtraOptions::new();
        extra.insert("temperature".to_string(), json!(0.1));
        extra.insert("top_p".to_string(), json!(0.9));
        merge_extra(&mut body, &extra);

        assert_eq!(body["temperature"], json!(0.1));
        assert_eq!(body["top_p"], json!(0.9));
    }

    #[test]
    fn test_merge_extra_nested_objects() {
        let mut body = Map::new();
        insert_path(&mut body, "options.temperature", json!(0.2));
        insert_path(&mut body, "options.seed", json!(1));

        let mut extra = ExtraOptions::new();
        extra.insert("options".to_string(), json!({ "num_ctx": 4096, "seed": 7 }));
        merge_extra(&mut body, &extra);

        assert_eq!(
            Value::Object(body),
            json!({ "options": { "temperature": 0.2, "num_ctx": 4096, "seed": 7 } })
        );
    }

    #[test]
    fn test_merge_extra_non_object_replaces() {
        let mut body = Map::new();
        insert_path(&mut body, "options.temperature", json!(0.2));

        let mut extra = ExtraOptions::new();
        extra.insert("options".to_string(), Value::Null);
        merge_extra(&mut body, &extra);

        assert_eq!(body["options"], Value::Null);
    }
}
