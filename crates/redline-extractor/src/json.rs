//! Recover JSON objects from model output

use redline_domain::StageError;
use serde_json::{Map, Value};

/// Extract JSON from a response, handling markdown code blocks
pub fn extract_json(response: &str) -> Option<&str> {
    let trimmed = response.trim();

    if let Some(rest) = trimmed.strip_prefix("```") {
        // Skip the fence line (``` or ```json) and the closing fence
        let (_, body) = rest.split_once('\n')?;
        let body = body.trim_end();
        let body = body.strip_suffix("```").unwrap_or(body);
        Some(body.trim())
    } else {
        Some(trimmed)
    }
}

/// Parse a model response that must be a single JSON object
pub fn parse_object(response: &str, stage: &str) -> Result<Map<String, Value>, StageError> {
    let json = extract_json(response)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| StageError::malformed(stage, "empty response"))?;

    let value: Value = serde_json::from_str(json).map_err(|e| {
        StageError::malformed(stage, format!("Failed to parse response as JSON: {}", e))
    })?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(StageError::malformed(
            stage,
            format!("expected a JSON object, got {}", type_name(&other)),
        )),
    }
}

/// Read an optional list of strings; wrong element types are a hard error
pub fn string_list(
    map: &Map<String, Value>,
    key: &str,
    stage: &str,
) -> Result<Option<Vec<String>>, StageError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                Value::Number(n) => Ok(n.to_string()),
                other => Err(StageError::malformed(
                    stage,
                    format!("'{}' must contain strings, found {}", key, type_name(other)),
                )),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(other) => Err(StageError::malformed(
            stage,
            format!("'{}' must be a list, found {}", key, type_name(other)),
        )),
    }
}

/// Read an optional string; non-strings are a hard error
pub fn string_field(
    map: &Map<String, Value>,
    key: &str,
    stage: &str,
) -> Result<Option<String>, StageError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(StageError::malformed(
            stage,
            format!("'{}' must be a string, found {}", key, type_name(other)),
        )),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_json_plain() {
        assert_eq!(extract_json("  {\"a\": 1}  "), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_extract_json_code_fence() {
        let response = "```json\n{\"title\": \"Lease\"}\n```";
        assert_eq!(extract_json(response), Some("{\"title\": \"Lease\"}"));

        let bare = "```\n{\"a\": 1}\n```\n";
        assert_eq!(extract_json(bare), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_extract_json_empty_fence() {
        assert_eq!(extract_json("```"), None);
    }

    #[test]
    fn test_parse_object_rejects_non_objects() {
        assert!(parse_object("[1, 2]", "extraction").is_err());
        assert!(parse_object("This is not JSON", "extraction").is_err());
        assert!(parse_object("", "extraction").is_err());
        assert!(parse_object("{\"ok\": true}", "extraction").is_ok());
    }

    #[test]
    fn test_string_list_shapes() {
        let map = json!({"a": ["x", 2], "b": "nope", "c": null, "d": [{"k": 1}]});
        let map = map.as_object().unwrap();

        assert_eq!(
            string_list(map, "a", "s").unwrap(),
            Some(vec!["x".to_string(), "2".to_string()])
        );
        assert!(string_list(map, "b", "s").is_err());
        assert_eq!(string_list(map, "c", "s").unwrap(), None);
        assert!(string_list(map, "d", "s").is_err());
        assert_eq!(string_list(map, "missing", "s").unwrap(), None);
    }

    #[test]
    fn test_string_field_shapes() {
        let map = json!({"title": "Lease", "n": 3});
        let map = map.as_object().unwrap();
        assert_eq!(string_field(map, "title", "s").unwrap(), Some("Lease".to_string()));
        assert!(string_field(map, "n", "s").is_err());
    }
}
