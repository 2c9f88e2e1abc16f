//! Record extraction from response bodies

use super::jsonpath::JsonPath;
use crate::error::ExtractError;
use serde_json::{Map, Value};

/// One output row: field name to value, in the order the API sent them.
pub type Record = Map<String, Value>;

/// Parse a raw response body.
///
/// # Errors
/// A body that is not JSON is an [`ExtractError::ResponseFormat`].
pub fn parse_body(body: &[u8]) -> Result<Value, ExtractError> {
    serde_json::from_slice(body)
        .map_err(|e| ExtractError::ResponseFormat(format!("response body is not valid JSON: {e}")))
}

/// Pulls records out of a response envelope with a records path.
///
/// # Example
/// ```
/// use tap_gapi::engine::{JsonPath, RecordExtractor};
/// use serde_json::json;
///
/// let extractor = RecordExtractor::new(JsonPath::parse("$.result[*]").unwrap());
/// let body = json!({"result": [{"id": "a"}, {"id": "b"}]});
/// let records = extractor.extract(&body).unwrap();
/// assert_eq!(records.len(), 2);
/// assert_eq!(records[0]["id"], "a");
/// ```
#[derive(Clone, Debug)]
pub struct RecordExtractor {
    path: JsonPath,
}

impl RecordExtractor {
    pub fn new(path: JsonPath) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &JsonPath {
        &self.path
    }

    /// Every match of the records path, in array order.
    ///
    /// A path that matches nothing yields no records.
    ///
    /// # Errors
    /// A match that is not a JSON object cannot be a record and is reported
    /// as [`ExtractError::ResponseFormat`].
    pub fn extract(&self, document: &Value) -> Result<Vec<Record>, ExtractError> {
        self.path
            .select(document)
            .into_iter()
            .enumerate()
            .map(|(idx, value)| match value {
                Value::Object(map) => Ok(map.clone()),
                other => Err(ExtractError::ResponseFormat(format!(
                    "match {idx} of '{}' is {}, not an object",
                    self.path,
                    kind(other)
                ))),
            })
            .collect()
    }

    /// Why the records path cannot reach into `document`, if it cannot.
    ///
    /// Walks the leading field names of the path and reports the first one
    /// whose parent exists but is not an object, such as `$.result.items[*]`
    /// against `{"result": [...]}`. A missing key is not a mismatch.
    pub fn envelope_mismatch(&self, document: &Value) -> Option<String> {
        let mut current = document;
        let mut walked = String::from("$");
        for field in self.path.field_prefix() {
            match current {
                Value::Object(map) => match map.get(field) {
                    Some(next) => current = next,
                    None => return None,
                },
                other => {
                    return Some(format!(
                        "'{}' expects an object at {walked}, found {}",
                        self.path,
                        kind(other)
                    ));
                }
            }
            walked.push('.');
            walked.push_str(field);
        }
        None
    }

    /// Parse `body` and extract its records.
    pub fn extract_bytes(&self, body: &[u8]) -> Result<Vec<Record>, ExtractError> {
        self.extract(&parse_body(body)?)
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extractor(path: &str) -> RecordExtractor {
        RecordExtractor::new(JsonPath::parse(path).unwrap())
    }

    #[test]
    fn test_extract_paginated_envelope() {
        let body = json!({
            "result": {
                "items": [{"id": "a"}, {"id": "b"}],
                "lastEvaluatedKey": "X"
            }
        });
        let records = extractor("$.result.items[*]").extract(&body).unwrap();

        let values: Vec<Value> = records.into_iter().map(Value::Object).collect();
        assert_eq!(values, vec![json!({"id": "a"}), json!({"id": "b"})]);
    }

    #[test]
    fn test_no_match_is_empty() {
        let body = json!({"result": {"lastEvaluatedKey": null}});
        let records = extractor("$.result.items[*]").extract(&body).unwrap();
        assert!(records.is_empty());

        let records = extractor("$.result[*]").extract(&json!({})).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_envelope_mismatch_detected() {
        let flat = json!({"result": [{"id": "a"}]});
        let paged = extractor("$.result.items[*]");
        assert!(paged.extract(&flat).unwrap().is_empty());
        let why = paged.envelope_mismatch(&flat).unwrap();
        assert!(why.contains("$.result"), "{why}");
        assert!(why.contains("an array"), "{why}");

        let last_page = json!({"result": {"lastEvaluatedKey": null}});
        assert!(paged.envelope_mismatch(&last_page).is_none());
        assert!(extractor("$.result[*]").envelope_mismatch(&flat).is_none());
        assert!(paged.envelope_mismatch(&json!({})).is_none());
    }

    #[test]
    fn test_field_order_preserved() {
        let body = br#"{"result":[{"zeta":1,"alpha":2,"mid":3}]}"#;
        let records = extractor("$.result[*]").extract_bytes(body).unwrap();
        let keys: Vec<&str> = records[0].keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_malformed_json_is_format_error() {
        let err = extractor("$.result[*]")
            .extract_bytes(b"<html>gateway</html>")
            .unwrap_err();
        assert!(matches!(err, ExtractError::ResponseFormat(_)));
    }

    #[test]
    fn test_non_object_match_is_format_error() {
        let body = json!({"result": ["a", "b"]});
        let err = extractor("$.result[*]").extract(&body).unwrap_err();
        assert!(matches!(err, ExtractError::ResponseFormat(_)));
        assert!(err.to_string().contains("a string"));
    }
}
