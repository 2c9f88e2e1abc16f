//! Next-page cursor tracking

use super::jsonpath::JsonPath;
use crate::error::ExtractError;
use serde_json::Value;

/// Opaque pagination token echoed back to the API on the next request.
///
/// Only presence matters; cursors are never compared or ordered.
#[derive(Clone, Debug)]
pub struct PageCursor(Value);

impl PageCursor {
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// The `nextToken` query value: the cursor serialised as compact JSON.
    /// Percent-encoding happens when the value is placed in the URL.
    pub fn to_query_value(&self) -> Result<String, ExtractError> {
        serde_json::to_string(&self.0)
            .map_err(|e| ExtractError::ResponseFormat(format!("unserialisable cursor: {e}")))
    }
}

impl From<Value> for PageCursor {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Finds the next-page cursor in a response envelope.
#[derive(Clone, Debug)]
pub struct PageCursorTracker {
    path: JsonPath,
}

impl PageCursorTracker {
    pub fn new(path: JsonPath) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &JsonPath {
        &self.path
    }

    /// First match of the cursor path, or `None` when pagination is over.
    ///
    /// Any falsy value counts as absent: `null`, `false`, zero, and empty
    /// strings, arrays or objects. GAPI reports the last page with
    /// `"lastEvaluatedKey": null` as often as it omits the key.
    pub fn next_cursor(&self, document: &Value) -> Option<PageCursor> {
        let value = self.path.first(document)?;
        let empty = match value {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Number(n) => n.as_f64() == Some(0.0),
            Value::String(s) => s.is_empty(),
            Value::Array(a) => a.is_empty(),
            Value::Object(o) => o.is_empty(),
        };
        if empty {
            None
        } else {
            Some(PageCursor(value.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tracker() -> PageCursorTracker {
        PageCursorTracker::new(JsonPath::parse("$.result.lastEvaluatedKey").unwrap())
    }

    #[test]
    fn test_cursor_found() {
        let body = json!({
            "result": {
                "items": [{"id": "a"}, {"id": "b"}],
                "lastEvaluatedKey": "X"
            }
        });
        let cursor = tracker().next_cursor(&body).unwrap();
        assert_eq!(cursor.as_value(), &json!("X"));
    }

    #[test]
    fn test_structured_cursor() {
        let body = json!({"result": {"items": [], "lastEvaluatedKey": {"pk": "cc#1", "sk": 7}}});
        let cursor = tracker().next_cursor(&body).unwrap();
        assert_eq!(cursor.to_query_value().unwrap(), r#"{"pk":"cc#1","sk":7}"#);
    }

    #[test]
    fn test_missing_key_is_absent() {
        let body = json!({"result": {"items": [{"id": "a"}]}});
        assert!(tracker().next_cursor(&body).is_none());
    }

    #[test]
    fn test_null_and_empty_are_absent() {
        for key in [json!(null), json!(""), json!({}), json!([])] {
            let body = json!({"result": {"items": [], "lastEvaluatedKey": key}});
            assert!(tracker().next_cursor(&body).is_none(), "{key} should end paging");
        }
    }

    #[test]
    fn test_false_and_zero_are_absent() {
        for key in [json!(false), json!(0), json!(0.0)] {
            let body = json!({"result": {"items": [], "lastEvaluatedKey": key}});
            assert!(tracker().next_cursor(&body).is_none(), "{key} should end paging");
        }
        for key in [json!(true), json!(3)] {
            let body = json!({"result": {"items": [], "lastEvaluatedKey": key}});
            assert!(tracker().next_cursor(&body).is_some(), "{key} should keep paging");
        }
    }

    #[test]
    fn test_string_cursor_query_value() {
        let cursor = PageCursor::from(json!("X"));
        assert_eq!(cursor.to_query_value().unwrap(), r#""X""#);
    }
}
