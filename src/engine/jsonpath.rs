//! Path expressions over parsed JSON documents
//!
//! Supports the subset of JSONPath the GAPI envelopes need:
//! - `$` root (optional)
//! - `.field` and `['field']` / `["field"]` member access
//! - `[3]` array index
//! - `[*]` and `.*` wildcards over array elements or object values
//!
//! Evaluation is a pure function of (document, path) and yields matches in
//! document order.

use crate::error::ExtractError;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    Field(String),
    Index(usize),
    Wildcard,
}

/// A parsed path expression.
///
/// # Example
/// ```
/// use tap_gapi::engine::JsonPath;
/// use serde_json::json;
///
/// let path = JsonPath::parse("$.result.items[*].id").unwrap();
/// let doc = json!({"result": {"items": [{"id": "a"}, {"id": "b"}]}});
/// let ids: Vec<_> = path.select(&doc).into_iter().cloned().collect();
/// assert_eq!(ids, vec![json!("a"), json!("b")]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JsonPath {
    source: String,
    segments: Vec<Segment>,
}

impl JsonPath {
    /// Parse an expression.
    ///
    /// # Errors
    /// Returns [`ExtractError::Config`] on empty segments, unbalanced
    /// brackets, unterminated quotes or non-numeric indexes.
    pub fn parse(expr: &str) -> Result<Self, ExtractError> {
        let source = expr.trim();
        if source.is_empty() {
            return Err(invalid(expr, "empty expression"));
        }

        let (rooted, rest) = match source.strip_prefix('$') {
            Some(rest) => (true, rest),
            None => (false, source),
        };
        let chars: Vec<char> = rest.chars().collect();
        let mut segments = Vec::new();
        let mut i = 0;

        // A bare leading name (`result.items`) is accepted like `$.result.items`
        if !chars.is_empty() && chars[0] != '.' && chars[0] != '[' {
            if rooted {
                return Err(invalid(expr, "expected '.' or '[' after '$'"));
            }
            let (name, next) = read_name(&chars, 0);
            segments.push(field_or_wildcard(expr, name)?);
            i = next;
        }

        while i < chars.len() {
            match chars[i] {
                '.' => {
                    let (name, next) = read_name(&chars, i + 1);
                    segments.push(field_or_wildcard(expr, name)?);
                    i = next;
                }
                '[' => {
                    let close = find_close(&chars, i + 1)
                        .ok_or_else(|| invalid(expr, "unclosed '['"))?;
                    let inner: String = chars[i + 1..close].iter().collect();
                    segments.push(bracket_segment(expr, inner.trim())?);
                    i = close + 1;
                }
                c => return Err(invalid(expr, &format!("unexpected '{c}'"))),
            }
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Leading run of member names, e.g. `["result", "items"]` for
    /// `$.result.items[*]`.
    pub fn field_prefix(&self) -> Vec<&str> {
        self.segments
            .iter()
            .map_while(|s| match s {
                Segment::Field(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// All matches in document order. No match is an empty vector.
    pub fn select<'a>(&self, document: &'a Value) -> Vec<&'a Value> {
        let mut current = vec![document];
        for segment in &self.segments {
            let mut next = Vec::new();
            for value in current {
                match (segment, value) {
                    (Segment::Field(name), Value::Object(map)) => {
                        if let Some(child) = map.get(name) {
                            next.push(child);
                        }
                    }
                    (Segment::Index(idx), Value::Array(items)) => {
                        if let Some(child) = items.get(*idx) {
                            next.push(child);
                        }
                    }
                    (Segment::Wildcard, Value::Array(items)) => next.extend(items.iter()),
                    (Segment::Wildcard, Value::Object(map)) => next.extend(map.values()),
                    _ => {}
                }
            }
            if next.is_empty() {
                return next;
            }
            current = next;
        }
        current
    }

    /// First match, if any.
    pub fn first<'a>(&self, document: &'a Value) -> Option<&'a Value> {
        self.select(document).into_iter().next()
    }
}

impl FromStr for JsonPath {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn invalid(expr: &str, reason: &str) -> ExtractError {
    ExtractError::Config(format!("invalid path expression '{expr}': {reason}"))
}

fn read_name(chars: &[char], start: usize) -> (String, usize) {
    let mut end = start;
    while end < chars.len() && chars[end] != '.' && chars[end] != '[' {
        end += 1;
    }
    (chars[start..end].iter().collect(), end)
}

fn field_or_wildcard(expr: &str, name: String) -> Result<Segment, ExtractError> {
    match name.as_str() {
        "" => Err(invalid(expr, "empty member name")),
        "*" => Ok(Segment::Wildcard),
        _ => Ok(Segment::Field(name)),
    }
}

/// Index of the `]` closing a bracket opened just before `start`, skipping
/// over quoted names.
fn find_close(chars: &[char], start: usize) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (offset, &c) in chars[start..].iter().enumerate() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, ']') => return Some(start + offset),
            (None, _) => {}
        }
    }
    None
}

fn bracket_segment(expr: &str, inner: &str) -> Result<Segment, ExtractError> {
    if inner == "*" {
        return Ok(Segment::Wildcard);
    }
    for quote in ['\'', '"'] {
        if let Some(name) = inner
            .strip_prefix(quote)
            .and_then(|s| s.strip_suffix(quote))
        {
            if name.is_empty() {
                return Err(invalid(expr, "empty member name"));
            }
            return Ok(Segment::Field(name.to_string()));
        }
    }
    inner
        .parse::<usize>()
        .map(Segment::Index)
        .map_err(|_| invalid(expr, &format!("bad index '{inner}'")))
}
