//! Stream descriptors
//!
//! A [`StreamDescriptor`] is everything that distinguishes one extractable
//! entity from another. Adding an entity means adding a descriptor value;
//! the extraction engine needs no new code.

use super::schema::Schema;
use crate::engine::JsonPath;
use crate::error::ExtractError;
use serde::Serialize;

/// Records path of single-shot GAPI endpoints
pub const DEFAULT_RECORDS_PATH: &str = "$.result[*]";
/// Records path of cursor-paginated GAPI endpoints
pub const PAGINATED_RECORDS_PATH: &str = "$.result.items[*]";
/// Where cursor-paginated endpoints report the next page
pub const LAST_EVALUATED_KEY_PATH: &str = "$.result.lastEvaluatedKey";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaginationMode {
    /// One request per run
    None,
    /// Follow the cursor until the API stops returning one
    Cursor,
}

impl std::fmt::Display for PaginationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            Self::None => "none",
            Self::Cursor => "cursor",
        })
    }
}

/// Static configuration for one stream. Immutable once built.
///
/// # Example
/// ```
/// use tap_gapi::streams::{PaginationMode, Property, Schema, StreamDescriptor};
///
/// let groups = StreamDescriptor::single_shot(
///     "groups",
///     "/business/taxonomy/groups?includeInactive=true",
///     &["id"],
///     Schema::new(vec![Property::string("id"), Property::string("name")]),
/// )
/// .unwrap();
///
/// assert_eq!(groups.path(), "/business/taxonomy/groups");
/// assert_eq!(groups.default_query(), &[("includeInactive".to_string(), "true".to_string())]);
/// assert_eq!(groups.pagination_mode(), PaginationMode::None);
/// ```
#[derive(Clone, Debug)]
pub struct StreamDescriptor {
    name: String,
    path: String,
    default_query: Vec<(String, String)>,
    primary_keys: Vec<String>,
    schema: Schema,
    records_path: JsonPath,
    last_evaluated_key_path: Option<JsonPath>,
}

impl StreamDescriptor {
    /// Build and validate a descriptor.
    ///
    /// `path` may carry an inline query string; it is split off into the
    /// default query parameters. A `cursor_path` makes the stream
    /// cursor-paginated.
    ///
    /// # Errors
    /// Returns [`ExtractError::Config`] when:
    /// - the name is empty or the path doesn't start with `/`
    /// - there are no primary keys, duplicates, or keys missing from the schema
    /// - the schema declares a property twice
    /// - a path expression doesn't parse
    /// - a cursor-mode records path is not nested one level under the envelope
    ///   that also holds the cursor
    pub fn try_new(
        name: &str,
        path: &str,
        primary_keys: &[&str],
        schema: Schema,
        records_path: &str,
        cursor_path: Option<&str>,
    ) -> Result<Self, ExtractError> {
        let fail = |reason: String| ExtractError::Config(format!("stream '{name}': {reason}"));

        if name.trim().is_empty() {
            return Err(ExtractError::Config("stream name must not be empty".into()));
        }

        let (path, default_query) = split_query(path);
        if !path.starts_with('/') {
            return Err(fail(format!("path '{path}' must start with '/'")));
        }

        if primary_keys.is_empty() {
            return Err(fail("at least one primary key is required".into()));
        }
        for (idx, key) in primary_keys.iter().enumerate() {
            if primary_keys[..idx].contains(key) {
                return Err(fail(format!("primary key '{key}' listed twice")));
            }
            if !schema.contains(key) {
                return Err(fail(format!("primary key '{key}' is not in the schema")));
            }
        }
        if let Some(dup) = schema.duplicate_names().first() {
            return Err(fail(format!("schema declares '{dup}' more than once")));
        }

        let records_path = JsonPath::parse(records_path)?;
        let records_prefix = records_path.field_prefix();
        if records_prefix.is_empty() {
            return Err(fail(format!(
                "records path '{records_path}' must start inside a result envelope"
            )));
        }

        let last_evaluated_key_path = match cursor_path {
            None if records_prefix.len() != 1 => {
                return Err(fail(format!(
                    "single-shot records path '{records_path}' must sit directly under the envelope"
                )));
            }
            None => None,
            Some(expr) => {
                let cursor = JsonPath::parse(expr)?;
                let cursor_prefix = cursor.field_prefix();
                if records_prefix.len() < 2 {
                    return Err(fail(format!(
                        "paginated records path '{records_path}' must be nested under the envelope"
                    )));
                }
                if cursor_prefix.first() != records_prefix.first() {
                    return Err(fail(format!(
                        "cursor path '{cursor}' and records path '{records_path}' use different envelopes"
                    )));
                }
                Some(cursor)
            }
        };

        Ok(Self {
            name: name.to_string(),
            path,
            default_query,
            primary_keys: primary_keys.iter().map(|k| k.to_string()).collect(),
            schema,
            records_path,
            last_evaluated_key_path,
        })
    }

    /// Single-shot stream reading `$.result[*]`.
    pub fn single_shot(
        name: &str,
        path: &str,
        primary_keys: &[&str],
        schema: Schema,
    ) -> Result<Self, ExtractError> {
        Self::try_new(name, path, primary_keys, schema, DEFAULT_RECORDS_PATH, None)
    }

    /// Cursor-paginated stream reading `$.result.items[*]`, following
    /// `$.result.lastEvaluatedKey`, and asking for all active statuses.
    pub fn cursor_paginated(
        name: &str,
        path: &str,
        primary_keys: &[&str],
        schema: Schema,
    ) -> Result<Self, ExtractError> {
        Ok(Self::try_new(
            name,
            path,
            primary_keys,
            schema,
            PAGINATED_RECORDS_PATH,
            Some(LAST_EVALUATED_KEY_PATH),
        )?
        .with_query("activeStatus", "ALL"))
    }

    /// Add a fixed query parameter sent on every request.
    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.default_query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn default_query(&self) -> &[(String, String)] {
        &self.default_query
    }

    pub fn primary_keys(&self) -> &[String] {
        &self.primary_keys
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn records_path(&self) -> &JsonPath {
        &self.records_path
    }

    /// Present iff the stream is cursor-paginated
    pub fn last_evaluated_key_path(&self) -> Option<&JsonPath> {
        self.last_evaluated_key_path.as_ref()
    }

    pub fn pagination_mode(&self) -> PaginationMode {
        match self.last_evaluated_key_path {
            Some(_) => PaginationMode::Cursor,
            None => PaginationMode::None,
        }
    }
}

fn split_query(path: &str) -> (String, Vec<(String, String)>) {
    match path.split_once('?') {
        Some((path, query)) => (
            path.to_string(),
            url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
        ),
        None => (path.to_string(), Vec::new()),
    }
}
