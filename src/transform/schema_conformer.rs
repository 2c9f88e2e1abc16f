//! Schema conformer transformer
//!
//! Drops record properties the stream schema doesn't declare so downstream
//! targets only ever see declared columns.

use crate::engine::Record;
use crate::etl::Transformer;
use crate::streams::StreamDescriptor;
use eyre::Result;
use owo_colors::OwoColorize;
use std::collections::BTreeSet;
use std::sync::Mutex;

/// Transformer that removes undeclared properties from records
///
/// Declared properties pass through untouched, whatever their type. Each
/// dropped property is reported once per conformer.
///
/// # Example
/// ```
/// use tap_gapi::etl::Transformer;
/// use tap_gapi::streams::{Property, Schema, StreamDescriptor};
/// use tap_gapi::transform::SchemaConformer;
/// use serde_json::json;
///
/// let markets = StreamDescriptor::single_shot(
///     "markets",
///     "/business/taxonomy/markets",
///     &["id"],
///     Schema::new(vec![Property::string("id"), Property::string("name")]),
/// )
/// .unwrap();
///
/// let conformer = SchemaConformer::for_stream(&markets);
/// let input = json!({"id": "m1", "name": "East", "internalRank": 4});
///
/// let output = conformer.transform(input.as_object().unwrap().clone()).unwrap();
/// assert!(!output.contains_key("internalRank"));
/// assert_eq!(output["name"], "East");
/// ```
pub struct SchemaConformer {
    stream: String,
    declared: BTreeSet<String>,
    reported: Mutex<BTreeSet<String>>,
}

impl SchemaConformer {
    pub fn new(stream: impl Into<String>, declared: impl IntoIterator<Item = String>) -> Self {
        Self {
            stream: stream.into(),
            declared: declared.into_iter().collect(),
            reported: Mutex::new(BTreeSet::new()),
        }
    }

    /// Conformer for the schema of `descriptor`
    pub fn for_stream(descriptor: &StreamDescriptor) -> Self {
        Self::new(
            descriptor.name(),
            descriptor
                .schema()
                .properties()
                .iter()
                .map(|p| p.name.clone()),
        )
    }

    /// Undeclared properties seen so far
    pub fn dropped(&self) -> Vec<String> {
        match self.reported.lock() {
            Ok(reported) => reported.iter().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().iter().cloned().collect(),
        }
    }

    fn report(&self, property: &str) {
        let mut reported = match self.reported.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if reported.insert(property.to_string()) {
            log::warn!(
                "{}: dropping undeclared property '{}'",
                self.stream.cyan(),
                property
            );
        }
    }
}

impl Transformer for SchemaConformer {
    type Input = Record;
    type Output = Record;

    fn transform(&self, mut input: Self::Input) -> Result<Self::Output> {
        let undeclared: Vec<String> = input
            .keys()
            .filter(|k| !self.declared.contains(*k))
            .cloned()
            .collect();
        for key in undeclared {
            self.report(&key);
            // shift_remove keeps the order of the remaining fields
            input.shift_remove(&key);
        }
        Ok(input)
    }
}
