//! Declared record schemas
//!
//! Schemas are static configuration: an ordered list of properties, each
//! nullable, rendered as JSON Schema for the SCHEMA message. They are never
//! inferred and records are not validated against them here.

use serde_json::{Map, Value, json};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PropertyType {
    String,
    Boolean,
    Integer,
    DateTime,
    Array(Box<PropertyType>),
}

impl PropertyType {
    fn to_json_schema(&self) -> Value {
        match self {
            Self::String => json!({"type": ["string", "null"]}),
            Self::Boolean => json!({"type": ["boolean", "null"]}),
            Self::Integer => json!({"type": ["integer", "null"]}),
            Self::DateTime => json!({"type": ["string", "null"], "format": "date-time"}),
            Self::Array(items) => {
                let mut item_schema = items.to_json_schema();
                // Array items are declared non-null
                if let Some(types) = item_schema.get_mut("type").and_then(Value::as_array_mut) {
                    types.retain(|t| t != "null");
                }
                json!({"type": ["array", "null"], "items": item_schema})
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub kind: PropertyType,
    pub description: Option<String>,
}

impl Property {
    pub fn new(name: impl Into<String>, kind: PropertyType) -> Self {
        Self {
            name: name.into(),
            kind,
            description: None,
        }
    }

    pub fn string(name: &str) -> Self {
        Self::new(name, PropertyType::String)
    }

    pub fn boolean(name: &str) -> Self {
        Self::new(name, PropertyType::Boolean)
    }

    pub fn integer(name: &str) -> Self {
        Self::new(name, PropertyType::Integer)
    }

    pub fn date_time(name: &str) -> Self {
        Self::new(name, PropertyType::DateTime)
    }

    pub fn string_array(name: &str) -> Self {
        Self::new(name, PropertyType::Array(Box::new(PropertyType::String)))
    }

    pub fn described(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// Ordered property list.
///
/// # Example
/// ```
/// use tap_gapi::streams::{Property, Schema};
///
/// let schema = Schema::new(vec![
///     Property::string("id").described("The group's system ID"),
///     Property::boolean("active"),
/// ]);
/// assert!(schema.contains("id"));
/// assert_eq!(schema.to_json_schema()["properties"]["active"]["type"][0], "boolean");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Schema {
    properties: Vec<Property>,
}

impl Schema {
    pub fn new(properties: Vec<Property>) -> Self {
        Self { properties }
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.properties.iter().any(|p| p.name == name)
    }

    /// Names declared more than once, in declaration order.
    pub fn duplicate_names(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        let mut duplicates = Vec::new();
        for property in &self.properties {
            let name = property.name.as_str();
            if seen.contains(&name) {
                if !duplicates.contains(&name) {
                    duplicates.push(name);
                }
            } else {
                seen.push(name);
            }
        }
        duplicates
    }

    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for property in &self.properties {
            let mut schema = property.kind.to_json_schema();
            if let (Some(description), Some(obj)) = (&property.description, schema.as_object_mut()) {
                obj.insert("description".to_string(), json!(description));
            }
            properties.insert(property.name.clone(), schema);
        }
        json!({"type": "object", "properties": properties})
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_schema_shape() {
        let schema = Schema::new(vec![
            Property::string("id").described("The Market's system ID"),
            Property::boolean("active"),
            Property::integer("levelMax"),
            Property::date_time("createdOn"),
            Property::string_array("supportedApplications"),
        ]);
        let json = schema.to_json_schema();

        assert_eq!(json["type"], "object");
        assert_eq!(json["properties"]["id"]["type"], json!(["string", "null"]));
        assert_eq!(json["properties"]["id"]["description"], "The Market's system ID");
        assert_eq!(json["properties"]["levelMax"]["type"], json!(["integer", "null"]));
        assert_eq!(json["properties"]["createdOn"]["format"], "date-time");
        assert_eq!(
            json["properties"]["supportedApplications"],
            json!({"type": ["array", "null"], "items": {"type": ["string"]}})
        );
    }

    #[test]
    fn test_property_order_preserved() {
        let schema = Schema::new(vec![
            Property::string("zeta"),
            Property::string("alpha"),
        ]);
        let json = schema.to_json_schema();
        let keys: Vec<&String> = json["properties"].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_duplicate_names() {
        let schema = Schema::new(vec![
            Property::string("a"),
            Property::string("b"),
            Property::boolean("a"),
            Property::string("a"),
        ]);
        assert_eq!(schema.duplicate_names(), vec!["a"]);
    }
}
