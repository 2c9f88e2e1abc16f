//! Scope-keyed stream registry

use super::descriptor::StreamDescriptor;
use crate::error::ExtractError;

/// Maps a configured scope to the ordered streams it runs.
///
/// Lookup ignores surrounding whitespace and slashes, so `business/taxonomy`
/// and `/business/taxonomy/` select the same streams. An unknown scope
/// selects nothing.
///
/// # Example
/// ```
/// use tap_gapi::streams::StreamRegistry;
///
/// let registry = StreamRegistry::builtin().unwrap();
/// assert!(!registry.streams_for("business/taxonomy").is_empty());
/// assert!(registry.streams_for("no/such/scope").is_empty());
/// ```
#[derive(Clone, Debug, Default)]
pub struct StreamRegistry {
    scopes: Vec<(String, Vec<StreamDescriptor>)>,
}

impl StreamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry of the streams shipped with the tap.
    pub fn builtin() -> Result<Self, ExtractError> {
        super::catalog::builtin_registry()
    }

    /// Append `descriptor` to `scope`, keeping registration order.
    ///
    /// # Errors
    /// Returns [`ExtractError::Config`] if the scope already has a stream
    /// with the same name.
    pub fn register(&mut self, scope: &str, descriptor: StreamDescriptor) -> Result<(), ExtractError> {
        let key = normalize(scope);
        let idx = match self.scopes.iter().position(|(s, _)| *s == key) {
            Some(idx) => idx,
            None => {
                self.scopes.push((key.clone(), Vec::new()));
                self.scopes.len() - 1
            }
        };
        let streams = &mut self.scopes[idx].1;
        if streams.iter().any(|d| d.name() == descriptor.name()) {
            return Err(ExtractError::Config(format!(
                "stream '{}' registered twice for scope '{key}'",
                descriptor.name()
            )));
        }
        streams.push(descriptor);
        Ok(())
    }

    /// Streams to run for `scope`, in registration order.
    pub fn streams_for(&self, scope: &str) -> &[StreamDescriptor] {
        let key = normalize(scope);
        self.scopes
            .iter()
            .find(|(s, _)| *s == key)
            .map(|(_, streams)| streams.as_slice())
            .unwrap_or(&[])
    }

    /// Registered scope names, in registration order.
    pub fn scopes(&self) -> impl Iterator<Item = &str> {
        self.scopes.iter().map(|(s, _)| s.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

fn normalize(scope: &str) -> String {
    scope.trim().trim_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streams::{Property, Schema};

    fn descriptor(name: &str) -> StreamDescriptor {
        StreamDescriptor::single_shot(
            name,
            &format!("/{name}"),
            &["id"],
            Schema::new(vec![Property::string("id")]),
        )
        .unwrap()
    }

    #[test]
    fn test_streams_in_registration_order() {
        let mut registry = StreamRegistry::new();
        registry.register("team/a", descriptor("one")).unwrap();
        registry.register("team/a", descriptor("two")).unwrap();
        registry.register("team/b", descriptor("three")).unwrap();

        let names: Vec<&str> = registry.streams_for("team/a").iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["one", "two"]);
        assert_eq!(registry.scopes().collect::<Vec<_>>(), vec!["team/a", "team/b"]);
    }

    #[test]
    fn test_unknown_scope_is_empty() {
        let mut registry = StreamRegistry::new();
        registry.register("team/a", descriptor("one")).unwrap();
        assert!(registry.streams_for("team/z").is_empty());
        assert!(registry.streams_for("").is_empty());
    }

    #[test]
    fn test_scope_normalized() {
        let mut registry = StreamRegistry::new();
        registry.register("/team/a/", descriptor("one")).unwrap();
        assert_eq!(registry.streams_for(" team/a ").len(), 1);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = StreamRegistry::new();
        registry.register("team/a", descriptor("one")).unwrap();
        assert!(registry.register("team/a", descriptor("one")).is_err());
        // Same name under another scope is fine
        assert!(registry.register("team/b", descriptor("one")).is_ok());
    }
}
