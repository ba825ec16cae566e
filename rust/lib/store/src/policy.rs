//! Per-field timestamp policies and the resolved configuration.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::record::Record;

pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";

/// Built-in field names, in the order they are applied.
pub const BUILTIN_FIELDS: [&str; 2] = [CREATED_AT, UPDATED_AT];

/// Computes the initial value of a field from the record being saved.
/// Returning None (or a blank value) falls back to the current time.
pub type DefaultFn = Arc<dyn Fn(&dyn Record) -> Option<Value> + Send + Sync>;

/// How a single timestamp field is initialized and maintained.
#[derive(Clone, Default)]
pub struct TimestampPolicy {
    /// Initial value source. None means "now".
    pub default: Option<DefaultFn>,
    /// Re-stamp with the current time on every save of a persisted record.
    pub update_on_save: bool,
}

impl TimestampPolicy {
    /// Initialized to now, never re-stamped.
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialized to now, re-stamped on every update.
    pub fn updating() -> Self {
        Self {
            default: None,
            update_on_save: true,
        }
    }

    pub fn with_default<F>(mut self, f: F) -> Self
    where
        F: Fn(&dyn Record) -> Option<Value> + Send + Sync + 'static,
    {
        self.default = Some(Arc::new(f));
        self
    }

    /// Initialize from another field's current value (e.g. `updated_at`
    /// starting out equal to `created_at`).
    pub fn copy_from(self, field: impl Into<String>) -> Self {
        let field = field.into();
        self.with_default(move |record| record.get(&field).cloned())
    }

    pub fn update_on_save(mut self, update: bool) -> Self {
        self.update_on_save = update;
        self
    }

    /// The built-in policy for a canonical field name, if there is one.
    pub fn builtin(field: &str) -> Option<Self> {
        match field {
            CREATED_AT => Some(Self::new()),
            UPDATED_AT => Some(Self::updating().copy_from(CREATED_AT)),
            _ => None,
        }
    }
}

impl fmt::Debug for TimestampPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimestampPolicy")
            .field("default", &self.default.as_ref().map(|_| "fn"))
            .field("update_on_save", &self.update_on_save)
            .finish()
    }
}

/// Resolved timestamps of a record type: field name to policy.
///
/// Disabled fields are never present. Fields are independent of each other;
/// iteration follows insertion order.
#[derive(Debug, Clone, Default)]
pub struct TimestampConfig {
    fields: Vec<(String, TimestampPolicy)>,
}

impl TimestampConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in policies for the given canonical names. Unknown names are skipped.
    pub fn builtins<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut config = Self::new();
        for name in names {
            if let Some(policy) = TimestampPolicy::builtin(name) {
                config.insert(name, policy);
            }
        }
        config
    }

    /// Add or replace a field's policy.
    pub fn insert(&mut self, field: impl Into<String>, policy: TimestampPolicy) {
        let field = field.into();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some((_, existing)) => *existing = policy,
            None => self.fields.push((field, policy)),
        }
    }

    /// Drop a field. Returns true if it was configured.
    pub fn remove(&mut self, field: &str) -> bool {
        let len = self.fields.len();
        self.fields.retain(|(name, _)| name != field);
        self.fields.len() < len
    }

    pub fn get(&self, field: &str) -> Option<&TimestampPolicy> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, policy)| policy)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TimestampPolicy)> {
        self.fields.iter().map(|(name, policy)| (name.as_str(), policy))
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_policies() {
        let created = TimestampPolicy::builtin(CREATED_AT).unwrap();
        assert!(created.default.is_none());
        assert!(!created.update_on_save);

        let updated = TimestampPolicy::builtin(UPDATED_AT).unwrap();
        assert!(updated.default.is_some());
        assert!(updated.update_on_save);

        assert!(TimestampPolicy::builtin("touched_at").is_none());
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut config = TimestampConfig::builtins(BUILTIN_FIELDS);
        config.insert(CREATED_AT, TimestampPolicy::updating());
        assert_eq!(config.field_names(), vec![CREATED_AT, UPDATED_AT]);
        assert!(config.get(CREATED_AT).unwrap().update_on_save);
    }

    #[test]
    fn builtins_skip_unknown_names() {
        let config = TimestampConfig::builtins(["touched_at", UPDATED_AT]);
        assert_eq!(config.field_names(), vec![UPDATED_AT]);
    }

    #[test]
    fn remove_reports_presence() {
        let mut config = TimestampConfig::builtins(BUILTIN_FIELDS);
        assert!(config.remove(UPDATED_AT));
        assert!(!config.remove(UPDATED_AT));
        assert_eq!(config.len(), 1);
    }

    #[test]
    fn debug_hides_closure() {
        let policy = TimestampPolicy::builtin(UPDATED_AT).unwrap();
        let text = format!("{:?}", policy);
        assert!(text.contains("update_on_save: true"), "got: {}", text);
        assert!(text.contains("\"fn\""), "got: {}", text);
    }
}
