//! Raw timestamps declarations attached to record types.
//!
//! A declaration comes either typed (built in code) or untyped (a JSON/TOML
//! value read from a models file). Untyped values are checked when they are
//! resolved, so a malformed declaration fails the save that uses it.

use recstamp_core::ServiceError;
use serde_json::{Map, Value};
use tracing::warn;

use crate::policy::TimestampPolicy;
use crate::record::is_set;

/// What a record type declares about its timestamps.
#[derive(Debug, Clone, Default)]
pub enum Declaration {
    /// No timestamps (absent or `false`).
    #[default]
    Off,
    /// `created_at` and `updated_at` with their built-in policies.
    On,
    /// A single built-in field.
    Field(String),
    /// Built-in fields by name. Names without a built-in policy are ignored.
    Fields(Vec<String>),
    /// Explicit per-field entries, in declaration order.
    Map(Vec<(String, Entry)>),
    /// Untyped declaration, validated on resolve.
    Value(Value),
}

/// One entry of a [`Declaration::Map`].
#[derive(Debug, Clone)]
pub enum Entry {
    /// The field's built-in policy, or a plain "initialize to now" policy
    /// when the field has no built-in.
    Enabled,
    /// The field is not stamped.
    Disabled,
    Policy(TimestampPolicy),
}

impl Declaration {
    /// Build a map declaration.
    pub fn map<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Entry)>,
        K: Into<String>,
    {
        Declaration::Map(entries.into_iter().map(|(k, e)| (k.into(), e)).collect())
    }

    /// Build a list declaration.
    pub fn fields<I, K>(names: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Declaration::Fields(names.into_iter().map(Into::into).collect())
    }

    /// Interpret an untyped value.
    ///
    /// `null`/`false` is off, `true` is on, a string names one field, an
    /// array lists fields and an object maps fields to entries. Numbers and
    /// TOML datetimes are rejected with [`ServiceError::InvalidConfiguration`].
    pub fn from_value(value: &Value) -> Result<Self, ServiceError> {
        if toml_datetime(value).is_some() {
            return Err(invalid(value));
        }
        match value {
            Value::Null | Value::Bool(false) => Ok(Declaration::Off),
            Value::Bool(true) => Ok(Declaration::On),
            Value::String(name) => Ok(Declaration::Field(name.clone())),
            Value::Array(items) => {
                let mut names = Vec::with_capacity(items.len());
                for item in items {
                    match item.as_str() {
                        Some(name) => names.push(name.to_string()),
                        None => warn!("timestamps: ignoring non-string list item {}", item),
                    }
                }
                Ok(Declaration::Fields(names))
            }
            Value::Object(obj) => Ok(Declaration::Map(
                obj.iter()
                    .map(|(field, entry)| (field.clone(), Entry::from_value(field, entry)))
                    .collect(),
            )),
            Value::Number(_) => Err(invalid(value)),
        }
    }
}

impl Entry {
    fn from_value(field: &str, value: &Value) -> Self {
        match value {
            Value::Bool(true) => Entry::Enabled,
            Value::Object(obj) if toml_datetime(value).is_none() => {
                Entry::Policy(policy_from_object(field, obj))
            }
            other if !is_set(Some(other)) => Entry::Disabled,
            other => {
                warn!(
                    "timestamps: entry for {} should be a boolean or an object, got {}; stamping with defaults",
                    field, other
                );
                Entry::Policy(TimestampPolicy::new())
            }
        }
    }
}

/// `{"default": "<field>", "update": true}`; `update_on_save` is accepted
/// for `update`. Unknown keys are ignored.
fn policy_from_object(field: &str, obj: &Map<String, Value>) -> TimestampPolicy {
    let update = obj.get("update").or_else(|| obj.get("update_on_save"));
    let policy = TimestampPolicy::new().update_on_save(is_set(update));

    match obj.get("default") {
        None | Some(Value::Null) => policy,
        Some(Value::String(source)) if !source.is_empty() => policy.copy_from(source.as_str()),
        Some(other) => {
            warn!(
                "timestamps: default for {} should name a field, got {}; using current time",
                field, other
            );
            policy
        }
    }
}

/// Key under which the `toml` crate carries a datetime through serde.
const TOML_DATETIME_KEY: &str = "$__toml_private_datetime";

/// The text of a TOML datetime that went through `serde_json`, which sees it
/// as a one-key object.
fn toml_datetime(value: &Value) -> Option<&str> {
    match value.as_object() {
        Some(obj) if obj.len() == 1 => obj.get(TOML_DATETIME_KEY).and_then(Value::as_str),
        _ => None,
    }
}

fn invalid(value: &Value) -> ServiceError {
    let shown = match toml_datetime(value) {
        Some(text) => text.to_string(),
        None => value.to_string(),
    };
    ServiceError::InvalidConfiguration(format!(
        "invalid timestamps declaration: expected true, a field name, a list of field names or a map, got {} ({})",
        shown,
        type_name(value)
    ))
}

/// Runtime type name of an untyped value, as reported in errors.
pub(crate) fn type_name(value: &Value) -> &'static str {
    if toml_datetime(value).is_some() {
        return "datetime";
    }
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl From<bool> for Declaration {
    fn from(enabled: bool) -> Self {
        if enabled {
            Declaration::On
        } else {
            Declaration::Off
        }
    }
}

impl From<&str> for Declaration {
    fn from(field: &str) -> Self {
        Declaration::Field(field.to_string())
    }
}

impl From<Value> for Declaration {
    fn from(value: Value) -> Self {
        Declaration::Value(value)
    }
}

impl From<bool> for Entry {
    fn from(enabled: bool) -> Self {
        if enabled {
            Entry::Enabled
        } else {
            Entry::Disabled
        }
    }
}

impl From<TimestampPolicy> for Entry {
    fn from(policy: TimestampPolicy) -> Self {
        Entry::Policy(policy)
    }
}
