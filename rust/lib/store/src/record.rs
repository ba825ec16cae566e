//! The record surface timestamps are applied through.

use serde_json::Value;

/// A record as seen by the timestamp machinery: named fields plus its
/// persistence status.
pub trait Record {
    /// Current value of a field, or None when the field is absent.
    fn get(&self, field: &str) -> Option<&Value>;

    /// Set a field, replacing any previous value.
    fn set(&mut self, field: &str, value: Value);

    /// True until the record has been committed once.
    fn is_new(&self) -> bool;
}

/// Whether a stored value counts as "set".
///
/// `null`, `false`, `0` and `""` are all treated as unset, so a column that
/// was explicitly nulled or left empty gets initialized like a missing one.
pub fn is_set(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}
