//! Applies resolved timestamp policies to a record before it is committed.

use chrono::{DateTime, Utc};
use recstamp_core::format_timestamp;
use serde_json::Value;
use tracing::debug;

use crate::policy::{TimestampConfig, TimestampPolicy};
use crate::record::{is_set, Record};

/// What happened to one field during a touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stamp {
    /// The field was unset and got its initial value.
    Initialized,
    /// A persisted record's field was moved to now.
    Refreshed,
    /// The field already had a value and was left alone.
    Kept,
}

/// Stamp `record` according to `config`, reading the clock once.
pub fn touch(record: &mut dyn Record, config: &TimestampConfig) -> Vec<(String, Stamp)> {
    touch_at(record, config, Utc::now())
}

/// Stamp `record` according to `config` with an explicit "now".
///
/// Every field that needs the current time gets the same value, so
/// `created_at` and `updated_at` never differ on the same save.
///
/// If the wall clock has stepped back behind a field's stored timestamp, the
/// field keeps its stored value instead of being refreshed to an earlier time.
pub fn touch_at(
    record: &mut dyn Record,
    config: &TimestampConfig,
    now: DateTime<Utc>,
) -> Vec<(String, Stamp)> {
    let stamp_value = Value::String(format_timestamp(now));
    let is_new = record.is_new();

    config
        .iter()
        .map(|(field, policy)| {
            let stamp = touch_field(record, field, policy, is_new, now, &stamp_value);
            debug!("touch {}: {:?}", field, stamp);
            (field.to_string(), stamp)
        })
        .collect()
}

fn touch_field(
    record: &mut dyn Record,
    field: &str,
    policy: &TimestampPolicy,
    is_new: bool,
    now: DateTime<Utc>,
    now_value: &Value,
) -> Stamp {
    if is_set(record.get(field)) {
        // Updating on the first save would clobber a caller-provided value.
        if !policy.update_on_save || is_new {
            return Stamp::Kept;
        }
        if stored_at(record, field).is_some_and(|at| at > now) {
            debug!("touch {}: stored value is ahead of the clock, keeping it", field);
            return Stamp::Kept;
        }
        record.set(field, now_value.clone());
        return Stamp::Refreshed;
    }

    let initial = policy
        .default
        .as_ref()
        .and_then(|default| default(&*record))
        .filter(|value| is_set(Some(value)))
        .unwrap_or_else(|| now_value.clone());
    record.set(field, initial);
    Stamp::Initialized
}

fn stored_at(record: &dyn Record, field: &str) -> Option<DateTime<Utc>> {
    let text = record.get(field)?.as_str()?;
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|at| at.with_timezone(&Utc))
}
