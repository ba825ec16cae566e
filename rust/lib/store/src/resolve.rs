//! Declaration → canonical [`TimestampConfig`].

use recstamp_core::ServiceError;
use tracing::{debug, warn};

use crate::declaration::{Declaration, Entry};
use crate::policy::{TimestampConfig, TimestampPolicy, BUILTIN_FIELDS};

/// Normalize a declaration into field policies.
///
/// Pure: the same declaration always yields the same fields. The only
/// failure is an untyped declaration of an unrecognized shape.
pub fn resolve(declaration: &Declaration) -> Result<TimestampConfig, ServiceError> {
    let config = match declaration {
        Declaration::Off => TimestampConfig::new(),
        Declaration::On => TimestampConfig::builtins(BUILTIN_FIELDS),
        Declaration::Field(name) => builtins_named(std::slice::from_ref(name)),
        Declaration::Fields(names) => builtins_named(names),
        Declaration::Map(entries) => from_entries(entries),
        Declaration::Value(raw) => return resolve(&Declaration::from_value(raw)?),
    };
    debug!("timestamps resolved: {:?}", config.field_names());
    Ok(config)
}

fn builtins_named(names: &[String]) -> TimestampConfig {
    for name in names {
        if !BUILTIN_FIELDS.contains(&name.as_str()) {
            warn!(
                "timestamps: {:?} has no built-in policy; declare it in a map to stamp it",
                name
            );
        }
    }
    TimestampConfig::builtins(
        BUILTIN_FIELDS
            .into_iter()
            .filter(|builtin| names.iter().any(|name| name == builtin)),
    )
}

fn from_entries(entries: &[(String, Entry)]) -> TimestampConfig {
    let mut config = TimestampConfig::new();
    for (field, entry) in entries {
        match entry {
            Entry::Enabled => {
                config.insert(field.as_str(), TimestampPolicy::builtin(field).unwrap_or_default());
            }
            Entry::Policy(policy) => config.insert(field.as_str(), policy.clone()),
            Entry::Disabled => {
                config.remove(field);
            }
        }
    }
    config
}
