//! Upgrades of older config files, applied to the raw JSON before deserializing.
//!
//! Each step takes a config of version `n` to `n + 1`.

use serde_json::{Map, Value};

use super::config::{CONFIG_VERSION, DEFAULT_NAME, DEFAULT_RATE};
use crate::error::{MonitorError, Result};

type Step = fn(&mut Map<String, Value>);

/// `(from_version, step)`, ordered.
const STEPS: [(u64, Step); 2] = [(1, add_rate_and_name), (2, short_monitor_types)];

/// Version of a raw config. Files written before versioning count as version 1.
pub fn version_of(value: &Value) -> u64 {
    value.get("version").and_then(Value::as_u64).unwrap_or(1)
}

/// Bring `value` up to [`CONFIG_VERSION`].
pub fn migrate(mut value: Value) -> Result<Value> {
    let from = version_of(&value);
    if from > CONFIG_VERSION {
        return Err(MonitorError::config(format!(
            "config version {} is newer than supported version {}",
            from, CONFIG_VERSION
        )));
    }

    let map = value
        .as_object_mut()
        .ok_or_else(|| MonitorError::config("config root must be a JSON object"))?;

    for (version, step) in STEPS {
        if version >= from {
            log::info!("Migrating config from version {} to {}", version, version + 1);
            step(map);
        }
    }
    map.insert("version".to_string(), Value::from(CONFIG_VERSION));
    Ok(value)
}

fn add_rate_and_name(map: &mut Map<String, Value>) {
    map.entry("rate").or_insert_with(|| Value::from(DEFAULT_RATE));
    map.entry("name").or_insert_with(|| Value::from(DEFAULT_NAME));
}

fn short_monitor_types(map: &mut Map<String, Value>) {
    let Some(rules) = map.get_mut("rules").and_then(Value::as_array_mut) else {
        return;
    };
    for rule in rules {
        let Some(kind) = rule.get_mut("type") else {
            continue;
        };
        let short = match kind.as_str() {
            Some("memory") => "mem",
            Some("network") => "net",
            Some("temperature") => "temp",
            _ => continue,
        };
        *kind = Value::from(short);
    }
}
