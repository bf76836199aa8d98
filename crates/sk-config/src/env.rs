use anyhow::{Context, Result};
use serde_json::Value;

/// `SK_<UPPER_SNAKE_KEY>` environment variables override the corresponding
/// top-level settings key, applied as the last layer (§6: "changes are
/// process-wide and applied at next tick" — env is the outermost layer an
/// operator can reach without touching a file).
const PREFIX: &str = "SK_";

pub fn apply_env_overrides(merged: &mut Value) -> Result<()> {
    let Value::Object(map) = merged else {
        return Ok(());
    };

    let keys: Vec<String> = map.keys().cloned().collect();
    for key in keys {
        let var_name = format!("{PREFIX}{}", key.to_uppercase());
        if let Ok(raw) = std::env::var(&var_name) {
            let existing = map.get(&key).cloned().unwrap_or(Value::Null);
            let parsed = coerce_like(&existing, &raw).with_context(|| format!("parsing {var_name}={raw}"))?;
            map.insert(key, parsed);
        }
    }
    Ok(())
}

/// Parses `raw` into the same JSON shape as `existing` so an env override
/// of a bool/number field doesn't silently become a string.
fn coerce_like(existing: &Value, raw: &str) -> Result<Value> {
    Ok(match existing {
        Value::Bool(_) => Value::Bool(raw.parse::<bool>().context("expected true/false")?),
        Value::Number(_) => serde_json::from_str(raw).context("expected a number")?,
        _ => Value::String(raw.to_string()),
    })
}
