//! sk-config
//!
//! Layered configuration (§6 "Configuration surface"): defaults, then zero
//! or more TOML files merged in order, then environment variable overrides,
//! grounded in the teacher's `mqk-config::load_layered_yaml` deep-merge +
//! canonicalize-and-hash pipeline, swapped from YAML to TOML since that's
//! the serialization format already carried in the workspace dependency
//! table.

mod env;
mod merge;
mod settings;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

pub use settings::Settings;

/// The result of [`load_layered`]: the typed settings plus the canonical
/// JSON rendering and its hash, so a CLI or daemon can log exactly which
/// configuration a run used (mirrors `mqk-config::LoadedConfig`).
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub settings: Settings,
    pub canonical_json: String,
    pub config_hash: String,
}

/// Merges `defaults -> file(s) in order -> environment` and returns the
/// resolved [`Settings`] alongside a stable hash of the merged value.
/// Unknown keys in a file are rejected by `serde`'s default behaviour
/// (`deny_unknown_fields` is intentionally *not* set — forward-compatible
/// config files are preferred over a hard failure, matching `mqk-config`'s
/// warn-don't-fail posture for unused keys).
pub fn load_layered(paths: &[&str]) -> Result<LoadedConfig> {
    let mut merged = serde_json::to_value(Settings::default()).context("serializing defaults")?;

    for path in paths {
        let raw = fs::read_to_string(Path::new(path)).with_context(|| format!("read config: {path}"))?;
        let parsed: toml::Value = toml::from_str(&raw).with_context(|| format!("parse toml: {path}"))?;
        let as_json = serde_json::to_value(parsed).context("toml->json conversion failed")?;
        merge::deep_merge(&mut merged, as_json);
    }

    env::apply_env_overrides(&mut merged)?;

    let canonical = merge::canonicalize(&merged);
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let config_hash = hex::encode(hasher.finalize());

    let settings: Settings = serde_json::from_str(&canonical).context("settings did not match canonical config")?;

    Ok(LoadedConfig { settings, canonical_json: canonical, config_hash })
}
