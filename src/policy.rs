//! System-wide policy overrides
//!
//! A policy file layers administrator-chosen default values beneath user
//! edits: when an application is missing a value for an option, the policy
//! override (if any) seeds it instead of the schema's implicit default.
//! Policy data is read-only for the whole session and never written back.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Per-driver map of option name to override default value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyStore {
    #[serde(default)]
    overrides: BTreeMap<String, BTreeMap<String, String>>,
}

impl PolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load policy overrides from a JSON file.
    ///
    /// A missing file is not an error: it simply means no system-wide
    /// overrides are in effect.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("no policy file at {:?}, using empty policy store", path);
            return Ok(Self::new());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read policy file {:?}", path))?;
        let store: Self =
            serde_json::from_str(&content).context("Failed to parse policy JSON")?;
        debug!(
            "loaded policy overrides for {} driver(s)",
            store.overrides.len()
        );
        Ok(store)
    }

    /// The override default for one driver/option pair, if any.
    pub fn lookup(&self, driver: &str, option: &str) -> Option<&str> {
        self.overrides
            .get(driver)
            .and_then(|opts| opts.get(option))
            .map(String::as_str)
    }

    /// Insert or replace an override. Used by tests and by loaders that
    /// aggregate multiple policy fragments.
    pub fn set_override(&mut self, driver: &str, option: &str, value: &str) {
        self.overrides
            .entry(driver.to_string())
            .or_default()
            .insert(option.to_string(), value.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}
