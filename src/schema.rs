//! Driver schema store
//!
//! A driver hands us raw text describing its runtime options; this module
//! parses that text into an immutable `DriverConfiguration` (sections of
//! typed option descriptors) and holds one configuration per driver.
//! Schemas are loaded once at startup and, apart from the one-time
//! canonical sort, never mutated afterwards.

use std::collections::HashSet;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{DricfgError, Result};
use crate::types::OptionKind;

/// A single option exposed by a driver: name, human description and
/// value type. Immutable after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub kind: OptionKind,
}

/// A named group of options, rendered as one tab by the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub description: String,
    pub options: Vec<OptionDescriptor>,
}

/// The full option schema of one driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverConfiguration {
    pub driver: String,
    pub sections: Vec<Section>,
}

impl DriverConfiguration {
    /// Stable-sorts each section's options by name.
    ///
    /// Applied once at load so presentation order is deterministic
    /// across runs regardless of how the driver emitted its schema.
    pub fn sort_section_options(&mut self) {
        for section in &mut self.sections {
            section.options.sort_by(|a, b| a.name.cmp(&b.name));
        }
    }

    /// Looks up an option descriptor by name across all sections.
    pub fn find_option(&self, name: &str) -> Option<&OptionDescriptor> {
        self.sections
            .iter()
            .flat_map(|s| s.options.iter())
            .find(|o| o.name == name)
    }

    /// Resolves an enum option's label to its raw value.
    pub fn enum_raw_for_label(&self, option: &str, label: &str) -> Option<&str> {
        self.find_option(option)
            .and_then(|o| o.kind.raw_for_label(label))
    }

    /// Iterates descriptors in canonical (section, option) order.
    pub fn options(&self) -> impl Iterator<Item = &OptionDescriptor> {
        self.sections.iter().flat_map(|s| s.options.iter())
    }

    /// Total number of options across all sections.
    pub fn option_count(&self) -> usize {
        self.sections.iter().map(|s| s.options.len()).sum()
    }
}

/// Parse one driver-supplied schema text into a validated configuration.
///
/// The text must describe exactly one driver. Option names must be unique
/// across all of its sections; a duplicate is a schema error, not something
/// we try to repair.
pub fn parse_driver_schema(text: &str) -> Result<DriverConfiguration> {
    let mut config: DriverConfiguration = serde_json::from_str(text)?;

    if config.driver.trim().is_empty() {
        return Err(DricfgError::schema("driver identifier is empty"));
    }

    let mut seen = HashSet::new();
    for option in config.options() {
        if !seen.insert(option.name.clone()) {
            return Err(DricfgError::schema(format!(
                "duplicate option '{}' in schema for driver '{}'",
                option.name, config.driver
            )));
        }
    }

    config.sort_section_options();
    debug!(
        "parsed schema for driver '{}': {} sections, {} options",
        config.driver,
        config.sections.len(),
        config.option_count()
    );

    Ok(config)
}

/// Holds one `DriverConfiguration` per supported driver, in load order.
/// Load order is also the persisted driver order.
#[derive(Debug, Clone, Default)]
pub struct SchemaStore {
    drivers: Vec<DriverConfiguration>,
}

impl SchemaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and add one driver schema text. Rejects a second schema for
    /// an already-known driver.
    pub fn load_driver(&mut self, text: &str) -> Result<&DriverConfiguration> {
        let config = parse_driver_schema(text)?;
        if self.find_driver(&config.driver).is_some() {
            return Err(DricfgError::schema(format!(
                "driver '{}' loaded twice",
                config.driver
            )));
        }
        self.drivers.push(config);
        Ok(self.drivers.last().expect("just pushed"))
    }

    /// Build a store from a list of schema texts, preserving their order.
    pub fn from_texts<'a>(texts: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let mut store = Self::new();
        for text in texts {
            store.load_driver(text)?;
        }
        Ok(store)
    }

    pub fn find_driver(&self, driver: &str) -> Option<&DriverConfiguration> {
        self.drivers.iter().find(|d| d.driver == driver)
    }

    pub fn drivers(&self) -> &[DriverConfiguration] {
        &self.drivers
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }
}
