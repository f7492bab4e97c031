//! Type-safe option kinds for driver schemas
//!
//! This module replaces stringly-typed option dispatch with a closed Rust
//! enum that provides compile-time validation and exhaustive matching.

use serde::{Deserialize, Serialize};
use strum::Display;

/// One selectable value of an enum option: a human-readable label paired
/// with the raw value the driver understands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValue {
    pub label: String,
    pub raw: String,
}

impl EnumValue {
    pub fn new(label: &str, raw: &str) -> Self {
        Self {
            label: label.to_string(),
            raw: raw.to_string(),
        }
    }
}

/// Value type of a driver option, carrying only the fields relevant to
/// each kind.
///
/// A fake-bool is an option that is semantically boolean but encoded as
/// "0"/"1" on the wire instead of "true"/"false".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Display)]
#[serde(tag = "type", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OptionKind {
    /// True boolean, encoded as "true"/"false"
    Bool,
    /// Boolean semantics, encoded as "1"/"0"
    FakeBool,
    /// Integer with an inclusive valid range
    Int { min: i32, max: i32 },
    /// Closed set of (label, raw value) pairs
    Enum { values: Vec<EnumValue> },
}

impl OptionKind {
    /// Returns true for kinds that are toggled rather than assigned.
    pub fn is_toggle(&self) -> bool {
        matches!(self, Self::Bool | Self::FakeBool)
    }

    /// The default value used to backfill an option that has no policy
    /// override and no user value.
    ///
    /// Descriptors carry no explicit default field; the first enum value
    /// and the range minimum act as the natural baseline.
    pub fn implicit_default(&self) -> String {
        match self {
            Self::Bool => "false".to_string(),
            Self::FakeBool => "0".to_string(),
            Self::Int { min, .. } => min.to_string(),
            Self::Enum { values } => values
                .first()
                .map(|v| v.raw.clone())
                .unwrap_or_else(|| "0".to_string()),
        }
    }

    /// Checks that a string-encoded value is well-formed for this kind.
    pub fn validates(&self, value: &str) -> bool {
        match self {
            Self::Bool => value == "true" || value == "false",
            Self::FakeBool => value == "0" || value == "1",
            Self::Int { min, max } => value
                .parse::<i32>()
                .map(|n| n >= *min && n <= *max)
                .unwrap_or(false),
            Self::Enum { values } => values.iter().any(|v| v.raw == value),
        }
    }

    /// Resolves an enum label to its raw value. Returns None for
    /// non-enum kinds and unknown labels.
    pub fn raw_for_label(&self, label: &str) -> Option<&str> {
        match self {
            Self::Enum { values } => values
                .iter()
                .find(|v| v.label == label)
                .map(|v| v.raw.as_str()),
            _ => None,
        }
    }

    /// Flips a toggle value. Returns None for non-toggle kinds.
    pub fn toggled(&self, current: &str) -> Option<String> {
        match self {
            Self::Bool => Some(if current == "true" { "false" } else { "true" }.to_string()),
            Self::FakeBool => Some(if current == "1" { "0" } else { "1" }.to_string()),
            _ => None,
        }
    }
}
