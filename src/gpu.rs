//! GPU identity records
//!
//! Multiple detection sources can report the same physical GPU model with
//! different cosmetic strings (vendor databases disagree on naming). The
//! numeric PCI vendor/device ID pair is canonical, so equality, hashing and
//! deduplication use only that pair — never the name fields.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Hardware identity of one detected GPU.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpuInfo {
    pub pci_id: String,
    pub vendor_id: u16,
    pub device_id: u16,
    pub vendor_name: String,
    pub device_name: String,
    pub driver_name: String,
}

impl PartialEq for GpuInfo {
    fn eq(&self, other: &Self) -> bool {
        self.vendor_id == other.vendor_id && self.device_id == other.device_id
    }
}

impl Eq for GpuInfo {}

impl Hash for GpuInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.vendor_id.hash(state);
        self.device_id.hash(state);
    }
}

impl fmt::Display for GpuInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{:04x}:{:04x}] ({})",
            self.vendor_name, self.device_name, self.vendor_id, self.device_id, self.driver_name
        )
    }
}

/// Collapses repeated detections of the same GPU model, keeping the first
/// occurrence and the input order.
pub fn dedup_gpus(detected: Vec<GpuInfo>) -> Vec<GpuInfo> {
    let mut unique: Vec<GpuInfo> = Vec::with_capacity(detected.len());
    for gpu in detected {
        if !unique.contains(&gpu) {
            unique.push(gpu);
        }
    }
    unique
}
