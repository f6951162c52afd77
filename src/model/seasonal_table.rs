use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Month (1-12) to device id to multiplier.
#[derive(Clone, PartialEq, Default, Serialize, Deserialize, Debug)]
#[serde(transparent)]
pub struct SeasonalTable(pub BTreeMap<u32, BTreeMap<String, f64>>);

impl SeasonalTable {
    pub fn multiplier(&self, month: u32, device_id: &str) -> Option<f64> {
        self.0.get(&month).and_then(|devices| devices.get(device_id)).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn set(&mut self, month: u32, device_id: &str, multiplier: f64) {
        self.0
            .entry(month)
            .or_default()
            .insert(device_id.to_string(), multiplier);
    }
}
