use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::Device;

/// Power above which a device counts as switched on.
pub const ON_THRESHOLD_KW: f64 = 0.05;

#[derive(Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    On,
    Off,
}

impl DeviceStatus {
    pub fn from_power_kw(power_kw: f64) -> Self {
        if power_kw > ON_THRESHOLD_KW {
            DeviceStatus::On
        } else {
            DeviceStatus::Off
        }
    }
}

/// Device snapshot stored with every reading; the time-series partition key.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct ReadingMetadata {
    pub device_id: String,
    pub device_name: String,
    pub device_type: String,
}

impl From<&Device> for ReadingMetadata {
    fn from(device: &Device) -> Self {
        Self {
            device_id: device.id.clone(),
            device_name: device.name.clone(),
            device_type: device.device_type.clone(),
        }
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct Reading {
    pub id: String,
    pub metadata: ReadingMetadata,
    pub timestamp: DateTime<Utc>,
    pub power_kw: f64,
    pub status: DeviceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<i32>,
    pub runtime_minutes: u32,
    pub efficiency: u32,
    pub maintenance_needed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holiday: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_event: Option<String>,
}
