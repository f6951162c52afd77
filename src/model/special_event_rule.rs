use serde::{Deserialize, Serialize};

/// Which devices a special event affects. Rules without a `deviceId` apply to all devices.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum DeviceScope {
    AllDevices,
    Device(String),
}

impl DeviceScope {
    pub fn includes(&self, device_id: &str) -> bool {
        match self {
            DeviceScope::AllDevices => true,
            DeviceScope::Device(id) => id == device_id,
        }
    }
}

impl Default for DeviceScope {
    fn default() -> Self {
        DeviceScope::AllDevices
    }
}

impl From<Option<String>> for DeviceScope {
    fn from(device_id: Option<String>) -> Self {
        match device_id {
            Some(id) => DeviceScope::Device(id),
            None => DeviceScope::AllDevices,
        }
    }
}

impl From<DeviceScope> for Option<String> {
    fn from(scope: DeviceScope) -> Self {
        match scope {
            DeviceScope::AllDevices => None,
            DeviceScope::Device(id) => Some(id),
        }
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SpecialEventRule {
    #[serde(rename_all = "camelCase")]
    SingleDay {
        name: String,
        month: u32,
        day: u32,
        hours: Vec<u32>,
        multiplier: f64,
        #[serde(default, rename = "deviceId")]
        scope: DeviceScope,
    },
    #[serde(rename_all = "camelCase")]
    DateRange {
        name: String,
        month: u32,
        start_day: u32,
        end_day: u32,
        multiplier: f64,
        #[serde(default, rename = "deviceId")]
        scope: DeviceScope,
    },
    /// Multiplier is derived from the calendar position rather than stored.
    #[serde(rename_all = "camelCase")]
    RandomPattern {
        name: String,
        month: u32,
        start_day: u32,
        end_day: u32,
    },
}

impl SpecialEventRule {
    pub fn name(&self) -> &str {
        match self {
            SpecialEventRule::SingleDay { name, .. }
            | SpecialEventRule::DateRange { name, .. }
            | SpecialEventRule::RandomPattern { name, .. } => name,
        }
    }

    pub fn month(&self) -> u32 {
        match self {
            SpecialEventRule::SingleDay { month, .. }
            | SpecialEventRule::DateRange { month, .. }
            | SpecialEventRule::RandomPattern { month, .. } => *month,
        }
    }
}
