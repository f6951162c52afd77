use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct HourWindow {
    pub from: u32,
    pub till: u32,
}

impl HourWindow {
    pub fn new(from: u32, till: u32) -> Self {
        Self { from, till }
    }

    /// Both bounds are inclusive.
    pub fn contains(&self, hour: u32) -> bool {
        self.from <= hour && hour <= self.till
    }
}

/// Scales one device's power on the named holidays, optionally only inside an hour window.
#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct HolidayEffect {
    pub holidays: Vec<String>,
    pub device_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<HourWindow>,
    pub multiplier: f64,
}

impl HolidayEffect {
    pub fn new(holidays: &[&str], device_id: &str, hours: Option<HourWindow>, multiplier: f64) -> Self {
        Self {
            holidays: holidays.iter().map(|h| h.to_string()).collect(),
            device_id: device_id.into(),
            hours,
            multiplier,
        }
    }

    pub fn applies_to(&self, holiday: &str, device_id: &str, hour: u32) -> bool {
        self.device_id == device_id
            && self.holidays.iter().any(|h| h == holiday)
            && self.hours.map_or(true, |window| window.contains(hour))
    }
}
