use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::model::{
    Device, DeviceScope, HolidayEffect, HolidayRule, HourWindow, SeasonalTable, SpecialEventRule,
};

pub const DEFAULT_WEEKEND_MULTIPLIER: f64 = 1.5;

/// Static rule tables describing one household; read-only for the duration of a run.
#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase", from = "HouseholdSections")]
pub struct HouseholdProfile {
    pub devices: Vec<Device>,
    pub holidays: Vec<HolidayRule>,
    pub holiday_effects: Vec<HolidayEffect>,
    pub special_events: Vec<SpecialEventRule>,
    pub seasonal_multipliers: SeasonalTable,
    pub weekend_devices: Vec<String>,
    pub weekend_multiplier: f64,
}

/// Household as written in the config file. A section that's left out falls back to the
/// smart home catalog, an explicitly empty one stays empty.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct HouseholdSections {
    devices: Option<Vec<Device>>,
    holidays: Option<Vec<HolidayRule>>,
    holiday_effects: Option<Vec<HolidayEffect>>,
    special_events: Option<Vec<SpecialEventRule>>,
    seasonal_multipliers: Option<SeasonalTable>,
    weekend_devices: Option<Vec<String>>,
    weekend_multiplier: Option<f64>,
}

impl From<HouseholdSections> for HouseholdProfile {
    fn from(sections: HouseholdSections) -> Self {
        Self {
            devices: sections.devices.unwrap_or_else(default_devices),
            holidays: sections.holidays.unwrap_or_else(default_holidays),
            holiday_effects: sections.holiday_effects.unwrap_or_else(default_holiday_effects),
            special_events: sections.special_events.unwrap_or_else(default_special_events),
            seasonal_multipliers: sections
                .seasonal_multipliers
                .unwrap_or_else(default_seasonal_multipliers),
            weekend_devices: sections.weekend_devices.unwrap_or_else(default_weekend_devices),
            weekend_multiplier: sections
                .weekend_multiplier
                .unwrap_or(DEFAULT_WEEKEND_MULTIPLIER),
        }
    }
}

impl Default for HouseholdProfile {
    fn default() -> Self {
        Self::smart_home()
    }
}

impl HouseholdProfile {
    /// The smart home the generator was built around.
    pub fn smart_home() -> Self {
        Self::from(HouseholdSections::default())
    }

    pub fn weekend_multiplier_for(&self, device_id: &str) -> Option<f64> {
        if self.weekend_devices.iter().any(|d| d == device_id) {
            Some(self.weekend_multiplier)
        } else {
            None
        }
    }
}

fn default_devices() -> Vec<Device> {
    vec![
        Device::new("HVAC", "HVAC System", "climate"),
        Device::new("FRIDGE", "Refrigerator", "appliance"),
        Device::new("LIGHTING", "Home Lighting", "lighting"),
        Device::new("EV_CHARGER", "EV Charging Station", "transportation"),
        Device::new("WASHER", "Washing Machine", "appliance"),
    ]
}

fn default_holidays() -> Vec<HolidayRule> {
    vec![
        HolidayRule::fixed_date("New Year's Day", 1, 1),
        HolidayRule::nth_weekday("Martin Luther King Jr. Day", 1, Weekday::Mon, 15, 21),
        HolidayRule::fixed_date("Valentine's Day", 2, 14),
        HolidayRule::fixed_date("St. Patrick's Day", 3, 17),
        HolidayRule::fixed_date("Tax Day", 4, 15),
        HolidayRule::fixed_date("Cinco de Mayo", 5, 5),
        HolidayRule::nth_weekday("Memorial Day", 5, Weekday::Mon, 25, 31),
        HolidayRule::fixed_date("Juneteenth", 6, 19),
        HolidayRule::fixed_date("Independence Day", 7, 4),
        HolidayRule::nth_weekday("Labor Day", 9, Weekday::Mon, 1, 7),
        HolidayRule::fixed_date("Halloween", 10, 31),
        HolidayRule::nth_weekday("Thanksgiving", 11, Weekday::Thu, 22, 28),
        HolidayRule::fixed_date("Christmas Eve", 12, 24),
        HolidayRule::fixed_date("Christmas Day", 12, 25),
        HolidayRule::fixed_date("New Year's Eve", 12, 31),
    ]
}

fn default_holiday_effects() -> Vec<HolidayEffect> {
    const CHRISTMAS: &[&str] = &["Christmas Day", "Christmas Eve"];
    const NEW_YEAR: &[&str] = &["New Year's Eve", "New Year's Day"];
    const SUMMER: &[&str] = &["Independence Day", "Memorial Day", "Labor Day"];

    vec![
        HolidayEffect::new(CHRISTMAS, "HVAC", None, 2.0),
        HolidayEffect::new(CHRISTMAS, "LIGHTING", None, 5.0),
        HolidayEffect::new(CHRISTMAS, "WASHER", None, 3.0),
        HolidayEffect::new(CHRISTMAS, "EV_CHARGER", None, 0.3),
        HolidayEffect::new(&["Thanksgiving"], "HVAC", None, 2.0),
        HolidayEffect::new(&["Thanksgiving"], "LIGHTING", None, 2.5),
        HolidayEffect::new(&["Thanksgiving"], "WASHER", None, 4.0),
        HolidayEffect::new(NEW_YEAR, "LIGHTING", None, 3.0),
        HolidayEffect::new(NEW_YEAR, "HVAC", None, 2.0),
        HolidayEffect::new(NEW_YEAR, "EV_CHARGER", None, 0.4),
        // hot summer afternoon
        HolidayEffect::new(SUMMER, "HVAC", Some(HourWindow::new(13, 18)), 2.5),
        HolidayEffect::new(SUMMER, "LIGHTING", None, 0.3),
        HolidayEffect::new(&["Halloween"], "LIGHTING", Some(HourWindow::new(17, 22)), 5.0),
        HolidayEffect::new(&["Valentine's Day"], "LIGHTING", Some(HourWindow::new(18, 23)), 2.0),
        HolidayEffect::new(&["Valentine's Day"], "HVAC", Some(HourWindow::new(18, 23)), 1.5),
        HolidayEffect::new(&["St. Patrick's Day"], "LIGHTING", Some(HourWindow::new(17, 23)), 2.0),
    ]
}

fn default_special_events() -> Vec<SpecialEventRule> {
    vec![
        SpecialEventRule::SingleDay {
            name: "Power Outage".into(),
            month: 3,
            day: 15,
            hours: (14..=19).collect(),
            multiplier: 0.0,
            scope: DeviceScope::AllDevices,
        },
        SpecialEventRule::DateRange {
            name: "Heat Wave".into(),
            month: 7,
            start_day: 10,
            end_day: 16,
            multiplier: 3.5,
            scope: DeviceScope::Device("HVAC".into()),
        },
        SpecialEventRule::DateRange {
            name: "Winter Storm".into(),
            month: 2,
            start_day: 5,
            end_day: 8,
            multiplier: 2.8,
            scope: DeviceScope::Device("HVAC".into()),
        },
        SpecialEventRule::DateRange {
            name: "Vacation".into(),
            month: 8,
            start_day: 5,
            end_day: 12,
            multiplier: 0.2,
            scope: DeviceScope::AllDevices,
        },
        SpecialEventRule::SingleDay {
            name: "Super Bowl Party".into(),
            month: 2,
            day: 11,
            hours: (14..=21).collect(),
            multiplier: 2.5,
            scope: DeviceScope::Device("LIGHTING".into()),
        },
        SpecialEventRule::DateRange {
            name: "House Guests".into(),
            month: 6,
            start_day: 15,
            end_day: 22,
            multiplier: 1.8,
            scope: DeviceScope::AllDevices,
        },
        SpecialEventRule::RandomPattern {
            name: "Home Renovation".into(),
            month: 4,
            start_day: 10,
            end_day: 20,
        },
    ]
}

fn default_seasonal_multipliers() -> SeasonalTable {
    // HVAC, LIGHTING, EV_CHARGER, WASHER, FRIDGE
    let rows: [(u32, [f64; 5]); 12] = [
        (1, [2.0, 1.5, 0.9, 1.1, 0.9]),
        (2, [1.8, 1.4, 0.9, 1.1, 0.9]),
        (3, [1.0, 1.0, 1.0, 1.2, 1.0]),
        (4, [0.8, 0.8, 1.1, 1.3, 1.0]),
        (5, [1.2, 0.7, 1.2, 1.2, 1.1]),
        (6, [1.5, 0.6, 1.2, 1.0, 1.3]),
        (7, [2.2, 0.5, 1.3, 1.0, 1.4]),
        (8, [2.0, 0.5, 1.3, 1.0, 1.4]),
        (9, [1.0, 0.8, 1.1, 1.1, 1.2]),
        (10, [1.2, 1.2, 1.0, 1.1, 1.0]),
        (11, [1.5, 1.4, 0.9, 1.2, 0.9]),
        (12, [1.8, 2.0, 0.8, 1.4, 1.1]),
    ];
    let device_ids = ["HVAC", "LIGHTING", "EV_CHARGER", "WASHER", "FRIDGE"];

    let mut table = SeasonalTable::default();
    for (month, multipliers) in rows.iter() {
        for (device_id, multiplier) in device_ids.iter().zip(multipliers.iter()) {
            table.set(*month, device_id, *multiplier);
        }
    }
    table
}

fn default_weekend_devices() -> Vec<String> {
    vec!["LIGHTING".into(), "HVAC".into(), "WASHER".into()]
}
