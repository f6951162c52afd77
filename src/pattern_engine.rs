use chrono::{DateTime, Datelike, NaiveDateTime, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use rand::Rng;
use std::ops::RangeInclusive;
use uuid::Uuid;

use crate::calendar_rules::CalendarRules;
use crate::model::{Device, DeviceStatus, HouseholdProfile, Reading, ReadingMetadata};

const MAINTENANCE_PROBABILITY: f64 = 0.05;
const EV_CHARGING_PROBABILITY: f64 = 0.5;
const WASHER_ACTIVE_PROBABILITY: f64 = 0.3;
const WASHER_STANDBY_KW: f64 = 0.01;

/// Turns a device and an instant into a fully enriched reading by layering time-of-day load,
/// weekend, seasonal, holiday and special event effects.
#[derive(Clone, Debug)]
pub struct PatternEngine {
    profile: HouseholdProfile,
    calendar: CalendarRules,
    timezone: Tz,
}

impl PatternEngine {
    pub fn new(profile: HouseholdProfile, timezone: Tz) -> Self {
        let calendar = CalendarRules::new(profile.holidays.clone(), profile.special_events.clone());

        Self {
            profile,
            calendar,
            timezone,
        }
    }

    pub fn profile(&self) -> &HouseholdProfile {
        &self.profile
    }

    pub fn generate<R: Rng>(
        &self,
        device: &Device,
        timestamp: DateTime<Utc>,
        rng: &mut R,
    ) -> Reading {
        let local = timestamp.with_timezone(&self.timezone).naive_local();
        let hour = local.hour();

        let mut power = base_power_kw(&device.id, hour, rng);

        if is_weekend(&local) {
            if let Some(multiplier) = self.profile.weekend_multiplier_for(&device.id) {
                power *= multiplier;
            }
        }

        if let Some(multiplier) = self
            .profile
            .seasonal_multipliers
            .multiplier(local.month(), &device.id)
        {
            power *= multiplier;
        }

        let holiday = self.calendar.holiday_for(&local);
        if let Some(name) = holiday {
            power *= self.holiday_multiplier(name, &device.id, hour);
        }

        let event = self.calendar.special_event_for(device, &local);
        power *= event.multiplier;

        let power_kw = round_kw(power.max(0.0));
        let status = DeviceStatus::from_power_kw(power_kw);

        Reading {
            id: Uuid::new_v4().to_string(),
            metadata: ReadingMetadata::from(device),
            timestamp,
            power_kw,
            status,
            temperature: temperature_range(&device.id).map(|range| rng.gen_range(range)),
            runtime_minutes: match status {
                DeviceStatus::On => rng.gen_range(1..=120),
                DeviceStatus::Off => 0,
            },
            efficiency: rng.gen_range(70..=99),
            maintenance_needed: rng.gen_bool(MAINTENANCE_PROBABILITY),
            holiday: holiday.map(String::from),
            special_event: event.name,
        }
    }

    fn holiday_multiplier(&self, holiday: &str, device_id: &str, hour: u32) -> f64 {
        self.profile
            .holiday_effects
            .iter()
            .find(|effect| effect.applies_to(holiday, device_id, hour))
            .map_or(1.0, |effect| effect.multiplier)
    }
}

fn is_weekend(local: &NaiveDateTime) -> bool {
    matches!(local.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Time-of-day load before any calendar effects.
pub fn base_power_kw<R: Rng>(device_id: &str, hour: u32, rng: &mut R) -> f64 {
    match device_id {
        "HVAC" => match hour {
            13..=18 => rng.gen_range(2.5..3.5),
            23 | 0..=5 => rng.gen_range(0.1..0.5),
            _ => rng.gen_range(1.0..2.0),
        },
        "FRIDGE" => rng.gen_range(0.1..0.2),
        "LIGHTING" => match hour {
            6..=8 | 18..=23 => rng.gen_range(0.2..0.5),
            _ => rng.gen_range(0.0..0.1),
        },
        "EV_CHARGER" => match hour {
            19..=23 | 0..=5 if rng.gen_bool(EV_CHARGING_PROBABILITY) => rng.gen_range(6.0..7.5),
            _ => 0.0,
        },
        "WASHER" => match hour {
            7..=10 | 18..=21 if rng.gen_bool(WASHER_ACTIVE_PROBABILITY) => rng.gen_range(0.5..1.2),
            _ => WASHER_STANDBY_KW,
        },
        _ => rng.gen_range(0.1..0.5),
    }
}

fn temperature_range(device_id: &str) -> Option<RangeInclusive<i32>> {
    match device_id {
        "HVAC" => Some(65..=80),
        "FRIDGE" => Some(33..=40),
        _ => None,
    }
}

fn round_kw(power: f64) -> f64 {
    (power * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::{check, let_assert};
    use chrono::{Duration, TimeZone};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn engine() -> PatternEngine {
        PatternEngine::new(HouseholdProfile::smart_home(), Tz::UTC)
    }

    fn device(engine: &PatternEngine, id: &str) -> Device {
        engine
            .profile()
            .devices
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .unwrap()
    }

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    /// Same seed again, so the base draw can be replayed independently of the engine.
    fn base_draw(device_id: &str, hour: u32, seed: u64) -> f64 {
        base_power_kw(device_id, hour, &mut StdRng::seed_from_u64(seed))
    }

    #[test]
    fn every_reading_has_non_negative_power_rounded_to_three_decimals() {
        let engine = engine();
        let mut rng = StdRng::seed_from_u64(7);
        let mut timestamp = utc(2024, 1, 1, 0);

        while timestamp < utc(2025, 1, 1, 0) {
            for device in &engine.profile().devices {
                let reading = engine.generate(device, timestamp, &mut rng);

                check!(reading.power_kw >= 0.0);
                let scaled = reading.power_kw * 1000.0;
                check!((scaled - scaled.round()).abs() < 1e-6);
            }
            timestamp = timestamp + Duration::minutes(97);
        }
    }

    #[test]
    fn status_is_on_exactly_when_power_exceeds_threshold() {
        let engine = engine();
        let mut rng = StdRng::seed_from_u64(11);

        for hour in 0..24 {
            for device in &engine.profile().devices {
                let reading = engine.generate(device, utc(2024, 3, 4, hour), &mut rng);

                check!((reading.status == DeviceStatus::On) == (reading.power_kw > 0.05));
                if reading.status == DeviceStatus::Off {
                    check!(reading.runtime_minutes == 0);
                } else {
                    check!((1..=120).contains(&reading.runtime_minutes));
                }
                check!((70..=99).contains(&reading.efficiency));
            }
        }
    }

    #[test]
    fn temperature_only_present_for_climate_and_refrigerator_devices() {
        let engine = engine();
        let mut rng = StdRng::seed_from_u64(3);
        let timestamp = utc(2024, 5, 14, 9);

        let hvac = engine.generate(&device(&engine, "HVAC"), timestamp, &mut rng);
        let fridge = engine.generate(&device(&engine, "FRIDGE"), timestamp, &mut rng);
        let washer = engine.generate(&device(&engine, "WASHER"), timestamp, &mut rng);

        let_assert!(Some(hvac_temperature) = hvac.temperature);
        let_assert!(Some(fridge_temperature) = fridge.temperature);
        check!((65..=80).contains(&hvac_temperature));
        check!((33..=40).contains(&fridge_temperature));
        check!(washer.temperature == None);
    }

    #[test]
    fn heat_wave_multiplies_on_top_of_seasonal_and_base_power() {
        let engine = engine();
        let hvac = device(&engine, "HVAC");
        // Friday 12 July 2024, inside the heat wave
        let timestamp = utc(2024, 7, 12, 14);

        let reading = engine.generate(&hvac, timestamp, &mut StdRng::seed_from_u64(42));

        let expected = round_kw(base_draw("HVAC", 14, 42) * 2.2 * 3.5);
        check!(reading.power_kw == expected);
        check!(reading.special_event.as_deref() == Some("Heat Wave"));
        check!(reading.holiday == None);
        check!(reading.power_kw >= round_kw(2.5 * 2.2 * 3.5));
    }

    #[test]
    fn christmas_lighting_multiplies_on_top_of_december_seasonal_lighting() {
        let engine = engine();
        let lighting = device(&engine, "LIGHTING");
        // Wednesday 25 December 2024
        let timestamp = utc(2024, 12, 25, 19);

        let reading = engine.generate(&lighting, timestamp, &mut StdRng::seed_from_u64(5));

        let expected = round_kw(base_draw("LIGHTING", 19, 5) * 2.0 * 5.0);
        check!(reading.power_kw == expected);
        check!(reading.holiday.as_deref() == Some("Christmas Day"));
        check!(reading.special_event == None);
    }

    #[test]
    fn weekend_multiplier_applies_to_weekend_devices_only() {
        let engine = engine();
        // Saturday 9 March 2024, March seasonal multipliers are 1.0 for HVAC and FRIDGE
        let saturday = utc(2024, 3, 9, 10);

        let hvac = engine.generate(&device(&engine, "HVAC"), saturday, &mut StdRng::seed_from_u64(1));
        let fridge = engine.generate(&device(&engine, "FRIDGE"), saturday, &mut StdRng::seed_from_u64(1));

        check!(hvac.power_kw == round_kw(base_draw("HVAC", 10, 1) * 1.5));
        check!(fridge.power_kw == round_kw(base_draw("FRIDGE", 10, 1)));
    }

    #[test]
    fn halloween_lighting_effect_is_limited_to_evening_window() {
        let engine = engine();
        let lighting = device(&engine, "LIGHTING");

        let evening = engine.generate(&lighting, utc(2024, 10, 31, 20), &mut StdRng::seed_from_u64(9));
        let morning = engine.generate(&lighting, utc(2024, 10, 31, 7), &mut StdRng::seed_from_u64(9));

        check!(evening.power_kw == round_kw(base_draw("LIGHTING", 20, 9) * 1.2 * 5.0));
        check!(morning.power_kw == round_kw(base_draw("LIGHTING", 7, 9) * 1.2));
        check!(morning.holiday.as_deref() == Some("Halloween"));
    }

    #[test]
    fn holiday_multipliers_follow_rule_table() {
        let engine = engine();
        let cases: &[(&str, &str, u32, f64)] = &[
            ("Christmas Day", "HVAC", 9, 2.0),
            ("Christmas Day", "LIGHTING", 2, 5.0),
            ("Christmas Day", "WASHER", 12, 3.0),
            ("Christmas Day", "EV_CHARGER", 22, 0.3),
            ("Christmas Day", "FRIDGE", 12, 1.0),
            ("Christmas Eve", "HVAC", 9, 2.0),
            ("Christmas Eve", "LIGHTING", 20, 5.0),
            ("Christmas Eve", "WASHER", 8, 3.0),
            ("Christmas Eve", "EV_CHARGER", 1, 0.3),
            ("Christmas Eve", "FRIDGE", 8, 1.0),
            ("Thanksgiving", "HVAC", 15, 2.0),
            ("Thanksgiving", "LIGHTING", 18, 2.5),
            ("Thanksgiving", "WASHER", 10, 4.0),
            ("Thanksgiving", "EV_CHARGER", 21, 1.0),
            ("Thanksgiving", "FRIDGE", 15, 1.0),
            ("New Year's Day", "LIGHTING", 0, 3.0),
            ("New Year's Day", "HVAC", 11, 2.0),
            ("New Year's Day", "EV_CHARGER", 23, 0.4),
            ("New Year's Day", "WASHER", 9, 1.0),
            ("New Year's Eve", "LIGHTING", 23, 3.0),
            ("New Year's Eve", "HVAC", 4, 2.0),
            ("New Year's Eve", "EV_CHARGER", 20, 0.4),
            ("New Year's Eve", "FRIDGE", 23, 1.0),
            // summer afternoon window is 13 through 18
            ("Independence Day", "HVAC", 12, 1.0),
            ("Independence Day", "HVAC", 13, 2.5),
            ("Independence Day", "HVAC", 18, 2.5),
            ("Independence Day", "HVAC", 19, 1.0),
            ("Independence Day", "LIGHTING", 21, 0.3),
            ("Memorial Day", "HVAC", 12, 1.0),
            ("Memorial Day", "HVAC", 15, 2.5),
            ("Memorial Day", "LIGHTING", 7, 0.3),
            ("Labor Day", "HVAC", 13, 2.5),
            ("Labor Day", "HVAC", 19, 1.0),
            ("Labor Day", "LIGHTING", 3, 0.3),
            ("Labor Day", "WASHER", 14, 1.0),
            ("Halloween", "LIGHTING", 16, 1.0),
            ("Halloween", "LIGHTING", 17, 5.0),
            ("Halloween", "LIGHTING", 22, 5.0),
            ("Halloween", "LIGHTING", 23, 1.0),
            ("Halloween", "HVAC", 19, 1.0),
            ("Valentine's Day", "LIGHTING", 17, 1.0),
            ("Valentine's Day", "LIGHTING", 18, 2.0),
            ("Valentine's Day", "LIGHTING", 23, 2.0),
            ("Valentine's Day", "HVAC", 17, 1.0),
            ("Valentine's Day", "HVAC", 18, 1.5),
            ("Valentine's Day", "HVAC", 23, 1.5),
            ("Valentine's Day", "HVAC", 0, 1.0),
            ("St. Patrick's Day", "LIGHTING", 16, 1.0),
            ("St. Patrick's Day", "LIGHTING", 17, 2.0),
            ("St. Patrick's Day", "LIGHTING", 23, 2.0),
            ("St. Patrick's Day", "LIGHTING", 0, 1.0),
            ("St. Patrick's Day", "HVAC", 20, 1.0),
        ];

        for (holiday, device_id, hour, expected) in cases {
            let multiplier = engine.holiday_multiplier(holiday, device_id, *hour);
            check!(
                multiplier == *expected,
                "{} {} at {}:00",
                holiday,
                device_id,
                hour
            );
        }
    }

    #[test]
    fn holidays_without_effects_leave_every_device_unmultiplied() {
        let engine = engine();
        let untouched = ["Martin Luther King Jr. Day", "Tax Day", "Cinco de Mayo", "Juneteenth"];

        for holiday in &untouched {
            for device in &engine.profile().devices {
                for hour in 0..24 {
                    check!(engine.holiday_multiplier(holiday, &device.id, hour) == 1.0);
                }
            }
        }
        for rule in &engine.profile().holidays {
            for hour in 0..24 {
                check!(engine.holiday_multiplier(rule.name(), "FRIDGE", hour) == 1.0);
            }
        }
    }

    #[test]
    fn holiday_effects_apply_on_their_calendar_dates() {
        let engine = engine();
        // (timestamp, device, seasonal multiplier, holiday multiplier, holiday)
        let cases = [
            // Thursday 28 November 2024
            (utc(2024, 11, 28, 8), "WASHER", 1.2, 4.0, "Thanksgiving"),
            // Thursday 4 July 2024
            (utc(2024, 7, 4, 14), "HVAC", 2.2, 2.5, "Independence Day"),
            (utc(2024, 7, 4, 10), "HVAC", 2.2, 1.0, "Independence Day"),
            // Wednesday 14 February 2024
            (utc(2024, 2, 14, 19), "HVAC", 1.8, 1.5, "Valentine's Day"),
            // Tuesday 24 December 2024
            (utc(2024, 12, 24, 20), "EV_CHARGER", 0.8, 0.3, "Christmas Eve"),
            // Monday 1 January 2024
            (utc(2024, 1, 1, 21), "LIGHTING", 1.5, 3.0, "New Year's Day"),
        ];

        for (seed, (timestamp, device_id, seasonal, holiday_multiplier, holiday)) in
            cases.iter().enumerate()
        {
            let seed = seed as u64 + 100;
            let reading = engine.generate(
                &device(&engine, device_id),
                *timestamp,
                &mut StdRng::seed_from_u64(seed),
            );

            let expected = round_kw(
                base_draw(device_id, timestamp.hour(), seed) * seasonal * holiday_multiplier,
            );
            check!(reading.power_kw == expected, "{} at {}", device_id, timestamp);
            check!(reading.holiday.as_deref() == Some(*holiday));
        }
    }

    #[test]
    fn power_outage_zeroes_every_device() {
        let engine = engine();
        let mut rng = StdRng::seed_from_u64(21);

        for device in &engine.profile().devices {
            let reading = engine.generate(device, utc(2024, 3, 15, 15), &mut rng);

            check!(reading.power_kw == 0.0);
            check!(reading.status == DeviceStatus::Off);
            check!(reading.special_event.as_deref() == Some("Power Outage"));
        }
    }

    #[test]
    fn calendar_is_evaluated_in_configured_timezone() {
        let engine = PatternEngine::new(HouseholdProfile::smart_home(), Tz::America__New_York);
        let lighting = device(&engine, "LIGHTING");
        // 00:30 UTC on 1 November is 20:30 on Halloween in New York
        let timestamp = Utc.with_ymd_and_hms(2024, 11, 1, 0, 30, 0).unwrap();

        let reading = engine.generate(&lighting, timestamp, &mut StdRng::seed_from_u64(2));

        check!(reading.holiday.as_deref() == Some("Halloween"));
        check!(reading.timestamp == timestamp);
    }

    #[test]
    fn unknown_devices_fall_back_to_generic_range() {
        let mut rng = StdRng::seed_from_u64(8);

        for hour in 0..24 {
            let power = base_power_kw("DISHWASHER", hour, &mut rng);
            check!((0.1..0.5).contains(&power));
        }
    }

    #[test]
    fn ev_charger_is_idle_outside_charging_window() {
        let mut rng = StdRng::seed_from_u64(8);

        for hour in 6..=18 {
            check!(base_power_kw("EV_CHARGER", hour, &mut rng) == 0.0);
        }
    }
}
