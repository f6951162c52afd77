use chrono::{Datelike, NaiveDateTime, Timelike};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::model::{Device, HolidayRule, SpecialEventRule};

/// Multipliers a random-pattern event can draw from.
pub const RANDOM_PATTERN_MULTIPLIERS: [f64; 5] = [0.1, 0.5, 2.0, 3.0, 0.0];

pub const NO_EVENT_MULTIPLIER: f64 = 1.0;

#[derive(Clone, PartialEq, Debug)]
pub struct SpecialEventMatch {
    pub name: Option<String>,
    pub multiplier: f64,
}

impl SpecialEventMatch {
    fn none() -> Self {
        Self {
            name: None,
            multiplier: NO_EVENT_MULTIPLIER,
        }
    }

    fn named(name: &str, multiplier: f64) -> Self {
        Self {
            name: Some(name.to_string()),
            multiplier,
        }
    }
}

/// Maps local calendar positions to holiday and special event labels. Rules are evaluated in
/// configured order and the first match wins.
#[derive(Clone, Debug)]
pub struct CalendarRules {
    holidays: Vec<HolidayRule>,
    special_events: Vec<SpecialEventRule>,
}

impl CalendarRules {
    pub fn new(holidays: Vec<HolidayRule>, special_events: Vec<SpecialEventRule>) -> Self {
        Self {
            holidays,
            special_events,
        }
    }

    pub fn holiday_for(&self, timestamp: &NaiveDateTime) -> Option<&str> {
        let date = timestamp.date();
        self.holidays
            .iter()
            .find(|rule| rule.matches(&date))
            .map(|rule| rule.name())
    }

    pub fn special_event_for(&self, device: &Device, timestamp: &NaiveDateTime) -> SpecialEventMatch {
        let (month, day, hour) = (timestamp.month(), timestamp.day(), timestamp.hour());

        for event in self.special_events.iter().filter(|e| e.month() == month) {
            match event {
                SpecialEventRule::SingleDay {
                    name,
                    day: event_day,
                    hours,
                    multiplier,
                    scope,
                    ..
                } => {
                    if *event_day == day && hours.contains(&hour) && scope.includes(&device.id) {
                        return SpecialEventMatch::named(name, *multiplier);
                    }
                }
                SpecialEventRule::DateRange {
                    name,
                    start_day,
                    end_day,
                    multiplier,
                    scope,
                    ..
                } => {
                    if (*start_day..=*end_day).contains(&day) && scope.includes(&device.id) {
                        return SpecialEventMatch::named(name, *multiplier);
                    }
                }
                SpecialEventRule::RandomPattern {
                    name,
                    start_day,
                    end_day,
                    ..
                } => {
                    if (*start_day..=*end_day).contains(&day) {
                        return SpecialEventMatch::named(name, random_pattern_multiplier(day, hour));
                    }
                }
            }
        }

        SpecialEventMatch::none()
    }
}

/// Stable for a given day and hour: the generator is local and seeded from the calendar only.
pub fn random_pattern_multiplier(day: u32, hour: u32) -> f64 {
    let mut rng = StdRng::seed_from_u64(u64::from(day + hour));
    RANDOM_PATTERN_MULTIPLIERS[rng.gen_range(0..RANDOM_PATTERN_MULTIPLIERS.len())]
}
