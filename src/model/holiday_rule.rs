use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum HolidayRule {
    #[serde(rename_all = "camelCase")]
    FixedDate { name: String, month: u32, day: u32 },
    /// Approximates "nth weekday of the month" as a weekday inside a day range.
    #[serde(rename_all = "camelCase")]
    NthWeekday {
        name: String,
        month: u32,
        weekday: Weekday,
        first_day: u32,
        last_day: u32,
    },
}

impl HolidayRule {
    pub fn fixed_date(name: &str, month: u32, day: u32) -> Self {
        HolidayRule::FixedDate {
            name: name.into(),
            month,
            day,
        }
    }

    pub fn nth_weekday(name: &str, month: u32, weekday: Weekday, first_day: u32, last_day: u32) -> Self {
        HolidayRule::NthWeekday {
            name: name.into(),
            month,
            weekday,
            first_day,
            last_day,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            HolidayRule::FixedDate { name, .. } | HolidayRule::NthWeekday { name, .. } => name,
        }
    }

    pub fn matches(&self, date: &NaiveDate) -> bool {
        match self {
            HolidayRule::FixedDate { month, day, .. } => date.month() == *month && date.day() == *day,
            HolidayRule::NthWeekday {
                month,
                weekday,
                first_day,
                last_day,
                ..
            } => {
                date.month() == *month
                    && (*first_day..=*last_day).contains(&date.day())
                    && date.weekday() == *weekday
            }
        }
    }
}
