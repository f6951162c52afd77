use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use std::error::Error;

/// Inclusive range of sampling instants shared by every device worker.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct SamplingWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub interval: Duration,
}

impl SamplingWindow {
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval: Duration,
    ) -> Result<Self, Box<dyn Error>> {
        if interval <= Duration::zero() {
            return Err(Box::<dyn Error>::from("Sampling interval must be positive"));
        }

        Ok(Self {
            start,
            end,
            interval,
        })
    }

    /// Covers `start_date` through the entire final calendar day of `end_date` in `timezone`;
    /// the last instant is one interval before the day after `end_date` starts.
    pub fn from_dates(
        start_date: NaiveDate,
        end_date: NaiveDate,
        interval_seconds: i64,
        timezone: Tz,
    ) -> Result<Self, Box<dyn Error>> {
        if end_date < start_date {
            return Err(Box::<dyn Error>::from(format!(
                "End date {} must not be before start date {}",
                end_date, start_date
            )));
        }
        if interval_seconds <= 0 {
            return Err(Box::<dyn Error>::from(format!(
                "Interval must be a positive number of seconds, got {}",
                interval_seconds
            )));
        }

        let day_after_end = end_date
            .succ_opt()
            .ok_or_else(|| format!("End date {} is out of range", end_date))?;
        let interval = Duration::try_seconds(interval_seconds)
            .ok_or_else(|| format!("Interval of {} seconds is out of range", interval_seconds))?;

        let start = start_of_day(start_date, timezone)?;
        let end = start_of_day(day_after_end, timezone)?
            .checked_sub_signed(interval)
            .ok_or_else(|| format!("Interval of {} seconds is out of range", interval_seconds))?;

        Self::new(start, end, interval)
    }

    pub fn timestamps(&self) -> impl Iterator<Item = DateTime<Utc>> {
        let interval = self.interval;
        let end = self.end;
        std::iter::successors(Some(self.start), move |t| t.checked_add_signed(interval))
            .take_while(move |t| *t <= end)
    }

    pub fn points(&self) -> u64 {
        if self.end < self.start {
            return 0;
        }
        let span = (self.end - self.start).num_seconds();
        (span / self.interval.num_seconds().max(1)) as u64 + 1
    }

    /// Fraction of the window covered up to `position`, as used for time-remaining estimates.
    pub fn fraction_elapsed(&self, position: DateTime<Utc>) -> f64 {
        let span = (self.end - self.start).num_milliseconds();
        if span <= 0 {
            return 1.0;
        }
        let covered = (position - self.start).num_milliseconds() as f64 / span as f64;
        covered.clamp(0.0, 1.0)
    }
}

fn start_of_day(date: NaiveDate, timezone: Tz) -> Result<DateTime<Utc>, Box<dyn Error>> {
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| format!("Invalid date {}", date))?;

    timezone
        .from_local_datetime(&midnight)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
        .ok_or_else(|| Box::<dyn Error>::from(format!("{} has no midnight in {:?}", date, timezone)))
}
