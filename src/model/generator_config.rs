use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::time::Duration;

use crate::config_client::SetDefaults;
use crate::model::{HouseholdProfile, SamplingWindow};

pub const DEFAULT_BATCH_SIZE: usize = 1000;
pub const DEFAULT_PROGRESS_REPORT_FREQUENCY: u64 = 300_000;
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECONDS: u64 = 10;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub interval_seconds: i64,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_progress_report_frequency")]
    pub progress_report_frequency: u64,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_shutdown_timeout_seconds")]
    pub shutdown_timeout_seconds: u64,
    #[serde(default)]
    pub household: HouseholdProfile,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_progress_report_frequency() -> u64 {
    DEFAULT_PROGRESS_REPORT_FREQUENCY
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_shutdown_timeout_seconds() -> u64 {
    DEFAULT_SHUTDOWN_TIMEOUT_SECONDS
}

impl SetDefaults for GeneratorConfig {
    fn set_defaults(&mut self) {}
}

impl GeneratorConfig {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate, interval_seconds: i64) -> Self {
        Self {
            start_date,
            end_date,
            interval_seconds,
            batch_size: DEFAULT_BATCH_SIZE,
            progress_report_frequency: DEFAULT_PROGRESS_REPORT_FREQUENCY,
            timezone: default_timezone(),
            shutdown_timeout_seconds: DEFAULT_SHUTDOWN_TIMEOUT_SECONDS,
            household: HouseholdProfile::smart_home(),
        }
    }

    pub fn timezone(&self) -> Result<Tz, Box<dyn Error>> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| Box::<dyn Error>::from(format!("Unknown timezone {}: {}", self.timezone, e)))
    }

    pub fn sampling_window(&self) -> Result<SamplingWindow, Box<dyn Error>> {
        SamplingWindow::from_dates(
            self.start_date,
            self.end_date,
            self.interval_seconds,
            self.timezone()?,
        )
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_seconds)
    }

    /// Checks everything that can be known to be wrong before connecting to the sink.
    pub fn validate(&self) -> Result<(), Box<dyn Error>> {
        if self.batch_size == 0 {
            return Err(Box::<dyn Error>::from("Batch size must be at least 1"));
        }
        if self.progress_report_frequency == 0 {
            return Err(Box::<dyn Error>::from(
                "Progress report frequency must be at least 1",
            ));
        }
        if self.household.devices.is_empty() {
            return Err(Box::<dyn Error>::from("No devices configured"));
        }
        self.sampling_window()?;

        Ok(())
    }
}
