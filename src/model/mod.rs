mod device;
mod generator_config;
mod holiday_effect;
mod holiday_rule;
mod household_profile;
mod reading;
mod sampling_window;
mod seasonal_table;
mod special_event_rule;

pub use crate::model::device::Device;
pub use crate::model::generator_config::{
    GeneratorConfig, DEFAULT_BATCH_SIZE, DEFAULT_PROGRESS_REPORT_FREQUENCY,
    DEFAULT_SHUTDOWN_TIMEOUT_SECONDS,
};
pub use crate::model::holiday_effect::{HolidayEffect, HourWindow};
pub use crate::model::holiday_rule::HolidayRule;
pub use crate::model::household_profile::{HouseholdProfile, DEFAULT_WEEKEND_MULTIPLIER};
pub use crate::model::reading::{DeviceStatus, Reading, ReadingMetadata, ON_THRESHOLD_KW};
pub use crate::model::sampling_window::SamplingWindow;
pub use crate::model::seasonal_table::SeasonalTable;
pub use crate::model::special_event_rule::{DeviceScope, SpecialEventRule};
