use async_trait::async_trait;
use std::error::Error;

use crate::model::Reading;

pub type SinkError = Box<dyn Error + Send + Sync>;

/// Coarse time resolution used to configure a time-series oriented store.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Granularity {
    Seconds,
    Minutes,
    Hours,
}

impl Granularity {
    pub fn for_interval_seconds(interval_seconds: i64) -> Self {
        if interval_seconds < 60 {
            Granularity::Seconds
        } else if interval_seconds < 3600 {
            Granularity::Minutes
        } else {
            Granularity::Hours
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Seconds => "seconds",
            Granularity::Minutes => "minutes",
            Granularity::Hours => "hours",
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SchemaRequest {
    pub name: String,
    pub time_field: String,
    pub metadata_field: String,
    pub granularity: Granularity,
}

impl SchemaRequest {
    pub fn for_readings(name: &str, granularity: Granularity) -> Self {
        Self {
            name: name.into(),
            time_field: "timestamp".into(),
            metadata_field: "metadata".into(),
            granularity,
        }
    }
}

/// How the store ended up being set up.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SchemaMode {
    TimeSeries,
    Plain,
}

/// Connection-level access to the store; each worker opens its own session from it.
#[async_trait]
pub trait SinkClient: Send + Sync {
    fn store_name(&self) -> String;

    /// Fails when the store can't be reached; callers abort before generating anything.
    async fn check_connection(&self) -> Result<(), SinkError>;

    /// Idempotent. Falls back to a plain append-only store instead of failing.
    async fn ensure_schema(&self, request: &SchemaRequest) -> SchemaMode;

    async fn open_session(&self) -> Result<Box<dyn SinkSession>, SinkError>;
}

/// A worker-owned session that persists ordered batches of readings.
#[async_trait]
pub trait SinkSession: Send {
    /// Failure must leave previously persisted batches intact.
    async fn insert_batch(&mut self, readings: &[Reading]) -> Result<(), SinkError>;

    async fn close(&mut self) -> Result<(), SinkError>;
}
