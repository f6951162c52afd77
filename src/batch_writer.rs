use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};

use crate::model::{Device, Reading, SamplingWindow};
use crate::pattern_engine::PatternEngine;
use crate::progress_aggregator::ProgressAggregator;
use crate::sink_client::SinkSession;

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct WorkerReport {
    pub device_id: String,
    pub generated: u64,
    pub inserted: u64,
    pub flushes: u64,
    pub failed_batches: u64,
    pub lost_readings: u64,
    pub cancelled: bool,
}

impl WorkerReport {
    pub fn for_device(device: &Device) -> Self {
        Self {
            device_id: device.id.clone(),
            ..Default::default()
        }
    }
}

/// Walks the sampling window for one device, generating readings and flushing them to the
/// worker's sink session in batches of at most `batch_size`.
///
/// A batch the sink rejects is logged and dropped; there are no retries.
#[derive(Clone)]
pub struct BatchWriter {
    engine: Arc<PatternEngine>,
    window: SamplingWindow,
    batch_size: usize,
    progress: Arc<ProgressAggregator>,
}

impl BatchWriter {
    pub fn new(
        engine: Arc<PatternEngine>,
        window: SamplingWindow,
        batch_size: usize,
        progress: Arc<ProgressAggregator>,
    ) -> Self {
        Self {
            engine,
            window,
            batch_size: batch_size.max(1),
            progress,
        }
    }

    /// Stops generating once `shutdown` flips to true, but still flushes what it already holds.
    pub async fn run(
        &self,
        device: &Device,
        session: &mut dyn SinkSession,
        shutdown: &watch::Receiver<bool>,
    ) -> WorkerReport {
        info!(
            "Worker started for {}: generating data from {} to {}",
            device.name, self.window.start, self.window.end
        );

        let mut rng = StdRng::from_entropy();
        let mut report = WorkerReport::for_device(device);
        let mut batch: Vec<Reading> = Vec::with_capacity(self.batch_size);

        for timestamp in self.window.timestamps() {
            let cancelled = *shutdown.borrow();
            if cancelled {
                report.cancelled = true;
                break;
            }

            batch.push(self.engine.generate(device, timestamp, &mut rng));
            report.generated += 1;

            if batch.len() >= self.batch_size {
                self.flush(device, session, &mut batch, timestamp, &mut report)
                    .await;
            }
        }

        if let Some(position) = batch.last().map(|r| r.timestamp) {
            self.flush(device, session, &mut batch, position, &mut report)
                .await;
        }

        info!(
            "Worker for {} completed. Inserted {} readings",
            device.name, report.inserted
        );

        report
    }

    async fn flush(
        &self,
        device: &Device,
        session: &mut dyn SinkSession,
        batch: &mut Vec<Reading>,
        position: DateTime<Utc>,
        report: &mut WorkerReport,
    ) {
        let count = batch.len() as u64;
        report.flushes += 1;

        match session.insert_batch(batch).await {
            Ok(()) => {
                report.inserted += count;
                if let Some(progress) = self.progress.record_inserted(count, position, &self.window) {
                    progress.log();
                }
            }
            Err(e) => {
                report.failed_batches += 1;
                report.lost_readings += count;
                error!(
                    "Error inserting batch of {} readings for {}: {}",
                    count, device.name, e
                );
            }
        }

        batch.clear();
    }
}
