use std::error::Error;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, OwnedMutexGuard};
use tokio::task::{JoinError, JoinSet};
use tracing::{error, info, warn};

use crate::batch_writer::{BatchWriter, WorkerReport};
use crate::config_client::ConfigClient;
use crate::model::{Device, GeneratorConfig};
use crate::pattern_engine::PatternEngine;
use crate::progress_aggregator::ProgressAggregator;
use crate::sink_client::{Granularity, SchemaMode, SchemaRequest, SinkClient, SinkSession};

const ESTIMATED_BYTES_PER_READING: f64 = 500.0;

/// Holds a worker's open session; the worker keeps it locked while it runs, so whatever is
/// left once the lock is free belongs to a worker that was aborted before it could close it.
type SessionSlot = Arc<Mutex<Option<Box<dyn SinkSession>>>>;

#[derive(Clone, PartialEq, Debug)]
pub struct RunSummary {
    pub total_inserted: u64,
    pub workers: Vec<WorkerReport>,
    pub schema_mode: SchemaMode,
    pub interrupted: bool,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn inserted_by_workers(&self) -> u64 {
        self.workers.iter().map(|w| w.inserted).sum()
    }

    pub fn failed_batches(&self) -> u64 {
        self.workers.iter().map(|w| w.failed_batches).sum()
    }
}

pub struct GeneratorServiceConfig {
    config_client: ConfigClient,
    sink_client: Arc<dyn SinkClient>,
}

impl GeneratorServiceConfig {
    pub fn new(
        config_client: ConfigClient,
        sink_client: Arc<dyn SinkClient>,
    ) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            config_client,
            sink_client,
        })
    }
}

pub struct GeneratorService {
    config: GeneratorServiceConfig,
}

impl GeneratorService {
    pub fn new(config: GeneratorServiceConfig) -> Self {
        Self { config }
    }

    /// Generates until done or interrupted with ctrl-c.
    pub async fn run(&self) -> Result<RunSummary, Box<dyn Error>> {
        let config = self.config.config_client.read_generator_config_from_file()?;

        let interrupt = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Unable to listen for interrupt signal: {}", e);
                std::future::pending::<()>().await;
            }
        };

        generate(Arc::clone(&self.config.sink_client), config, interrupt).await
    }
}

/// Runs one worker per device until every worker finished or `interrupt` completes. After an
/// interrupt workers get `shutdown_timeout_seconds` to finish their current batch before
/// they're aborted.
pub async fn generate<F>(
    sink_client: Arc<dyn SinkClient>,
    config: GeneratorConfig,
    interrupt: F,
) -> Result<RunSummary, Box<dyn Error>>
where
    F: Future<Output = ()>,
{
    config.validate()?;
    let window = config.sampling_window()?;
    let store_name = sink_client.store_name();

    info!("Connecting to {}", store_name);
    if let Err(e) = sink_client.check_connection().await {
        return Err(Box::<dyn Error>::from(format!(
            "Error connecting to {}: {}",
            store_name, e
        )));
    }

    let schema_request = SchemaRequest::for_readings(
        &store_name,
        Granularity::for_interval_seconds(config.interval_seconds),
    );
    let schema_mode = sink_client.ensure_schema(&schema_request).await;

    let devices = &config.household.devices;
    let readings_per_device = window.points();
    let estimated_readings = readings_per_device * devices.len() as u64;
    info!(
        "Data generation plan: {} to {} every {} second(s) for {} devices, {} readings per device, {} readings in total (~{:.1} MB) using {} workers",
        config.start_date,
        config.end_date,
        config.interval_seconds,
        devices.len(),
        readings_per_device,
        estimated_readings,
        estimated_readings as f64 * ESTIMATED_BYTES_PER_READING / 1_000_000.0,
        devices.len()
    );

    let special_events: Vec<&str> = config
        .household
        .special_events
        .iter()
        .map(|event| event.name())
        .collect();
    info!(
        "Calendar: {} holidays, special events: {}",
        config.household.holidays.len(),
        if special_events.is_empty() {
            "none".to_string()
        } else {
            special_events.join(", ")
        }
    );

    let progress = Arc::new(ProgressAggregator::new(config.progress_report_frequency));
    let engine = Arc::new(PatternEngine::new(
        config.household.clone(),
        config.timezone()?,
    ));
    let writer = BatchWriter::new(engine, window, config.batch_size, Arc::clone(&progress));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut workers = JoinSet::new();
    let mut session_slots: Vec<(&Device, SessionSlot)> = Vec::with_capacity(devices.len());
    for device in devices {
        let slot: SessionSlot = Arc::new(Mutex::new(None));
        let held = Arc::clone(&slot).lock_owned().await;
        session_slots.push((device, slot));

        workers.spawn(run_worker(
            writer.clone(),
            device.clone(),
            Arc::clone(&sink_client),
            held,
            shutdown_rx.clone(),
        ));
    }

    let mut reports = Vec::with_capacity(devices.len());
    let mut interrupted = false;
    tokio::pin!(interrupt);

    loop {
        tokio::select! {
            joined = workers.join_next() => match joined {
                Some(result) => collect_report(result, &mut reports),
                None => break,
            },
            _ = &mut interrupt, if !interrupted => {
                interrupted = true;
                break;
            }
        }
    }

    if interrupted {
        let timeout = config.shutdown_timeout();
        warn!(
            "Process interrupted, waiting up to {:?} for workers to finish their current batch",
            timeout
        );
        // only fails when every worker already finished
        let _ = shutdown_tx.send(true);

        let drained = tokio::time::timeout(timeout, async {
            while let Some(result) = workers.join_next().await {
                collect_report(result, &mut reports);
            }
        })
        .await;

        if drained.is_err() {
            warn!(
                "{} workers did not finish within {:?}, aborting them",
                workers.len(),
                timeout
            );
            workers.shutdown().await;
        }
    }

    for (device, slot) in &session_slots {
        let mut held = slot.lock().await;
        release_session(&device.name, &mut held).await;
    }

    let summary = RunSummary {
        total_inserted: progress.total_inserted(),
        workers: reports,
        schema_mode,
        interrupted,
        elapsed: progress.elapsed(),
    };

    info!(
        "Data generation {}! Total readings inserted: {}, failed batches: {}, runtime: {:.1} minutes",
        if interrupted { "interrupted" } else { "complete" },
        summary.total_inserted,
        summary.failed_batches(),
        summary.elapsed.as_secs_f64() / 60.0
    );

    Ok(summary)
}

/// Owns the device's sink session for the worker's lifetime and closes it once on the way out.
async fn run_worker(
    writer: BatchWriter,
    device: Device,
    sink_client: Arc<dyn SinkClient>,
    mut session_slot: OwnedMutexGuard<Option<Box<dyn SinkSession>>>,
    shutdown: watch::Receiver<bool>,
) -> WorkerReport {
    let session = match sink_client.open_session().await {
        Ok(session) => session_slot.insert(session),
        Err(e) => {
            error!("Could not open a session for {}: {}", device.name, e);
            return WorkerReport::for_device(&device);
        }
    };

    let report = writer.run(&device, session.as_mut(), &shutdown).await;

    release_session(&device.name, &mut session_slot).await;

    report
}

async fn release_session(device_name: &str, slot: &mut Option<Box<dyn SinkSession>>) {
    if let Some(mut session) = slot.take() {
        if let Err(e) = session.close().await {
            warn!("Error closing session for {}: {}", device_name, e);
        }
    }
}

fn collect_report(result: Result<WorkerReport, JoinError>, reports: &mut Vec<WorkerReport>) {
    match result {
        Ok(report) => reports.push(report),
        Err(e) => error!("Worker task failed: {}", e),
    }
}
