use std::error::Error;
use std::sync::Arc;
use tracing::error;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;

use jarvis_consumption_generator::bigquery_client::{BigqueryClient, BigqueryClientConfig};
use jarvis_consumption_generator::config_client::{ConfigClient, ConfigClientConfig};
use jarvis_consumption_generator::generator_service::{GeneratorService, GeneratorServiceConfig};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => fmt::layer().with_target(false).json().boxed(),
        _ => fmt::layer().with_target(false).boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

async fn run() -> Result<(), Box<dyn Error>> {
    let config_client = ConfigClient::new(ConfigClientConfig::from_env()?);
    let bigquery_client = BigqueryClient::new(BigqueryClientConfig::from_env()?);

    let service = GeneratorService::new(GeneratorServiceConfig::new(
        config_client,
        Arc::new(bigquery_client),
    )?);

    service.run().await?;

    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(e) = run().await {
        error!("Data generation failed: {}", e);
        std::process::exit(1);
    }
}
