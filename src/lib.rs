pub mod batch_writer;
pub mod bigquery_client;
pub mod calendar_rules;
pub mod config_client;
pub mod generator_service;
pub mod model;
pub mod pattern_engine;
pub mod progress_aggregator;
pub mod sink_client;
