use async_trait::async_trait;
use gcp_bigquery_client::model::table::Table;
use gcp_bigquery_client::model::table_data_insert_all_request::TableDataInsertAllRequest;
use gcp_bigquery_client::model::table_field_schema::TableFieldSchema;
use gcp_bigquery_client::model::table_schema::TableSchema;
use gcp_bigquery_client::model::time_partitioning::TimePartitioning;
use gcp_bigquery_client::Client;
use std::env;
use std::error::Error;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::model::Reading;
use crate::sink_client::{SchemaMode, SchemaRequest, SinkClient, SinkError, SinkSession};

#[derive(Clone, Debug)]
pub struct BigqueryClientConfig {
    pub project_id: String,
    pub dataset: String,
    pub table: String,
    pub key_file_path: String,
}

impl BigqueryClientConfig {
    pub fn new(
        project_id: String,
        dataset: String,
        table: String,
        key_file_path: String,
    ) -> Result<Self, Box<dyn Error>> {
        debug!(
            "BigqueryClientConfig::new(project_id: {}, dataset: {}, table: {}, key_file_path: {})",
            project_id, dataset, table, key_file_path
        );

        if project_id.is_empty() {
            return Err(Box::<dyn Error>::from("BigQuery project id is required"));
        }

        Ok(Self {
            project_id,
            dataset,
            table,
            key_file_path,
        })
    }

    pub fn from_env() -> Result<Self, Box<dyn Error>> {
        let project_id = env::var("BIGQUERY_PROJECT_ID").unwrap_or_default();
        let dataset = env::var("BIGQUERY_DATASET").unwrap_or_else(|_| "jarvis".to_string());
        let table = env::var("BIGQUERY_TABLE").unwrap_or_else(|_| "power_readings".to_string());
        let key_file_path =
            env::var("BIGQUERY_KEY_FILE").unwrap_or_else(|_| "/secrets/keyfile.json".to_string());

        Self::new(project_id, dataset, table, key_file_path)
    }
}

pub struct BigqueryClient {
    config: Arc<BigqueryClientConfig>,
}

impl BigqueryClient {
    pub fn new(config: BigqueryClientConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    async fn connect(&self) -> Result<Client, SinkError> {
        Ok(Client::from_service_account_key_file(&self.config.key_file_path).await?)
    }

    fn table(&self, request: &SchemaRequest, partitioned: bool) -> Table {
        let table = Table::new(
            &self.config.project_id,
            &self.config.dataset,
            &request.name,
            reading_table_schema(),
        )
        .description("Synthesized household power consumption readings")
        .label("granularity", request.granularity.as_str());

        if partitioned {
            table.time_partitioning(TimePartitioning::per_day().field(&request.time_field))
        } else {
            table
        }
    }
}

#[async_trait]
impl SinkClient for BigqueryClient {
    fn store_name(&self) -> String {
        self.config.table.clone()
    }

    async fn check_connection(&self) -> Result<(), SinkError> {
        let client = self.connect().await?;
        client
            .dataset()
            .get(&self.config.project_id, &self.config.dataset)
            .await?;

        info!(
            "Connected to BigQuery dataset {}.{}",
            self.config.project_id, self.config.dataset
        );

        Ok(())
    }

    async fn ensure_schema(&self, request: &SchemaRequest) -> SchemaMode {
        let client = match self.connect().await {
            Ok(c) => c,
            Err(e) => {
                warn!("Could not verify table {}: {}", request.name, e);
                return SchemaMode::Plain;
            }
        };

        if let Ok(existing) = client
            .table()
            .get(&self.config.project_id, &self.config.dataset, &request.name, None)
            .await
        {
            debug!("Table {} already exists", request.name);
            return if existing.time_partitioning.is_some() {
                SchemaMode::TimeSeries
            } else {
                SchemaMode::Plain
            };
        }

        info!("Creating time partitioned table {}", request.name);
        match client.table().create(self.table(request, true)).await {
            Ok(_) => {
                info!("Created time partitioned table {}", request.name);
                return SchemaMode::TimeSeries;
            }
            Err(e) => {
                warn!("Could not create time partitioned table {}: {}", request.name, e);
                warn!("Will use a regular table instead");
            }
        }

        if let Err(e) = client.table().create(self.table(request, false)).await {
            warn!("Could not create table {}: {}", request.name, e);
        }

        SchemaMode::Plain
    }

    async fn open_session(&self) -> Result<Box<dyn SinkSession>, SinkError> {
        let client = self.connect().await?;

        Ok(Box::new(BigquerySession {
            config: Arc::clone(&self.config),
            client: Some(client),
        }))
    }
}

pub struct BigquerySession {
    config: Arc<BigqueryClientConfig>,
    client: Option<Client>,
}

#[async_trait]
impl SinkSession for BigquerySession {
    async fn insert_batch(&mut self, readings: &[Reading]) -> Result<(), SinkError> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| SinkError::from("BigQuery session is closed"))?;

        let mut insert_request = TableDataInsertAllRequest::new();
        for reading in readings {
            insert_request.add_row(Some(reading.id.clone()), reading)?;
        }

        let response = client
            .tabledata()
            .insert_all(
                &self.config.project_id,
                &self.config.dataset,
                &self.config.table,
                insert_request,
            )
            .await?;

        match response.insert_errors {
            Some(errors) if !errors.is_empty() => Err(SinkError::from(format!(
                "BigQuery rejected {} of {} rows",
                errors.len(),
                readings.len()
            ))),
            _ => Ok(()),
        }
    }

    async fn close(&mut self) -> Result<(), SinkError> {
        self.client.take();
        Ok(())
    }
}

/// Column layout of a reading; `metadata` is nested so it can serve as the clustering key.
pub fn reading_table_schema() -> TableSchema {
    TableSchema::new(vec![
        TableFieldSchema::string("id"),
        TableFieldSchema::record(
            "metadata",
            vec![
                TableFieldSchema::string("device_id"),
                TableFieldSchema::string("device_name"),
                TableFieldSchema::string("device_type"),
            ],
        ),
        TableFieldSchema::timestamp("timestamp"),
        TableFieldSchema::float("power_kw"),
        TableFieldSchema::string("status"),
        TableFieldSchema::integer("temperature"),
        TableFieldSchema::integer("runtime_minutes"),
        TableFieldSchema::integer("efficiency"),
        TableFieldSchema::bool("maintenance_needed"),
        TableFieldSchema::string("holiday"),
        TableFieldSchema::string("special_event"),
    ])
}
