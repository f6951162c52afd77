use crate::model::GeneratorConfig;
use serde::de::DeserializeOwned;
use std::env;
use std::error::Error;
use std::fs;
use tracing::{debug, info};

pub trait SetDefaults {
    fn set_defaults(&mut self);
}

pub struct ConfigClientConfig {
    config_path: String,
}

impl ConfigClientConfig {
    pub fn new(config_path: String) -> Result<Self, Box<dyn Error>> {
        debug!("ConfigClientConfig::new(config_path: {})", config_path);
        Ok(Self { config_path })
    }

    pub fn from_env() -> Result<Self, Box<dyn Error>> {
        let config_path =
            env::var("CONFIG_PATH").unwrap_or_else(|_| "/configs/config.yaml".to_string());

        Self::new(config_path)
    }
}

pub struct ConfigClient {
    config: ConfigClientConfig,
}

impl ConfigClient {
    pub fn new(config: ConfigClientConfig) -> Self {
        Self { config }
    }

    pub fn read_config_from_file<T>(&self) -> Result<T, Box<dyn Error>>
    where
        T: DeserializeOwned + SetDefaults,
    {
        let config_file_contents = fs::read_to_string(&self.config.config_path)?;
        let mut config: T = serde_yaml::from_str(&config_file_contents)?;

        config.set_defaults();

        info!("Loaded config from {}", &self.config.config_path);

        Ok(config)
    }

    /// Reads the generator config and rejects it before any connection is made if it can't run.
    pub fn read_generator_config_from_file(&self) -> Result<GeneratorConfig, Box<dyn Error>> {
        let config: GeneratorConfig = self.read_config_from_file()?;
        config.validate()?;

        Ok(config)
    }
}
