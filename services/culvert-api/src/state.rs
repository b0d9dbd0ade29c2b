//! Application state for the culvert API.

use std::sync::Arc;

use anyhow::{Context, Result};
use culvert_protocol::PipelineError;
use grid_processor::ImergArchive;
use station_client::{build_client, ForecastClient, FrostClient, NveClient, PipeLifeClient};
use tracing::{info, warn};

use crate::config::ServiceConfig;

/// Shared application state, built once at startup.
pub struct AppState {
    pub config: ServiceConfig,

    /// Absent when no Frost client id is configured.
    pub frost: Option<FrostClient>,

    pub forecast: ForecastClient,

    /// Absent when no NVE API key is configured.
    pub nve: Option<NveClient>,

    pub pipelife: PipeLifeClient,

    /// Absent when no archive is configured.
    pub imerg: Option<Arc<ImergArchive>>,
}

impl AppState {
    /// Build provider clients and open the archive described by `config`.
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let http = build_client(&config.http_options()).context("Failed to build HTTP client")?;

        let frost = if config.frost.client_id.is_empty() {
            warn!("FROST_CLIENT_ID not set, station endpoints are disabled");
            None
        } else {
            Some(FrostClient::new(
                http.clone(),
                &config.frost.base_url,
                config.frost.client_id.clone(),
            ))
        };

        let nve = if config.nve.api_key.is_empty() {
            warn!("NVE_API_KEY not set, flow endpoint is disabled");
            None
        } else {
            Some(NveClient::new(http.clone(), &config.nve.base_url, config.nve.api_key.clone()))
        };

        let imerg = match &config.imerg {
            Some(imerg_config) => {
                imerg_config
                    .validate()
                    .map_err(anyhow::Error::msg)
                    .context("Invalid imerg configuration")?;
                let archive = ImergArchive::open(imerg_config).with_context(|| {
                    format!("Failed to open IMERG archive at {:?}", imerg_config.archive_path)
                })?;
                match archive.bounds() {
                    Some(bounds) => info!(min = %bounds.min, max = %bounds.max, "Opened IMERG archive"),
                    None => warn!("IMERG archive has no discoverable bounds, every range will be rejected"),
                }
                Some(Arc::new(archive))
            }
            None => None,
        };

        Ok(Self {
            forecast: ForecastClient::new(http.clone(), &config.forecast.base_url),
            pipelife: PipeLifeClient::new(http, &config.pipelife.base_url),
            frost,
            nve,
            imerg,
            config,
        })
    }

    pub fn frost(&self) -> Result<&FrostClient, PipelineError> {
        self.frost
            .as_ref()
            .ok_or_else(|| PipelineError::Unavailable("Frost client id is not configured".to_string()))
    }

    pub fn nve(&self) -> Result<&NveClient, PipelineError> {
        self.nve
            .as_ref()
            .ok_or_else(|| PipelineError::Unavailable("NVE API key is not configured".to_string()))
    }

    pub fn imerg(&self) -> Result<&Arc<ImergArchive>, PipelineError> {
        self.imerg
            .as_ref()
            .ok_or_else(|| PipelineError::Unavailable("IMERG archive is not configured".to_string()))
    }
}
