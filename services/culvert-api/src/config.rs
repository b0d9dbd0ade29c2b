//! Service configuration loading and types.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use grid_processor::GridProcessorConfig;
use serde::Deserialize;
use station_client::{forecast, frost, nve, pipelife, HttpOptions, PipeLifeCredentials};

/// Service configuration, loaded once at startup from YAML.
///
/// Credentials are usually left out of the file and supplied through
/// `FROST_CLIENT_ID`, `NVE_API_KEY` and `PIPELIFE_USERS`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Timeout for every outgoing provider request.
    pub request_timeout_secs: u64,

    /// User-Agent sent to every provider.
    pub user_agent: String,

    pub frost: FrostConfig,
    pub forecast: ForecastConfig,
    pub nve: NveConfig,
    pub pipelife: PipeLifeConfig,

    /// The dense precipitation archive; IMERG endpoints answer 503 without it.
    pub imerg: Option<GridProcessorConfig>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 60,
            user_agent: HttpOptions::default().user_agent,
            frost: FrostConfig::default(),
            forecast: ForecastConfig::default(),
            nve: NveConfig::default(),
            pipelife: PipeLifeConfig::default(),
            imerg: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FrostConfig {
    pub base_url: String,
    pub client_id: String,
    /// Nearest stations considered before the completeness filter.
    pub nearest_candidates: usize,
}

impl Default for FrostConfig {
    fn default() -> Self {
        Self {
            base_url: frost::DEFAULT_BASE_URL.to_string(),
            client_id: String::new(),
            nearest_candidates: frost::DEFAULT_NEAREST_CANDIDATES,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub base_url: String,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            base_url: forecast::DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NveConfig {
    pub base_url: String,
    pub api_key: String,
}

impl Default for NveConfig {
    fn default() -> Self {
        Self {
            base_url: nve::DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipeLifeConfig {
    pub base_url: String,
    pub users: Vec<PipeLifeCredentials>,
}

impl Default for PipeLifeConfig {
    fn default() -> Self {
        Self {
            base_url: pipelife::DEFAULT_BASE_URL.to_string(),
            users: Vec::new(),
        }
    }
}

/// Parse `PIPELIFE_USERS`: a JSON array of credential objects.
pub fn parse_pipelife_users(text: &str) -> Result<Vec<PipeLifeCredentials>> {
    serde_json::from_str(text).context("PIPELIFE_USERS must be a JSON array of {client_id, client_secret, username, password}")
}

impl ServiceConfig {
    /// Load configuration from a YAML file, then apply environment overrides.
    ///
    /// A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read: {:?}", path))?;
            Self::from_yaml(&content).with_context(|| format!("Failed to parse: {:?}", path))?
        } else {
            tracing::warn!("Config file {} does not exist, using defaults", path.display());
            Self::default()
        };
        config.apply_env()?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Override credentials and the archive location from the environment.
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(id) = std::env::var("FROST_CLIENT_ID") {
            self.frost.client_id = id;
        }
        if let Ok(key) = std::env::var("NVE_API_KEY") {
            self.nve.api_key = key;
        }
        if let Ok(users) = std::env::var("PIPELIFE_USERS") {
            self.pipelife.users = parse_pipelife_users(&users)?;
        }
        match self.imerg.as_mut() {
            Some(imerg) => imerg.apply_env(),
            None if std::env::var("IMERG_ARCHIVE_PATH").is_ok() => {
                self.imerg = Some(GridProcessorConfig::from_env());
            }
            None => {}
        }
        Ok(())
    }

    pub fn http_options(&self) -> HttpOptions {
        HttpOptions {
            timeout: Duration::from_secs(self.request_timeout_secs),
            user_agent: self.user_agent.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_processor::CellIndexConfig;

    #[test]
    fn test_defaults_point_at_public_apis() {
        let config = ServiceConfig::default();
        assert_eq!(config.frost.base_url, "https://frost.met.no");
        assert_eq!(config.frost.nearest_candidates, 50);
        assert!(config.imerg.is_none());
        assert!(config.pipelife.users.is_empty());
    }

    #[test]
    fn test_from_yaml_partial() {
        let config = ServiceConfig::from_yaml(
            r#"
request_timeout_secs: 10
frost:
  client_id: abc
imerg:
  archive_path: /data/imerg.zarr
  files_dir: /data/imerg
  cell_index:
    kind: geo_json
    path: /data/cells.geojson
"#,
        )
        .unwrap();

        assert_eq!(config.request_timeout_secs, 10);
        assert_eq!(config.frost.client_id, "abc");
        assert_eq!(config.frost.base_url, "https://frost.met.no");
        let imerg = config.imerg.unwrap();
        assert_eq!(imerg.archive_path, Path::new("/data/imerg.zarr"));
        assert!(matches!(imerg.cell_index, CellIndexConfig::GeoJson { .. }));
        assert_eq!(imerg.missing_fill_value, -1.0);
    }

    #[test]
    fn test_parse_pipelife_users() {
        let users = parse_pipelife_users(
            r#"[{"client_id":"c","client_secret":"s","username":"u","password":"p"}]"#,
        )
        .unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username, "u");

        assert!(parse_pipelife_users("not json").is_err());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServiceConfig::load(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config.request_timeout_secs, 60);
    }
}
