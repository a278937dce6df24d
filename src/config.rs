//! Client configuration loaded from TOML.
//!
//! - `MeasureConfig::default_config()` uses the defaults embedded in the binary
//! - `MeasureConfig::load(path)` reads a user file; missing keys fall back to defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::info;
use url::Url;

use crate::history::{HistoryStore, JsonFileStorage, SqliteStorage, HISTORY_SLOT};
use crate::submission::HeightPolicy;

/// Defaults embedded from `config/default.toml`.
const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

const APP_DIR: &str = "bodymeasure";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MeasureConfig {
    /// Inference endpoint receiving the multipart POST.
    pub endpoint: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// Send the entered height as `height_cm`.
    pub height_hint: bool,
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub backend: HistoryBackend,
    /// Directory holding the history file or database.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryBackend {
    #[default]
    Json,
    Sqlite,
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://abhishek785-ai-body-measurement.hf.space/predict".to_string(),
            request_timeout_secs: 120,
            user_agent: format!("bodymeasure/{}", env!("CARGO_PKG_VERSION")),
            height_hint: false,
            history: HistoryConfig::default(),
        }
    }
}

impl MeasureConfig {
    /// Configuration embedded in the binary.
    pub fn default_config() -> Result<Self> {
        Self::from_toml_str(DEFAULT_CONFIG).context("Embedded default.toml is invalid")
    }

    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {:?}", path))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config {:?}", path))?;
        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: MeasureConfig = toml::from_str(content)?;
        config.endpoint_url()?;
        if config.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be greater than zero");
        }
        Ok(config)
    }

    pub fn endpoint_url(&self) -> Result<Url> {
        let url = Url::parse(&self.endpoint)
            .with_context(|| format!("Invalid endpoint URL: {}", self.endpoint))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => bail!("Unsupported endpoint scheme: {}", other),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn height_policy(&self) -> HeightPolicy {
        if self.height_hint {
            HeightPolicy::Required
        } else {
            HeightPolicy::Omit
        }
    }

    /// Directory for history data: the configured path, else
    /// `<data dir>/bodymeasure`.
    pub fn history_dir(&self) -> Result<PathBuf> {
        if let Some(path) = &self.history.path {
            return Ok(path.clone());
        }
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .context("Could not determine the platform data directory")
    }

    /// File the configured backend reads and writes.
    pub fn history_path(&self) -> Result<PathBuf> {
        let dir = self.history_dir()?;
        Ok(match self.history.backend {
            HistoryBackend::Json => dir.join(format!("{}.json", HISTORY_SLOT)),
            HistoryBackend::Sqlite => dir.join("bodymeasure.db"),
        })
    }

    /// Open the configured history backend and load what it holds.
    pub fn open_history(&self) -> Result<HistoryStore> {
        let path = self.history_path()?;
        let store = match self.history.backend {
            HistoryBackend::Json => HistoryStore::open(JsonFileStorage::new(path)),
            HistoryBackend::Sqlite => HistoryStore::open(SqliteStorage::open(&path)?),
        };
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_embedded_defaults_load() {
        let config = MeasureConfig::default_config().unwrap();
        assert_eq!(config.endpoint_url().unwrap().path(), "/predict");
        assert_eq!(config.request_timeout(), Duration::from_secs(120));
        assert!(!config.height_hint);
        assert_eq!(config.height_policy(), HeightPolicy::Omit);
        assert_eq!(config.history.backend, HistoryBackend::Json);
        assert!(config.history.path.is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = MeasureConfig::from_toml_str(
            r#"
height_hint = true

[history]
backend = "sqlite"
"#,
        )
        .unwrap();
        assert_eq!(config.height_policy(), HeightPolicy::Required);
        assert_eq!(config.history.backend, HistoryBackend::Sqlite);
        assert_eq!(config.endpoint, MeasureConfig::default().endpoint);
    }

    #[test]
    fn test_rejects_bad_endpoint() {
        assert!(MeasureConfig::from_toml_str(r#"endpoint = "not a url""#).is_err());
        assert!(MeasureConfig::from_toml_str(r#"endpoint = "ftp://example.com/predict""#).is_err());
        assert!(MeasureConfig::from_toml_str("request_timeout_secs = 0").is_err());
    }

    #[test]
    fn test_rejects_unknown_backend() {
        let err = MeasureConfig::from_toml_str("[history]\nbackend = \"redis\"");
        assert!(err.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "endpoint = \"http://127.0.0.1:7860/predict\"\n").unwrap();

        let config = MeasureConfig::load(&path).unwrap();
        assert_eq!(config.endpoint_url().unwrap().port(), Some(7860));

        assert!(MeasureConfig::load(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_history_paths_per_backend() {
        let dir = TempDir::new().unwrap();
        let mut config = MeasureConfig::default();
        config.history.path = Some(dir.path().to_path_buf());

        assert_eq!(
            config.history_path().unwrap(),
            dir.path().join("measurement_history.json")
        );
        config.history.backend = HistoryBackend::Sqlite;
        assert_eq!(config.history_path().unwrap(), dir.path().join("bodymeasure.db"));
    }

    #[test]
    fn test_open_history_round_trips_both_backends() {
        for backend in [HistoryBackend::Json, HistoryBackend::Sqlite] {
            let dir = TempDir::new().unwrap();
            let mut config = MeasureConfig::default();
            config.history.path = Some(dir.path().join("data"));
            config.history.backend = backend;

            let store = config.open_history().unwrap();
            store.add(crate::measurement::MeasurementResult::default().with(
                crate::measurement::MeasurementKey::Hip,
                95.3,
            ));
            drop(store);

            let reopened = config.open_history().unwrap();
            assert_eq!(reopened.snapshot().len(), 1, "backend {:?}", backend);
        }
    }
}
