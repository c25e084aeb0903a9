//! flowcast.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_MODEL_FILE: &str = "lstm_vehicle_model.json";
pub const DEFAULT_SCALER_FILE: &str = "vehicle_scaler.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    pub server: ServerConfig,
    pub artifacts: ArtifactsConfig,
    pub inference: InferenceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    /// Base directory both artifact files are resolved against.
    pub dir: PathBuf,
    pub model_file: String,
    pub scaler_file: String,
    /// Expected hex SHA-256 of the model artifact, if pinned.
    pub model_sha256: Option<String>,
    /// Expected hex SHA-256 of the scaler artifact, if pinned.
    pub scaler_sha256: Option<String>,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("prediction_api"),
            model_file: DEFAULT_MODEL_FILE.to_string(),
            scaler_file: DEFAULT_SCALER_FILE.to_string(),
            model_sha256: None,
            scaler_sha256: None,
        }
    }
}

impl ArtifactsConfig {
    pub fn model_path(&self) -> PathBuf {
        self.dir.join(&self.model_file)
    }

    pub fn scaler_path(&self) -> PathBuf {
        self.dir.join(&self.scaler_file)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Upper bound on a single pipeline evaluation.
    pub timeout_ms: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self { timeout_ms: 2_000 }
    }
}

impl InferenceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl FlowConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: FlowConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FlowConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(
            config.artifacts.model_path(),
            PathBuf::from("prediction_api").join("lstm_vehicle_model.json")
        );
        assert_eq!(
            config.artifacts.scaler_path(),
            PathBuf::from("prediction_api").join("vehicle_scaler.json")
        );
        assert_eq!(config.inference.timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_parse_partial() {
        let toml_str = r#"
[artifacts]
dir = "/srv/models"
scaler_sha256 = "abc123"

[inference]
timeout_ms = 250
"#;
        let config: FlowConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.artifacts.dir, PathBuf::from("/srv/models"));
        assert_eq!(config.artifacts.model_file, DEFAULT_MODEL_FILE);
        assert_eq!(config.artifacts.scaler_sha256.as_deref(), Some("abc123"));
        assert_eq!(config.inference.timeout_ms, 250);
    }

    #[test]
    fn test_from_file_roundtrips_rendered_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flowcast.toml");
        let mut config = FlowConfig::default();
        config.server.port = 9100;
        std::fs::write(&path, config.to_toml_string().unwrap()).unwrap();

        let loaded = FlowConfig::from_file(&path).unwrap();
        assert_eq!(loaded.server.port, 9100);
    }
}
