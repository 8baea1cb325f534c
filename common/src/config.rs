use crate::error::{DetectError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment override for the backend base address. Takes priority
/// over the config file.
pub const BACKEND_URL_ENV: &str = "DEBRIS_DETECT_BACKEND_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".into(),
            timeout_seconds: 120,
        }
    }
}

impl BackendConfig {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: BackendConfig = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| DetectError::Config("home directory not found".into()))?;
        Ok(home.join(".config").join("debris-detect").join("config.json"))
    }

    /// Effective base URL, with the environment variable winning over
    /// the file value. A trailing slash is trimmed so endpoint paths
    /// can be appended uniformly.
    pub fn base_url(&self) -> String {
        let url = std::env::var(BACKEND_URL_ENV).unwrap_or_else(|_| self.base_url.clone());
        url.trim_end_matches('/').to_string()
    }
}
