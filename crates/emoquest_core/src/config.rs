use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::history::{HistoryViewBuilder, HISTORY_WINDOW, MIN_HISTORY_ENTRIES};

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EmoquestConfig {
    pub storage: StorageConfig,
    pub classifier: ClassifierConfig,
    pub gateway: GatewayConfig,
    pub history: HistoryConfig,
}

impl EmoquestConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: EmoquestConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; if file doesn't exist, return defaults with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("EMOQUEST_DB_PATH") {
            self.storage.db_path = v;
        }
        if let Ok(v) = std::env::var("EMOQUEST_CLASSIFIER") {
            match v.parse() {
                Ok(provider) => self.classifier.provider = provider,
                Err(e) => tracing::warn!("Ignoring EMOQUEST_CLASSIFIER: {}", e),
            }
        }
        if let Ok(v) = std::env::var("EMOQUEST_CLASSIFIER_URL") {
            self.classifier.endpoint = Some(v);
        }
        if let Ok(v) = std::env::var("EMOQUEST_CLASSIFIER_KEY") {
            self.classifier.api_key = Some(v);
        }
        if let Ok(v) = std::env::var("EMOQUEST_HOST") {
            self.gateway.host = v;
        }
        if let Ok(v) = std::env::var("EMOQUEST_PORT") {
            if let Ok(n) = v.parse() {
                self.gateway.port = n;
            }
        }
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: "emoquest.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierProvider {
    /// Offline keyword lexicon.
    #[default]
    Keyword,
    /// Remote text-classification endpoint.
    Http,
}

impl std::str::FromStr for ClassifierProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "keyword" => Ok(ClassifierProvider::Keyword),
            "http" => Ok(ClassifierProvider::Http),
            other => Err(format!("unknown classifier provider '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub provider: ClassifierProvider,
    /// Full URL of the inference endpoint (required for `http`).
    pub endpoint: Option<String>,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub max_attempts: u32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            provider: ClassifierProvider::Keyword,
            endpoint: None,
            model: "j-hartmann/emotion-english-distilroberta-base".to_string(),
            api_key: None,
            timeout_secs: 30,
            max_attempts: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub min_entries: usize,
    pub window: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            min_entries: MIN_HISTORY_ENTRIES,
            window: HISTORY_WINDOW,
        }
    }
}

impl HistoryConfig {
    pub fn builder(&self) -> HistoryViewBuilder {
        HistoryViewBuilder::new(self.min_entries, self.window)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = EmoquestConfig::default();
        assert_eq!(cfg.storage.db_path, "emoquest.db");
        assert_eq!(cfg.classifier.provider, ClassifierProvider::Keyword);
        assert_eq!(cfg.gateway.port, 5000);
        assert_eq!(cfg.history.min_entries, 10);
        assert_eq!(cfg.history.window, 15);
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml_str = r#"
[classifier]
provider = "http"
endpoint = "http://localhost:8080/classify"
"#;
        let cfg: EmoquestConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.classifier.provider, ClassifierProvider::Http);
        assert_eq!(cfg.classifier.endpoint.as_deref(), Some("http://localhost:8080/classify"));
        // Defaults for unspecified fields
        assert_eq!(cfg.classifier.max_attempts, 3);
        assert_eq!(cfg.storage.db_path, "emoquest.db");
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[storage]
db_path = "data/quests.db"

[classifier]
provider = "keyword"
model = "custom/model"
timeout_secs = 5
max_attempts = 1

[gateway]
host = "0.0.0.0"
port = 8088

[history]
min_entries = 3
window = 5
"#;
        let cfg: EmoquestConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.storage.db_path, "data/quests.db");
        assert_eq!(cfg.classifier.model, "custom/model");
        assert_eq!(cfg.classifier.timeout_secs, 5);
        assert_eq!(cfg.gateway.host, "0.0.0.0");
        assert_eq!(cfg.gateway.port, 8088);
        let builder = cfg.history.builder();
        assert_eq!(builder.min_entries(), 3);
        assert_eq!(builder.window(), 5);
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!("HTTP".parse::<ClassifierProvider>(), Ok(ClassifierProvider::Http));
        assert!("bert".parse::<ClassifierProvider>().is_err());
    }

    #[test]
    fn test_env_overrides_and_defaults() {
        // Part 1: env overrides
        std::env::set_var("EMOQUEST_DB_PATH", "/tmp/override.db");
        std::env::set_var("EMOQUEST_PORT", "9090");

        let mut cfg = EmoquestConfig::default();
        cfg.apply_env_overrides();

        assert_eq!(cfg.storage.db_path, "/tmp/override.db");
        assert_eq!(cfg.gateway.port, 9090);

        std::env::remove_var("EMOQUEST_DB_PATH");
        std::env::remove_var("EMOQUEST_PORT");

        // Part 2: nonexistent path returns defaults (no env interference)
        let cfg = EmoquestConfig::load_or_default("/nonexistent/path.toml");
        assert_eq!(cfg.storage.db_path, "emoquest.db");
    }
}
