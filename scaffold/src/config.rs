//! Configuration for the prerequisite walk.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use scaffold_agent::OpenAiBackend;
use syllabus::CatalogConfig;

/// Configuration for a scaffolding session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScaffoldConfig {
    /// Catalog configuration
    pub catalog: CatalogConfig,
    /// Oracle configuration
    pub oracle: OracleConfig,
    /// Walk configuration
    pub walk: WalkConfig,
    /// Blob storage configuration
    pub storage: StorageConfig,
}

impl Default for ScaffoldConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig::default(),
            oracle: OracleConfig::default(),
            walk: WalkConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl ScaffoldConfig {
    /// Load config from YAML file.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

/// Oracle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Base URL of an OpenAI-compatible API
    pub base_url: String,
    /// Model to request
    pub model: String,
    /// API key, if the endpoint wants one
    pub api_key: Option<String>,
    /// Per-call timeout (ms)
    pub timeout_ms: u64,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum tokens per completion
    pub max_tokens: u32,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".to_string(),
            model: "llama3".to_string(),
            api_key: None,
            timeout_ms: 60_000,
            temperature: 0.2,
            max_tokens: 2048,
        }
    }
}

impl OracleConfig {
    /// Build the HTTP backend this config describes.
    pub fn backend(&self) -> OpenAiBackend {
        OpenAiBackend::new(&self.base_url, &self.model, self.api_key.clone())
    }
}

/// Walk configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkConfig {
    /// Board whose textbooks are walked
    pub board: String,
    /// How many years back the walk may go
    pub max_depth: u32,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            board: "CBSE".to_string(),
            max_depth: 3,
        }
    }
}

/// Blob storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory session blobs are written to
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("structured_data"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ScaffoldConfig::default();
        assert_eq!(config.oracle.model, "llama3");
        assert_eq!(config.walk.max_depth, 3);
        assert_eq!(config.storage.data_dir, PathBuf::from("structured_data"));
        assert!(config
            .catalog
            .base_url
            .starts_with("https://staticapis.pragament.com"));
    }

    #[test]
    fn test_yaml_roundtrip() {
        let mut config = ScaffoldConfig::default();
        config.walk.max_depth = 2;
        config.oracle.model = "llama3.1".to_string();

        let yaml = config.to_yaml().unwrap();
        let parsed = ScaffoldConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed.walk.max_depth, 2);
        assert_eq!(parsed.oracle.model, "llama3.1");
    }
}
