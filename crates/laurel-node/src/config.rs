use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub node: NodeSettings,
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSettings {
    pub data_dir: PathBuf,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seconds between scheduled recomputation passes.
    pub recompute_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// "text" or "json".
    pub format: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node: NodeSettings {
                data_dir: PathBuf::from("./data"),
                name: "laurel-node".to_string(),
            },
            engine: EngineConfig {
                recompute_interval_secs: 60,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "text".to_string(),
            },
        }
    }
}

impl NodeConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(data_dir) = env::var("LAUREL_DATA_DIR") {
            self.node.data_dir = PathBuf::from(data_dir);
        }
        if let Ok(name) = env::var("LAUREL_NODE_NAME") {
            if !name.is_empty() {
                self.node.name = name;
            }
        }
        if let Ok(interval) = env::var("LAUREL_RECOMPUTE_INTERVAL") {
            if let Ok(secs) = interval.parse() {
                self.engine.recompute_interval_secs = secs;
            }
        }
        if let Ok(level) = env::var("LAUREL_LOG_LEVEL") {
            if !level.is_empty() {
                self.logging.level = level;
            }
        }
        if let Ok(format) = env::var("LAUREL_LOG_FORMAT") {
            if format == "text" || format == "json" {
                self.logging.format = format;
            }
        }
    }
}
