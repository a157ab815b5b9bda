use serde::{Deserialize, Serialize};

/// Default storage slot key. The snapshot file is `<slot>.json`.
pub const DEFAULT_SLOT: &str = "missions-possible-data";

/// Configuration from config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Slot key; the snapshot lives in `<slot>.json` in the data directory
    #[serde(default = "default_slot")]
    pub slot: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            slot: default_slot(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// One of trace, debug, info, warn, error
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: default_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Whether task commands refuse to run without a signed-in identity
    #[serde(default = "default_true")]
    pub required: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig { required: true }
    }
}

fn default_slot() -> String {
    DEFAULT_SLOT.to_string()
}

fn default_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.storage.slot, DEFAULT_SLOT);
        assert_eq!(config.log.level, "info");
        assert!(config.session.required);
    }

    #[test]
    fn partial_tables_fill_in_defaults() {
        let config: Config = toml::from_str(
            r#"
[storage]
slot = "work"

[session]
required = false
"#,
        )
        .unwrap();
        assert_eq!(config.storage.slot, "work");
        assert_eq!(config.log.level, "info");
        assert!(!config.session.required);
    }
}
