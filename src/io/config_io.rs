use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::io::recovery::atomic_write;
use crate::model::config::Config;

/// Keys accepted by `mp config get/set`
pub const CONFIG_KEYS: [&str; 3] = ["storage.slot", "log.level", "session.required"];

pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

static SLOT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("slot pattern is valid")
});

pub const CONFIG_TEMPLATE: &str = r##"# missions configuration

[storage]
# Snapshot slot key. Categories are stored in <slot>.json next to this file.
slot = "missions-possible-data"

[log]
# trace | debug | info | warn | error (MISSIONS_LOG overrides)
level = "info"

[session]
# Refuse task commands until someone has signed in with `mp signin`.
required = true
"##;

/// Error type for configuration I/O
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config.toml: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("could not edit config.toml: {0}")]
    EditError(#[from] toml_edit::TomlError),
    #[error("unknown config key \"{0}\" (expected one of: {keys})", keys = CONFIG_KEYS.join(", "))]
    UnknownKey(String),
    #[error("invalid value \"{value}\" for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Data directory
// ---------------------------------------------------------------------------

/// Resolve the data directory: explicit flag, then `MISSIONS_HOME`, then
/// `$XDG_CONFIG_HOME/missions`, then `$HOME/.config/missions`.
pub fn resolve_data_dir(flag: Option<&str>) -> PathBuf {
    resolve_data_dir_with(flag, |key| std::env::var(key).ok())
}

fn resolve_data_dir_with(flag: Option<&str>, env: impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(dir) = flag {
        return PathBuf::from(dir);
    }
    if let Some(home) = env("MISSIONS_HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(home);
    }
    let config_dir = env("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            env("HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("/"))
                .join(".config")
        });
    config_dir.join("missions")
}

pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join("config.toml")
}

// ---------------------------------------------------------------------------
// Read / write
// ---------------------------------------------------------------------------

/// Read the config along with its editable document. A missing file yields
/// the defaults and an empty document.
pub fn read_config(data_dir: &Path) -> Result<(Config, toml_edit::DocumentMut), ConfigError> {
    let path = config_path(data_dir);
    if !path.exists() {
        return Ok((Config::default(), toml_edit::DocumentMut::new()));
    }
    let text = fs::read_to_string(&path).map_err(|source| ConfigError::ReadError {
        path: path.clone(),
        source,
    })?;
    let config: Config = toml::from_str(&text)?;
    let doc: toml_edit::DocumentMut = text.parse()?;
    Ok((config, doc))
}

/// Write the document back, preserving comments and layout.
pub fn write_config(data_dir: &Path, doc: &toml_edit::DocumentMut) -> Result<(), ConfigError> {
    fs::create_dir_all(data_dir)?;
    atomic_write(&config_path(data_dir), doc.to_string().as_bytes())?;
    Ok(())
}

/// Write the commented default config. Existing files are kept unless `force`.
/// Returns true when a file was written.
pub fn write_default_config(data_dir: &Path, force: bool) -> Result<bool, ConfigError> {
    let path = config_path(data_dir);
    if path.exists() && !force {
        return Ok(false);
    }
    fs::create_dir_all(data_dir)?;
    atomic_write(&path, CONFIG_TEMPLATE.as_bytes())?;
    Ok(true)
}

// ---------------------------------------------------------------------------
// Key access
// ---------------------------------------------------------------------------

pub fn config_value(config: &Config, key: &str) -> Result<String, ConfigError> {
    match key {
        "storage.slot" => Ok(config.storage.slot.clone()),
        "log.level" => Ok(config.log.level.clone()),
        "session.required" => Ok(config.session.required.to_string()),
        other => Err(ConfigError::UnknownKey(other.to_string())),
    }
}

/// Validate `value` for `key` and store it in the document.
pub fn set_config_value(
    doc: &mut toml_edit::DocumentMut,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let (table, field, item) = match key {
        "storage.slot" => {
            if !SLOT_RE.is_match(value) {
                return Err(invalid("use letters, digits, '.', '_' or '-'"));
            }
            ("storage", "slot", toml_edit::value(value))
        }
        "log.level" => {
            let level = value.trim().to_ascii_lowercase();
            if !LOG_LEVELS.contains(&level.as_str()) {
                return Err(invalid("expected trace|debug|info|warn|error"));
            }
            ("log", "level", toml_edit::value(level))
        }
        "session.required" => {
            let flag: bool = value
                .trim()
                .parse()
                .map_err(|_| invalid("expected true or false"))?;
            ("session", "required", toml_edit::value(flag))
        }
        other => return Err(ConfigError::UnknownKey(other.to_string())),
    };

    if !doc.contains_key(table) {
        doc[table] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    doc[table][field] = item;
    Ok(())
}
