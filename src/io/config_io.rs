use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::EngineConfig;

/// File name looked up beside the action file when no path is given
pub const CONFIG_FILE_NAME: &str = "gtd.toml";

/// Error type for loading gtd.toml
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid config in {path}: {message}")]
    Invalid { path: PathBuf, message: String },
}

/// Where to look for the config: the explicit path if given, else
/// `gtd.toml` in the directory holding `action_file`.
pub fn config_path_for(action_file: &Path, explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(path) => path.to_path_buf(),
        None => action_file
            .parent()
            .unwrap_or(Path::new("."))
            .join(CONFIG_FILE_NAME),
    }
}

/// Read and validate the config at `path`. A missing file yields defaults.
pub fn read_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(EngineConfig::default());
    }
    let text = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let config = parse_config(&text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    validate(&config).map_err(|message| ConfigError::Invalid {
        path: path.to_path_buf(),
        message,
    })?;
    Ok(config)
}

pub fn parse_config(text: &str) -> Result<EngineConfig, toml::de::Error> {
    toml::from_str(text)
}

fn validate(config: &EngineConfig) -> Result<(), String> {
    if config.ordering.position_stride <= 0 {
        return Err(format!(
            "ordering.position_stride must be positive, got {}",
            config.ordering.position_stride
        ));
    }
    Ok(())
}
