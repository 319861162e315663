use std::fs;
use std::path::{Path, PathBuf};

use crate::model::action::Action;

/// Error type for reading an action file
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Load a JSON array of actions
pub fn load_actions(path: &Path) -> Result<Vec<Action>, LoadError> {
    let text = fs::read_to_string(path).map_err(|e| LoadError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let actions: Vec<Action> = serde_json::from_str(&text).map_err(|e| LoadError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    tracing::debug!(path = %path.display(), count = actions.len(), "loaded actions");
    Ok(actions)
}
