//! Engine configuration: numerical tunables that are not part of the
//! conservation semantics themselves.

use crate::numerics::IntegrationTolerance;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub integration: IntegrationTolerance,
}

#[derive(Debug, thiserror::Error)]
pub enum EngineConfigError {
    #[error("failed to read engine config '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse engine config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub fn load_engine_config(path: impl AsRef<Path>) -> Result<EngineConfig, EngineConfigError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|source| EngineConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&source).map_err(|source| EngineConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
