//! `deps.toml` loading
//!
//! ```toml
//! [manager]
//! progress_delay_ms = 250
//! cache_policy = "identity"
//!
//! [agent]
//! program = "Rscript"
//! check_args = ["/opt/deps/check.R"]
//! install_args = ["/opt/deps/install.R"]
//!
//! [[feature]]
//! id = "gt"
//! label = "Preparing tables"
//! dependency = [{ name = "gt", version = "0.2.0" }]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use deps_agent::AgentConfig;
use deps_catalog::{Catalog, FeatureDefinition};
use deps_core::ManagerConfig;
use serde::{Deserialize, Serialize};

use crate::error::{CliError, Result};

/// Config files larger than this are rejected before parsing.
pub const MAX_CONFIG_SIZE: u64 = 1024 * 1024;

pub const CONFIG_FILE_NAME: &str = "deps.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepsConfig {
    pub manager: ManagerConfig,
    pub agent: AgentConfig,
    #[serde(rename = "feature")]
    pub features: Vec<FeatureDefinition>,
}

impl DepsConfig {
    /// Load from `explicit` if given, else the first existing default
    /// location. No file at all means defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(CliError::ConfigNotFound {
                    path: path.to_path_buf(),
                });
            }
            return Self::from_path(path);
        }

        match default_locations().into_iter().find(|p| p.is_file()) {
            Some(path) => Self::from_path(&path),
            None => {
                tracing::debug!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let size = fs::metadata(path)?.len();
        if size > MAX_CONFIG_SIZE {
            return Err(CliError::ConfigTooLarge {
                path: path.to_path_buf(),
                size,
                max: MAX_CONFIG_SIZE,
            });
        }

        let text = fs::read_to_string(path)?;
        let config = toml::from_str(&text).map_err(|e| CliError::InvalidConfig {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Builtin features with this file's features layered on top.
    pub fn catalog(&self) -> Result<Catalog> {
        let mut catalog = Catalog::builtin()?;
        catalog.merge(Catalog::from_features(self.features.clone())?);
        catalog.validate()?;
        Ok(catalog)
    }
}

fn default_locations() -> Vec<PathBuf> {
    let mut locations = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(dir) = dirs::config_dir() {
        locations.push(dir.join("deps").join(CONFIG_FILE_NAME));
    }
    locations
}
