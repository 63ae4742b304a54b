//! How to invoke the agent program

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Agent invocation settings, the `[agent]` table of `deps.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Program to run
    pub program: String,
    /// Arguments for a check; the request arrives as JSON on stdin
    pub check_args: Vec<String>,
    /// Arguments for an install; package names are appended
    pub install_args: Vec<String>,
    /// Extra environment for both commands
    pub env: BTreeMap<String, String>,
    pub working_dir: Option<PathBuf>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            program: "deps-agent".to_string(),
            check_args: vec!["check".to_string()],
            install_args: vec!["install".to_string()],
            env: BTreeMap::new(),
            working_dir: None,
        }
    }
}

impl AgentConfig {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    pub fn check_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.check_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn install_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.install_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}
