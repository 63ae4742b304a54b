//! Manager configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::CachePolicy;

/// Tunables for [`DependencyManager`](crate::DependencyManager).
///
/// # Example TOML
///
/// ```toml
/// progress_delay_ms = 250
/// cache_policy = "identity"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// How long a remote check may run before its progress label is shown
    pub progress_delay_ms: u64,
    /// How the satisfied cache decides hits
    pub cache_policy: CachePolicy,
}

impl ManagerConfig {
    pub fn progress_delay(&self) -> Duration {
        Duration::from_millis(self.progress_delay_ms)
    }

    pub fn with_cache_policy(mut self, policy: CachePolicy) -> Self {
        self.cache_policy = policy;
        self
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            progress_delay_ms: 250,
            cache_policy: CachePolicy::Identity,
        }
    }
}
