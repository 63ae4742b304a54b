use std::collections::BTreeSet;
use std::sync::RwLock;

/// Names of host features whose packages are known to be installed.
///
/// A capability is switched on after its feature resolves successfully and
/// stays on until [`Capabilities::reset`].
#[derive(Debug, Default)]
pub struct Capabilities {
    enabled: RwLock<BTreeSet<String>>,
}

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enable<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut enabled = self.enabled.write().unwrap_or_else(|e| e.into_inner());
        for name in names {
            let name = name.into();
            if enabled.insert(name.clone()) {
                tracing::info!(capability = %name, "Capability enabled");
            }
        }
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.enabled
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(name)
    }

    /// Enabled capabilities, sorted.
    pub fn snapshot(&self) -> Vec<String> {
        self.enabled
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    pub fn reset(&self) {
        self.enabled
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}
