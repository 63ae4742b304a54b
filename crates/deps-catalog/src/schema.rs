//! On-disk catalog format
//!
//! ```toml
//! [[feature]]
//! id = "import-csv"
//! label = "Preparing Import from CSV"
//! action = "Importing data from CSV"
//! enables = ["import-csv"]
//! include = []
//! dependency = [
//!   { name = "readr", version = "1.1.0" },
//!   { name = "Rcpp", version = "0.11.5" },
//! ]
//!
//! [feature.prompt]
//! title = "Install readr"
//! message = "{action} needs {packages}. Install now?"
//! ```

use deps_core::Dependency;
use serde::{Deserialize, Serialize};

/// A whole catalog file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default, rename = "feature")]
    pub features: Vec<FeatureDefinition>,
}

/// One feature and the packages it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureDefinition {
    pub id: String,

    /// Progress label shown while dependencies are checked
    pub label: String,

    /// Default user action when the caller does not supply one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    #[serde(default)]
    pub silent_embedded_update: bool,

    /// Custom confirmation dialog replacing the default one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<PromptDefinition>,

    /// Capabilities switched on once the feature's packages are present
    #[serde(default)]
    pub enables: Vec<String>,

    /// Other features whose dependencies this one also needs
    #[serde(default)]
    pub include: Vec<String>,

    #[serde(default, rename = "dependency")]
    pub dependencies: Vec<Dependency>,
}

/// Text for a feature-specific confirmation dialog.
///
/// `{action}` and `{packages}` in either field are replaced with the user
/// action and the comma-separated unsatisfied package names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptDefinition {
    pub title: String,
    pub message: String,
}
