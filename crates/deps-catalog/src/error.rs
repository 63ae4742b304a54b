//! Error types for deps-catalog

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Catalog file too large: {path} is {size} bytes (max {max})")]
    CatalogTooLarge { path: PathBuf, size: u64, max: u64 },

    #[error("Invalid catalog{}: {message}", location(.path))]
    InvalidCatalog {
        path: Option<PathBuf>,
        message: String,
    },

    #[error("Feature not found: {id}")]
    FeatureNotFound { id: String },

    #[error("Feature {id} is defined more than once")]
    DuplicateFeature { id: String },

    #[error("Feature includes form a cycle: {}", .chain.join(" -> "))]
    IncludeCycle { chain: Vec<String> },

    #[error(transparent)]
    Core(#[from] deps_core::Error),
}

fn location(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" at {}", p.display()))
        .unwrap_or_default()
}
