//! Declarative feature catalog for deps.
//!
//! Features name the packages a piece of host functionality needs. The
//! [`FeatureGate`] resolves them through a [`deps_core::DependencyManager`]
//! and records which capabilities became available.

pub mod capabilities;
pub mod catalog;
pub mod error;
pub mod gate;
pub mod prompt;
pub mod schema;

pub use capabilities::Capabilities;
pub use catalog::{Catalog, MAX_CATALOG_SIZE};
pub use error::{Error, Result};
pub use gate::FeatureGate;
pub use prompt::TemplatePrompt;
pub use schema::{CatalogFile, FeatureDefinition, PromptDefinition};
