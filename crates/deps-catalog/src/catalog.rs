//! Loading and querying feature definitions

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use deps_core::{Dependency, DependencyKey, compare_versions};

use crate::schema::{CatalogFile, FeatureDefinition};
use crate::{Error, Result};

/// Catalog files larger than this are rejected before parsing.
pub const MAX_CATALOG_SIZE: u64 = 1024 * 1024;

const BUILTIN: &str = include_str!("../builtin.toml");

/// Feature definitions keyed by id.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    features: BTreeMap<String, FeatureDefinition>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The catalog shipped with the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(text).map_err(|e| Error::InvalidCatalog {
            path: None,
            message: e.to_string(),
        })?;
        Self::from_file(file)
    }

    /// Read a catalog from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let io_error = |source| Error::Io {
            path: path.to_path_buf(),
            source,
        };

        let size = fs::metadata(path).map_err(io_error)?.len();
        if size > MAX_CATALOG_SIZE {
            return Err(Error::CatalogTooLarge {
                path: path.to_path_buf(),
                size,
                max: MAX_CATALOG_SIZE,
            });
        }

        let text = fs::read_to_string(path).map_err(io_error)?;
        let file: CatalogFile = toml::from_str(&text).map_err(|e| Error::InvalidCatalog {
            path: Some(path.to_path_buf()),
            message: e.to_string(),
        })?;
        let catalog = Self::from_file(file)?;
        tracing::debug!(path = %path.display(), features = catalog.len(), "Loaded feature catalog");
        Ok(catalog)
    }

    pub fn from_file(file: CatalogFile) -> Result<Self> {
        Self::from_features(file.features)
    }

    pub fn from_features(features: impl IntoIterator<Item = FeatureDefinition>) -> Result<Self> {
        let mut catalog = Self::new();
        for feature in features {
            if catalog.features.contains_key(&feature.id) {
                return Err(Error::DuplicateFeature { id: feature.id });
            }
            catalog.features.insert(feature.id.clone(), feature);
        }
        Ok(catalog)
    }

    /// Add every feature of `other`, replacing definitions with the same id.
    pub fn merge(&mut self, other: Catalog) {
        for (id, feature) in other.features {
            if self.features.insert(id.clone(), feature).is_some() {
                tracing::debug!(%id, "Feature definition overridden");
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&FeatureDefinition> {
        self.features.get(id)
    }

    pub fn feature(&self, id: &str) -> Result<&FeatureDefinition> {
        self.get(id).ok_or_else(|| Error::FeatureNotFound { id: id.to_string() })
    }

    /// Features sorted by id.
    pub fn list(&self) -> impl Iterator<Item = &FeatureDefinition> {
        self.features.values()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Every dependency of `id`, including those of features it includes.
    ///
    /// Included features come first, in declaration order. A package listed
    /// more than once appears once, at its first position, with the highest
    /// minimum version requested.
    pub fn dependencies(&self, id: &str) -> Result<Vec<Dependency>> {
        let mut out: Vec<Dependency> = Vec::new();
        let mut positions: HashMap<DependencyKey, usize> = HashMap::new();
        let mut chain = Vec::new();
        self.collect(id, &mut chain, &mut out, &mut positions)?;
        Ok(out)
    }

    fn collect(
        &self,
        id: &str,
        chain: &mut Vec<String>,
        out: &mut Vec<Dependency>,
        positions: &mut HashMap<DependencyKey, usize>,
    ) -> Result<()> {
        if chain.iter().any(|seen| seen == id) {
            let mut cycle = chain.clone();
            cycle.push(id.to_string());
            return Err(Error::IncludeCycle { chain: cycle });
        }
        let feature = self.feature(id)?;

        chain.push(id.to_string());
        for included in &feature.include {
            self.collect(included, chain, out, positions)?;
        }
        chain.pop();

        for dependency in &feature.dependencies {
            match positions.get(&dependency.key()) {
                Some(&index) => {
                    let existing = &mut out[index];
                    if compare_versions(&dependency.min_version, &existing.min_version)
                        == Ordering::Greater
                    {
                        existing.min_version = dependency.min_version.clone();
                    }
                    existing.update_if_embedded |= dependency.update_if_embedded;
                }
                None => {
                    positions.insert(dependency.key(), out.len());
                    out.push(dependency.clone());
                }
            }
        }
        Ok(())
    }

    /// Check that every include resolves and no include chain loops.
    pub fn validate(&self) -> Result<()> {
        for (id, feature) in &self.features {
            for dependency in &feature.dependencies {
                dependency.validate()?;
            }
            self.dependencies(id)?;
        }
        Ok(())
    }
}
