//! Dependency descriptors exchanged with the resolution service
//!
//! A [`Dependency`] names a package and the minimum version a feature needs.
//! Responses from the service annotate the same type with the best version
//! the package source can offer.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Where a package comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    /// Fetched from a public package repository
    #[default]
    #[serde(alias = "cran")]
    Remote,
    /// Bundled with the host application
    Embedded,
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyKind::Remote => write!(f, "remote"),
            DependencyKind::Embedded => write!(f, "embedded"),
        }
    }
}

/// Identity of a dependency: `(name, kind)`.
///
/// The minimum version is deliberately not part of the identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DependencyKey {
    pub name: String,
    pub kind: DependencyKind,
}

/// A required package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,

    #[serde(default)]
    pub kind: DependencyKind,

    /// Minimum acceptable version; empty means any version
    #[serde(default, rename = "version")]
    pub min_version: String,

    /// Allow the service to silently upgrade an embedded package
    #[serde(default)]
    pub update_if_embedded: bool,

    /// Best version the package source can offer (service responses only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_version: Option<String>,

    /// Whether `available_version` meets `min_version` (service responses only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_satisfied: Option<bool>,
}

impl Dependency {
    /// A package from the public repository.
    pub fn remote(name: impl Into<String>, min_version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: DependencyKind::Remote,
            min_version: min_version.into(),
            update_if_embedded: false,
            available_version: None,
            version_satisfied: None,
        }
    }

    /// A package shipped with the host application.
    pub fn embedded(
        name: impl Into<String>,
        min_version: impl Into<String>,
        update_if_embedded: bool,
    ) -> Self {
        Self {
            kind: DependencyKind::Embedded,
            update_if_embedded,
            ..Self::remote(name, min_version)
        }
    }

    /// Annotate with what the package source can offer.
    pub fn with_available(mut self, version: Option<&str>, satisfied: bool) -> Self {
        self.available_version = version.map(String::from);
        self.version_satisfied = Some(satisfied);
        self
    }

    pub fn key(&self) -> DependencyKey {
        DependencyKey {
            name: self.name.clone(),
            kind: self.kind,
        }
    }

    /// Same package, regardless of version requirement or annotations.
    pub fn is_same_package(&self, other: &Dependency) -> bool {
        self.name == other.name && self.kind == other.kind
    }

    pub fn has_min_version(&self) -> bool {
        !self.min_version.trim().is_empty()
    }

    /// True when the service reported that no acceptable version exists.
    pub fn is_version_conflict(&self) -> bool {
        self.version_satisfied == Some(false)
    }

    /// Reject dependencies no agent could act on.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid_dependency("package name is empty"));
        }
        if self.name.chars().any(char::is_whitespace) {
            return Err(Error::invalid_dependency(format!(
                "package name '{}' contains whitespace",
                self.name
            )));
        }
        Ok(())
    }

    /// Whether `version` meets this dependency's minimum.
    pub fn accepts(&self, version: &str) -> bool {
        !self.has_min_version() || compare_versions(version, &self.min_version) != Ordering::Less
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_min_version() {
            write!(f, "{} (>= {})", self.name, self.min_version)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// Compare two package version strings.
///
/// Components are split on `.` and `-`; numeric components compare
/// numerically, anything else lexically. Missing trailing components count
/// as zero, so `1.2` equals `1.2.0`.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let left: Vec<&str> = split_version(a);
    let right: Vec<&str> = split_version(b);
    let len = left.len().max(right.len());

    for i in 0..len {
        let l = left.get(i).copied().unwrap_or("0");
        let r = right.get(i).copied().unwrap_or("0");
        let ord = match (l.parse::<u64>(), r.parse::<u64>()) {
            (Ok(l), Ok(r)) => l.cmp(&r),
            _ => l.cmp(r),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }

    Ordering::Equal
}

fn split_version(version: &str) -> Vec<&str> {
    version
        .trim()
        .split(['.', '-'])
        .filter(|part| !part.is_empty())
        .collect()
}
