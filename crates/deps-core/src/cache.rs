//! Process-wide cache of dependencies known to be satisfied
//!
//! Entries are only ever added after the resolution service confirms them,
//! and are never removed individually: [`SatisfiedCache::clear`] drops
//! everything whenever the installed package set may have changed.
//!
//! Every clear bumps a generation counter. Answers obtained before a clear
//! describe a package set that no longer exists, so writers pass the
//! generation they started from and are ignored once it has moved on.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::dependency::{Dependency, DependencyKey, compare_versions};

/// How cache hits are decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CachePolicy {
    /// A cached `(name, kind)` satisfies any later request for that package,
    /// whatever minimum version it asks for.
    #[default]
    Identity,
    /// A cached package satisfies a request only if the request's minimum
    /// version is not higher than the highest minimum already verified.
    Versioned,
}

/// Result of filtering a request's dependencies against the cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub already_satisfied: Vec<Dependency>,
    pub to_check: Vec<Dependency>,
    /// Cache generation the partition was taken in
    pub generation: u64,
}

impl Partition {
    /// Nothing left to ask the service about.
    pub fn is_fully_cached(&self) -> bool {
        self.to_check.is_empty()
    }
}

#[derive(Debug, Default)]
struct Entries {
    /// Identity -> highest minimum version verified for it
    verified: HashMap<DependencyKey, String>,
    generation: u64,
}

/// Set of dependency identities confirmed as satisfied.
#[derive(Debug, Default)]
pub struct SatisfiedCache {
    policy: CachePolicy,
    entries: Mutex<Entries>,
}

impl SatisfiedCache {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            entries: Mutex::new(Entries::default()),
        }
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of clears so far.
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    pub fn contains(&self, dependency: &Dependency) -> bool {
        let entries = self.lock();
        Self::hit(self.policy, &entries.verified, dependency)
    }

    fn hit(
        policy: CachePolicy,
        entries: &HashMap<DependencyKey, String>,
        dependency: &Dependency,
    ) -> bool {
        let Some(verified) = entries.get(&dependency.key()) else {
            return false;
        };
        match policy {
            CachePolicy::Identity => true,
            CachePolicy::Versioned => {
                !dependency.has_min_version()
                    || compare_versions(&dependency.min_version, verified) != Ordering::Greater
            }
        }
    }

    /// Split `dependencies` into cached and still-to-check, preserving order.
    pub fn partition(&self, dependencies: &[Dependency]) -> Partition {
        let entries = self.lock();
        let mut partition = Partition {
            generation: entries.generation,
            ..Partition::default()
        };
        for dependency in dependencies {
            if Self::hit(self.policy, &entries.verified, dependency) {
                partition.already_satisfied.push(dependency.clone());
            } else {
                partition.to_check.push(dependency.clone());
            }
        }
        partition
    }

    pub fn insert(&self, dependency: &Dependency) {
        let mut entries = self.lock();
        Self::insert_locked(&mut entries.verified, dependency);
    }

    pub fn insert_all<'a>(&self, dependencies: impl IntoIterator<Item = &'a Dependency>) {
        let mut entries = self.lock();
        for dependency in dependencies {
            Self::insert_locked(&mut entries.verified, dependency);
        }
    }

    /// Add `dependencies` if the cache has not been cleared since
    /// `generation`. Returns whether anything was written.
    pub fn insert_verified<'a>(
        &self,
        generation: u64,
        dependencies: impl IntoIterator<Item = &'a Dependency>,
    ) -> bool {
        let mut entries = self.lock();
        if entries.generation != generation {
            tracing::debug!(
                generation,
                current = entries.generation,
                "Cache cleared during check; not recording"
            );
            return false;
        }
        for dependency in dependencies {
            Self::insert_locked(&mut entries.verified, dependency);
        }
        true
    }

    fn insert_locked(entries: &mut HashMap<DependencyKey, String>, dependency: &Dependency) {
        let verified = entries.entry(dependency.key()).or_default();
        if compare_versions(&dependency.min_version, verified) == Ordering::Greater {
            *verified = dependency.min_version.clone();
        }
    }

    /// Add every entry of `checked` that does not appear in `unsatisfied`,
    /// unless the cache was cleared since `generation`.
    pub fn record_checked(
        &self,
        generation: u64,
        checked: &[Dependency],
        unsatisfied: &[Dependency],
    ) -> bool {
        let satisfied = checked
            .iter()
            .filter(|dependency| !unsatisfied.iter().any(|u| u.is_same_package(dependency)));
        self.insert_verified(generation, satisfied)
    }

    /// Forget everything.
    pub fn clear(&self) {
        let mut entries = self.lock();
        if !entries.verified.is_empty() {
            tracing::debug!(
                count = entries.verified.len(),
                "Clearing satisfied dependency cache"
            );
        }
        entries.verified.clear();
        entries.generation += 1;
    }

    pub fn len(&self) -> usize {
        self.lock().verified.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().verified.is_empty()
    }
}
