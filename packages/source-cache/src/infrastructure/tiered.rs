//! Multi-Tier Cache: fast tier in front of a slow tier
//!
//! - **Write**: write-through to both tiers; a slow-tier failure never
//!   affects the fast tier, which stays authoritative for the process
//! - **Read**: fast tier, then slow tier. A revision the fast tier only
//!   knows as marked existing is looked up in the slow tier first, since the
//!   slow tier may hold the version map from an earlier process
//! - **Read-repair**: slow-tier hits for manifests, package trees and the
//!   full version list are copied into the fast tier before returning
//!
//! Either tier may be a [`super::DiscardCache`], which is how "memory only"
//! and "disk only" configurations are expressed.

use std::sync::Arc;

use prometheus::Registry;

use crate::domain::{
    AnalyzerInfo, Lock, Manifest, PackageTree, PairedVersion, ProjectIdentifier, Revision,
    SingleSourceCache, SourceCache, UnpairedVersion, Version,
};
use crate::metrics::TierMetrics;
use crate::Result;

/// Composition of two source caches
pub struct MultiTierCache {
    fast: Arc<dyn SourceCache>,
    slow: Arc<dyn SourceCache>,
    metrics: Option<Arc<TierMetrics>>,
}

impl MultiTierCache {
    pub fn new(fast: Arc<dyn SourceCache>, slow: Arc<dyn SourceCache>) -> Self {
        Self {
            fast,
            slow,
            metrics: None,
        }
    }

    /// Count tier hits, misses and read-repairs in `registry`
    pub fn with_metrics(mut self, registry: &Registry) -> Result<Self> {
        let metrics = TierMetrics::new(registry).map_err(|e| {
            crate::CacheError::config(format!("cannot register tier metrics: {}", e))
        })?;
        self.metrics = Some(Arc::new(metrics));
        Ok(self)
    }

    pub fn metrics(&self) -> Option<Arc<TierMetrics>> {
        self.metrics.clone()
    }
}

impl SourceCache for MultiTierCache {
    fn new_single_source_cache(&self, id: &ProjectIdentifier) -> Arc<dyn SingleSourceCache> {
        Arc::new(MultiTierSingleSourceCache {
            fast: self.fast.new_single_source_cache(id),
            slow: self.slow.new_single_source_cache(id),
            metrics: self.metrics.clone(),
        })
    }

    fn close(&self) -> Result<()> {
        let fast = self.fast.close();
        let slow = self.slow.close();
        fast.and(slow)
    }
}

/// Per-source view over both tiers
pub struct MultiTierSingleSourceCache {
    fast: Arc<dyn SingleSourceCache>,
    slow: Arc<dyn SingleSourceCache>,
    metrics: Option<Arc<TierMetrics>>,
}

#[derive(Clone, Copy)]
enum Tier {
    Fast,
    Slow,
    Neither,
}

impl MultiTierSingleSourceCache {
    fn record(&self, tier: Tier) {
        if let Some(metrics) = &self.metrics {
            match tier {
                Tier::Fast => metrics.fast_hits.inc(),
                Tier::Slow => metrics.slow_hits.inc(),
                Tier::Neither => metrics.misses.inc(),
            }
        }
    }

    fn record_repair(&self) {
        if let Some(metrics) = &self.metrics {
            metrics.read_repairs.inc();
        }
    }

    /// Fast tier, then slow tier, no repair
    fn lookup<T>(&self, get: impl Fn(&dyn SingleSourceCache) -> Option<T>) -> Option<T> {
        if let Some(found) = get(self.fast.as_ref()) {
            self.record(Tier::Fast);
            return Some(found);
        }
        let found = get(self.slow.as_ref());
        self.record(if found.is_some() { Tier::Slow } else { Tier::Neither });
        found
    }
}

impl SingleSourceCache for MultiTierSingleSourceCache {
    fn set_manifest_and_lock(
        &self,
        rev: &Revision,
        info: &AnalyzerInfo,
        manifest: &Manifest,
        lock: &Lock,
    ) {
        self.fast.set_manifest_and_lock(rev, info, manifest, lock);
        self.slow.set_manifest_and_lock(rev, info, manifest, lock);
    }

    fn get_manifest_and_lock(
        &self,
        rev: &Revision,
        info: &AnalyzerInfo,
    ) -> Option<(Manifest, Lock)> {
        if let Some(found) = self.fast.get_manifest_and_lock(rev, info) {
            self.record(Tier::Fast);
            return Some(found);
        }

        match self.slow.get_manifest_and_lock(rev, info) {
            Some((manifest, lock)) => {
                self.record(Tier::Slow);
                self.fast.set_manifest_and_lock(rev, info, &manifest, &lock);
                self.record_repair();
                Some((manifest, lock))
            }
            None => {
                self.record(Tier::Neither);
                None
            }
        }
    }

    fn set_package_tree(&self, rev: &Revision, tree: &PackageTree) {
        self.fast.set_package_tree(rev, tree);
        self.slow.set_package_tree(rev, tree);
    }

    fn get_package_tree(&self, rev: &Revision, import_root: &str) -> Option<PackageTree> {
        if let Some(tree) = self.fast.get_package_tree(rev, import_root) {
            self.record(Tier::Fast);
            return Some(tree);
        }

        match self.slow.get_package_tree(rev, import_root) {
            Some(tree) => {
                self.record(Tier::Slow);
                self.fast.set_package_tree(rev, &tree);
                self.record_repair();
                Some(tree)
            }
            None => {
                self.record(Tier::Neither);
                None
            }
        }
    }

    fn mark_revision_exists(&self, rev: &Revision) {
        self.fast.mark_revision_exists(rev);
        self.slow.mark_revision_exists(rev);
    }

    fn set_version_map(&self, versions: &[PairedVersion]) {
        self.fast.set_version_map(versions);
        self.slow.set_version_map(versions);
    }

    fn get_all_versions(&self) -> Option<Vec<PairedVersion>> {
        if let Some(versions) = self.fast.get_all_versions() {
            self.record(Tier::Fast);
            return Some(versions);
        }

        match self.slow.get_all_versions() {
            Some(versions) => {
                self.record(Tier::Slow);
                self.fast.set_version_map(&versions);
                self.record_repair();
                Some(versions)
            }
            None => {
                self.record(Tier::Neither);
                None
            }
        }
    }

    fn get_versions_for(&self, rev: &Revision) -> Option<Vec<UnpairedVersion>> {
        let marked = match self.fast.get_versions_for(rev) {
            // An empty answer is only a mark unless the fast tier holds a map
            Some(found) if !found.is_empty() || self.fast.get_all_versions().is_some() => {
                self.record(Tier::Fast);
                return Some(found);
            }
            marked => marked,
        };

        match self.slow.get_versions_for(rev) {
            Some(found) => {
                self.record(Tier::Slow);
                Some(found)
            }
            None if marked.is_some() => {
                self.record(Tier::Fast);
                marked
            }
            None => {
                self.record(Tier::Neither);
                None
            }
        }
    }

    fn get_revision_for(&self, uv: &UnpairedVersion) -> Option<Revision> {
        self.lookup(|tier| tier.get_revision_for(uv))
    }

    fn to_revision(&self, v: &Version) -> Option<Revision> {
        self.lookup(|tier| tier.to_revision(v))
    }

    fn to_unpaired(&self, v: &Version) -> Option<UnpairedVersion> {
        self.lookup(|tier| tier.to_unpaired(v))
    }
}
