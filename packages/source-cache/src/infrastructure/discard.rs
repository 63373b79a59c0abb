//! Discard Source Cache
//!
//! Accepts every write and drops it; every read misses. Lets callers written
//! against the cache contract run with caching disabled, and expresses
//! "memory only" / "disk only" tier compositions.

use std::sync::Arc;

use crate::domain::{
    AnalyzerInfo, Lock, Manifest, PackageTree, PairedVersion, ProjectIdentifier, Revision,
    SingleSourceCache, SourceCache, UnpairedVersion, Version,
};
use crate::Result;

#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardCache;

impl SourceCache for DiscardCache {
    fn new_single_source_cache(&self, _id: &ProjectIdentifier) -> Arc<dyn SingleSourceCache> {
        Arc::new(DiscardSingleSourceCache)
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSingleSourceCache;

impl SingleSourceCache for DiscardSingleSourceCache {
    fn set_manifest_and_lock(&self, _: &Revision, _: &AnalyzerInfo, _: &Manifest, _: &Lock) {}

    fn get_manifest_and_lock(&self, _: &Revision, _: &AnalyzerInfo) -> Option<(Manifest, Lock)> {
        None
    }

    fn set_package_tree(&self, _: &Revision, _: &PackageTree) {}

    fn get_package_tree(&self, _: &Revision, _: &str) -> Option<PackageTree> {
        None
    }

    fn mark_revision_exists(&self, _: &Revision) {}

    fn set_version_map(&self, _: &[PairedVersion]) {}

    fn get_all_versions(&self) -> Option<Vec<PairedVersion>> {
        None
    }

    fn get_versions_for(&self, _: &Revision) -> Option<Vec<UnpairedVersion>> {
        None
    }

    fn get_revision_for(&self, _: &UnpairedVersion) -> Option<Revision> {
        None
    }

    // Even self-describing versions miss here
    fn to_revision(&self, _: &Version) -> Option<Revision> {
        None
    }

    fn to_unpaired(&self, _: &Version) -> Option<UnpairedVersion> {
        None
    }
}
