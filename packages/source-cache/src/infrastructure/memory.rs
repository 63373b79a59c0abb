//! In-Memory Source Cache
//!
//! Process-lifetime cache. Used standalone when persistence is unwanted and
//! as the fast tier of a [`super::MultiTierCache`].

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;

use crate::domain::{
    AnalyzerInfo, Lock, Manifest, PackageTree, PairedVersion, ProjectIdentifier, Revision,
    SingleSourceCache, SourceCache, UnpairedVersion, VersionIndex,
};
use crate::Result;

/// Factory of in-memory views, one per project identifier
///
/// Views are created on first request and shared by later requests for the
/// same identifier.
#[derive(Default)]
pub struct MemoryCache {
    sources: DashMap<ProjectIdentifier, Arc<MemorySingleSourceCache>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sources with a live view
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl SourceCache for MemoryCache {
    fn new_single_source_cache(&self, id: &ProjectIdentifier) -> Arc<dyn SingleSourceCache> {
        self.sources
            .entry(id.clone())
            .or_insert_with(|| {
                tracing::debug!(project = %id, "creating in-memory source cache");
                Arc::new(MemorySingleSourceCache::new(id.clone()))
            })
            .value()
            .clone()
    }

    fn close(&self) -> Result<()> {
        self.sources.clear();
        Ok(())
    }
}

#[derive(Default)]
struct Records {
    infos: HashMap<AnalyzerInfo, HashMap<Revision, (Manifest, Lock)>>,
    trees: HashMap<Revision, PackageTree>,
    index: VersionIndex,
}

/// In-memory records of one source
pub struct MemorySingleSourceCache {
    id: ProjectIdentifier,
    records: RwLock<Records>,
}

impl MemorySingleSourceCache {
    pub fn new(id: ProjectIdentifier) -> Self {
        Self {
            id,
            records: RwLock::new(Records::default()),
        }
    }

    pub fn project(&self) -> &ProjectIdentifier {
        &self.id
    }
}

impl SingleSourceCache for MemorySingleSourceCache {
    fn set_manifest_and_lock(
        &self,
        rev: &Revision,
        info: &AnalyzerInfo,
        manifest: &Manifest,
        lock: &Lock,
    ) {
        let mut records = self.records.write();
        records
            .infos
            .entry(info.clone())
            .or_default()
            .insert(rev.clone(), (manifest.clone(), lock.clone()));
        records.index.mark_revision(rev);
    }

    fn get_manifest_and_lock(
        &self,
        rev: &Revision,
        info: &AnalyzerInfo,
    ) -> Option<(Manifest, Lock)> {
        self.records
            .read()
            .infos
            .get(info)
            .and_then(|by_rev| by_rev.get(rev))
            .cloned()
    }

    fn set_package_tree(&self, rev: &Revision, tree: &PackageTree) {
        let mut records = self.records.write();
        records.trees.insert(rev.clone(), tree.clone());
        records.index.mark_revision(rev);
    }

    fn get_package_tree(&self, rev: &Revision, import_root: &str) -> Option<PackageTree> {
        let tree = self.records.read().trees.get(rev).cloned()?;
        Some(tree.rerooted(import_root))
    }

    fn mark_revision_exists(&self, rev: &Revision) {
        self.records.write().index.mark_revision(rev);
    }

    fn set_version_map(&self, versions: &[PairedVersion]) {
        self.records.write().index.replace(versions);
    }

    fn get_all_versions(&self) -> Option<Vec<PairedVersion>> {
        self.records.read().index.all()
    }

    fn get_versions_for(&self, rev: &Revision) -> Option<Vec<UnpairedVersion>> {
        self.records.read().index.versions_for(rev)
    }

    fn get_revision_for(&self, uv: &UnpairedVersion) -> Option<Revision> {
        self.records.read().index.revision_for(uv)
    }
}
