//! Cache Ports (Trait Interface)
//!
//! Port/Adapter pattern for backend flexibility:
//! - Memory: process-lifetime cache, also the fast tier
//! - SQLite: persistent cache shared across processes
//! - Discard: caching disabled
//! - MultiTier: any two of the above composed as fast + slow tiers
//!
//! Lookups never fail: a miss is `None`. Writes are best-effort and never
//! return errors; only construction and [`SourceCache::close`] do.

use std::sync::Arc;

use super::manifest::{Lock, Manifest};
use super::pkgtree::PackageTree;
use super::project::{AnalyzerInfo, ProjectIdentifier};
use super::version::{PairedVersion, Revision, UnpairedVersion, Version};
use crate::Result;

/// Cache of one source's metadata
///
/// All records are partitioned by the [`ProjectIdentifier`] the view was
/// created for.
pub trait SingleSourceCache: Send + Sync {
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Manifest & Lock
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Store the manifest and lock found at `rev` by analyzer `info` (UPSERT)
    fn set_manifest_and_lock(
        &self,
        rev: &Revision,
        info: &AnalyzerInfo,
        manifest: &Manifest,
        lock: &Lock,
    );

    /// Manifest and lock stored under exactly `(rev, info)`
    fn get_manifest_and_lock(&self, rev: &Revision, info: &AnalyzerInfo)
        -> Option<(Manifest, Lock)>;

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Package Trees
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Store the package tree of `rev`, replacing any previous one
    fn set_package_tree(&self, rev: &Revision, tree: &PackageTree);

    /// Package tree of `rev`, re-rooted onto `import_root`
    fn get_package_tree(&self, rev: &Revision, import_root: &str) -> Option<PackageTree>;

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Version Index
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Record that `rev` exists even though nothing else is cached for it
    fn mark_revision_exists(&self, rev: &Revision);

    /// Replace the whole version index with `versions`
    fn set_version_map(&self, versions: &[PairedVersion]);

    /// Snapshot of the version list; `None` if no map was ever set
    fn get_all_versions(&self) -> Option<Vec<PairedVersion>>;

    /// Every version currently mapped to `rev`
    fn get_versions_for(&self, rev: &Revision) -> Option<Vec<UnpairedVersion>>;

    /// Revision `uv` currently points at
    fn get_revision_for(&self, uv: &UnpairedVersion) -> Option<Revision>;

    /// Resolve any version to a revision
    fn to_revision(&self, v: &Version) -> Option<Revision> {
        match v {
            Version::Revision(rev) => Some(rev.clone()),
            Version::Paired(pv) => Some(pv.revision.clone()),
            Version::Unpaired(uv) => self.get_revision_for(uv),
        }
    }

    /// Resolve any version to an unpaired version
    ///
    /// A bare revision resolves to the first version mapped to it.
    fn to_unpaired(&self, v: &Version) -> Option<UnpairedVersion> {
        match v {
            Version::Unpaired(uv) => Some(uv.clone()),
            Version::Paired(pv) => Some(pv.version.clone()),
            Version::Revision(rev) => self
                .get_versions_for(rev)
                .and_then(|uvs| uvs.into_iter().next()),
        }
    }
}

/// Factory of per-source cache views
pub trait SourceCache: Send + Sync {
    /// View of the records belonging to `id`
    fn new_single_source_cache(&self, id: &ProjectIdentifier) -> Arc<dyn SingleSourceCache>;

    /// Flush and release underlying resources
    ///
    /// Call once every view is done; the cache is unusable afterwards even
    /// when an error is returned.
    fn close(&self) -> Result<()>;
}
