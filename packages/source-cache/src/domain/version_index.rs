//! Bidirectional Revision ↔ UnpairedVersion index for one source

use std::collections::{HashMap, HashSet};

use super::version::{PairedVersion, Revision, UnpairedVersion};

/// Version index of one source
///
/// A revision may carry many versions (a branch and a tag on the same
/// commit); a version points at exactly one revision. The list handed to
/// [`VersionIndex::replace`] is the source of truth and discards everything
/// previously known, including revisions recorded through
/// [`VersionIndex::mark_revision`].
#[derive(Debug, Clone, Default)]
pub struct VersionIndex {
    /// Paired list in caller order; `None` until a map has been set
    list: Option<Vec<PairedVersion>>,
    by_version: HashMap<UnpairedVersion, Revision>,
    by_revision: HashMap<Revision, Vec<UnpairedVersion>>,
}

impl VersionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_paired(versions: &[PairedVersion]) -> Self {
        let mut index = Self::new();
        index.replace(versions);
        index
    }

    /// Replace the whole index with `versions`
    ///
    /// If a version appears more than once, its last pairing wins.
    pub fn replace(&mut self, versions: &[PairedVersion]) {
        let mut by_version: HashMap<UnpairedVersion, Revision> = HashMap::new();
        for pv in versions {
            by_version.insert(pv.version.clone(), pv.revision.clone());
        }

        let mut seen = HashSet::new();
        let list: Vec<PairedVersion> = versions
            .iter()
            .filter(|pv| by_version.get(&pv.version) == Some(&pv.revision))
            .filter(|pv| seen.insert(pv.version.clone()))
            .cloned()
            .collect();

        let mut by_revision: HashMap<Revision, Vec<UnpairedVersion>> = HashMap::new();
        for pv in &list {
            by_revision
                .entry(pv.revision.clone())
                .or_default()
                .push(pv.version.clone());
        }

        self.list = Some(list);
        self.by_version = by_version;
        self.by_revision = by_revision;
    }

    /// Record that `rev` exists, without attaching any version to it
    pub fn mark_revision(&mut self, rev: &Revision) {
        self.by_revision.entry(rev.clone()).or_default();
    }

    /// Whether a version map has ever been set
    pub fn is_set(&self) -> bool {
        self.list.is_some()
    }

    pub fn all(&self) -> Option<Vec<PairedVersion>> {
        self.list.clone()
    }

    /// Every version mapped to `rev`
    ///
    /// A revision that was only marked as existing yields `Some(vec![])`.
    pub fn versions_for(&self, rev: &Revision) -> Option<Vec<UnpairedVersion>> {
        self.by_revision.get(rev).cloned()
    }

    pub fn revision_for(&self, uv: &UnpairedVersion) -> Option<Revision> {
        self.by_version.get(uv).cloned()
    }

    /// First version mapped to `rev`, in stored order
    pub fn first_version_for(&self, rev: &Revision) -> Option<UnpairedVersion> {
        self.by_revision.get(rev).and_then(|uvs| uvs.first().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_index_misses() {
        let index = VersionIndex::new();
        assert!(!index.is_set());
        assert!(index.all().is_none());
        assert!(index.versions_for(&Revision::new("abc123")).is_none());
        assert!(index.revision_for(&UnpairedVersion::branch("main")).is_none());
    }

    #[test]
    fn test_bidirectional_lookup() {
        let index = VersionIndex::from_paired(&[
            UnpairedVersion::branch("main").pair("abc123"),
            UnpairedVersion::tag("1.0").pair("def456"),
        ]);

        assert_eq!(
            index.revision_for(&UnpairedVersion::branch("main")),
            Some(Revision::new("abc123"))
        );
        assert_eq!(
            index.versions_for(&Revision::new("def456")),
            Some(vec![UnpairedVersion::tag("1.0")])
        );
    }

    #[test]
    fn test_aliases_retained() {
        let index = VersionIndex::from_paired(&[
            UnpairedVersion::branch("main").pair("abc123"),
            UnpairedVersion::tag("v1.0.0").pair("abc123"),
        ]);

        let uvs = index.versions_for(&Revision::new("abc123")).unwrap();
        assert_eq!(uvs.len(), 2);
        assert_eq!(
            index.first_version_for(&Revision::new("abc123")),
            Some(UnpairedVersion::branch("main"))
        );
    }

    #[test]
    fn test_last_pairing_wins() {
        let index = VersionIndex::from_paired(&[
            UnpairedVersion::branch("main").pair("old"),
            UnpairedVersion::branch("main").pair("new"),
        ]);

        assert_eq!(
            index.revision_for(&UnpairedVersion::branch("main")),
            Some(Revision::new("new"))
        );
        assert!(index.versions_for(&Revision::new("old")).is_none());
        assert_eq!(index.all().unwrap().len(), 1);
    }

    #[test]
    fn test_replace_discards_previous_state() {
        let mut index = VersionIndex::from_paired(&[UnpairedVersion::branch("main").pair("abc123")]);
        index.mark_revision(&Revision::new("marked"));
        index.replace(&[UnpairedVersion::tag("2.0").pair("fff")]);

        assert!(index.revision_for(&UnpairedVersion::branch("main")).is_none());
        assert!(index.versions_for(&Revision::new("marked")).is_none());
        assert_eq!(index.all().unwrap(), vec![UnpairedVersion::tag("2.0").pair("fff")]);
    }

    #[test]
    fn test_marked_revision_has_no_versions() {
        let mut index = VersionIndex::new();
        index.mark_revision(&Revision::new("abc123"));

        assert_eq!(index.versions_for(&Revision::new("abc123")), Some(vec![]));
        assert!(index.first_version_for(&Revision::new("abc123")).is_none());
        assert!(!index.is_set());
    }

    #[test]
    fn test_empty_map_is_set() {
        let index = VersionIndex::from_paired(&[]);
        assert!(index.is_set());
        assert_eq!(index.all(), Some(vec![]));
    }
}
