//! Shared fixtures for source cache integration tests

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use source_cache::domain::{
    AnalyzerInfo, Constraint, Lock, LockedProject, Manifest, Package, PackageTree,
    ProjectIdentifier, ProjectProperties, Revision, SingleSourceCache, SourceCache,
    UnpairedVersion,
};
use source_cache::infrastructure::{DiscardCache, MemoryCache, MultiTierCache, PersistentCache};
use tempfile::TempDir;

pub const ROOT: &str = "example.com/test";

/// Epoch shared by every persistent cache in one test run
pub const EPOCH: i64 = 1_700_000_000;

pub type CacheFactory = fn(&Path) -> Arc<dyn SourceCache>;

pub fn test_id() -> ProjectIdentifier {
    ProjectIdentifier::new(ROOT).normalize()
}

pub fn analyzer() -> AnalyzerInfo {
    AnalyzerInfo::new("test-analyzer", 1)
}

pub fn persistent(dir: &Path) -> Arc<dyn SourceCache> {
    Arc::new(PersistentCache::open(dir, EPOCH, tracing::Span::none()).unwrap())
}

pub fn memory(_: &Path) -> Arc<dyn SourceCache> {
    Arc::new(MemoryCache::new())
}

pub fn tiered(dir: &Path) -> Arc<dyn SourceCache> {
    Arc::new(MultiTierCache::new(Arc::new(MemoryCache::new()), persistent(dir)))
}

pub fn tiered_no_disk(_: &Path) -> Arc<dyn SourceCache> {
    Arc::new(MultiTierCache::new(
        Arc::new(MemoryCache::new()),
        Arc::new(DiscardCache),
    ))
}

pub fn tiered_no_mem(dir: &Path) -> Arc<dyn SourceCache> {
    Arc::new(MultiTierCache::new(Arc::new(DiscardCache), persistent(dir)))
}

/// Cache under test plus the view of [`test_id`]
///
/// For persistent harnesses [`Harness::reopen`] closes the cache and opens a
/// new one on the same directory; otherwise it does nothing.
pub struct Harness {
    factory: CacheFactory,
    persistent: bool,
    dir: TempDir,
    pub cache: Arc<dyn SourceCache>,
    pub sc: Arc<dyn SingleSourceCache>,
}

impl Harness {
    pub fn new(factory: CacheFactory, persistent: bool) -> Self {
        let dir = TempDir::new().unwrap();
        let cache = factory(dir.path());
        let sc = cache.new_single_source_cache(&test_id());
        Self {
            factory,
            persistent,
            dir,
            cache,
            sc,
        }
    }

    pub fn reopen(&mut self) {
        if !self.persistent {
            return;
        }
        self.cache.close().unwrap();
        self.cache = (self.factory)(self.dir.path());
        self.sc = self.cache.new_single_source_cache(&test_id());
    }

    pub fn close(self) {
        self.cache.close().unwrap();
    }
}

pub fn first_manifest() -> (Manifest, Lock) {
    let manifest = Manifest::new()
        .constraint("foo", ProjectProperties::new(Constraint::Any))
        .constraint(
            "bar",
            ProjectProperties::with_source(Constraint::semver(">1.3").unwrap(), "whatever"),
        )
        .override_constraint(
            "b",
            ProjectProperties::new(Constraint::semver("=2.0.0").unwrap()),
        )
        .require(["c", "d"])
        .ignore(["a", "b"]);

    let v0_10 = || UnpairedVersion::tag("v0.10.0");
    let lock = Lock::new(vec![
        LockedProject::new(
            ProjectIdentifier::new("github.com/sdboyer/gps"),
            v0_10().pair("anything"),
            ["gps"],
        ),
        LockedProject::new(
            ProjectIdentifier::new("github.com/sdboyer/gps2"),
            v0_10().pair("whatever"),
            Vec::<String>::new(),
        ),
        LockedProject::new(
            ProjectIdentifier::new("github.com/sdboyer/gps3"),
            v0_10().pair("again"),
            ["gps", "flugle"],
        ),
        LockedProject::new(
            ProjectIdentifier::new("foo"),
            UnpairedVersion::tag("nada").pair("itsaliving"),
            ["foo"],
        ),
        LockedProject::new(
            ProjectIdentifier::new("github.com/sdboyer/gps4"),
            v0_10().pair("meow"),
            ["flugle", "gps"],
        ),
    ]);

    (manifest, lock)
}

pub fn second_manifest() -> (Manifest, Lock) {
    let manifest = Manifest::new()
        .constraint(
            "foo",
            ProjectProperties::with_source(Constraint::Any, "whatever"),
        )
        .override_constraint(
            "bar",
            ProjectProperties::new(Constraint::semver("=2.0.0").unwrap()),
        )
        .require(["a", "b"])
        .ignore(["c", "d"]);

    let lock = Lock::new(vec![
        LockedProject::new(
            ProjectIdentifier::new("github.com/sdboyer/gps"),
            UnpairedVersion::tag("v0.10.0").pair("278a227dfc3d595a33a77ff3f841fd8ca1bc8cd0"),
            ["gps"],
        ),
        LockedProject::new(
            ProjectIdentifier::new("github.com/sdboyer/gps2"),
            UnpairedVersion::tag("v0.11.0").pair("anything"),
            ["gps"],
        ),
        LockedProject::new(
            ProjectIdentifier::new("github.com/sdboyer/gps3"),
            Revision::new("278a227dfc3d595a33a77ff3f841fd8ca1bc8cd0"),
            ["gps"],
        ),
    ]);

    (manifest, lock)
}

pub fn full_tree() -> PackageTree {
    PackageTree::new(ROOT)
        .with_package(Package {
            name: "test".into(),
            import_path: ROOT.into(),
            comment_path: "comment".into(),
            imports: vec!["sort".into()],
            test_imports: vec![],
        })
        .with_package(Package {
            name: "simple".into(),
            import_path: format!("{}/simple", ROOT),
            comment_path: "comment".into(),
            imports: vec!["github.com/golang/dep/gps".into(), "sort".into()],
            test_imports: vec![],
        })
        .with_package(Package {
            name: "m1p".into(),
            import_path: format!("{}/m1p", ROOT),
            comment_path: String::new(),
            imports: vec![
                "github.com/golang/dep/gps".into(),
                "os".into(),
                "sort".into(),
            ],
            test_imports: vec![],
        })
}

pub fn error_tree() -> PackageTree {
    PackageTree::new(ROOT).with_error(format!("{}/test", ROOT), "error")
}
