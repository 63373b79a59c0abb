//! Domain layer for source-cache
//!
//! # Domain Models
//!
//! - `Revision`, `UnpairedVersion`, `PairedVersion`, `Version`: points in a
//!   source's history
//! - `ProjectIdentifier`, `AnalyzerInfo`: cache partition and invalidation keys
//! - `Manifest`, `Lock`, `PackageTree`: values produced by analysis
//! - `VersionIndex`: bidirectional revision/version index
//!
//! # Port Traits
//!
//! - `SourceCache`: factory of per-source views
//! - `SingleSourceCache`: get/set operations for one source
//!
//! # Examples
//!
//! ```rust
//! use source_cache::domain::{ProjectIdentifier, SourceCache, UnpairedVersion, Revision};
//! use source_cache::infrastructure::MemoryCache;
//!
//! let cache = MemoryCache::new();
//! let sc = cache.new_single_source_cache(&ProjectIdentifier::new("example.com/test"));
//!
//! sc.set_version_map(&[
//!     UnpairedVersion::branch("main").pair("abc123"),
//!     UnpairedVersion::tag("1.0").pair("def456"),
//! ]);
//!
//! assert_eq!(
//!     sc.get_revision_for(&UnpairedVersion::branch("main")),
//!     Some(Revision::new("abc123"))
//! );
//! assert_eq!(
//!     sc.get_versions_for(&Revision::new("def456")),
//!     Some(vec![UnpairedVersion::tag("1.0")])
//! );
//! ```

mod manifest;
mod pkgtree;
mod ports;
mod project;
mod version;
mod version_index;

pub use manifest::{Constraint, Lock, LockedProject, Manifest, ProjectConstraints, ProjectProperties};
pub use pkgtree::{Package, PackageOrErr, PackageTree};
pub use ports::{SingleSourceCache, SourceCache};
pub use project::{AnalyzerInfo, ProjectIdentifier, ProjectRoot};
pub use version::{
    compare_for_downgrade, compare_for_upgrade, sort_paired_for_downgrade,
    sort_paired_for_upgrade, PairedVersion, Revision, UnpairedVersion, Version, VersionType,
};
pub use version_index::VersionIndex;
