//! source-cache: tiered metadata cache for dependency-resolution sources
//!
//! A resolver asks the same questions of every source over and over: which
//! versions exist, which revision a branch points at, what manifest and lock
//! a revision declares, which packages it contains. Answering them means
//! talking to a VCS or analyzing a checkout. This crate remembers the
//! answers.
//!
//! ## Layers
//!
//! - [`domain`]: versions, manifests, package trees and the
//!   `SourceCache` / `SingleSourceCache` port traits
//! - [`infrastructure`]: memory, SQLite, multi-tier and discard backends
//! - [`config`]: picks and opens a backend composition
//! - [`metrics`]: Prometheus counters for tier hits and read-repairs
//!
//! ## Usage
//!
//! ```rust
//! use source_cache::config::CacheConfig;
//! use source_cache::domain::{ProjectIdentifier, Revision, UnpairedVersion, Version};
//!
//! let cache = CacheConfig::memory().open().unwrap();
//! let sc = cache.new_single_source_cache(&ProjectIdentifier::new("example.com/test"));
//!
//! sc.set_version_map(&[UnpairedVersion::branch("main").pair("abc123")]);
//! assert_eq!(
//!     sc.to_revision(&Version::from(UnpairedVersion::branch("main"))),
//!     Some(Revision::new("abc123"))
//! );
//! cache.close().unwrap();
//! ```

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod metrics;

pub use error::{CacheError, ErrorKind, Result};
