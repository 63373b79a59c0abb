//! Package import tree of one revision
//!
//! Analysis failures for individual packages are first-class values: a tree
//! that records an error for `root/broken` is a cache hit, not a miss.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Metadata for one successfully analyzed package
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub import_path: String,
    /// Import path declared in the package's import comment, if any
    #[serde(default)]
    pub comment_path: String,
    #[serde(default)]
    pub imports: Vec<String>,
    #[serde(default)]
    pub test_imports: Vec<String>,
}

impl Package {
    /// Structural equality with imports and test imports compared as sets
    pub fn same_as(&self, other: &Package) -> bool {
        fn as_set(v: &[String]) -> BTreeSet<&str> {
            v.iter().map(String::as_str).collect()
        }

        self.name == other.name
            && self.import_path == other.import_path
            && self.comment_path == other.comment_path
            && self.imports.len() == other.imports.len()
            && self.test_imports.len() == other.test_imports.len()
            && as_set(&self.imports) == as_set(&other.imports)
            && as_set(&self.test_imports) == as_set(&other.test_imports)
    }
}

/// Either a package or the message of the error hit while analyzing it
///
/// Errors are kept as messages: error identity does not survive a trip
/// through the persistent store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageOrErr {
    Package(Package),
    Err(String),
}

impl PackageOrErr {
    pub fn error(err: impl std::fmt::Display) -> Self {
        PackageOrErr::Err(err.to_string())
    }

    pub fn same_as(&self, other: &PackageOrErr) -> bool {
        match (self, other) {
            (PackageOrErr::Package(a), PackageOrErr::Package(b)) => a.same_as(b),
            (PackageOrErr::Err(a), PackageOrErr::Err(b)) => a == b,
            _ => false,
        }
    }
}

/// Import root plus every package found beneath it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageTree {
    pub import_root: String,
    pub packages: BTreeMap<String, PackageOrErr>,
}

impl PackageTree {
    pub fn new(import_root: impl Into<String>) -> Self {
        Self {
            import_root: import_root.into(),
            packages: BTreeMap::new(),
        }
    }

    pub fn with_package(mut self, package: Package) -> Self {
        self.packages
            .insert(package.import_path.clone(), PackageOrErr::Package(package));
        self
    }

    pub fn with_error(mut self, import_path: impl Into<String>, err: impl std::fmt::Display) -> Self {
        self.packages
            .insert(import_path.into(), PackageOrErr::error(err));
        self
    }

    /// Rewrite every import path under the current root onto `root`
    ///
    /// Paths outside the current root are left untouched.
    pub fn rerooted(self, root: &str) -> PackageTree {
        if self.import_root == root {
            return self;
        }

        let old_root = self.import_root;
        let packages = self
            .packages
            .into_iter()
            .map(|(path, entry)| {
                let path = join_root(root, &strip_root(&old_root, &path));
                let entry = match entry {
                    PackageOrErr::Package(mut p) => {
                        p.import_path = join_root(root, &strip_root(&old_root, &p.import_path));
                        PackageOrErr::Package(p)
                    }
                    err => err,
                };
                (path, entry)
            })
            .collect();

        PackageTree {
            import_root: root.to_string(),
            packages,
        }
    }

    /// Structural equality using [`PackageOrErr::same_as`] per entry
    pub fn same_as(&self, other: &PackageTree) -> bool {
        self.import_root == other.import_root
            && self.packages.len() == other.packages.len()
            && self.packages.iter().all(|(path, entry)| {
                other
                    .packages
                    .get(path)
                    .is_some_and(|theirs| entry.same_as(theirs))
            })
    }
}

/// Path relative to `root`: `""` for the root itself, `"/sub"` beneath it,
/// unchanged otherwise
///
/// Import paths never begin with `/`, so the relative forms cannot collide
/// with an unrelated absolute path.
pub(crate) fn strip_root(root: &str, path: &str) -> String {
    if path == root {
        return String::new();
    }
    match path.strip_prefix(root) {
        Some(rest) if rest.starts_with('/') => rest.to_string(),
        _ => path.to_string(),
    }
}

/// Inverse of [`strip_root`]
pub(crate) fn join_root(root: &str, relative: &str) -> String {
    if relative.is_empty() || relative.starts_with('/') {
        format!("{}{}", root, relative)
    } else {
        relative.to_string()
    }
}
