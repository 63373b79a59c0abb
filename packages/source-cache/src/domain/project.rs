//! Project identity and analyzer identity

use std::fmt;

use serde::{Deserialize, Serialize};

/// Import root of a project (e.g. `github.com/sdboyer/gps`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectRoot(String);

impl ProjectRoot {
    pub fn new(root: impl Into<String>) -> Self {
        Self(root.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProjectRoot {
    fn from(root: &str) -> Self {
        Self::new(root)
    }
}

/// Identity of a dependency source: import root plus an optional network
/// source override
///
/// This is the cache partitioning key. Both halves take part in equality, so
/// the same root fetched from two different sources never shares records.
///
/// ```rust
/// use source_cache::domain::ProjectIdentifier;
///
/// let id = ProjectIdentifier::new("example.com/test").normalize();
/// assert_eq!(id.source(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectIdentifier {
    pub root: ProjectRoot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl ProjectIdentifier {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: ProjectRoot::new(root),
            source: None,
        }
    }

    pub fn with_source(root: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            root: ProjectRoot::new(root),
            source: Some(source.into()),
        }
    }

    /// Canonical form: trims whitespace and a trailing `/`, and drops a
    /// source override that is empty or merely repeats the root
    pub fn normalize(self) -> Self {
        let root = self.root.0.trim().trim_end_matches('/').to_string();
        let source = self
            .source
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty() && *s != root);
        Self {
            root: ProjectRoot(root),
            source,
        }
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Source override as stored in partition keys (empty when absent)
    pub fn source_key(&self) -> &str {
        self.source.as_deref().unwrap_or("")
    }
}

impl fmt::Display for ProjectIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{} ({})", self.root, source),
            None => write!(f, "{}", self.root),
        }
    }
}

/// Name and version of the analyzer that produced a manifest and lock
///
/// Cached manifests are keyed by this; a different analyzer version may read
/// the same revision differently, so any change yields a cache miss.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnalyzerInfo {
    pub name: String,
    pub version: i32,
}

impl AnalyzerInfo {
    pub fn new(name: impl Into<String>, version: i32) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }
}

impl fmt::Display for AnalyzerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.name, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims_root() {
        let id = ProjectIdentifier::new(" example.com/test/ ").normalize();
        assert_eq!(id.root.as_str(), "example.com/test");
        assert_eq!(id.source(), None);
    }

    #[test]
    fn test_normalize_drops_redundant_source() {
        let id = ProjectIdentifier::with_source("example.com/test", "example.com/test").normalize();
        assert_eq!(id.source(), None);

        let id = ProjectIdentifier::with_source("example.com/test", "  ").normalize();
        assert_eq!(id.source(), None);

        let id =
            ProjectIdentifier::with_source("example.com/test", "https://mirror/test").normalize();
        assert_eq!(id.source(), Some("https://mirror/test"));
        assert_eq!(id.source_key(), "https://mirror/test");
    }

    #[test]
    fn test_source_distinguishes_identifiers() {
        let a = ProjectIdentifier::new("example.com/test");
        let b = ProjectIdentifier::with_source("example.com/test", "https://fork/test");
        assert_ne!(a, b);
        assert_eq!(b.to_string(), "example.com/test (https://fork/test)");
    }

    #[test]
    fn test_analyzer_display() {
        assert_eq!(AnalyzerInfo::new("dep", 1).to_string(), "dep.1");
    }
}
