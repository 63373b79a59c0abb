//! Manifest and lock values produced by the analyzer
//!
//! The cache treats both as opaque serializable values. Equality is
//! structural: constraints, overrides, required and ignored package sets for
//! manifests; the locked project list for locks.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::project::{ProjectIdentifier, ProjectRoot};
use super::version::{Revision, Version};

/// Version constraint declared for a dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Constraint {
    /// Any version is acceptable
    Any,
    /// No version is acceptable
    None,
    /// Semantic version range (e.g. `> 1.3`)
    Semver(semver::VersionReq),
    /// Exactly this branch
    Branch(String),
    /// Exactly this non-semver tag
    Plain(String),
    /// Exactly this revision
    Revision(Revision),
}

impl Constraint {
    /// Parse a semver range constraint
    pub fn semver(range: &str) -> Result<Self, semver::Error> {
        Ok(Constraint::Semver(semver::VersionReq::parse(range)?))
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Any => f.write_str("*"),
            Constraint::None => f.write_str("<none>"),
            Constraint::Semver(req) => write!(f, "{}", req),
            Constraint::Branch(name) | Constraint::Plain(name) => f.write_str(name),
            Constraint::Revision(rev) => write!(f, "{}", rev),
        }
    }
}

/// Properties declared for one dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub constraint: Constraint,
}

impl ProjectProperties {
    pub fn new(constraint: Constraint) -> Self {
        Self {
            source: None,
            constraint,
        }
    }

    pub fn with_source(constraint: Constraint, source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            constraint,
        }
    }
}

pub type ProjectConstraints = BTreeMap<ProjectRoot, ProjectProperties>;

/// Dependency declaration of one source at one revision
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub constraints: ProjectConstraints,
    #[serde(default)]
    pub overrides: ProjectConstraints,
    #[serde(default)]
    pub required: BTreeSet<String>,
    #[serde(default)]
    pub ignored: BTreeSet<String>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constraint(mut self, root: impl Into<String>, props: ProjectProperties) -> Self {
        self.constraints.insert(ProjectRoot::new(root), props);
        self
    }

    pub fn override_constraint(mut self, root: impl Into<String>, props: ProjectProperties) -> Self {
        self.overrides.insert(ProjectRoot::new(root), props);
        self
    }

    pub fn require<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required.extend(packages.into_iter().map(Into::into));
        self
    }

    pub fn ignore<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored.extend(packages.into_iter().map(Into::into));
        self
    }
}

/// One project pinned in a lock
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedProject {
    pub id: ProjectIdentifier,
    /// Paired version, or a bare revision
    pub version: Version,
    /// Package subset in use, sorted
    #[serde(default)]
    pub packages: Vec<String>,
}

impl LockedProject {
    pub fn new<I, S>(id: ProjectIdentifier, version: impl Into<Version>, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut packages: Vec<String> = packages.into_iter().map(Into::into).collect();
        packages.sort();
        Self {
            id,
            version: version.into(),
            packages,
        }
    }
}

/// Resolved-dependency snapshot of one source at one revision
///
/// Projects are kept sorted by identifier so that structural equality does
/// not depend on insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lock {
    projects: Vec<LockedProject>,
}

impl Lock {
    pub fn new(mut projects: Vec<LockedProject>) -> Self {
        projects.sort_by(|a, b| a.id.cmp(&b.id));
        Self { projects }
    }

    pub fn projects(&self) -> &[LockedProject] {
        &self.projects
    }
}

impl fmt::Display for Lock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries: Vec<String> = self
            .projects
            .iter()
            .map(|lp| format!("{}@{}", lp.id, lp.version))
            .collect();
        write!(f, "[{}]", entries.join(", "))
    }
}
