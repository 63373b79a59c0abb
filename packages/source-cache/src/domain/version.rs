//! Version and revision model
//!
//! A source's history is addressed either by an immutable [`Revision`]
//! (commit hash) or by a human-facing [`UnpairedVersion`] (branch or tag).
//! Once the source layer has learned which revision a label points at, the
//! two travel together as a [`PairedVersion`]. [`Version`] is the closed union
//! of all three.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Immutable identifier for one snapshot of a source (e.g. a commit hash)
///
/// Equality is byte-exact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(String);

impl Revision {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Revision {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for Revision {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Kind tag shared by every [`Version`] variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionType {
    Revision,
    Branch,
    Semver,
    Plain,
}

impl VersionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionType::Revision => "revision",
            VersionType::Branch => "branch",
            VersionType::Semver => "semver",
            VersionType::Plain => "plain",
        }
    }
}

impl fmt::Display for VersionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Branch or tag with no revision attached
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UnpairedVersion {
    /// A branch; `is_default` marks the source's default branch
    Branch {
        name: String,
        #[serde(default)]
        is_default: bool,
    },
    /// A tag that parses as a semantic version
    Semver { name: String },
    /// Any other tag
    Plain { name: String },
}

impl UnpairedVersion {
    /// Non-default branch
    pub fn branch(name: impl Into<String>) -> Self {
        UnpairedVersion::Branch {
            name: name.into(),
            is_default: false,
        }
    }

    /// The source's default branch
    pub fn default_branch(name: impl Into<String>) -> Self {
        UnpairedVersion::Branch {
            name: name.into(),
            is_default: true,
        }
    }

    /// A tag, classified as semver when it parses as one
    ///
    /// ```rust
    /// use source_cache::domain::{UnpairedVersion, VersionType};
    ///
    /// assert_eq!(UnpairedVersion::tag("v1.2").version_type(), VersionType::Semver);
    /// assert_eq!(UnpairedVersion::tag("nightly").version_type(), VersionType::Plain);
    /// ```
    pub fn tag(name: impl Into<String>) -> Self {
        let name = name.into();
        if parse_semver(&name).is_some() {
            UnpairedVersion::Semver { name }
        } else {
            UnpairedVersion::Plain { name }
        }
    }

    pub fn name(&self) -> &str {
        match self {
            UnpairedVersion::Branch { name, .. }
            | UnpairedVersion::Semver { name }
            | UnpairedVersion::Plain { name } => name,
        }
    }

    pub fn version_type(&self) -> VersionType {
        match self {
            UnpairedVersion::Branch { .. } => VersionType::Branch,
            UnpairedVersion::Semver { .. } => VersionType::Semver,
            UnpairedVersion::Plain { .. } => VersionType::Plain,
        }
    }

    /// Parsed semantic version, for `Semver` tags
    pub fn semver(&self) -> Option<semver::Version> {
        match self {
            UnpairedVersion::Semver { name } => parse_semver(name),
            _ => None,
        }
    }

    /// Bind this label to the revision it currently points at
    pub fn pair(self, revision: impl Into<Revision>) -> PairedVersion {
        PairedVersion {
            version: self,
            revision: revision.into(),
        }
    }
}

impl fmt::Display for UnpairedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Branch or tag bound to the revision it currently resolves to
///
/// Two paired versions are identical iff both halves match, which is
/// exactly the derived `PartialEq`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairedVersion {
    pub version: UnpairedVersion,
    pub revision: Revision,
}

impl PairedVersion {
    pub fn unpaired(&self) -> &UnpairedVersion {
        &self.version
    }

    pub fn revision(&self) -> &Revision {
        &self.revision
    }

    pub fn unpair(self) -> UnpairedVersion {
        self.version
    }
}

impl fmt::Display for PairedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.version, self.revision)
    }
}

/// Anything that identifies a point in a source's history
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Version {
    Revision(Revision),
    Unpaired(UnpairedVersion),
    Paired(PairedVersion),
}

impl Version {
    pub fn version_type(&self) -> VersionType {
        match self {
            Version::Revision(_) => VersionType::Revision,
            Version::Unpaired(uv) => uv.version_type(),
            Version::Paired(pv) => pv.version.version_type(),
        }
    }

    /// Revision carried by the value itself, without any index lookup
    pub fn revision(&self) -> Option<&Revision> {
        match self {
            Version::Revision(rev) => Some(rev),
            Version::Paired(pv) => Some(&pv.revision),
            Version::Unpaired(_) => None,
        }
    }

    /// Unpaired half carried by the value itself, without any index lookup
    pub fn unpaired(&self) -> Option<&UnpairedVersion> {
        match self {
            Version::Unpaired(uv) => Some(uv),
            Version::Paired(pv) => Some(&pv.version),
            Version::Revision(_) => None,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::Revision(rev) => rev.fmt(f),
            Version::Unpaired(uv) => uv.fmt(f),
            Version::Paired(pv) => pv.version.fmt(f),
        }
    }
}

impl From<Revision> for Version {
    fn from(rev: Revision) -> Self {
        Version::Revision(rev)
    }
}

impl From<UnpairedVersion> for Version {
    fn from(uv: UnpairedVersion) -> Self {
        Version::Unpaired(uv)
    }
}

impl From<PairedVersion> for Version {
    fn from(pv: PairedVersion) -> Self {
        Version::Paired(pv)
    }
}

/// Lenient semver parse: accepts a leading `v` and missing minor/patch parts
fn parse_semver(raw: &str) -> Option<semver::Version> {
    let trimmed = raw.strip_prefix('v').unwrap_or(raw);
    let split_at = trimmed
        .find(|c: char| c == '-' || c == '+')
        .unwrap_or(trimmed.len());
    let (core, suffix) = trimmed.split_at(split_at);

    let mut normalized = core.to_string();
    match core.matches('.').count() {
        0 => normalized.push_str(".0.0"),
        1 => normalized.push_str(".0"),
        _ => {}
    }
    normalized.push_str(suffix);

    semver::Version::parse(&normalized).ok()
}

// ═══════════════════════════════════════════════════════════════════════════
// Ordering
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq)]
enum Direction {
    Upgrade,
    Downgrade,
}

/// Borrowed view of the two halves a version may carry
#[derive(Clone, Copy)]
struct Parts<'a> {
    unpaired: Option<&'a UnpairedVersion>,
    revision: Option<&'a Revision>,
}

impl<'a> From<&'a Version> for Parts<'a> {
    fn from(v: &'a Version) -> Self {
        Parts {
            unpaired: v.unpaired(),
            revision: v.revision(),
        }
    }
}

impl<'a> From<&'a PairedVersion> for Parts<'a> {
    fn from(pv: &'a PairedVersion) -> Self {
        Parts {
            unpaired: Some(&pv.version),
            revision: Some(&pv.revision),
        }
    }
}

/// Sort class: semver releases, semver prereleases, default branch, other
/// branches, plain tags, revisions
fn class_of(uv: Option<&UnpairedVersion>) -> u8 {
    match uv {
        Some(UnpairedVersion::Semver { name }) => match parse_semver(name) {
            Some(sv) if sv.pre.is_empty() => 0,
            _ => 1,
        },
        Some(UnpairedVersion::Branch {
            is_default: true, ..
        }) => 2,
        Some(UnpairedVersion::Branch { .. }) => 3,
        Some(UnpairedVersion::Plain { .. }) => 4,
        None => 5,
    }
}

fn compare(a: Parts<'_>, b: Parts<'_>, direction: Direction) -> Ordering {
    let (ca, cb) = (class_of(a.unpaired), class_of(b.unpaired));
    if ca != cb {
        return ca.cmp(&cb);
    }

    let by_label = match (a.unpaired, b.unpaired) {
        (Some(ua), Some(ub)) => match (ua.semver(), ub.semver()) {
            (Some(sa), Some(sb)) => match direction {
                Direction::Upgrade => sb.cmp(&sa),
                Direction::Downgrade => sa.cmp(&sb),
            },
            _ => ua.name().cmp(ub.name()),
        },
        _ => Ordering::Equal,
    };

    // Revisions break ties so the order is total and deterministic
    by_label.then_with(|| a.revision.cmp(&b.revision))
}

/// Order versions so newer ones are visited first
///
/// Semver releases (descending) come first, then prereleases, the default
/// branch, other branches, plain tags and finally bare revisions, each
/// group lexicographic where semver does not apply.
pub fn compare_for_upgrade(a: &Version, b: &Version) -> Ordering {
    compare(a.into(), b.into(), Direction::Upgrade)
}

/// Order versions so older ones are visited first
///
/// Same grouping as [`compare_for_upgrade`], with semver ascending.
pub fn compare_for_downgrade(a: &Version, b: &Version) -> Ordering {
    compare(a.into(), b.into(), Direction::Downgrade)
}

pub fn sort_paired_for_upgrade(versions: &mut [PairedVersion]) {
    versions.sort_by(|a, b| compare(a.into(), b.into(), Direction::Upgrade));
}

pub fn sort_paired_for_downgrade(versions: &mut [PairedVersion]) {
    versions.sort_by(|a, b| compare(a.into(), b.into(), Direction::Downgrade));
}
