//! Cache configuration
//!
//! Chooses which backend composition a process uses. Loaded from YAML
//! (schema v1) and optionally overridden from the environment:
//!
//! ```yaml
//! version: 1
//! backend: tiered
//! cache_dir: /var/cache/resolver
//! epoch: 1700000000
//! ```
//!
//! | Variable              | Field       |
//! |-----------------------|-------------|
//! | `SOURCE_CACHE_BACKEND`| `backend`   |
//! | `SOURCE_CACHE_DIR`    | `cache_dir` |
//! | `SOURCE_CACHE_EPOCH`  | `epoch`     |

mod error;

pub use error::{ConfigError, ConfigResult};

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::SourceCache;
use crate::infrastructure::{DiscardCache, MemoryCache, MultiTierCache};
#[cfg(feature = "sqlite")]
use crate::infrastructure::PersistentCache;
use crate::Result;

pub const ENV_BACKEND: &str = "SOURCE_CACHE_BACKEND";
pub const ENV_CACHE_DIR: &str = "SOURCE_CACHE_DIR";
pub const ENV_EPOCH: &str = "SOURCE_CACHE_EPOCH";

const SUPPORTED_VERSIONS: [u32; 1] = [1];

/// Backend composition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Process-lifetime memory only
    #[default]
    Memory,
    /// SQLite file only
    Persistent,
    /// Memory in front of the SQLite file
    Tiered,
    /// Caching disabled
    Disabled,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Memory => "memory",
            BackendKind::Persistent => "persistent",
            BackendKind::Tiered => "tiered",
            BackendKind::Disabled => "disabled",
        }
    }

    /// Whether the backend keeps data on disk
    pub fn needs_cache_dir(&self) -> bool {
        matches!(self, BackendKind::Persistent | BackendKind::Tiered)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(BackendKind::Memory),
            "persistent" | "disk" => Ok(BackendKind::Persistent),
            "tiered" | "multi" => Ok(BackendKind::Tiered),
            "disabled" | "discard" | "none" => Ok(BackendKind::Disabled),
            _ => Err(ConfigError::UnknownBackend(s.to_string())),
        }
    }
}

/// YAML Schema v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFileV1 {
    /// Schema version (always 1 for v1)
    version: u32,

    #[serde(default)]
    backend: BackendKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    cache_dir: Option<PathBuf>,

    #[serde(default)]
    epoch: i64,
}

/// Source cache configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheConfig {
    pub backend: BackendKind,
    /// Directory holding the database file
    pub cache_dir: Option<PathBuf>,
    /// Content written under any other epoch is discarded on open
    pub epoch: i64,
}

impl CacheConfig {
    pub fn memory() -> Self {
        Self::default()
    }

    pub fn disabled() -> Self {
        Self {
            backend: BackendKind::Disabled,
            ..Self::default()
        }
    }

    pub fn persistent(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend: BackendKind::Persistent,
            cache_dir: Some(cache_dir.into()),
            epoch: 0,
        }
    }

    pub fn tiered(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend: BackendKind::Tiered,
            cache_dir: Some(cache_dir.into()),
            epoch: 0,
        }
    }

    pub fn epoch(mut self, epoch: i64) -> Self {
        self.epoch = epoch;
        self
    }

    /// Load from a YAML file
    pub fn from_yaml(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let file: ConfigFileV1 = serde_yaml::from_str(content)?;

        if !SUPPORTED_VERSIONS.contains(&file.version) {
            return Err(ConfigError::UnsupportedVersion {
                found: file.version,
                supported: SUPPORTED_VERSIONS.to_vec(),
            });
        }

        Ok(Self {
            backend: file.backend,
            cache_dir: file.cache_dir,
            epoch: file.epoch,
        })
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        let file = ConfigFileV1 {
            version: 1,
            backend: self.backend,
            cache_dir: self.cache_dir.clone(),
            epoch: self.epoch,
        };
        Ok(serde_yaml::to_string(&file)?)
    }

    /// Apply `SOURCE_CACHE_*` environment overrides
    pub fn with_env_overrides(self) -> ConfigResult<Self> {
        self.with_overrides_from(|var| std::env::var(var).ok())
    }

    /// Apply overrides from any variable lookup
    pub fn with_overrides_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> ConfigResult<Self> {
        if let Some(value) = lookup(ENV_BACKEND) {
            self.backend = value.parse()?;
        }

        if let Some(value) = lookup(ENV_CACHE_DIR) {
            self.cache_dir = if value.trim().is_empty() {
                None
            } else {
                Some(PathBuf::from(value))
            };
        }

        if let Some(value) = lookup(ENV_EPOCH) {
            self.epoch = value
                .trim()
                .parse()
                .map_err(|e: std::num::ParseIntError| ConfigError::InvalidEnv {
                    var: ENV_EPOCH.to_string(),
                    value: value.clone(),
                    reason: e.to_string(),
                })?;
        }

        Ok(self)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.backend.needs_cache_dir() && self.cache_dir.is_none() {
            return Err(ConfigError::MissingCacheDir {
                backend: self.backend.to_string(),
            });
        }

        if cfg!(not(feature = "sqlite")) && self.backend.needs_cache_dir() {
            return Err(ConfigError::BackendUnavailable {
                backend: self.backend.to_string(),
            });
        }

        Ok(())
    }

    /// Build the configured cache, logging under a `source_cache` span
    pub fn open(&self) -> Result<Arc<dyn SourceCache>> {
        self.open_with_span(tracing::info_span!("source_cache", backend = %self.backend))
    }

    /// Build the configured cache, logging under `span`
    pub fn open_with_span(&self, span: tracing::Span) -> Result<Arc<dyn SourceCache>> {
        self.validate()?;

        let cache: Arc<dyn SourceCache> = match self.backend {
            BackendKind::Memory => Arc::new(MemoryCache::new()),
            BackendKind::Disabled => Arc::new(DiscardCache),
            BackendKind::Persistent => self.open_persistent(span.clone())?,
            BackendKind::Tiered => Arc::new(MultiTierCache::new(
                Arc::new(MemoryCache::new()),
                self.open_persistent(span.clone())?,
            )),
        };

        tracing::info!(parent: &span, backend = %self.backend, epoch = self.epoch, "source cache opened");
        Ok(cache)
    }

    #[cfg(feature = "sqlite")]
    fn open_persistent(&self, span: tracing::Span) -> Result<Arc<dyn SourceCache>> {
        let cache_dir = self
            .cache_dir
            .as_deref()
            .ok_or_else(|| ConfigError::MissingCacheDir {
                backend: self.backend.to_string(),
            })?;
        Ok(Arc::new(PersistentCache::open(cache_dir, self.epoch, span)?))
    }

    #[cfg(not(feature = "sqlite"))]
    fn open_persistent(&self, _span: tracing::Span) -> Result<Arc<dyn SourceCache>> {
        Err(ConfigError::BackendUnavailable {
            backend: self.backend.to_string(),
        }
        .into())
    }
}
