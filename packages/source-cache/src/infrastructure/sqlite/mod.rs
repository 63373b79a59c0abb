//! SQLite Source Cache
//!
//! Single-file persistent cache living in the configured cache directory.
//! Suitable as the slow tier of a [`super::MultiTierCache`] or on its own.
//!
//! Every read and write is one short transaction. The connection runs in WAL
//! mode with a busy timeout, so processes sharing the file wait for each
//! other instead of failing. Operations never fail outward: write errors and
//! undecodable rows are logged and treated as dropped writes and misses.

mod codec;
mod schema;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::{
    AnalyzerInfo, Lock, Manifest, PackageTree, PairedVersion, ProjectIdentifier, Revision,
    SingleSourceCache, SourceCache, UnpairedVersion, VersionIndex,
};
use crate::{CacheError, Result};

pub use schema::SCHEMA_VERSION;

/// Database file name inside the cache directory
pub const DB_FILE_NAME: &str = "source-cache.db";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

type SharedConnection = Arc<Mutex<Option<Connection>>>;

/// Persistent source cache backed by one SQLite database
pub struct PersistentCache {
    path: PathBuf,
    epoch: i64,
    conn: SharedConnection,
    span: tracing::Span,
}

impl PersistentCache {
    /// Open (or create) the database in `cache_dir`
    ///
    /// Content stamped with an epoch other than `epoch` is discarded.
    /// Diagnostics are emitted under `log_span`.
    pub fn open(cache_dir: impl AsRef<Path>, epoch: i64, log_span: tracing::Span) -> Result<Self> {
        let cache_dir = cache_dir.as_ref();
        std::fs::create_dir_all(cache_dir).map_err(|e| {
            CacheError::io(format!(
                "cannot create cache directory {}: {}",
                cache_dir.display(),
                e
            ))
            .with_source(e)
        })?;

        let path = cache_dir.join(DB_FILE_NAME);
        let mut conn = Connection::open(&path)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        schema::prepare(&mut conn, epoch, &log_span)?;

        tracing::debug!(parent: &log_span, path = %path.display(), epoch, "opened persistent source cache");

        Ok(Self {
            path,
            epoch,
            conn: Arc::new(Mutex::new(Some(conn))),
            span: log_span,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn epoch(&self) -> i64 {
        self.epoch
    }

    pub fn is_closed(&self) -> bool {
        self.conn.lock().is_none()
    }
}

impl SourceCache for PersistentCache {
    fn new_single_source_cache(&self, id: &ProjectIdentifier) -> Arc<dyn SingleSourceCache> {
        Arc::new(PersistentSingleSourceCache {
            root: id.root.as_str().to_string(),
            source: id.source_key().to_string(),
            conn: Arc::clone(&self.conn),
            span: self.span.clone(),
        })
    }

    fn close(&self) -> Result<()> {
        let Some(conn) = self.conn.lock().take() else {
            return Err(CacheError::closed("persistent source cache"));
        };
        conn.close().map_err(|(_, e)| {
            CacheError::database(format!("cannot close {}: {}", self.path.display(), e))
                .with_source(e)
        })?;
        tracing::debug!(parent: &self.span, path = %self.path.display(), "closed persistent source cache");
        Ok(())
    }
}

/// Persistent view of one source
///
/// Views share the factory's connection; after the factory is closed every
/// read misses and every write is dropped.
pub struct PersistentSingleSourceCache {
    root: String,
    source: String,
    conn: SharedConnection,
    span: tracing::Span,
}

impl PersistentSingleSourceCache {
    /// Run `f` against the live connection, logging any failure
    fn with_conn<T>(&self, op: &str, f: impl FnOnce(&mut Connection) -> Result<T>) -> Option<T> {
        let mut guard = self.conn.lock();
        let Some(conn) = guard.as_mut() else {
            tracing::warn!(parent: &self.span, project = %self.root, op, "source cache is closed");
            return None;
        };

        match f(conn) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(parent: &self.span, project = %self.root, op, error = %e, "source cache operation failed");
                None
            }
        }
    }

    /// Like [`Self::with_conn`] for lookups that report absence as `None`
    fn lookup<T>(
        &self,
        op: &str,
        f: impl FnOnce(&mut Connection) -> Result<Option<T>>,
    ) -> Option<T> {
        self.with_conn(op, f).flatten()
    }

    fn mark_revision(&self, conn: &Connection, rev: &Revision) -> Result<()> {
        conn.execute(
            "INSERT OR IGNORE INTO revisions (project_root, project_source, revision)
             VALUES (?1, ?2, ?3)",
            params![self.root, self.source, rev.as_str()],
        )?;
        Ok(())
    }
}

impl SingleSourceCache for PersistentSingleSourceCache {
    fn set_manifest_and_lock(
        &self,
        rev: &Revision,
        info: &AnalyzerInfo,
        manifest: &Manifest,
        lock: &Lock,
    ) {
        self.with_conn("set_manifest_and_lock", |conn| {
            let manifest = codec::encode(manifest)?;
            let lock = codec::encode(lock)?;
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT OR REPLACE INTO manifests
                 (project_root, project_source, revision, analyzer_name, analyzer_version, manifest, lock)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    self.root,
                    self.source,
                    rev.as_str(),
                    info.name,
                    info.version,
                    manifest,
                    lock
                ],
            )?;
            self.mark_revision(&tx, rev)?;
            tx.commit()?;
            Ok(())
        });
    }

    fn get_manifest_and_lock(
        &self,
        rev: &Revision,
        info: &AnalyzerInfo,
    ) -> Option<(Manifest, Lock)> {
        self.lookup("get_manifest_and_lock", |conn| {
            let row: Option<(String, String)> = conn
                .query_row(
                    "SELECT manifest, lock FROM manifests
                     WHERE project_root = ?1 AND project_source = ?2 AND revision = ?3
                       AND analyzer_name = ?4 AND analyzer_version = ?5",
                    params![self.root, self.source, rev.as_str(), info.name, info.version],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            match row {
                Some((manifest, lock)) => Ok(Some((
                    codec::decode("manifest", &manifest)?,
                    codec::decode("lock", &lock)?,
                ))),
                None => Ok(None),
            }
        })
    }

    fn set_package_tree(&self, rev: &Revision, tree: &PackageTree) {
        self.with_conn("set_package_tree", |conn| {
            let encoded = codec::encode_tree(tree)?;
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT OR REPLACE INTO package_trees (project_root, project_source, revision, tree)
                 VALUES (?1, ?2, ?3, ?4)",
                params![self.root, self.source, rev.as_str(), encoded],
            )?;
            self.mark_revision(&tx, rev)?;
            tx.commit()?;
            Ok(())
        });
    }

    fn get_package_tree(&self, rev: &Revision, import_root: &str) -> Option<PackageTree> {
        self.lookup("get_package_tree", |conn| {
            let text: Option<String> = conn
                .query_row(
                    "SELECT tree FROM package_trees
                     WHERE project_root = ?1 AND project_source = ?2 AND revision = ?3",
                    params![self.root, self.source, rev.as_str()],
                    |row| row.get(0),
                )
                .optional()?;

            text.map(|text| codec::decode_tree(&text, import_root))
                .transpose()
        })
    }

    fn mark_revision_exists(&self, rev: &Revision) {
        self.with_conn("mark_revision_exists", |conn| self.mark_revision(conn, rev));
    }

    fn set_version_map(&self, versions: &[PairedVersion]) {
        self.with_conn("set_version_map", |conn| {
            // Normalized the same way the in-memory index is
            let list = VersionIndex::from_paired(versions).all().unwrap_or_default();

            let tx = conn.transaction()?;
            for table in ["versions", "revisions"] {
                tx.execute(
                    &format!(
                        "DELETE FROM {} WHERE project_root = ?1 AND project_source = ?2",
                        table
                    ),
                    params![self.root, self.source],
                )?;
            }
            tx.execute(
                "INSERT OR REPLACE INTO version_maps (project_root, project_source, updated_at)
                 VALUES (?1, ?2, ?3)",
                params![self.root, self.source, chrono::Utc::now().to_rfc3339()],
            )?;

            {
                let mut insert = tx.prepare(
                    "INSERT INTO versions (project_root, project_source, version, revision, position)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )?;
                for (position, pv) in list.iter().enumerate() {
                    insert.execute(params![
                        self.root,
                        self.source,
                        codec::encode(pv.unpaired())?,
                        pv.revision().as_str(),
                        position as i64
                    ])?;
                }
            }
            for pv in &list {
                self.mark_revision(&tx, pv.revision())?;
            }

            tx.commit()?;
            Ok(())
        });
    }

    fn get_all_versions(&self) -> Option<Vec<PairedVersion>> {
        self.lookup("get_all_versions", |conn| {
            let is_set = conn
                .query_row(
                    "SELECT 1 FROM version_maps WHERE project_root = ?1 AND project_source = ?2",
                    params![self.root, self.source],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();
            if !is_set {
                return Ok(None);
            }

            let mut stmt = conn.prepare(
                "SELECT version, revision FROM versions
                 WHERE project_root = ?1 AND project_source = ?2
                 ORDER BY position",
            )?;
            let rows = stmt
                .query_map(params![self.root, self.source], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let mut versions = Vec::with_capacity(rows.len());
            for (version, revision) in rows {
                let uv: UnpairedVersion = codec::decode("version", &version)?;
                versions.push(uv.pair(revision));
            }
            Ok(Some(versions))
        })
    }

    fn get_versions_for(&self, rev: &Revision) -> Option<Vec<UnpairedVersion>> {
        self.lookup("get_versions_for", |conn| {
            let known = conn
                .query_row(
                    "SELECT 1 FROM revisions
                     WHERE project_root = ?1 AND project_source = ?2 AND revision = ?3",
                    params![self.root, self.source, rev.as_str()],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();
            if !known {
                return Ok(None);
            }

            let mut stmt = conn.prepare(
                "SELECT version FROM versions
                 WHERE project_root = ?1 AND project_source = ?2 AND revision = ?3
                 ORDER BY position",
            )?;
            let rows = stmt
                .query_map(params![self.root, self.source, rev.as_str()], |row| {
                    row.get::<_, String>(0)
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let versions = rows
                .iter()
                .map(|text| codec::decode("version", text))
                .collect::<Result<Vec<UnpairedVersion>>>()?;
            Ok(Some(versions))
        })
    }

    fn get_revision_for(&self, uv: &UnpairedVersion) -> Option<Revision> {
        self.lookup("get_revision_for", |conn| {
            let revision: Option<String> = conn
                .query_row(
                    "SELECT revision FROM versions
                     WHERE project_root = ?1 AND project_source = ?2 AND version = ?3",
                    params![self.root, self.source, codec::encode(uv)?],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(revision.map(Revision::new))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Constraint, LockedProject, ProjectProperties, Version};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn test_id() -> ProjectIdentifier {
        ProjectIdentifier::new("example.com/test")
    }

    fn open(dir: &TempDir, epoch: i64) -> PersistentCache {
        PersistentCache::open(dir.path(), epoch, tracing::Span::none()).unwrap()
    }

    fn sample_manifest() -> (Manifest, Lock) {
        let manifest = Manifest::new().constraint(
            "example.com/dep",
            ProjectProperties::new(Constraint::semver("^1.2").unwrap()),
        );
        let lock = Lock::new(vec![LockedProject::new(
            ProjectIdentifier::new("example.com/dep"),
            UnpairedVersion::tag("v1.2.3").pair("aaa111"),
            ["."],
        )]);
        (manifest, lock)
    }

    #[test]
    fn test_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let rev = Revision::new("abc123");
        let info = AnalyzerInfo::new("test-analyzer", 1);
        let (manifest, lock) = sample_manifest();
        let versions = vec![
            UnpairedVersion::branch("main").pair("abc123"),
            UnpairedVersion::tag("1.0").pair("def456"),
        ];

        {
            let cache = open(&dir, 1);
            let sc = cache.new_single_source_cache(&test_id());
            sc.set_manifest_and_lock(&rev, &info, &manifest, &lock);
            sc.set_version_map(&versions);
            cache.close().unwrap();
        }

        let cache = open(&dir, 1);
        let sc = cache.new_single_source_cache(&test_id());
        assert_eq!(sc.get_manifest_and_lock(&rev, &info), Some((manifest, lock)));
        assert_eq!(sc.get_all_versions(), Some(versions));
        assert_eq!(
            sc.get_revision_for(&UnpairedVersion::tag("1.0")),
            Some(Revision::new("def456"))
        );
        assert_eq!(
            sc.to_unpaired(&Version::from(Revision::new("abc123"))),
            Some(UnpairedVersion::branch("main"))
        );
    }

    #[test]
    fn test_epoch_change_discards_content() {
        let dir = TempDir::new().unwrap();
        {
            let cache = open(&dir, 1);
            cache
                .new_single_source_cache(&test_id())
                .set_version_map(&[UnpairedVersion::branch("main").pair("abc123")]);
            cache.close().unwrap();
        }

        let cache = open(&dir, 2);
        let sc = cache.new_single_source_cache(&test_id());
        assert!(sc.get_all_versions().is_none());
        assert!(sc.get_versions_for(&Revision::new("abc123")).is_none());
        assert_eq!(cache.epoch(), 2);
    }

    #[test]
    fn test_empty_version_map_is_a_hit() {
        let dir = TempDir::new().unwrap();
        let cache = open(&dir, 1);
        let sc = cache.new_single_source_cache(&test_id());

        assert!(sc.get_all_versions().is_none());
        sc.set_version_map(&[]);
        assert_eq!(sc.get_all_versions(), Some(vec![]));
    }

    #[test]
    fn test_version_map_replaces_marked_revisions() {
        let dir = TempDir::new().unwrap();
        let cache = open(&dir, 1);
        let sc = cache.new_single_source_cache(&test_id());

        sc.mark_revision_exists(&Revision::new("lost"));
        assert_eq!(sc.get_versions_for(&Revision::new("lost")), Some(vec![]));

        sc.set_version_map(&[UnpairedVersion::branch("main").pair("abc123")]);
        assert!(sc.get_versions_for(&Revision::new("lost")).is_none());
        assert_eq!(
            sc.get_versions_for(&Revision::new("abc123")),
            Some(vec![UnpairedVersion::branch("main")])
        );
    }

    #[test]
    fn test_undecodable_row_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let cache = open(&dir, 1);
        let sc = cache.new_single_source_cache(&test_id());
        let rev = Revision::new("abc123");
        sc.set_package_tree(&rev, &PackageTree::new("example.com/test"));

        {
            let guard = cache.conn.lock();
            let conn = guard.as_ref().unwrap();
            conn.execute("UPDATE package_trees SET tree = '{broken'", [])
                .unwrap();
        }

        assert!(sc.get_package_tree(&rev, "example.com/test").is_none());
        // The revision itself is still known
        assert_eq!(sc.get_versions_for(&rev), Some(vec![]));
    }

    #[test]
    fn test_closed_cache_misses_and_drops_writes() {
        let dir = TempDir::new().unwrap();
        let cache = open(&dir, 1);
        let sc = cache.new_single_source_cache(&test_id());
        sc.mark_revision_exists(&Revision::new("abc123"));

        cache.close().unwrap();
        assert!(cache.is_closed());

        sc.mark_revision_exists(&Revision::new("def456"));
        assert!(sc.get_versions_for(&Revision::new("abc123")).is_none());

        let err = cache.close().unwrap_err();
        assert_eq!(err.kind, crate::ErrorKind::Closed);
    }

    #[test]
    fn test_sources_partitioned() {
        let dir = TempDir::new().unwrap();
        let cache = open(&dir, 1);
        let upstream = cache.new_single_source_cache(&test_id());
        let fork = cache.new_single_source_cache(&ProjectIdentifier::with_source(
            "example.com/test",
            "https://fork.example.com/test",
        ));

        upstream.set_version_map(&[UnpairedVersion::branch("main").pair("abc123")]);
        assert!(fork.get_all_versions().is_none());
        assert!(fork
            .get_revision_for(&UnpairedVersion::branch("main"))
            .is_none());
    }

    #[test]
    fn test_meta_stamped() {
        let dir = TempDir::new().unwrap();
        let cache = open(&dir, 7);
        let guard = cache.conn.lock();
        let conn = guard.as_ref().unwrap();

        assert_eq!(
            schema::read_meta(conn, "schema_version").unwrap(),
            Some(SCHEMA_VERSION.to_string())
        );
        assert_eq!(schema::read_meta(conn, "epoch").unwrap(), Some("7".into()));
        assert!(schema::read_meta(conn, "created_at").unwrap().is_some());
        assert!(dir.path().join(DB_FILE_NAME).exists());
    }
}
