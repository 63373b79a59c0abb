//! Database schema and epoch bookkeeping

use rusqlite::{params, Connection, OptionalExtension};

use crate::Result;

/// Bumped whenever a table layout or value encoding changes
pub const SCHEMA_VERSION: i64 = 1;

const CONTENT_TABLES: [&str; 5] = [
    "manifests",
    "package_trees",
    "version_maps",
    "versions",
    "revisions",
];

/// Bring the database to the current schema and `epoch`
///
/// A database written under another schema version is rebuilt from scratch.
/// A database stamped with another epoch keeps its tables but loses all
/// content.
pub(super) fn prepare(conn: &mut Connection, epoch: i64, span: &tracing::Span) -> Result<()> {
    let tx = conn.transaction()?;

    tx.execute(
        "CREATE TABLE IF NOT EXISTS meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )?;

    let stored_schema = read_meta(&tx, "schema_version")?;
    if stored_schema.as_deref() != Some(SCHEMA_VERSION.to_string().as_str()) {
        if let Some(old) = &stored_schema {
            tracing::info!(
                parent: span,
                old_schema = %old,
                new_schema = SCHEMA_VERSION,
                "source cache schema changed, rebuilding tables"
            );
        }
        for table in CONTENT_TABLES {
            tx.execute(&format!("DROP TABLE IF EXISTS {}", table), [])?;
        }
        create_tables(&tx)?;
        write_meta(&tx, "schema_version", &SCHEMA_VERSION.to_string())?;
    }

    match read_meta(&tx, "epoch")? {
        Some(stored) if stored == epoch.to_string() => {}
        stored => {
            if let Some(old) = stored {
                tracing::info!(
                    parent: span,
                    old_epoch = %old,
                    new_epoch = epoch,
                    "source cache epoch changed, discarding cached metadata"
                );
                for table in CONTENT_TABLES {
                    tx.execute(&format!("DELETE FROM {}", table), [])?;
                }
            }
            write_meta(&tx, "epoch", &epoch.to_string())?;
        }
    }

    tx.execute(
        "INSERT OR IGNORE INTO meta (key, value) VALUES ('created_at', ?1)",
        params![chrono::Utc::now().to_rfc3339()],
    )?;

    tx.commit()?;
    Ok(())
}

fn create_tables(conn: &Connection) -> Result<()> {
    // Manifest and lock per revision, keyed by the analyzer that produced them
    conn.execute(
        "CREATE TABLE IF NOT EXISTS manifests (
            project_root TEXT NOT NULL,
            project_source TEXT NOT NULL,
            revision TEXT NOT NULL,
            analyzer_name TEXT NOT NULL,
            analyzer_version INTEGER NOT NULL,
            manifest TEXT NOT NULL,
            lock TEXT NOT NULL,
            PRIMARY KEY (project_root, project_source, revision, analyzer_name, analyzer_version)
        )",
        [],
    )?;

    // Package trees, import paths relative to the tree root
    conn.execute(
        "CREATE TABLE IF NOT EXISTS package_trees (
            project_root TEXT NOT NULL,
            project_source TEXT NOT NULL,
            revision TEXT NOT NULL,
            tree TEXT NOT NULL,
            PRIMARY KEY (project_root, project_source, revision)
        )",
        [],
    )?;

    // One row per source whose version map has been set, even to nothing
    conn.execute(
        "CREATE TABLE IF NOT EXISTS version_maps (
            project_root TEXT NOT NULL,
            project_source TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (project_root, project_source)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS versions (
            project_root TEXT NOT NULL,
            project_source TEXT NOT NULL,
            version TEXT NOT NULL,
            revision TEXT NOT NULL,
            position INTEGER NOT NULL,
            PRIMARY KEY (project_root, project_source, version)
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_versions_revision
         ON versions(project_root, project_source, revision)",
        [],
    )?;

    // Revisions known to exist, with or without versions
    conn.execute(
        "CREATE TABLE IF NOT EXISTS revisions (
            project_root TEXT NOT NULL,
            project_source TEXT NOT NULL,
            revision TEXT NOT NULL,
            PRIMARY KEY (project_root, project_source, revision)
        )",
        [],
    )?;

    Ok(())
}

pub(super) fn read_meta(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row(
            "SELECT value FROM meta WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

fn write_meta(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO meta (key, value) VALUES (?1, ?2)",
        params![key, value],
    )?;
    Ok(())
}
