use super::versioned_schema::{VersionedSchema, BASE_DB_VERSION};
use anyhow::{bail, Context, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::info;

pub type SharedConnection = Arc<Mutex<Connection>>;

/// How long a writer waits for another process holding the write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Reads the schema version stored in `user_version`, relative to `BASE_DB_VERSION`.
pub fn schema_version(conn: &Connection) -> Result<usize> {
    let raw: i64 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .context("Failed to read database version")?;
    let version = raw - BASE_DB_VERSION as i64;
    if version < 0 {
        bail!(
            "Database version {} is too old, does not contain base db version {}",
            raw,
            BASE_DB_VERSION
        );
    }
    Ok(version as usize)
}

fn user_table_count(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
        [],
        |r| r.get(0),
    )?)
}

fn migrate_if_needed(
    conn: &mut Connection,
    schemas: &[VersionedSchema],
    version: usize,
) -> Result<()> {
    let latest = schemas.len() - 1;
    if version >= latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    let mut current = version;
    for schema in schemas.iter().skip(version + 1) {
        if let Some(migration_fn) = schema.migration {
            info!("Migrating db from version {} to {}", current, schema.version);
            migration_fn(&tx)?;
        }
        current = schema.version;
    }
    schemas[current].validate(&tx)?;
    tx.pragma_update(None, "user_version", BASE_DB_VERSION + current)?;
    tx.commit()?;
    Ok(())
}

/// Prepares `conn` so that it holds the latest of `schemas`.
///
/// An empty database gets the latest schema created directly. Otherwise the
/// stored version is validated against its own schema and migrated forward.
pub fn prepare_connection(conn: &mut Connection, schemas: &[VersionedSchema]) -> Result<()> {
    if schemas.is_empty() {
        bail!("No schema versions declared");
    }
    conn.pragma_update(None, "foreign_keys", "ON")?;

    if user_table_count(conn)? == 0 {
        let latest = &schemas[schemas.len() - 1];
        info!("Creating db schema at version {}", latest.version);
        latest.create(conn)?;
        return Ok(());
    }

    let version = schema_version(conn)?;
    let schema = schemas
        .get(version)
        .with_context(|| format!("Database version {} is too new", version))?;
    schema
        .validate(conn)
        .with_context(|| format!("Database does not match schema version {}", version))?;

    migrate_if_needed(conn, schemas, version)
}

/// Opens (creating if needed) the database file at `db_path` and brings it to
/// the latest of `schemas`. Any failure here is fatal for the process.
pub fn open_database<P: AsRef<Path>>(
    db_path: P,
    schemas: &[VersionedSchema],
) -> Result<SharedConnection> {
    let db_path = db_path.as_ref();
    let mut conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {:?}", db_path))?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    prepare_connection(&mut conn, schemas)?;
    Ok(Arc::new(Mutex::new(conn)))
}
