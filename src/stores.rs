use crate::catalog_store::SqliteCatalogStore;
use crate::collection::SqliteCollectionStore;
use crate::schema::VERSIONED_SCHEMAS;
use crate::sqlite_persistence::{open_database, SharedConnection};
use crate::user::SqliteAccountStore;
use anyhow::{Context, Result};
use std::path::Path;

/// The three stores, sharing one database connection.
#[derive(Clone)]
pub struct Stores {
    pub catalog: SqliteCatalogStore,
    pub accounts: SqliteAccountStore,
    pub collections: SqliteCollectionStore,
}

impl Stores {
    /// Opens the database at `db_path`, creating or migrating its schema.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        let conn = open_database(db_path, VERSIONED_SCHEMAS)
            .with_context(|| format!("Failed to prepare database {:?}", db_path))?;
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: SharedConnection) -> Self {
        Self {
            catalog: SqliteCatalogStore::new(conn.clone()),
            accounts: SqliteAccountStore::new(conn.clone()),
            collections: SqliteCollectionStore::new(conn),
        }
    }
}
