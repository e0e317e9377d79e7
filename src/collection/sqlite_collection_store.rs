use super::collection_store::CollectionStore;
use super::models::{Collection, CollectionId, RankedEntry};
use super::schema::{COLLECTION_ENTRY_TABLE_V_0, COLLECTION_TABLE_V_0};
use crate::catalog_store::{CatalogStore, MovieId};
use crate::error::{StoreError, StoreResult};
use crate::sqlite_persistence::SharedConnection;
use crate::user::AccountId;
use crate::validation::validate_collection_name;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::MutexGuard;
use tracing::{debug, info};

fn load_ranked_list(conn: &Connection, collection_id: CollectionId) -> rusqlite::Result<Vec<MovieId>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT movie_id FROM {} WHERE collection_id = ?1 ORDER BY rank",
        COLLECTION_ENTRY_TABLE_V_0.name
    ))?;
    let ids = stmt
        .query_map(params![collection_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<MovieId>>>()?;
    Ok(ids)
}

/// Collections of `owner` in creation order, with their entries.
pub(crate) fn load_owned_collections(
    conn: &Connection,
    owner: AccountId,
) -> rusqlite::Result<Vec<Collection>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT collection_id, name FROM {} WHERE account_id = ?1 ORDER BY collection_id",
        COLLECTION_TABLE_V_0.name
    ))?;
    let heads = stmt
        .query_map(params![owner], |row| {
            Ok((row.get::<_, CollectionId>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut collections = Vec::with_capacity(heads.len());
    for (id, name) in heads {
        collections.push(Collection {
            id,
            owner,
            name,
            ranked_list: load_ranked_list(conn, id)?,
        });
    }
    Ok(collections)
}

#[derive(Clone)]
pub struct SqliteCollectionStore {
    conn: SharedConnection,
}

impl SqliteCollectionStore {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn load_collection(
        conn: &Connection,
        collection_id: CollectionId,
    ) -> rusqlite::Result<Option<Collection>> {
        let head = conn
            .query_row(
                &format!(
                    "SELECT account_id, name FROM {} WHERE collection_id = ?1",
                    COLLECTION_TABLE_V_0.name
                ),
                params![collection_id],
                |row| Ok((row.get::<_, AccountId>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;
        let Some((owner, name)) = head else {
            return Ok(None);
        };
        Ok(Some(Collection {
            id: collection_id,
            owner,
            name,
            ranked_list: load_ranked_list(conn, collection_id)?,
        }))
    }

    fn ensure_movies_exist(conn: &Connection, movie_ids: &[MovieId]) -> StoreResult<()> {
        for movie_id in movie_ids {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM movie WHERE movie_id = ?1)",
                params![movie_id],
                |row| row.get(0),
            )?;
            if !exists {
                return Err(StoreError::not_found("movie", movie_id));
            }
        }
        Ok(())
    }

    /// Writes the name and the full entry list of `collection`.
    fn save(conn: &Connection, collection: &Collection) -> rusqlite::Result<()> {
        conn.execute(
            &format!(
                "UPDATE {} SET name = ?1 WHERE collection_id = ?2",
                COLLECTION_TABLE_V_0.name
            ),
            params![collection.name, collection.id],
        )?;
        conn.execute(
            &format!(
                "DELETE FROM {} WHERE collection_id = ?1",
                COLLECTION_ENTRY_TABLE_V_0.name
            ),
            params![collection.id],
        )?;
        for (idx, movie_id) in collection.ranked_list.iter().enumerate() {
            conn.execute(
                &format!(
                    "INSERT INTO {} (collection_id, movie_id, rank) VALUES (?1, ?2, ?3)",
                    COLLECTION_ENTRY_TABLE_V_0.name
                ),
                params![collection.id, movie_id, (idx + 1) as i64],
            )?;
        }
        Ok(())
    }

    /// Loads a collection, applies `mutate` and writes it back in one
    /// transaction.
    fn update<F>(&self, collection_id: CollectionId, mutate: F) -> StoreResult<Collection>
    where
        F: FnOnce(&Connection, &mut Collection) -> StoreResult<()>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut collection = Self::load_collection(&tx, collection_id)?
            .ok_or_else(|| StoreError::not_found("collection", collection_id))?;
        mutate(&*tx, &mut collection)?;
        Self::save(&tx, &collection)?;
        tx.commit()?;
        debug!(
            "Rewrote collection {} with {} entries",
            collection.id,
            collection.len()
        );
        Ok(collection)
    }
}

impl CollectionStore for SqliteCollectionStore {
    fn create(
        &self,
        owner: AccountId,
        name: &str,
        ranked_list: &[MovieId],
    ) -> StoreResult<Collection> {
        validate_collection_name(name)?;
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let owner_exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM account WHERE account_id = ?1)",
            params![owner],
            |row| row.get(0),
        )?;
        if !owner_exists {
            return Err(StoreError::not_found("account", owner));
        }
        Self::ensure_movies_exist(&tx, ranked_list)?;

        tx.execute(
            &format!(
                "INSERT INTO {} (account_id, name) VALUES (?1, ?2)",
                COLLECTION_TABLE_V_0.name
            ),
            params![owner, name.trim()],
        )?;
        let collection = Collection {
            id: tx.last_insert_rowid(),
            owner,
            name: name.trim().to_string(),
            ranked_list: ranked_list.to_vec(),
        };
        Self::save(&tx, &collection)?;
        tx.commit()?;

        info!(
            "Account {} created collection {} '{}' with {} movies",
            owner,
            collection.id,
            collection.name,
            collection.len()
        );
        Ok(collection)
    }

    fn get(&self, collection_id: CollectionId) -> StoreResult<Option<Collection>> {
        let conn = self.lock()?;
        Ok(Self::load_collection(&conn, collection_id)?)
    }

    fn list_for_owner(&self, owner: AccountId) -> StoreResult<Vec<Collection>> {
        let conn = self.lock()?;
        Ok(load_owned_collections(&conn, owner)?)
    }

    fn rename(&self, collection_id: CollectionId, name: &str) -> StoreResult<Collection> {
        validate_collection_name(name)?;
        self.update(collection_id, |_, collection| {
            collection.name = name.trim().to_string();
            Ok(())
        })
    }

    fn insert_at_rank(
        &self,
        collection_id: CollectionId,
        movie_id: MovieId,
        rank: usize,
    ) -> StoreResult<Collection> {
        self.update(collection_id, |conn, collection| {
            Self::ensure_movies_exist(conn, &[movie_id])?;
            collection.insert_at_rank(movie_id, rank)?;
            Ok(())
        })
    }

    fn move_entry(
        &self,
        collection_id: CollectionId,
        from: usize,
        to: usize,
    ) -> StoreResult<Collection> {
        self.update(collection_id, |_, collection| {
            collection.move_entry(from, to)?;
            Ok(())
        })
    }

    fn delete(&self, owner: AccountId, collection_id: CollectionId) -> StoreResult<bool> {
        let conn = self.lock()?;
        let actual_owner: Option<AccountId> = conn
            .query_row(
                &format!(
                    "SELECT account_id FROM {} WHERE collection_id = ?1",
                    COLLECTION_TABLE_V_0.name
                ),
                params![collection_id],
                |row| row.get(0),
            )
            .optional()?;
        match actual_owner {
            None => Ok(false),
            Some(actual_owner) if actual_owner != owner => Err(StoreError::NotOwner {
                collection_id,
                account_id: owner,
            }),
            Some(_) => {
                conn.execute(
                    &format!(
                        "DELETE FROM {} WHERE collection_id = ?1",
                        COLLECTION_TABLE_V_0.name
                    ),
                    params![collection_id],
                )?;
                info!("Account {} deleted collection {}", owner, collection_id);
                Ok(true)
            }
        }
    }

    fn render(
        &self,
        collection_id: CollectionId,
        catalog: &dyn CatalogStore,
    ) -> StoreResult<Vec<RankedEntry>> {
        let collection = self
            .get(collection_id)?
            .ok_or_else(|| StoreError::not_found("collection", collection_id))?;

        let mut entries = Vec::with_capacity(collection.len());
        for movie_id in collection.ranked_list {
            match catalog.get_by_id(movie_id)? {
                Some(movie) => entries.push(RankedEntry {
                    rank: entries.len() + 1,
                    movie_id,
                    title: movie.title,
                }),
                None => debug!(
                    "Skipping movie {} of collection {}, no longer in the catalog",
                    movie_id, collection_id
                ),
            }
        }
        Ok(entries)
    }
}
