use super::account_store::AccountStore;
use super::auth::PasswordDigest;
use super::schema::ACCOUNT_TABLE_V_0;
use super::session::Session;
use super::user_models::{AccountId, User};
use crate::catalog_store::{normalize_key, MovieId};
use crate::collection::load_owned_collections;
use crate::error::{StoreError, StoreResult};
use crate::sqlite_persistence::SharedConnection;
use crate::validation::validate_username;
use rusqlite::{params, Connection, OptionalExtension, ToSql};
use std::sync::MutexGuard;
use tracing::{debug, info};

#[derive(Clone)]
pub struct SqliteAccountStore {
    conn: SharedConnection,
}

impl SqliteAccountStore {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn load_user_where(
        conn: &Connection,
        column: &str,
        value: impl ToSql,
    ) -> rusqlite::Result<Option<User>> {
        let row = conn
            .query_row(
                &format!(
                    "SELECT account_id, account_name, passphrase, favorite_movie FROM {} WHERE {} = ?1",
                    ACCOUNT_TABLE_V_0.name, column
                ),
                params![value],
                |row| {
                    Ok((
                        row.get::<_, AccountId>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<MovieId>>(3)?,
                    ))
                },
            )
            .optional()?;
        let Some((id, username, passphrase, favorite_movie_id)) = row else {
            return Ok(None);
        };
        let collections = load_owned_collections(conn, id)?;
        Ok(Some(User {
            id,
            username,
            password_digest: PasswordDigest::from_hex(passphrase),
            favorite_movie_id,
            collections,
        }))
    }

    fn load_by_username(conn: &Connection, username: &str) -> rusqlite::Result<Option<User>> {
        Self::load_user_where(conn, "account_name", normalize_key(username))
    }

    fn load_by_id(conn: &Connection, account_id: AccountId) -> rusqlite::Result<Option<User>> {
        Self::load_user_where(conn, "account_id", account_id)
    }

    fn username_taken(conn: &Connection, normalized: &str) -> rusqlite::Result<bool> {
        conn.query_row(
            &format!(
                "SELECT EXISTS(SELECT 1 FROM {} WHERE account_name = ?1)",
                ACCOUNT_TABLE_V_0.name
            ),
            params![normalized],
            |row| row.get(0),
        )
    }
}

impl AccountStore for SqliteAccountStore {
    fn exists(&self, username: &str) -> StoreResult<bool> {
        let conn = self.lock()?;
        Ok(Self::username_taken(&conn, &normalize_key(username))?)
    }

    fn create(&self, username: &str, password: &PasswordDigest) -> StoreResult<User> {
        validate_username(username)?;
        let username = normalize_key(username);

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        if Self::username_taken(&tx, &username)? {
            return Err(StoreError::duplicate("account", username));
        }
        tx.execute(
            &format!(
                "INSERT INTO {} (account_name, passphrase) VALUES (?1, ?2)",
                ACCOUNT_TABLE_V_0.name
            ),
            params![username, password.as_str()],
        )?;
        let account_id = tx.last_insert_rowid();
        let user = Self::load_by_id(&tx, account_id)?
            .ok_or_else(|| StoreError::not_found("account", account_id))?;
        tx.commit()?;

        info!("Created account {} '{}'", account_id, user.username);
        Ok(user)
    }

    fn verify(&self, username: &str, password: &PasswordDigest) -> StoreResult<bool> {
        let conn = self.lock()?;
        let stored: Option<String> = conn
            .query_row(
                &format!(
                    "SELECT passphrase FROM {} WHERE account_name = ?1",
                    ACCOUNT_TABLE_V_0.name
                ),
                params![normalize_key(username)],
                |row| row.get(0),
            )
            .optional()?;
        Ok(stored.is_some_and(|hex| PasswordDigest::from_hex(hex) == *password))
    }

    fn get_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let conn = self.lock()?;
        Ok(Self::load_by_username(&conn, username)?)
    }

    fn get_by_id(&self, account_id: AccountId) -> StoreResult<Option<User>> {
        let conn = self.lock()?;
        Ok(Self::load_by_id(&conn, account_id)?)
    }

    fn list_usernames(&self) -> StoreResult<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT account_name FROM {} ORDER BY account_name",
            ACCOUNT_TABLE_V_0.name
        ))?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
    }

    fn set_session(&self, session: &mut Session, username: &str) -> StoreResult<()> {
        let conn = self.lock()?;
        let user = Self::load_by_username(&conn, username)?
            .ok_or_else(|| StoreError::not_found("account", normalize_key(username)))?;
        info!("Account {} '{}' logged in", user.id, user.username);
        session.replace(user);
        Ok(())
    }

    fn refresh_session(&self, session: &mut Session) -> StoreResult<()> {
        let Some(account_id) = session.user_id() else {
            return Ok(());
        };
        let conn = self.lock()?;
        match Self::load_by_id(&conn, account_id)? {
            Some(user) => session.replace(user),
            None => {
                debug!("Account {} vanished, clearing session", account_id);
                session.logout();
            }
        }
        Ok(())
    }

    fn delete(&self, session: &mut Session, account_id: AccountId) -> StoreResult<bool> {
        let conn = self.lock()?;
        let deleted = conn.execute(
            &format!("DELETE FROM {} WHERE account_id = ?1", ACCOUNT_TABLE_V_0.name),
            params![account_id],
        )? > 0;
        if session.user_id() == Some(account_id) {
            session.logout();
        }
        if deleted {
            info!("Deleted account {}", account_id);
        }
        Ok(deleted)
    }

    fn set_password(&self, account_id: AccountId, password: &PasswordDigest) -> StoreResult<()> {
        let conn = self.lock()?;
        let updated = conn.execute(
            &format!(
                "UPDATE {} SET passphrase = ?1 WHERE account_id = ?2",
                ACCOUNT_TABLE_V_0.name
            ),
            params![password.as_str(), account_id],
        )?;
        if updated == 0 {
            return Err(StoreError::not_found("account", account_id));
        }
        debug!("Password changed for account {}", account_id);
        Ok(())
    }

    fn set_favorite_movie(
        &self,
        account_id: AccountId,
        movie_id: Option<MovieId>,
    ) -> StoreResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        if let Some(movie_id) = movie_id {
            let movie_exists: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM movie WHERE movie_id = ?1)",
                params![movie_id],
                |row| row.get(0),
            )?;
            if !movie_exists {
                return Err(StoreError::not_found("movie", movie_id));
            }
        }
        let updated = tx.execute(
            &format!(
                "UPDATE {} SET favorite_movie = ?1 WHERE account_id = ?2",
                ACCOUNT_TABLE_V_0.name
            ),
            params![movie_id, account_id],
        )?;
        if updated == 0 {
            return Err(StoreError::not_found("account", account_id));
        }
        tx.commit()?;
        debug!("Account {} favorite movie set to {:?}", account_id, movie_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog_store::{CatalogStore, MovieDraft};
    use crate::collection::CollectionStore;
    use crate::stores::Stores;
    use tempfile::TempDir;

    fn create_tmp_stores() -> (Stores, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let stores = Stores::open(temp_dir.path().join("test.db")).unwrap();
        (stores, temp_dir)
    }

    fn digest(plain: &str) -> PasswordDigest {
        PasswordDigest::from_plaintext(plain).unwrap()
    }

    #[test]
    fn test_create_account() {
        let (stores, _temp_dir) = create_tmp_stores();

        let user = stores.accounts.create("Brendan", &digest("hello")).unwrap();
        assert_eq!(user.username, "brendan");
        assert_eq!(user.favorite_movie_id, None);
        assert!(user.collections.is_empty());

        assert!(stores.accounts.exists("BRENDAN").unwrap());
        assert!(!stores.accounts.exists("randy").unwrap());
    }

    #[test]
    fn test_create_rejects_case_insensitive_duplicate() {
        let (stores, _temp_dir) = create_tmp_stores();
        stores.accounts.create("randy", &digest("test")).unwrap();

        let err = stores
            .accounts
            .create("Randy", &digest("other"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { entity: "account", .. }));
        assert_eq!(stores.accounts.list_usernames().unwrap(), vec!["randy"]);
    }

    #[test]
    fn test_create_rejects_long_username() {
        let (stores, _temp_dir) = create_tmp_stores();
        let err = stores
            .accounts
            .create(&"x".repeat(33), &digest("test"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[test]
    fn test_verify() {
        let (stores, _temp_dir) = create_tmp_stores();
        stores.accounts.create("dante", &digest("123")).unwrap();

        assert!(stores.accounts.verify("dante", &digest("123")).unwrap());
        assert!(stores.accounts.verify("Dante", &digest("123")).unwrap());
        assert!(!stores.accounts.verify("dante", &digest("1234")).unwrap());
        assert!(!stores.accounts.verify("nobody", &digest("123")).unwrap());
    }

    #[test]
    fn test_set_session_loads_full_user() {
        let (stores, _temp_dir) = create_tmp_stores();
        let user = stores.accounts.create("brendan", &digest("hello")).unwrap();
        let movie = stores
            .catalog
            .insert(&MovieDraft::new("Hatari!", 157))
            .unwrap();
        stores
            .accounts
            .set_favorite_movie(user.id, Some(movie.id))
            .unwrap();
        stores
            .collections
            .create(user.id, "Safari", &[movie.id])
            .unwrap();

        let mut session = Session::new();
        stores.accounts.set_session(&mut session, "BRENDAN").unwrap();

        let logged_in = stores.accounts.get_session(&session).unwrap();
        assert_eq!(logged_in.id, user.id);
        assert_eq!(logged_in.favorite_movie_id, Some(movie.id));
        assert_eq!(logged_in.collections.len(), 1);
        assert_eq!(logged_in.collections[0].ranked_list, vec![movie.id]);
    }

    #[test]
    fn test_set_session_unknown_user() {
        let (stores, _temp_dir) = create_tmp_stores();
        let mut session = Session::new();
        let err = stores
            .accounts
            .set_session(&mut session, "ghost")
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "account", .. }));
        assert!(!session.is_logged_in());
    }

    #[test]
    fn test_delete_clears_session_and_collections() {
        let (stores, _temp_dir) = create_tmp_stores();
        let user = stores.accounts.create("randy", &digest("test")).unwrap();
        let movie = stores
            .catalog
            .insert(&MovieDraft::new("Hatari!", 157))
            .unwrap();
        let collection = stores
            .collections
            .create(user.id, "Favorites", &[movie.id])
            .unwrap();

        let mut session = Session::new();
        stores.accounts.set_session(&mut session, "randy").unwrap();
        assert!(stores.accounts.delete(&mut session, user.id).unwrap());

        assert!(!session.is_logged_in());
        assert!(!stores.accounts.exists("randy").unwrap());
        assert!(stores.collections.get(collection.id).unwrap().is_none());
        assert!(!stores.accounts.delete(&mut session, user.id).unwrap());
    }

    #[test]
    fn test_delete_other_user_keeps_session() {
        let (stores, _temp_dir) = create_tmp_stores();
        stores.accounts.create("brendan", &digest("hello")).unwrap();
        let other = stores.accounts.create("randy", &digest("test")).unwrap();

        let mut session = Session::new();
        stores.accounts.set_session(&mut session, "brendan").unwrap();
        stores.accounts.delete(&mut session, other.id).unwrap();
        assert_eq!(session.user().unwrap().username, "brendan");
    }

    #[test]
    fn test_set_password() {
        let (stores, _temp_dir) = create_tmp_stores();
        let user = stores.accounts.create("dante", &digest("123")).unwrap();

        stores.accounts.set_password(user.id, &digest("456")).unwrap();
        assert!(!stores.accounts.verify("dante", &digest("123")).unwrap());
        assert!(stores.accounts.verify("dante", &digest("456")).unwrap());

        let err = stores
            .accounts
            .set_password(user.id + 100, &digest("456"))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "account", .. }));
    }

    #[test]
    fn test_favorite_movie_must_exist_and_clears_on_delete() {
        let (stores, _temp_dir) = create_tmp_stores();
        let user = stores.accounts.create("brendan", &digest("hello")).unwrap();

        let err = stores
            .accounts
            .set_favorite_movie(user.id, Some(42))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "movie", .. }));

        let movie = stores
            .catalog
            .insert(&MovieDraft::new("Hatari!", 157))
            .unwrap();
        stores
            .accounts
            .set_favorite_movie(user.id, Some(movie.id))
            .unwrap();

        let mut session = Session::new();
        stores.accounts.set_session(&mut session, "brendan").unwrap();
        assert_eq!(session.user().unwrap().favorite_movie_id, Some(movie.id));

        stores.catalog.delete(movie.id).unwrap();
        stores.accounts.refresh_session(&mut session).unwrap();
        assert_eq!(session.user().unwrap().favorite_movie_id, None);
    }
}
