//! Temporary databases and seed data.

use super::constants::*;
use betterboxd::catalog_store::{CatalogStore, Movie, MovieDraft};
use betterboxd::user::{AccountStore, PasswordDigest, Session, User};
use betterboxd::Stores;
use std::path::PathBuf;
use tempfile::TempDir;

/// A freshly created database in a temporary directory. The directory is
/// removed when the fixture is dropped.
pub struct TestDb {
    pub stores: Stores,
    pub db_path: PathBuf,
    _dir: TempDir,
}

impl TestDb {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = dir.path().join("betterboxd.db");
        let stores = Stores::open(&db_path).expect("Failed to open test database");
        Self {
            stores,
            db_path,
            _dir: dir,
        }
    }

    /// A database with "Hatari!" and "Unfrosted" already in the catalog.
    pub fn seeded() -> (Self, Movie, Movie) {
        let db = Self::new();
        let hatari = db
            .stores
            .catalog
            .insert(&hatari_draft())
            .expect("Failed to seed Hatari!");
        let unfrosted = db
            .stores
            .catalog
            .insert(&unfrosted_draft())
            .expect("Failed to seed Unfrosted");
        (db, hatari, unfrosted)
    }

    /// Opens a second set of stores over the same database file, as another
    /// process would.
    pub fn reopen(&self) -> Stores {
        Stores::open(&self.db_path).expect("Failed to reopen test database")
    }

    /// Creates an account and returns a session logged into it.
    pub fn login_new_user(&self, username: &str, password: &str) -> (User, Session) {
        let digest = PasswordDigest::from_plaintext(password).unwrap();
        let user = self.stores.accounts.create(username, &digest).unwrap();
        let mut session = Session::new();
        self.stores
            .accounts
            .set_session(&mut session, username)
            .unwrap();
        (user, session)
    }
}

pub fn hatari_draft() -> MovieDraft {
    MovieDraft::new(HATARI_TITLE, HATARI_RUNTIME)
        .with_genre("Adventure")
        .with_crew(HATARI_ACTOR, ["Actor"])
        .with_crew(HATARI_COMPOSER, ["Composer"])
        .with_song(HATARI_SONGS[0])
        .with_song(HATARI_SONGS[1])
}

pub fn unfrosted_draft() -> MovieDraft {
    MovieDraft::new(UNFROSTED_TITLE, UNFROSTED_RUNTIME)
        .with_genre("Comedy")
        .with_crew(UNFROSTED_DIRECTOR, ["Director", "Actor", "Writer"])
        .with_crew(UNFROSTED_ACTOR, ["Actor"])
}
