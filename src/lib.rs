//! Betterboxd movie catalog library
//!
//! Storage for a movie catalog, user accounts and ranked collections, all
//! kept in a single SQLite database.

pub mod catalog_store;
pub mod collection;
pub mod config;
pub mod error;
pub mod schema;
pub mod sqlite_persistence;
pub mod stores;
pub mod user;
pub mod validation;

// Re-export commonly used types for convenience
pub use catalog_store::{CatalogStore, Movie, MovieDraft, SqliteCatalogStore};
pub use collection::{Collection, CollectionStore, SqliteCollectionStore};
pub use error::{StoreError, StoreResult};
pub use stores::Stores;
pub use user::{AccountStore, Session, SqliteAccountStore, User};
