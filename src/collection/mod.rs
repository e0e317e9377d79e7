mod collection_store;
pub mod models;
pub mod schema;
mod sqlite_collection_store;

pub use collection_store::CollectionStore;
pub use models::{Collection, CollectionId, RankedEntry};
pub(crate) use sqlite_collection_store::load_owned_collections;
pub use sqlite_collection_store::SqliteCollectionStore;
