//! Movie catalog storage.
//!
//! Movies are stored with their crew links, a score with ordered songs,
//! genres, ratings and reviews. All case-insensitive matching goes through
//! [`normalize_key`].

mod models;
pub mod schema;
mod store;
mod trait_def;

pub use models::{
    is_composer_role, normalize_key, rolling_average, CrewCredit, CrewId, Movie, MovieDraft,
    MovieId, Score, Song, COMPOSER_ROLE, UNKNOWN_COMPOSER,
};
pub use store::SqliteCatalogStore;
pub use trait_def::CatalogStore;
