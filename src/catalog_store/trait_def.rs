//! CatalogStore trait definition.

use super::models::{CrewCredit, Movie, MovieDraft, MovieId};
use crate::error::StoreResult;
use crate::user::{AccountId, Session};

/// Movie catalog operations.
///
/// Searches are case-insensitive and return movies ordered by title. The
/// `*_inexact` variants match any movie where the normalized term is a
/// substring of the normalized field.
pub trait CatalogStore: Send + Sync {
    // =========================================================================
    // Writes
    // =========================================================================

    /// Inserts a movie together with its crew links, score, songs and genres.
    ///
    /// Either everything is persisted or nothing is. Crew members already in
    /// the catalog (by case-insensitive name) are reused. When no credit holds
    /// the composer role an "Unknown Composer" crew member owns the score.
    fn insert(&self, draft: &MovieDraft) -> StoreResult<Movie>;

    /// Replaces the crew of a movie and re-resolves the score's composer.
    fn set_crew(&self, movie_id: MovieId, crew: &[CrewCredit]) -> StoreResult<Movie>;

    /// Replaces the songs of a movie's score, keeping the composer.
    fn set_score(&self, movie_id: MovieId, songs: &[String]) -> StoreResult<Movie>;

    /// Records one rating, returning the new average.
    fn add_rating(&self, movie_id: MovieId, rating: f64) -> StoreResult<f64>;

    fn add_review(&self, movie_id: MovieId, account_id: AccountId, review: &str)
        -> StoreResult<()>;

    /// Records a rating and an optional review by the logged-in user, in a
    /// single transaction.
    fn add_log(
        &self,
        session: &Session,
        movie_id: MovieId,
        rating: f64,
        review: Option<&str>,
    ) -> StoreResult<f64>;

    /// Deletes a movie and everything that hangs off it. Collections keep
    /// their dangling entries, which are skipped when rendered.
    fn delete(&self, movie_id: MovieId) -> StoreResult<bool>;

    // =========================================================================
    // Reads
    // =========================================================================

    fn get_by_id(&self, movie_id: MovieId) -> StoreResult<Option<Movie>>;

    fn find_by_title_exact(&self, title: &str) -> StoreResult<Option<Movie>>;

    fn find_by_title_inexact(&self, term: &str) -> StoreResult<Vec<Movie>>;

    fn find_by_crew_inexact(&self, term: &str) -> StoreResult<Vec<Movie>>;

    fn find_by_score_inexact(&self, term: &str) -> StoreResult<Vec<Movie>>;

    fn find_by_genre_exact(&self, genre: &str) -> StoreResult<Vec<Movie>>;

    fn list_all(&self) -> StoreResult<Vec<Movie>>;

    fn count(&self) -> StoreResult<usize>;
}
