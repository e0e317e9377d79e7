//! SQLite-backed movie catalog.

use super::models::{
    normalize_key, rolling_average, CrewCredit, CrewId, Movie, MovieDraft, MovieId, Score, Song,
    COMPOSER_ROLE, UNKNOWN_COMPOSER,
};
use super::trait_def::CatalogStore;
use crate::error::{StoreError, StoreResult, WriteStep};
use crate::sqlite_persistence::SharedConnection;
use crate::user::{AccountId, Session};
use crate::validation::{
    validate_crew, validate_movie_draft, validate_rating, validate_review, validate_songs,
};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::MutexGuard;
use tracing::{debug, info, warn};

const SEARCH_BY_TITLE_SQL: &str = "SELECT movie_id, title_key FROM movie \
     WHERE instr(title_key, ?1) > 0 ORDER BY title_key";

const SEARCH_BY_CREW_SQL: &str = "SELECT DISTINCT m.movie_id, m.title_key FROM crew_movie cm \
     JOIN crew c ON c.crew_id = cm.crew_id \
     JOIN movie m ON m.movie_id = cm.movie_id \
     WHERE instr(c.name_key, ?1) > 0 ORDER BY m.title_key";

const SEARCH_BY_SONG_SQL: &str = "SELECT DISTINCT m.movie_id, m.title_key FROM score_song s \
     JOIN movie m ON m.movie_id = s.score_id \
     WHERE instr(s.song_key, ?1) > 0 ORDER BY m.title_key";

const SEARCH_BY_GENRE_SQL: &str = "SELECT DISTINCT m.movie_id, m.title_key FROM movie_genre g \
     JOIN movie m ON m.movie_id = g.movie_id \
     WHERE g.genre_key = ?1 ORDER BY m.title_key";

#[derive(Clone)]
pub struct SqliteCatalogStore {
    conn: SharedConnection,
}

impl SqliteCatalogStore {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn movie_id_by_title_key(conn: &Connection, title_key: &str) -> rusqlite::Result<Option<MovieId>> {
        conn.query_row(
            "SELECT movie_id FROM movie WHERE title_key = ?1",
            params![title_key],
            |row| row.get(0),
        )
        .optional()
    }

    fn movie_title(conn: &Connection, movie_id: MovieId) -> rusqlite::Result<Option<String>> {
        conn.query_row(
            "SELECT movie_title FROM movie WHERE movie_id = ?1",
            params![movie_id],
            |row| row.get(0),
        )
        .optional()
    }

    fn find_or_create_crew(conn: &Connection, name: &str) -> rusqlite::Result<CrewId> {
        let name = name.trim();
        let key = normalize_key(name);
        let existing: Option<CrewId> = conn
            .query_row(
                "SELECT crew_id FROM crew WHERE name_key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(crew_id) = existing {
            debug!("Reusing crew member {} for '{}'", crew_id, name);
            return Ok(crew_id);
        }
        conn.execute(
            "INSERT INTO crew (crew_name, name_key) VALUES (?1, ?2)",
            params![name, key],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Folds credits naming the same person into one, dropping repeated
    /// roles. Input order is preserved.
    fn merge_credits(crew: &[CrewCredit]) -> Vec<(String, Vec<String>)> {
        let mut merged: Vec<(String, String, Vec<String>)> = Vec::new();
        for credit in crew {
            let key = normalize_key(&credit.name);
            let idx = match merged.iter().position(|(k, _, _)| *k == key) {
                Some(idx) => idx,
                None => {
                    merged.push((key, credit.name.trim().to_string(), Vec::new()));
                    merged.len() - 1
                }
            };
            let roles = &mut merged[idx].2;
            for role in &credit.roles {
                let role_key = normalize_key(role);
                if !roles.iter().any(|r| normalize_key(r) == role_key) {
                    roles.push(role.trim().to_string());
                }
            }
        }
        merged
            .into_iter()
            .map(|(_, name, roles)| (name, roles))
            .collect()
    }

    fn link_crew(conn: &Connection, movie_id: MovieId, crew: &[CrewCredit]) -> rusqlite::Result<()> {
        for (name, roles) in Self::merge_credits(crew) {
            let crew_id = Self::find_or_create_crew(conn, &name)?;
            conn.execute(
                "INSERT OR IGNORE INTO crew_movie (crew_id, movie_id) VALUES (?1, ?2)",
                params![crew_id, movie_id],
            )?;
            for role in roles {
                conn.execute(
                    "INSERT OR IGNORE INTO crew_job (crew_id, movie_id, job) VALUES (?1, ?2, ?3)",
                    params![crew_id, movie_id, role],
                )?;
            }
        }
        Ok(())
    }

    /// The first linked crew member (in credit order) holding the composer
    /// role, or the shared "Unknown Composer" linked on the fly.
    fn resolve_composer(conn: &Connection, movie_id: MovieId) -> rusqlite::Result<CrewId> {
        let composer: Option<CrewId> = conn
            .query_row(
                "SELECT cm.crew_id FROM crew_movie cm \
                 JOIN crew_job cj ON cj.crew_id = cm.crew_id AND cj.movie_id = cm.movie_id \
                 WHERE cm.movie_id = ?1 AND lower(cj.job) = lower(?2) \
                 ORDER BY cm.rowid LIMIT 1",
                params![movie_id, COMPOSER_ROLE],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(crew_id) = composer {
            return Ok(crew_id);
        }

        debug!("Movie {} has no composer, crediting '{}'", movie_id, UNKNOWN_COMPOSER);
        let crew_id = Self::find_or_create_crew(conn, UNKNOWN_COMPOSER)?;
        conn.execute(
            "INSERT OR IGNORE INTO crew_movie (crew_id, movie_id) VALUES (?1, ?2)",
            params![crew_id, movie_id],
        )?;
        conn.execute(
            "INSERT OR IGNORE INTO crew_job (crew_id, movie_id, job) VALUES (?1, ?2, ?3)",
            params![crew_id, movie_id, COMPOSER_ROLE],
        )?;
        Ok(crew_id)
    }

    fn write_songs(conn: &Connection, movie_id: MovieId, songs: &[String]) -> rusqlite::Result<()> {
        for (idx, song) in songs.iter().enumerate() {
            let title = song.trim();
            conn.execute(
                "INSERT INTO score_song (score_id, song, song_key, track_number) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![movie_id, title, normalize_key(title), (idx + 1) as i64],
            )?;
        }
        Ok(())
    }

    fn write_genres(conn: &Connection, movie_id: MovieId, genres: &[String]) -> rusqlite::Result<()> {
        for genre in genres {
            let genre = genre.trim();
            conn.execute(
                "INSERT OR IGNORE INTO movie_genre (movie_id, genre, genre_key) VALUES (?1, ?2, ?3)",
                params![movie_id, genre, normalize_key(genre)],
            )?;
        }
        Ok(())
    }

    fn write_new_movie(
        conn: &Connection,
        draft: &MovieDraft,
        step: &mut WriteStep,
    ) -> rusqlite::Result<Movie> {
        *step = WriteStep::CoreFields;
        let title = draft.title.trim();
        conn.execute(
            "INSERT INTO movie (movie_title, title_key, run_time, average_rating, num_ratings) \
             VALUES (?1, ?2, ?3, 0.0, 0)",
            params![title, normalize_key(title), draft.runtime],
        )?;
        let movie_id = conn.last_insert_rowid();

        *step = WriteStep::CrewLinks;
        Self::link_crew(conn, movie_id, &draft.crew)?;

        *step = WriteStep::Composer;
        let composer_id = Self::resolve_composer(conn, movie_id)?;

        *step = WriteStep::Score;
        conn.execute(
            "INSERT INTO score (score_id, crew_id) VALUES (?1, ?2)",
            params![movie_id, composer_id],
        )?;

        *step = WriteStep::Songs;
        Self::write_songs(conn, movie_id, &draft.score)?;

        *step = WriteStep::ScoreLink;
        conn.execute(
            "UPDATE movie SET score_id = ?1 WHERE movie_id = ?1",
            params![movie_id],
        )?;

        *step = WriteStep::Genres;
        Self::write_genres(conn, movie_id, &draft.genres)?;

        *step = WriteStep::ReadBack;
        Self::load_movie(conn, movie_id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
    }

    fn replace_crew(
        conn: &Connection,
        movie_id: MovieId,
        crew: &[CrewCredit],
        step: &mut WriteStep,
    ) -> rusqlite::Result<Movie> {
        *step = WriteStep::CrewLinks;
        conn.execute("DELETE FROM crew_job WHERE movie_id = ?1", params![movie_id])?;
        conn.execute("DELETE FROM crew_movie WHERE movie_id = ?1", params![movie_id])?;
        Self::link_crew(conn, movie_id, crew)?;

        *step = WriteStep::Composer;
        let composer_id = Self::resolve_composer(conn, movie_id)?;

        *step = WriteStep::Score;
        conn.execute(
            "UPDATE score SET crew_id = ?1 WHERE score_id = ?2",
            params![composer_id, movie_id],
        )?;

        *step = WriteStep::ReadBack;
        Self::load_movie(conn, movie_id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
    }

    fn replace_songs(
        conn: &Connection,
        movie_id: MovieId,
        songs: &[String],
        step: &mut WriteStep,
    ) -> rusqlite::Result<Movie> {
        *step = WriteStep::Songs;
        conn.execute("DELETE FROM score_song WHERE score_id = ?1", params![movie_id])?;
        Self::write_songs(conn, movie_id, songs)?;

        *step = WriteStep::ReadBack;
        Self::load_movie(conn, movie_id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
    }

    /// Commits a multi-step movie write, or rolls it back and reports the
    /// step that failed.
    fn finish_write(
        tx: Transaction<'_>,
        title: String,
        step: WriteStep,
        result: rusqlite::Result<Movie>,
    ) -> StoreResult<Movie> {
        match result {
            Ok(movie) => {
                tx.commit().map_err(|source| StoreError::PartialWrite {
                    title,
                    step: WriteStep::Commit,
                    source,
                })?;
                Ok(movie)
            }
            Err(source) => {
                warn!(
                    "Rolling back write of movie '{}' after failure at {}: {}",
                    title, step, source
                );
                if let Err(e) = tx.rollback() {
                    warn!("Rollback of movie '{}' failed: {}", title, e);
                }
                Err(StoreError::PartialWrite {
                    title,
                    step,
                    source,
                })
            }
        }
    }

    fn load_crew(
        conn: &Connection,
        movie_id: MovieId,
    ) -> rusqlite::Result<BTreeMap<String, BTreeSet<String>>> {
        let mut crew: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        let mut names_stmt = conn.prepare(
            "SELECT c.crew_name FROM crew_movie cm JOIN crew c ON c.crew_id = cm.crew_id \
             WHERE cm.movie_id = ?1",
        )?;
        let names = names_stmt
            .query_map(params![movie_id], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        for name in names {
            crew.entry(name).or_default();
        }

        let mut jobs_stmt = conn.prepare(
            "SELECT c.crew_name, cj.job FROM crew_job cj JOIN crew c ON c.crew_id = cj.crew_id \
             WHERE cj.movie_id = ?1",
        )?;
        let jobs = jobs_stmt
            .query_map(params![movie_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        for (name, job) in jobs {
            crew.entry(name).or_default().insert(job);
        }
        Ok(crew)
    }

    fn load_score(conn: &Connection, movie_id: MovieId) -> rusqlite::Result<Score> {
        let composer: String = conn.query_row(
            "SELECT c.crew_name FROM score s JOIN crew c ON c.crew_id = s.crew_id \
             WHERE s.score_id = ?1",
            params![movie_id],
            |row| row.get(0),
        )?;
        let mut stmt = conn.prepare(
            "SELECT track_number, song FROM score_song WHERE score_id = ?1 ORDER BY track_number",
        )?;
        let songs = stmt
            .query_map(params![movie_id], |row| {
                Ok(Song {
                    track_number: row.get(0)?,
                    title: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Score { composer, songs })
    }

    fn load_genres(conn: &Connection, movie_id: MovieId) -> rusqlite::Result<Vec<String>> {
        let mut stmt =
            conn.prepare("SELECT genre FROM movie_genre WHERE movie_id = ?1 ORDER BY rowid")?;
        let genres = stmt
            .query_map(params![movie_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(genres)
    }

    fn load_reviews(
        conn: &Connection,
        movie_id: MovieId,
    ) -> rusqlite::Result<BTreeMap<AccountId, Vec<String>>> {
        let mut stmt = conn.prepare(
            "SELECT account_id, review FROM movie_review WHERE movie_id = ?1 ORDER BY review_id",
        )?;
        let rows = stmt
            .query_map(params![movie_id], |row| {
                Ok((row.get::<_, AccountId>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        let mut reviews: BTreeMap<AccountId, Vec<String>> = BTreeMap::new();
        for (account_id, review) in rows {
            reviews.entry(account_id).or_default().push(review);
        }
        Ok(reviews)
    }

    fn load_movie(conn: &Connection, movie_id: MovieId) -> rusqlite::Result<Option<Movie>> {
        let row = conn
            .query_row(
                "SELECT movie_title, run_time, average_rating, num_ratings FROM movie \
                 WHERE movie_id = ?1",
                params![movie_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, u32>(1)?,
                        row.get::<_, f64>(2)?,
                        row.get::<_, u32>(3)?,
                    ))
                },
            )
            .optional()?;
        let Some((title, runtime, average_rating, rating_count)) = row else {
            return Ok(None);
        };

        Ok(Some(Movie {
            id: movie_id,
            title,
            runtime,
            genres: Self::load_genres(conn, movie_id)?,
            crew: Self::load_crew(conn, movie_id)?,
            score: Self::load_score(conn, movie_id)?,
            average_rating,
            rating_count,
            reviews: Self::load_reviews(conn, movie_id)?,
        }))
    }

    /// Runs a search returning `(movie_id, title_key)` rows and hydrates the
    /// matching movies in order.
    fn search(conn: &Connection, sql: &str, term: &str) -> rusqlite::Result<Vec<Movie>> {
        let mut stmt = conn.prepare(sql)?;
        let ids = stmt
            .query_map(params![normalize_key(term)], |row| row.get::<_, MovieId>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        let mut movies = Vec::with_capacity(ids.len());
        for movie_id in ids {
            if let Some(movie) = Self::load_movie(conn, movie_id)? {
                movies.push(movie);
            }
        }
        Ok(movies)
    }

    fn apply_rating(conn: &Connection, movie_id: MovieId, rating: f64) -> StoreResult<f64> {
        let current: Option<(f64, u32)> = conn
            .query_row(
                "SELECT average_rating, num_ratings FROM movie WHERE movie_id = ?1",
                params![movie_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let (average, count) = current.ok_or_else(|| StoreError::not_found("movie", movie_id))?;
        let (average, count) = rolling_average(average, count, rating);
        conn.execute(
            "UPDATE movie SET average_rating = ?1, num_ratings = ?2 WHERE movie_id = ?3",
            params![average, count, movie_id],
        )?;
        Ok(average)
    }

    fn append_review(
        conn: &Connection,
        movie_id: MovieId,
        account_id: AccountId,
        review: &str,
    ) -> StoreResult<()> {
        if Self::movie_title(conn, movie_id)?.is_none() {
            return Err(StoreError::not_found("movie", movie_id));
        }
        let account_exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM account WHERE account_id = ?1)",
            params![account_id],
            |row| row.get(0),
        )?;
        if !account_exists {
            return Err(StoreError::not_found("account", account_id));
        }
        conn.execute(
            "INSERT INTO movie_review (movie_id, account_id, review) VALUES (?1, ?2, ?3)",
            params![movie_id, account_id, review.trim()],
        )?;
        Ok(())
    }
}

impl CatalogStore for SqliteCatalogStore {
    fn insert(&self, draft: &MovieDraft) -> StoreResult<Movie> {
        validate_movie_draft(draft)?;
        let title = draft.title.trim().to_string();

        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if Self::movie_id_by_title_key(&tx, &normalize_key(&title))?.is_some() {
            return Err(StoreError::duplicate("movie", title));
        }

        let mut step = WriteStep::CoreFields;
        let result = Self::write_new_movie(&tx, draft, &mut step);
        let movie = Self::finish_write(tx, title, step, result)?;
        info!(
            "Inserted movie {} '{}' with {} crew members and {} songs",
            movie.id,
            movie.title,
            movie.crew.len(),
            movie.score.songs.len()
        );
        Ok(movie)
    }

    fn set_crew(&self, movie_id: MovieId, crew: &[CrewCredit]) -> StoreResult<Movie> {
        validate_crew(crew)?;
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let title = Self::movie_title(&tx, movie_id)?
            .ok_or_else(|| StoreError::not_found("movie", movie_id))?;

        let mut step = WriteStep::CrewLinks;
        let result = Self::replace_crew(&tx, movie_id, crew, &mut step);
        let movie = Self::finish_write(tx, title, step, result)?;
        info!("Replaced crew of movie {} '{}'", movie.id, movie.title);
        Ok(movie)
    }

    fn set_score(&self, movie_id: MovieId, songs: &[String]) -> StoreResult<Movie> {
        validate_songs(songs)?;
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let title = Self::movie_title(&tx, movie_id)?
            .ok_or_else(|| StoreError::not_found("movie", movie_id))?;

        let mut step = WriteStep::Songs;
        let result = Self::replace_songs(&tx, movie_id, songs, &mut step);
        let movie = Self::finish_write(tx, title, step, result)?;
        info!(
            "Replaced score of movie {} '{}' with {} songs",
            movie.id,
            movie.title,
            movie.score.songs.len()
        );
        Ok(movie)
    }

    fn add_rating(&self, movie_id: MovieId, rating: f64) -> StoreResult<f64> {
        validate_rating(rating)?;
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let average = Self::apply_rating(&tx, movie_id, rating)?;
        tx.commit()?;
        debug!("Movie {} rated {}, average now {:.2}", movie_id, rating, average);
        Ok(average)
    }

    fn add_review(
        &self,
        movie_id: MovieId,
        account_id: AccountId,
        review: &str,
    ) -> StoreResult<()> {
        validate_review(review)?;
        let conn = self.lock()?;
        Self::append_review(&conn, movie_id, account_id, review)?;
        debug!("Account {} reviewed movie {}", account_id, movie_id);
        Ok(())
    }

    fn add_log(
        &self,
        session: &Session,
        movie_id: MovieId,
        rating: f64,
        review: Option<&str>,
    ) -> StoreResult<f64> {
        let account_id = session.user_id().ok_or(StoreError::NoActiveSession)?;
        validate_rating(rating)?;
        if let Some(review) = review {
            validate_review(review)?;
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let average = Self::apply_rating(&tx, movie_id, rating)?;
        if let Some(review) = review {
            Self::append_review(&tx, movie_id, account_id, review)?;
        }
        tx.commit()?;
        info!(
            "Account {} logged movie {} with rating {}",
            account_id, movie_id, rating
        );
        Ok(average)
    }

    fn delete(&self, movie_id: MovieId) -> StoreResult<bool> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM movie WHERE movie_id = ?1", params![movie_id])? > 0;
        if deleted {
            info!("Deleted movie {}", movie_id);
        }
        Ok(deleted)
    }

    fn get_by_id(&self, movie_id: MovieId) -> StoreResult<Option<Movie>> {
        let conn = self.lock()?;
        Ok(Self::load_movie(&conn, movie_id)?)
    }

    fn find_by_title_exact(&self, title: &str) -> StoreResult<Option<Movie>> {
        let conn = self.lock()?;
        match Self::movie_id_by_title_key(&conn, &normalize_key(title))? {
            Some(movie_id) => Ok(Self::load_movie(&conn, movie_id)?),
            None => Ok(None),
        }
    }

    fn find_by_title_inexact(&self, term: &str) -> StoreResult<Vec<Movie>> {
        let conn = self.lock()?;
        Ok(Self::search(&conn, SEARCH_BY_TITLE_SQL, term)?)
    }

    fn find_by_crew_inexact(&self, term: &str) -> StoreResult<Vec<Movie>> {
        let conn = self.lock()?;
        Ok(Self::search(&conn, SEARCH_BY_CREW_SQL, term)?)
    }

    fn find_by_score_inexact(&self, term: &str) -> StoreResult<Vec<Movie>> {
        let conn = self.lock()?;
        Ok(Self::search(&conn, SEARCH_BY_SONG_SQL, term)?)
    }

    fn find_by_genre_exact(&self, genre: &str) -> StoreResult<Vec<Movie>> {
        let conn = self.lock()?;
        Ok(Self::search(&conn, SEARCH_BY_GENRE_SQL, genre)?)
    }

    fn list_all(&self) -> StoreResult<Vec<Movie>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT movie_id FROM movie ORDER BY title_key")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, MovieId>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        let mut movies = Vec::with_capacity(ids.len());
        for movie_id in ids {
            if let Some(movie) = Self::load_movie(&conn, movie_id)? {
                movies.push(movie);
            }
        }
        Ok(movies)
    }

    fn count(&self) -> StoreResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM movie", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
