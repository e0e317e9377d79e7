//! SQLite tables backing the movie catalog.
//!
//! Natural keys (`title_key`, `name_key`, `song_key`, `genre_key`) hold the
//! trimmed, lowercased form of the displayed value so that lookups and
//! uniqueness are case-insensitive while the original spelling is kept.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, DEFAULT_TIMESTAMP,
};

const MOVIE_FOREIGN_KEY: ForeignKey = ForeignKey {
    foreign_table: "movie",
    foreign_column: "movie_id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const CREW_FOREIGN_KEY: ForeignKey = ForeignKey {
    foreign_table: "crew",
    foreign_column: "crew_id",
    on_delete: ForeignKeyOnChange::Cascade,
};

pub const MOVIE_TABLE_V_0: Table = Table {
    name: "movie",
    columns: &[
        sqlite_column!("movie_id", SqlType::Integer, is_primary_key = true),
        sqlite_column!("movie_title", SqlType::Text, non_null = true),
        sqlite_column!("title_key", SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("run_time", SqlType::Integer, non_null = true),
        sqlite_column!(
            "average_rating",
            SqlType::Real,
            non_null = true,
            default_value = Some("0.0")
        ),
        sqlite_column!(
            "num_ratings",
            SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        // Filled in once the score row exists.
        sqlite_column!(
            "score_id",
            SqlType::Integer,
            foreign_key = Some(&ForeignKey {
                foreign_table: "score",
                foreign_column: "score_id",
                on_delete: ForeignKeyOnChange::SetNull,
            })
        ),
        sqlite_column!(
            "created",
            SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[],
    unique_constraints: &[],
};

pub const CREW_TABLE_V_0: Table = Table {
    name: "crew",
    columns: &[
        sqlite_column!("crew_id", SqlType::Integer, is_primary_key = true),
        sqlite_column!("crew_name", SqlType::Text, non_null = true),
        sqlite_column!("name_key", SqlType::Text, non_null = true, is_unique = true),
    ],
    indices: &[],
    unique_constraints: &[],
};

pub const CREW_MOVIE_TABLE_V_0: Table = Table {
    name: "crew_movie",
    columns: &[
        sqlite_column!(
            "crew_id",
            SqlType::Integer,
            non_null = true,
            foreign_key = Some(&CREW_FOREIGN_KEY)
        ),
        sqlite_column!(
            "movie_id",
            SqlType::Integer,
            non_null = true,
            foreign_key = Some(&MOVIE_FOREIGN_KEY)
        ),
    ],
    indices: &[("idx_crew_movie_movie", "movie_id")],
    unique_constraints: &[&["crew_id", "movie_id"]],
};

pub const CREW_JOB_TABLE_V_0: Table = Table {
    name: "crew_job",
    columns: &[
        sqlite_column!(
            "crew_id",
            SqlType::Integer,
            non_null = true,
            foreign_key = Some(&CREW_FOREIGN_KEY)
        ),
        sqlite_column!(
            "movie_id",
            SqlType::Integer,
            non_null = true,
            foreign_key = Some(&MOVIE_FOREIGN_KEY)
        ),
        sqlite_column!("job", SqlType::Text, non_null = true),
    ],
    indices: &[("idx_crew_job_movie", "movie_id")],
    unique_constraints: &[&["crew_id", "movie_id", "job"]],
};

/// One score per movie, sharing the movie's id.
pub const SCORE_TABLE_V_0: Table = Table {
    name: "score",
    columns: &[
        sqlite_column!(
            "score_id",
            SqlType::Integer,
            is_primary_key = true,
            foreign_key = Some(&MOVIE_FOREIGN_KEY)
        ),
        sqlite_column!(
            "crew_id",
            SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "crew",
                foreign_column: "crew_id",
                on_delete: ForeignKeyOnChange::Restrict,
            })
        ),
    ],
    indices: &[],
    unique_constraints: &[],
};

pub const SCORE_SONG_TABLE_V_0: Table = Table {
    name: "score_song",
    columns: &[
        sqlite_column!(
            "score_id",
            SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "score",
                foreign_column: "score_id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("song", SqlType::Text, non_null = true),
        sqlite_column!("song_key", SqlType::Text, non_null = true),
        sqlite_column!("track_number", SqlType::Integer, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[&["score_id", "track_number"]],
};

pub const MOVIE_GENRE_TABLE_V_1: Table = Table {
    name: "movie_genre",
    columns: &[
        sqlite_column!(
            "movie_id",
            SqlType::Integer,
            non_null = true,
            foreign_key = Some(&MOVIE_FOREIGN_KEY)
        ),
        sqlite_column!("genre", SqlType::Text, non_null = true),
        sqlite_column!("genre_key", SqlType::Text, non_null = true),
    ],
    indices: &[("idx_movie_genre_key", "genre_key")],
    unique_constraints: &[&["movie_id", "genre_key"]],
};

pub const MOVIE_REVIEW_TABLE_V_1: Table = Table {
    name: "movie_review",
    columns: &[
        sqlite_column!("review_id", SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "movie_id",
            SqlType::Integer,
            non_null = true,
            foreign_key = Some(&MOVIE_FOREIGN_KEY)
        ),
        sqlite_column!(
            "account_id",
            SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "account",
                foreign_column: "account_id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("review", SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_movie_review_movie", "movie_id")],
    unique_constraints: &[],
};
