//! Versioned schema of the Betterboxd database.

use crate::catalog_store::schema::{
    CREW_JOB_TABLE_V_0, CREW_MOVIE_TABLE_V_0, CREW_TABLE_V_0, MOVIE_GENRE_TABLE_V_1,
    MOVIE_REVIEW_TABLE_V_1, MOVIE_TABLE_V_0, SCORE_SONG_TABLE_V_0, SCORE_TABLE_V_0,
};
use crate::collection::schema::{COLLECTION_ENTRY_TABLE_V_0, COLLECTION_TABLE_V_0};
use crate::sqlite_persistence::VersionedSchema;
use crate::user::schema::ACCOUNT_TABLE_V_0;
use anyhow::Result;
use rusqlite::Connection;

fn migrate_v0_to_v1(conn: &Connection) -> Result<()> {
    MOVIE_GENRE_TABLE_V_1.create(conn)?;
    MOVIE_REVIEW_TABLE_V_1.create(conn)?;
    Ok(())
}

pub const VERSIONED_SCHEMAS: &[VersionedSchema] = &[
    VersionedSchema {
        version: 0,
        tables: &[
            ACCOUNT_TABLE_V_0,
            MOVIE_TABLE_V_0,
            CREW_TABLE_V_0,
            CREW_MOVIE_TABLE_V_0,
            CREW_JOB_TABLE_V_0,
            SCORE_TABLE_V_0,
            SCORE_SONG_TABLE_V_0,
            COLLECTION_TABLE_V_0,
            COLLECTION_ENTRY_TABLE_V_0,
        ],
        migration: None,
    },
    VersionedSchema {
        version: 1,
        tables: &[
            ACCOUNT_TABLE_V_0,
            MOVIE_TABLE_V_0,
            CREW_TABLE_V_0,
            CREW_MOVIE_TABLE_V_0,
            CREW_JOB_TABLE_V_0,
            SCORE_TABLE_V_0,
            SCORE_SONG_TABLE_V_0,
            COLLECTION_TABLE_V_0,
            COLLECTION_ENTRY_TABLE_V_0,
            MOVIE_GENRE_TABLE_V_1,
            MOVIE_REVIEW_TABLE_V_1,
        ],
        migration: Some(migrate_v0_to_v1),
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite_persistence::{open_database, schema_version};
    use rusqlite::params;
    use tempfile::TempDir;

    #[test]
    fn new_database_gets_latest_version() {
        let temp_dir = TempDir::new().unwrap();
        let conn = open_database(temp_dir.path().join("test.db"), VERSIONED_SCHEMAS).unwrap();
        let conn = conn.lock().unwrap();
        assert_eq!(schema_version(&conn).unwrap(), VERSIONED_SCHEMAS.len() - 1);
        VERSIONED_SCHEMAS.last().unwrap().validate(&conn).unwrap();
    }

    #[test]
    fn migrates_v0_database_keeping_data() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        {
            let conn = Connection::open(&db_path).unwrap();
            VERSIONED_SCHEMAS[0].create(&conn).unwrap();
            conn.execute(
                "INSERT INTO movie (movie_title, title_key, run_time) VALUES (?1, ?2, ?3)",
                params!["Hatari!", "hatari!", 157],
            )
            .unwrap();
            assert_eq!(schema_version(&conn).unwrap(), 0);
        }

        let conn = open_database(&db_path, VERSIONED_SCHEMAS).unwrap();
        let conn = conn.lock().unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 1);
        MOVIE_GENRE_TABLE_V_1.validate(&conn).unwrap();
        MOVIE_REVIEW_TABLE_V_1.validate(&conn).unwrap();

        let title: String = conn
            .query_row("SELECT movie_title FROM movie", [], |row| row.get(0))
            .unwrap();
        assert_eq!(title, "Hatari!");
    }

    #[test]
    fn reopening_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        drop(open_database(&db_path, VERSIONED_SCHEMAS).unwrap());
        let conn = open_database(&db_path, VERSIONED_SCHEMAS).unwrap();
        assert_eq!(schema_version(&conn.lock().unwrap()).unwrap(), 1);
    }

    #[test]
    fn rejects_database_with_damaged_schema() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        drop(open_database(&db_path, VERSIONED_SCHEMAS).unwrap());
        {
            let conn = Connection::open(&db_path).unwrap();
            conn.execute("DROP TABLE collection_entry", []).unwrap();
        }
        assert!(open_database(&db_path, VERSIONED_SCHEMAS).is_err());
    }

    #[test]
    fn rejects_foreign_database() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        {
            let conn = Connection::open(&db_path).unwrap();
            conn.execute("CREATE TABLE notes (body TEXT)", []).unwrap();
        }
        assert!(open_database(&db_path, VERSIONED_SCHEMAS).is_err());
    }
}
