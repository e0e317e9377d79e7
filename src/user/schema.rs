use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, DEFAULT_TIMESTAMP,
};

pub const ACCOUNT_TABLE_V_0: Table = Table {
    name: "account",
    columns: &[
        sqlite_column!("account_id", SqlType::Integer, is_primary_key = true),
        // Lowercased at creation.
        sqlite_column!("account_name", SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("passphrase", SqlType::Text, non_null = true),
        sqlite_column!(
            "favorite_movie",
            SqlType::Integer,
            foreign_key = Some(&ForeignKey {
                foreign_table: "movie",
                foreign_column: "movie_id",
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
