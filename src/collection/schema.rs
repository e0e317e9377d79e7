use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, DEFAULT_TIMESTAMP,
};

pub const COLLECTION_TABLE_V_0: Table = Table {
    name: "collection",
    columns: &[
        sqlite_column!("collection_id", SqlType::Integer, is_primary_key = true),
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
        sqlite_column!("name", SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_collection_account", "account_id")],
    unique_constraints: &[],
};

/// `movie_id` has no foreign key: movies may leave the catalog while still
/// ranked in a collection.
pub const COLLECTION_ENTRY_TABLE_V_0: Table = Table {
    name: "collection_entry",
    columns: &[
        sqlite_column!(
            "collection_id",
            SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "collection",
                foreign_column: "collection_id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("movie_id", SqlType::Integer, non_null = true),
        sqlite_column!("rank", SqlType::Integer, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[&["collection_id", "rank"]],
};
