mod database;
mod versioned_schema;

pub use database::{open_database, prepare_connection, schema_version, SharedConnection};
pub use versioned_schema::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema, BASE_DB_VERSION,
    DEFAULT_TIMESTAMP,
};
