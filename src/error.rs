//! Error taxonomy for the catalog, account and collection stores.

use crate::validation::ValidationError;
use std::fmt;
use thiserror::Error;

/// The stage of a multi-step movie write that was running when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStep {
    CoreFields,
    CrewLinks,
    Composer,
    Score,
    Songs,
    ScoreLink,
    Genres,
    ReadBack,
    Commit,
}

impl fmt::Display for WriteStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WriteStep::CoreFields => "core fields",
            WriteStep::CrewLinks => "crew links",
            WriteStep::Composer => "composer resolution",
            WriteStep::Score => "score record",
            WriteStep::Songs => "score songs",
            WriteStep::ScoreLink => "score back-reference",
            WriteStep::Genres => "genres",
            WriteStep::ReadBack => "read-back",
            WriteStep::Commit => "commit",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} '{key}' already exists")]
    Duplicate { entity: &'static str, key: String },

    #[error("{entity} '{key}' not found")]
    NotFound { entity: &'static str, key: String },

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("Collection {collection_id} does not belong to account {account_id}")]
    NotOwner {
        collection_id: i64,
        account_id: i64,
    },

    #[error("No user is logged in")]
    NoActiveSession,

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Writing movie '{title}' failed at {step}, all changes were rolled back: {source}")]
    PartialWrite {
        title: String,
        step: WriteStep,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Database connection lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    pub(crate) fn not_found(entity: &'static str, key: impl ToString) -> Self {
        StoreError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub(crate) fn duplicate(entity: &'static str, key: impl ToString) -> Self {
        StoreError::Duplicate {
            entity,
            key: key.to_string(),
        }
    }

    /// Whether the caller can turn this into a prompt and carry on, as opposed
    /// to aborting the current operation.
    pub fn is_recoverable(&self) -> bool {
        match self {
            StoreError::Duplicate { .. }
            | StoreError::NotFound { .. }
            | StoreError::Validation(_)
            | StoreError::NotOwner { .. }
            | StoreError::NoActiveSession => true,
            StoreError::Storage(_) | StoreError::PartialWrite { .. } | StoreError::LockPoisoned => {
                false
            }
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_recoverable_errors() {
        assert!(StoreError::duplicate("movie", "Hatari!").is_recoverable());
        assert!(StoreError::not_found("account", "randy").is_recoverable());
        assert!(StoreError::NoActiveSession.is_recoverable());
        assert!(StoreError::Validation(ValidationError::RatingOutOfRange { value: 7.0 })
            .is_recoverable());
        assert!(!StoreError::LockPoisoned.is_recoverable());
        assert!(!StoreError::PartialWrite {
            title: "Hatari!".to_string(),
            step: WriteStep::Songs,
            source: rusqlite::Error::QueryReturnedNoRows,
        }
        .is_recoverable());
    }

    #[test]
    fn partial_write_message_names_the_step() {
        let err = StoreError::PartialWrite {
            title: "Hatari!".to_string(),
            step: WriteStep::Songs,
            source: rusqlite::Error::QueryReturnedNoRows,
        };
        let msg = err.to_string();
        assert!(msg.contains("Hatari!"));
        assert!(msg.contains("score songs"));
        assert!(msg.contains("rolled back"));
    }
}
