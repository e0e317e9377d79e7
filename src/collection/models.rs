//! Ranked movie collections.

use crate::catalog_store::MovieId;
use crate::user::AccountId;
use crate::validation::{ValidationError, ValidationResult};
use serde::Serialize;

pub type CollectionId = i64;

/// A user-owned ranked list of movies. Index 0 holds rank 1.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Collection {
    pub id: CollectionId,
    pub owner: AccountId,
    pub name: String,
    pub ranked_list: Vec<MovieId>,
}

/// One line of a rendered collection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RankedEntry {
    pub rank: usize,
    pub movie_id: MovieId,
    pub title: String,
}

impl Collection {
    pub fn len(&self) -> usize {
        self.ranked_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked_list.is_empty()
    }

    /// 1-based rank of the first occurrence of `movie_id`.
    pub fn rank_of(&self, movie_id: MovieId) -> Option<usize> {
        self.ranked_list
            .iter()
            .position(|id| *id == movie_id)
            .map(|idx| idx + 1)
    }

    /// Inserts `movie_id` at 1-based `rank`, pushing later entries down.
    /// `rank` may be one past the end to append.
    pub fn insert_at_rank(&mut self, movie_id: MovieId, rank: usize) -> ValidationResult<()> {
        let max = self.ranked_list.len() + 1;
        if rank == 0 || rank > max {
            return Err(ValidationError::RankOutOfRange { rank, max });
        }
        self.ranked_list.insert(rank - 1, movie_id);
        Ok(())
    }

    /// Removes the entry at `from` and reinserts it at `to` (0-based).
    pub fn move_entry(&mut self, from: usize, to: usize) -> ValidationResult<()> {
        let len = self.ranked_list.len();
        for index in [from, to] {
            if index >= len {
                return Err(ValidationError::IndexOutOfRange { index, len });
            }
        }
        let movie_id = self.ranked_list.remove(from);
        self.ranked_list.insert(to, movie_id);
        Ok(())
    }
}
