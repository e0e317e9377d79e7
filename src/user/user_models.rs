//! Account models

use super::auth::PasswordDigest;
use crate::catalog_store::MovieId;
use crate::collection::{Collection, CollectionId};
use serde::Serialize;

pub type AccountId = i64;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct User {
    pub id: AccountId,
    /// Always lowercase.
    pub username: String,
    #[serde(skip)]
    pub password_digest: PasswordDigest,
    pub favorite_movie_id: Option<MovieId>,
    pub collections: Vec<Collection>,
}

impl User {
    pub fn check_password(&self, digest: &PasswordDigest) -> bool {
        self.password_digest == *digest
    }

    pub fn collection(&self, collection_id: CollectionId) -> Option<&Collection> {
        self.collections.iter().find(|c| c.id == collection_id)
    }
}
