use super::models::{Collection, CollectionId, RankedEntry};
use crate::catalog_store::{CatalogStore, MovieId};
use crate::error::StoreResult;
use crate::user::AccountId;

/// Ranked collections owned by accounts.
pub trait CollectionStore: Send + Sync {
    /// Every movie in `ranked_list` must exist in the catalog.
    fn create(
        &self,
        owner: AccountId,
        name: &str,
        ranked_list: &[MovieId],
    ) -> StoreResult<Collection>;

    fn get(&self, collection_id: CollectionId) -> StoreResult<Option<Collection>>;

    fn list_for_owner(&self, owner: AccountId) -> StoreResult<Vec<Collection>>;

    fn rename(&self, collection_id: CollectionId, name: &str) -> StoreResult<Collection>;

    /// `rank` is 1-based and may be one past the end.
    fn insert_at_rank(
        &self,
        collection_id: CollectionId,
        movie_id: MovieId,
        rank: usize,
    ) -> StoreResult<Collection>;

    /// Relocates the entry at 0-based `from` to `to`.
    fn move_entry(
        &self,
        collection_id: CollectionId,
        from: usize,
        to: usize,
    ) -> StoreResult<Collection>;

    /// Fails with `NotOwner` for a collection of another account.
    fn delete(&self, owner: AccountId, collection_id: CollectionId) -> StoreResult<bool>;

    /// Resolves titles through `catalog`. Entries whose movie was removed are
    /// skipped and the remaining ones are ranked 1..n.
    fn render(
        &self,
        collection_id: CollectionId,
        catalog: &dyn CatalogStore,
    ) -> StoreResult<Vec<RankedEntry>>;
}
