//! End-to-end tests for ranked collections

mod common;

use betterboxd::catalog_store::{CatalogStore, MovieDraft};
use betterboxd::collection::CollectionStore;
use betterboxd::validation::ValidationError;
use betterboxd::StoreError;
use common::*;

fn ranks(entries: &[betterboxd::collection::RankedEntry]) -> Vec<(usize, &str)> {
    entries.iter().map(|e| (e.rank, e.title.as_str())).collect()
}

#[test]
fn test_move_first_to_last() {
    let (db, hatari, unfrosted) = TestDb::seeded();
    let bee_movie = db
        .stores
        .catalog
        .insert(&MovieDraft::new("Bee Movie", 91))
        .unwrap();
    let (user, _) = db.login_new_user(TEST_USER, TEST_PASS);
    let collections = &db.stores.collections;

    let collection = collections
        .create(user.id, "Favorites", &[hatari.id, unfrosted.id, bee_movie.id])
        .unwrap();
    let moved = collections.move_entry(collection.id, 0, 2).unwrap();
    assert_eq!(moved.ranked_list, vec![unfrosted.id, bee_movie.id, hatari.id]);

    let rendered = collections.render(collection.id, &db.stores.catalog).unwrap();
    assert_eq!(
        ranks(&rendered),
        vec![(1, UNFROSTED_TITLE), (2, "Bee Movie"), (3, HATARI_TITLE)]
    );
}

#[test]
fn test_render_skips_deleted_movies() {
    let (db, hatari, unfrosted) = TestDb::seeded();
    let (user, _) = db.login_new_user(TEST_USER, TEST_PASS);
    let collections = &db.stores.collections;

    let collection = collections
        .create(user.id, "Favorites", &[hatari.id, unfrosted.id])
        .unwrap();
    assert!(db.stores.catalog.delete(hatari.id).unwrap());

    let rendered = collections.render(collection.id, &db.stores.catalog).unwrap();
    assert_eq!(ranks(&rendered), vec![(1, UNFROSTED_TITLE)]);
    // The stale reference itself is kept.
    assert_eq!(
        collections.get(collection.id).unwrap().unwrap().ranked_list,
        vec![hatari.id, unfrosted.id]
    );
}

#[test]
fn test_insert_at_rank_bounds() {
    let (db, hatari, unfrosted) = TestDb::seeded();
    let (user, _) = db.login_new_user(TEST_USER, TEST_PASS);
    let collections = &db.stores.collections;

    let collection = collections.create(user.id, "Queue", &[]).unwrap();
    let err = collections
        .insert_at_rank(collection.id, hatari.id, 2)
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::RankOutOfRange { rank: 2, max: 1 })
    ));

    collections.insert_at_rank(collection.id, hatari.id, 1).unwrap();
    let updated = collections
        .insert_at_rank(collection.id, unfrosted.id, 1)
        .unwrap();
    assert_eq!(updated.ranked_list, vec![unfrosted.id, hatari.id]);

    let err = collections
        .insert_at_rank(collection.id, 12345, 1)
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { entity: "movie", .. }));
}

#[test]
fn test_collections_are_per_owner() {
    let (db, hatari, _) = TestDb::seeded();
    let (brendan, _) = db.login_new_user(TEST_USER, TEST_PASS);
    let (randy, _) = db.login_new_user(OTHER_USER, OTHER_PASS);
    let collections = &db.stores.collections;

    let mine = collections.create(brendan.id, "Mine", &[hatari.id]).unwrap();
    collections.create(randy.id, "Theirs", &[]).unwrap();

    assert_eq!(collections.list_for_owner(brendan.id).unwrap(), vec![mine.clone()]);

    let err = collections.delete(randy.id, mine.id).unwrap_err();
    assert!(matches!(err, StoreError::NotOwner { .. }));
    assert!(collections.get(mine.id).unwrap().is_some());

    let renamed = collections.rename(mine.id, "Best of the sixties").unwrap();
    assert_eq!(renamed.name, "Best of the sixties");

    assert!(collections.delete(brendan.id, mine.id).unwrap());
    assert!(!collections.delete(brendan.id, mine.id).unwrap());
}
