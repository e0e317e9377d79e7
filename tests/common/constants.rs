//! Shared constants for integration tests
//!
//! When seeded data changes, update only this file.

// ============================================================================
// Test Accounts
// ============================================================================

pub const TEST_USER: &str = "brendan";
pub const TEST_PASS: &str = "hello";

pub const OTHER_USER: &str = "randy";
pub const OTHER_PASS: &str = "test";

// ============================================================================
// Seeded Catalog
// ============================================================================

pub const HATARI_TITLE: &str = "Hatari!";
pub const HATARI_RUNTIME: i64 = 157;
pub const HATARI_ACTOR: &str = "John Wayne";
pub const HATARI_COMPOSER: &str = "Henry Mancini";
pub const HATARI_SONGS: [&str; 2] = ["Theme", "Baby Elephant Walk"];

pub const UNFROSTED_TITLE: &str = "Unfrosted";
pub const UNFROSTED_RUNTIME: i64 = 93;
pub const UNFROSTED_DIRECTOR: &str = "Jerry Seinfeld";
pub const UNFROSTED_ACTOR: &str = "Jim Gaffigan";
