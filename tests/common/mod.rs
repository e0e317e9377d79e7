//! Common test infrastructure
//!
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{TestDb, HATARI_TITLE};
//!
//! #[test]
//! fn test_find_hatari() {
//!     let (db, hatari, _) = TestDb::seeded();
//!     let found = db.stores.catalog.find_by_title_exact(HATARI_TITLE).unwrap();
//!     assert_eq!(found.unwrap().id, hatari.id);
//! }
//! ```

#![allow(dead_code)]

mod constants;
mod fixtures;

pub use constants::*;
pub use fixtures::{hatari_draft, unfrosted_draft, TestDb};
