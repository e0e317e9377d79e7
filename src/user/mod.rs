pub mod auth;
mod account_store;
pub mod schema;
mod session;
mod sqlite_account_store;
pub mod user_models;

pub use account_store::AccountStore;
pub use auth::PasswordDigest;
pub use session::Session;
pub use sqlite_account_store::SqliteAccountStore;
pub use user_models::{AccountId, User};
