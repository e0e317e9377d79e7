use super::auth::PasswordDigest;
use super::session::Session;
use super::user_models::{AccountId, User};
use crate::catalog_store::MovieId;
use crate::error::StoreResult;

/// Account persistence and login sessions.
///
/// Usernames are matched case-insensitively and stored lowercased.
pub trait AccountStore: Send + Sync {
    fn exists(&self, username: &str) -> StoreResult<bool>;

    /// Creates an account with no favorite movie and no collections.
    fn create(&self, username: &str, password: &PasswordDigest) -> StoreResult<User>;

    /// Returns false for unknown usernames as well as for wrong passwords.
    fn verify(&self, username: &str, password: &PasswordDigest) -> StoreResult<bool>;

    fn get_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    fn get_by_id(&self, account_id: AccountId) -> StoreResult<Option<User>>;

    fn list_usernames(&self) -> StoreResult<Vec<String>>;

    /// Loads the full user (favorite movie and collections) into `session`.
    fn set_session(&self, session: &mut Session, username: &str) -> StoreResult<()>;

    fn get_session<'s>(&self, session: &'s Session) -> Option<&'s User> {
        session.user()
    }

    /// Reloads the logged-in user, logging out if the account is gone.
    fn refresh_session(&self, session: &mut Session) -> StoreResult<()>;

    /// Deletes the account and its collections. The session is cleared if it
    /// held the deleted user.
    fn delete(&self, session: &mut Session, account_id: AccountId) -> StoreResult<bool>;

    fn set_password(&self, account_id: AccountId, password: &PasswordDigest) -> StoreResult<()>;

    fn set_favorite_movie(&self, account_id: AccountId, movie_id: Option<MovieId>)
        -> StoreResult<()>;
}
