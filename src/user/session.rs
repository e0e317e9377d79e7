use super::user_models::{AccountId, User};

/// The logged-in user of one interactive process, if any.
///
/// Passed explicitly to the operations that act on behalf of a user. The
/// account store keeps it in sync when the user changes their own account.
#[derive(Debug, Default, Clone)]
pub struct Session {
    current: Option<User>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(&self) -> Option<&User> {
        self.current.as_ref()
    }

    pub fn user_id(&self) -> Option<AccountId> {
        self.current.as_ref().map(|u| u.id)
    }

    pub fn is_logged_in(&self) -> bool {
        self.current.is_some()
    }

    pub fn logout(&mut self) -> Option<User> {
        self.current.take()
    }

    pub(crate) fn replace(&mut self, user: User) {
        self.current = Some(user);
    }
}
