//! The session context handed to the API client at construction.
//!
//! It owns the three pieces of process-wide session state: the bearer
//! credential, the refresh window and the current user's display name.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{Credential, RefreshCoordinator, TokenStore};

/// What the UI shows for the signed-in user.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub username: String,
}

#[derive(Default)]
pub struct SessionContext {
    tokens: TokenStore,
    refresh: RefreshCoordinator,
    user: RwLock<Option<CurrentUser>>,
}

impl SessionContext {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn refresh(&self) -> &RefreshCoordinator {
        &self.refresh
    }

    pub fn current_user(&self) -> Option<CurrentUser> {
        self.user.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// A stored credential is what makes the session authenticated; the
    /// display name is optional.
    pub fn is_authenticated(&self) -> bool {
        self.tokens.is_present()
    }

    /// Stores a newly issued credential. The display name is only replaced
    /// when the backend sent one.
    pub fn establish(&self, credential: Credential, username: Option<String>) {
        self.tokens.set(Some(credential));
        if let Some(username) = username {
            info!(username = username.as_str(), "session established");
            *self.user.write().unwrap_or_else(|e| e.into_inner()) = Some(CurrentUser { username });
        }
    }

    /// Drops the credential and the current user.
    pub fn reset(&self) {
        self.tokens.clear();
        *self.user.write().unwrap_or_else(|e| e.into_inner()) = None;
    }
}
