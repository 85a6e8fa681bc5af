use std::sync::RwLock;

use tracing::debug;

use super::Credential;

/// In-memory holder of the current bearer credential.
///
/// Nothing here is persisted: a restarted process starts empty and has to
/// run a refresh exchange to get a credential back.
#[derive(Default)]
pub struct TokenStore {
    current: RwLock<Option<Credential>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the stored credential. `None` is equivalent to [`TokenStore::clear`].
    pub fn set(&self, credential: Option<Credential>) {
        debug!(present = credential.is_some(), "token store updated");
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = credential;
    }

    pub fn get(&self) -> Option<Credential> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn clear(&self) {
        self.set(None);
    }

    pub fn is_present(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }
}
