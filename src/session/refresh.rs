//! Refresh coordination.
//!
//! Every request that hits an authorization failure asks the coordinator for a
//! ticket. The first one gets a [`RefreshLease`] and performs the exchange;
//! everyone arriving while the lease is held gets a [`WaitHandle`] and is
//! resumed with the lease's outcome. The waiter queue is drained exactly once
//! per lease, in registration order, and the outcome is the same for all.
//! A rejected request that finds a newer credential already stored gets it
//! back directly and starts nothing.

use std::sync::Mutex;

use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::Credential;

/// Why a refresh exchange did not produce a credential.
///
/// Cloneable because one failure is handed to every waiter of the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RefreshError {
    /// HTTP status of the refresh endpoint, `None` when no response arrived.
    pub status: Option<u16>,
    pub message: String,
}

impl RefreshError {
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        RefreshError {
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        RefreshError {
            status: None,
            message: message.into(),
        }
    }

    /// The exchange owner went away before reporting an outcome.
    pub fn abandoned() -> Self {
        Self::transport("Session refresh was abandoned")
    }
}

type Outcome = Result<Credential, RefreshError>;

struct Waiter {
    tx: oneshot::Sender<Outcome>,
    recovering: bool,
}

#[derive(Default)]
struct RefreshState {
    refreshing: bool,
    waiters: Vec<Waiter>,
}

/// Process-wide refresh state: one `refreshing` flag plus the ordered waiters.
#[derive(Default)]
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
}

/// The role a caller gets when it needs a fresh credential.
pub enum RefreshTicket<'a> {
    /// No exchange was running; the caller must perform it and complete the lease.
    Leader(RefreshLease<'a>),
    /// An exchange is already running; await its outcome.
    Waiter(WaitHandle),
    /// A window closed after the failing request was sent and its credential
    /// is already stored. Replay with it instead of exchanging again.
    Rotated(Credential),
}

/// What closing a window released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub released: usize,
    /// Whether the leader or any waiter was recovering a rejected request.
    pub recovering: bool,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Either starts a refresh window or joins the one in progress.
    pub fn begin(&self) -> RefreshTicket<'_> {
        self.enter(false, || None)
    }

    /// Like [`RefreshCoordinator::begin`] for a request whose credential was
    /// rejected.
    ///
    /// When no exchange is running, `rotated` is consulted while the window
    /// state is locked. A leader stores its credential before closing the
    /// window, so a request that lost the race against a finished exchange
    /// sees the new credential here rather than opening a second window.
    pub fn begin_recovery<F>(&self, rotated: F) -> RefreshTicket<'_>
    where
        F: FnOnce() -> Option<Credential>,
    {
        self.enter(true, rotated)
    }

    fn enter<F>(&self, recovering: bool, rotated: F) -> RefreshTicket<'_>
    where
        F: FnOnce() -> Option<Credential>,
    {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.refreshing {
            let (tx, rx) = oneshot::channel();
            state.waiters.push(Waiter { tx, recovering });
            debug!(position = state.waiters.len(), "queued behind running refresh");
            return RefreshTicket::Waiter(WaitHandle { rx });
        }
        if let Some(credential) = rotated() {
            return RefreshTicket::Rotated(credential);
        }
        state.refreshing = true;
        debug!(recovering, "starting refresh window");
        RefreshTicket::Leader(RefreshLease {
            coordinator: self,
            recovering,
            completed: false,
        })
    }

    pub fn is_refreshing(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .refreshing
    }

    /// Number of callers currently suspended behind the running exchange.
    pub fn pending_waiters(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .waiters
            .len()
    }

    fn finish(&self, leader_recovering: bool, outcome: Outcome) -> Completion {
        let waiters = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            state.refreshing = false;
            std::mem::take(&mut state.waiters)
        };

        let completion = Completion {
            released: waiters.len(),
            recovering: leader_recovering || waiters.iter().any(|w| w.recovering),
        };
        for waiter in waiters {
            // A waiter whose caller was dropped just misses the outcome.
            let _ = waiter.tx.send(outcome.clone());
        }
        completion
    }
}

/// Exclusive right to run the current refresh exchange.
///
/// Dropping a lease without calling [`RefreshLease::complete`] rejects all
/// waiters with [`RefreshError::abandoned`] and closes the window.
pub struct RefreshLease<'a> {
    coordinator: &'a RefreshCoordinator,
    recovering: bool,
    completed: bool,
}

impl RefreshLease<'_> {
    /// Publishes the exchange outcome to every waiter and closes the window.
    pub fn complete(mut self, outcome: Result<Credential, RefreshError>) -> Completion {
        self.completed = true;
        self.coordinator.finish(self.recovering, outcome)
    }
}

impl Drop for RefreshLease<'_> {
    fn drop(&mut self) {
        if !self.completed {
            let completion = self
                .coordinator
                .finish(self.recovering, Err(RefreshError::abandoned()));
            warn!(
                released = completion.released,
                "refresh lease dropped before completion"
            );
        }
    }
}

/// A suspended caller waiting for the running exchange.
pub struct WaitHandle {
    rx: oneshot::Receiver<Outcome>,
}

impl WaitHandle {
    pub async fn wait(self) -> Result<Credential, RefreshError> {
        self.rx.await.unwrap_or_else(|_| Err(RefreshError::abandoned()))
    }
}
