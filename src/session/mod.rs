pub mod context;
pub mod credential;
pub mod refresh;
pub mod token_store;

// Re-export the primary session items so code outside can do
// "use crate::session::{SessionContext, Credential};"
pub use context::{CurrentUser, SessionContext};
pub use credential::Credential;
pub use refresh::{
    Completion, RefreshCoordinator, RefreshError, RefreshLease, RefreshTicket, WaitHandle,
};
pub use token_store::TokenStore;
