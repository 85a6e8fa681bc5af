use tokio::sync::watch;
use tracing::warn;

/// Moves the application to the sign-in entry point once the session is
/// unrecoverable.
pub trait Navigator: Send + Sync {
    fn redirect_to_sign_in(&self, location: &str);
}

/// Only records the redirect in the logs. Used when nothing is listening.
pub struct LoggingNavigator;

impl Navigator for LoggingNavigator {
    fn redirect_to_sign_in(&self, location: &str) {
        warn!(location, "session lost, sign-in required");
    }
}

/// Publishes the sign-in location on a watch channel the UI layer subscribes to.
pub struct WatchNavigator {
    tx: watch::Sender<Option<String>>,
}

impl WatchNavigator {
    pub fn new() -> (Self, watch::Receiver<Option<String>>) {
        let (tx, rx) = watch::channel(None);
        (WatchNavigator { tx }, rx)
    }
}

impl Navigator for WatchNavigator {
    fn redirect_to_sign_in(&self, location: &str) {
        self.tx.send_replace(Some(location.to_string()));
    }
}
