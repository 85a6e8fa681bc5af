//! Authentication endpoints and the session facade the UI talks to.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::api::error::Result;
use crate::api::{ApiClient, ApiRequest};
use crate::models::{AuthResponse, LoginRequest, RefreshResponse, RegisterRequest};
use crate::session::{Credential, CurrentUser, SessionContext};

/// Raw calls to `/auth/*`.
pub struct AuthApi {
    client: Arc<ApiClient>,
}

impl AuthApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        AuthApi { client }
    }

    /// A 401 here means bad credentials, not an expired session, so it is
    /// never recovered through a refresh.
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse> {
        self.client
            .call(
                ApiRequest::post("/auth/login")
                    .with_json(request)?
                    .without_refresh(),
            )
            .await
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse> {
        self.client
            .call(
                ApiRequest::post("/auth/register")
                    .with_json(request)?
                    .without_refresh(),
            )
            .await
    }

    pub async fn refresh(&self) -> Result<RefreshResponse> {
        Ok(self.client.exchange().await?)
    }

    pub async fn logout(&self) -> Result<()> {
        self.client
            .call_optional::<Value>(ApiRequest::post("/auth/logout"))
            .await
            .map(|_| ())
    }

    /// Invalidates every session of the user on the backend. Local state is
    /// left alone; the next 401 takes care of it.
    pub async fn revoke_all(&self) -> Result<()> {
        self.client
            .call_optional::<Value>(ApiRequest::post("/auth/revoke-all"))
            .await
            .map(|_| ())
    }
}

/// Session lifecycle: sign in, sign out, and restoring a session on start.
pub struct AuthSession {
    api: AuthApi,
    client: Arc<ApiClient>,
    bootstrapped: OnceCell<bool>,
}

impl AuthSession {
    pub fn new(client: Arc<ApiClient>) -> Self {
        AuthSession {
            api: AuthApi::new(client.clone()),
            client,
            bootstrapped: OnceCell::new(),
        }
    }

    pub fn api(&self) -> &AuthApi {
        &self.api
    }

    pub fn context(&self) -> &Arc<SessionContext> {
        self.client.context()
    }

    pub fn current_user(&self) -> Option<CurrentUser> {
        self.context().current_user()
    }

    pub fn is_authenticated(&self) -> bool {
        self.context().is_authenticated()
    }

    pub async fn login(&self, username_or_email: &str, password: &str) -> Result<CurrentUser> {
        let request = LoginRequest {
            username_or_email: username_or_email.to_string(),
            password: password.to_string(),
        };
        let response = self
            .api
            .login(&request)
            .await
            .map_err(|e| e.or_message("Login failed"))?;
        Ok(self.adopt(response))
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<CurrentUser> {
        let response = self
            .api
            .register(request)
            .await
            .map_err(|e| e.or_message("Registration failed"))?;
        Ok(self.adopt(response))
    }

    /// Signs out remotely when possible. Local state is cleared either way.
    pub async fn logout(&self) {
        if let Err(e) = self.api.logout().await {
            warn!("Remote logout failed, clearing local session anyway: {}", e);
        }
        self.context().reset();
        info!("signed out");
    }

    pub async fn revoke_all(&self) -> Result<()> {
        self.api.revoke_all().await
    }

    /// Tries once to restore a session from the session cookie.
    ///
    /// Later calls return the first outcome without contacting the backend.
    /// A failure leaves the session anonymous. It navigates to sign-in only
    /// when a rejected request was waiting on the same exchange.
    pub async fn bootstrap(&self) -> bool {
        *self
            .bootstrapped
            .get_or_init(|| async {
                match self.client.refresh_session().await {
                    Ok(_) => {
                        info!("session restored");
                        true
                    }
                    Err(e) => {
                        debug!("no session to restore: {}", e);
                        self.context().reset();
                        false
                    }
                }
            })
            .await
    }

    fn adopt(&self, response: AuthResponse) -> CurrentUser {
        self.context().establish(
            Credential::new(response.access_token),
            Some(response.username.clone()),
        );
        CurrentUser {
            username: response.username,
        }
    }
}
