//! The API client: outbound pipeline, transport, and transparent recovery
//! from expired credentials.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use super::error::{ClientError, Result};
use super::middleware::{InboundAction, Pipeline, classify};
use super::navigator::{LoggingNavigator, Navigator};
use super::request::{ApiRequest, HttpResponse};
use super::transport::{ReqwestTransport, Transport};
use crate::config::ConfigV1;
use crate::metrics::{Metrics, MetricsRecorder};
use crate::models::{ApiEnvelope, RefreshResponse};
use crate::session::{Credential, RefreshError, RefreshLease, RefreshTicket, SessionContext};

pub const REFRESH_PATH: &str = "/auth/refresh";

pub struct ApiClient {
    transport: Arc<dyn Transport>,
    pipeline: Pipeline,
    context: Arc<SessionContext>,
    navigator: Arc<dyn Navigator>,
    sign_in_path: String,
    metrics: Option<Metrics>,
}

pub struct ApiClientBuilder {
    transport: Arc<dyn Transport>,
    context: Arc<SessionContext>,
    pipeline: Pipeline,
    navigator: Arc<dyn Navigator>,
    sign_in_path: String,
    metrics: Option<Metrics>,
}

impl ApiClientBuilder {
    pub fn pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    pub fn sign_in_path(mut self, path: impl Into<String>) -> Self {
        self.sign_in_path = path.into();
        self
    }

    pub fn metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn build(self) -> ApiClient {
        ApiClient {
            transport: self.transport,
            pipeline: self.pipeline,
            context: self.context,
            navigator: self.navigator,
            sign_in_path: self.sign_in_path,
            metrics: self.metrics,
        }
    }
}

impl ApiClient {
    pub fn builder(transport: Arc<dyn Transport>, context: Arc<SessionContext>) -> ApiClientBuilder {
        ApiClientBuilder {
            transport,
            context,
            pipeline: Pipeline::standard(),
            navigator: Arc::new(LoggingNavigator),
            sign_in_path: "/login".to_string(),
            metrics: None,
        }
    }

    /// A builder for a client talking to the configured backend through `reqwest`.
    pub fn from_config(config: &ConfigV1, context: Arc<SessionContext>) -> Result<ApiClientBuilder> {
        let transport = ReqwestTransport::new(
            config.api.resolved_base_url(),
            Duration::from_millis(config.api.timeout_in_ms),
        )?;
        Ok(Self::builder(Arc::new(transport), context).sign_in_path(config.gate.login_path.clone()))
    }

    pub fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }

    pub fn sign_in_path(&self) -> &str {
        &self.sign_in_path
    }

    /// Dispatches a request and recovers once from an expired credential.
    ///
    /// Only 2xx responses are returned as `Ok`.
    pub async fn send(&self, request: ApiRequest) -> Result<HttpResponse> {
        let (sent, response) = self.dispatch(request).await?;
        match classify(&sent, &response) {
            InboundAction::Recover => self.recover(sent).await,
            action => settle(action, response),
        }
    }

    /// Sends the request and unwraps the envelope payload.
    pub async fn call<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        self.send(request).await?.envelope::<T>()?.into_data()
    }

    /// Like [`ApiClient::call`] for endpoints whose payload may be null.
    pub async fn call_optional<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<Option<T>> {
        self.send(request).await?.envelope::<T>()?.into_result()
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.call(ApiRequest::get(path)).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.call(ApiRequest::post(path).with_json(body)?).await
    }

    /// Obtains a fresh credential through the coordinator: either runs the
    /// exchange or joins the one in progress.
    ///
    /// Does not navigate on its own account. If a rejected request queued
    /// behind an exchange led from here, that failure still sends the user to
    /// sign-in once.
    pub async fn refresh_session(&self) -> Result<Credential> {
        match self.context.refresh().begin() {
            RefreshTicket::Waiter(handle) => Ok(handle.wait().await?),
            RefreshTicket::Leader(lease) => Ok(self.lead_refresh(lease).await?),
            RefreshTicket::Rotated(credential) => Ok(credential),
        }
    }

    /// One raw call to the refresh endpoint.
    ///
    /// Authenticated by the session cookie only and never routed through
    /// recovery, so its own 401 is final.
    pub async fn exchange(&self) -> std::result::Result<RefreshResponse, RefreshError> {
        let request = self
            .pipeline
            .run_anonymous(ApiRequest::post(REFRESH_PATH), &self.context);
        let response = self
            .transport
            .execute(&request)
            .await
            .map_err(|e| RefreshError::transport(e.to_string()))?;

        let status = response.status.as_u16();
        if !response.status.is_success() {
            return Err(RefreshError::rejected(status, response.error_message()));
        }
        response
            .envelope::<RefreshResponse>()
            .and_then(ApiEnvelope::into_data)
            .map_err(|e| RefreshError::rejected(status, e.display_message()))
    }

    async fn dispatch(&self, request: ApiRequest) -> Result<(ApiRequest, HttpResponse)> {
        let prepared = self.pipeline.run(request, &self.context);
        let response = self.transport.execute(&prepared).await?;
        Ok((prepared, response))
    }

    async fn recover(&self, mut request: ApiRequest) -> Result<HttpResponse> {
        request.retried = true;

        let tokens = self.context.tokens();
        let sent = request.bearer().map(str::to_string);
        let rotated = || {
            tokens
                .get()
                .filter(|current| sent.as_deref() != Some(current.as_str()))
        };

        let credential = match self.context.refresh().begin_recovery(rotated) {
            RefreshTicket::Rotated(credential) => {
                debug!(
                    path = request.path.as_str(),
                    "credential rotated while in flight, replaying"
                );
                credential
            }
            RefreshTicket::Waiter(handle) => handle.wait().await?,
            RefreshTicket::Leader(lease) => self.lead_refresh(lease).await?,
        };
        self.replay(request, &credential).await
    }

    /// Runs the exchange for the window this lease holds.
    ///
    /// On failure the session is cleared before waiters are rejected, and the
    /// user is sent to sign-in once when any rejected request took part in
    /// the window.
    async fn lead_refresh(&self, lease: RefreshLease<'_>) -> std::result::Result<Credential, RefreshError> {
        match self.exchange().await {
            Ok(refreshed) => {
                let credential = Credential::new(refreshed.access_token);
                self.context
                    .establish(credential.clone(), refreshed.username);
                let completion = lease.complete(Ok(credential.clone()));
                info!(released = completion.released, "session refreshed");
                self.record_refresh("success", completion.released);
                Ok(credential)
            }
            Err(err) => {
                self.context.reset();
                let completion = lease.complete(Err(err.clone()));
                warn!(
                    released = completion.released,
                    status = ?err.status,
                    "session refresh failed: {}",
                    err
                );
                self.record_refresh("failure", completion.released);
                if completion.recovering {
                    self.navigator.redirect_to_sign_in(&self.sign_in_path);
                }
                Err(err)
            }
        }
    }

    async fn replay(&self, mut request: ApiRequest, credential: &Credential) -> Result<HttpResponse> {
        request.retried = true;
        request.set_bearer(credential);
        let (sent, response) = self.dispatch(request).await?;
        settle(classify(&sent, &response), response)
    }

    fn record_refresh(&self, result: &str, released: usize) {
        if let Some(metrics) = &self.metrics {
            metrics.record_refresh(result);
            metrics.record_waiters_released(result, released);
        }
    }
}

fn settle(action: InboundAction, response: HttpResponse) -> Result<HttpResponse> {
    match action {
        InboundAction::Deliver => Ok(response),
        InboundAction::Reject => Err(ClientError::Api {
            status: response.status.as_u16(),
            message: response.error_message(),
        }),
        InboundAction::Recover | InboundAction::Unauthorized => Err(ClientError::Unauthorized {
            message: response.error_message(),
        }),
    }
}
