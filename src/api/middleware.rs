//! The client's request pipeline.
//!
//! Outbound stages are plain values applied in order to an [`ApiRequest`]
//! before it is handed to the transport. The inbound side is a pure
//! classification of the response; the client acts on it.

use http::StatusCode;
use http::header::{ACCEPT, CONTENT_TYPE, HeaderName, HeaderValue};
use tracing::debug;
use uuid::Uuid;

use super::request::{ApiRequest, HttpResponse};
use crate::session::SessionContext;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// A transform applied to every outgoing request.
pub trait OutboundStage: Send + Sync {
    fn name(&self) -> &'static str;

    /// Stages that put the bearer credential on the request are skipped for
    /// the refresh exchange, which authenticates with the session cookie.
    fn attaches_credential(&self) -> bool {
        false
    }

    fn apply(&self, request: ApiRequest, context: &SessionContext) -> ApiRequest;
}

/// JSON in, JSON out.
pub struct DefaultHeaders;

impl OutboundStage for DefaultHeaders {
    fn name(&self) -> &'static str {
        "default-headers"
    }

    fn apply(&self, mut request: ApiRequest, _context: &SessionContext) -> ApiRequest {
        let json = HeaderValue::from_static("application/json");
        request.headers.entry(ACCEPT).or_insert(json.clone());
        if request.body.is_some() {
            request.headers.entry(CONTENT_TYPE).or_insert(json);
        }
        request
    }
}

/// Tags every dispatch (replays included) with a fresh id for log correlation.
pub struct RequestId;

impl OutboundStage for RequestId {
    fn name(&self) -> &'static str {
        "request-id"
    }

    fn apply(&self, mut request: ApiRequest, _context: &SessionContext) -> ApiRequest {
        if let Ok(value) = HeaderValue::from_str(&Uuid::new_v4().to_string()) {
            request
                .headers
                .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
        }
        request
    }
}

/// Puts the current credential, if any, on the request.
pub struct AttachBearer;

impl OutboundStage for AttachBearer {
    fn name(&self) -> &'static str {
        "attach-bearer"
    }

    fn attaches_credential(&self) -> bool {
        true
    }

    fn apply(&self, mut request: ApiRequest, context: &SessionContext) -> ApiRequest {
        if let Some(credential) = context.tokens().get() {
            request.set_bearer(&credential);
        }
        request
    }
}

/// Ordered list of outbound stages.
pub struct Pipeline {
    stages: Vec<Box<dyn OutboundStage>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Pipeline { stages: Vec::new() }
    }

    /// Default headers, request id, then the bearer credential.
    pub fn standard() -> Self {
        Self::new()
            .with_stage(DefaultHeaders)
            .with_stage(RequestId)
            .with_stage(AttachBearer)
    }

    pub fn with_stage(mut self, stage: impl OutboundStage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    pub fn run(&self, request: ApiRequest, context: &SessionContext) -> ApiRequest {
        self.stages
            .iter()
            .fold(request, |request, stage| stage.apply(request, context))
    }

    /// Runs every stage except those attaching the bearer credential.
    pub fn run_anonymous(&self, request: ApiRequest, context: &SessionContext) -> ApiRequest {
        self.stages
            .iter()
            .filter(|stage| !stage.attaches_credential())
            .fold(request, |request, stage| stage.apply(request, context))
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::standard()
    }
}

/// What the client should do with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundAction {
    /// 2xx: hand it to the caller.
    Deliver,
    /// First 401 for this request: recover through a refresh.
    Recover,
    /// 401 after a refresh already happened: terminal.
    Unauthorized,
    /// Any other failure status.
    Reject,
}

pub fn classify(request: &ApiRequest, response: &HttpResponse) -> InboundAction {
    let action = if response.status == StatusCode::UNAUTHORIZED {
        if request.retried {
            InboundAction::Unauthorized
        } else {
            InboundAction::Recover
        }
    } else if response.status.is_success() {
        InboundAction::Deliver
    } else {
        InboundAction::Reject
    };
    debug!(
        path = request.path.as_str(),
        status = response.status.as_u16(),
        ?action,
        "classified response"
    );
    action
}
