//! HTTP client for the storefront backend.
//!
//! Requests go through an ordered outbound pipeline (default headers,
//! request id, bearer credential) and a transport. A 401 on a request that
//! has not been retried yet is recovered through the shared refresh
//! coordinator in [`crate::session`].

pub mod client;
pub mod error;
pub mod middleware;
pub mod navigator;
pub mod request;
pub mod transport;

pub use client::{ApiClient, ApiClientBuilder, REFRESH_PATH};
pub use error::{ClientError, GENERIC_ERROR_MESSAGE};
pub use middleware::{AttachBearer, DefaultHeaders, OutboundStage, Pipeline, RequestId};
pub use navigator::{LoggingNavigator, Navigator, WatchNavigator};
pub use request::{ApiRequest, HttpResponse};
pub use transport::{ReqwestTransport, Transport};
