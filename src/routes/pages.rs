//! Forwarding of page requests that passed the Session Gate.

use std::time::Duration;

use axum::body::{Body, to_bytes};
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::http::header::{CONNECTION, CONTENT_LENGTH, HOST, TRANSFER_ENCODING};
use axum::response::{IntoResponse, Response};
use tracing::{debug, error};

use crate::state::AppState;
use crate::utils::http_helpers::HTTPError;

const MAX_FORWARDED_BODY: usize = 2 * 1024 * 1024;

/// The page renderer behind the edge server.
pub struct PageUpstream {
    client: reqwest::Client,
    base_url: String,
}

impl PageUpstream {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(PageUpstream {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Replays the incoming request against the renderer and relays its answer.
    pub async fn forward(&self, request: Request) -> Result<Response, HTTPError> {
        let (parts, body) = request.into_parts();
        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let url = format!("{}{}", self.base_url, path_and_query);

        let body = to_bytes(body, MAX_FORWARDED_BODY)
            .await
            .map_err(|e| HTTPError::new(StatusCode::PAYLOAD_TOO_LARGE, e.to_string()))?;

        let mut headers = parts.headers;
        headers.remove(HOST);
        headers.remove(CONNECTION);
        headers.remove(CONTENT_LENGTH);

        debug!(method = %parts.method, url = url.as_str(), "forwarding page request");
        let upstream = self
            .client
            .request(parts.method, &url)
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                error!("Page renderer unreachable: {}", e);
                HTTPError::new(StatusCode::BAD_GATEWAY, "Page renderer unavailable")
            })?;

        let status = upstream.status();
        let mut response_headers = upstream.headers().clone();
        response_headers.remove(TRANSFER_ENCODING);
        response_headers.remove(CONNECTION);
        response_headers.remove(CONTENT_LENGTH);
        let bytes = upstream.bytes().await.map_err(|e| {
            error!("Failed to read page renderer response: {}", e);
            HTTPError::new(StatusCode::BAD_GATEWAY, "Page renderer unavailable")
        })?;

        let mut response = Response::new(Body::from(bytes));
        *response.status_mut() = status;
        *response.headers_mut() = response_headers;
        Ok(response)
    }
}

/// Fallback handler for every path without a local route.
pub async fn render(State(state): State<AppState>, request: Request) -> Response {
    match &state.upstream {
        Some(upstream) => match upstream.forward(request).await {
            Ok(response) => response,
            Err(e) => e.into_response(),
        },
        None => HTTPError::new(StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}
