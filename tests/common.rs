#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use figment::{
    Figment,
    providers::{Format, Yaml},
};
use serde_json::{Value, json};
use storefront::api::error::Result;
use storefront::api::{ApiClient, ApiRequest, HttpResponse, Navigator, REFRESH_PATH, Transport};
use storefront::config::{ConfigV1, load_config_from};
use storefront::routes::create_router;
use storefront::session::{Credential, SessionContext};
use storefront::startup::build_state;
use tokio::sync::Semaphore;

pub const TEST_CONFIG: &str = r#"
version: "1.0.0"
logging:
  level: "debug"
  format: "json"
gate:
  session_cookie: refreshToken
  protected_routes: ["/account", "/admin"]
  guest_routes: ["/login", "/register"]
"#;

pub fn config_from_yaml(yaml: &str) -> ConfigV1 {
    load_config_from(Figment::new().merge(Yaml::string(yaml))).expect("test config should load")
}

pub fn build_app(config: ConfigV1) -> Router {
    let state = build_state(Arc::new(config)).expect("state should build");
    create_router(state)
}

pub fn page_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header("Cookie", cookie);
    }
    builder.body(Body::empty()).expect("failed to build request")
}

pub fn envelope(status: StatusCode, message: &str, data: Value) -> HttpResponse {
    let body = json!({
        "success": status.is_success(),
        "statusCode": status.as_u16(),
        "message": message,
        "data": data,
        "timestamp": "2024-05-01T10:00:00"
    });
    HttpResponse::new(status, body.to_string())
}

/// Polls `condition` until it holds, failing the test after two seconds.
pub async fn wait_until(what: &str, condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        if tokio::time::Instant::now() > deadline {
            panic!("timed out waiting for {}", what);
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
}

/// An in-memory backend.
///
/// Protected endpoints accept only the currently valid token. Every
/// successful refresh issues a new one. The refresh endpoint can be held
/// closed until the test releases it.
pub struct FakeBackend {
    valid_token: Mutex<String>,
    issued: AtomicUsize,
    refresh_calls: AtomicUsize,
    refresh_rejects: Mutex<bool>,
    refresh_gate: Semaphore,
    gated: bool,
    always_unauthorized: Mutex<HashSet<String>>,
    rotate_on: Mutex<Option<(String, Arc<SessionContext>)>>,
    served: Mutex<Vec<ApiRequest>>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Self::build(false)
    }

    /// Refresh calls block until [`FakeBackend::release_refresh`].
    pub fn gated() -> Arc<Self> {
        Self::build(true)
    }

    fn build(gated: bool) -> Arc<Self> {
        Arc::new(FakeBackend {
            valid_token: Mutex::new("not-issued-yet".to_string()),
            issued: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            refresh_rejects: Mutex::new(false),
            refresh_gate: Semaphore::new(0),
            gated,
            always_unauthorized: Mutex::new(HashSet::new()),
            rotate_on: Mutex::new(None),
            served: Mutex::new(Vec::new()),
        })
    }

    pub fn release_refresh(&self) {
        self.refresh_gate.add_permits(1);
    }

    pub fn reject_refresh(&self) {
        *self.refresh_rejects.lock().unwrap() = true;
    }

    pub fn always_unauthorized(&self, path: &str) {
        self.always_unauthorized
            .lock()
            .unwrap()
            .insert(path.to_string());
    }

    /// While answering the first request to `path`, install the valid token
    /// in `context`, as a concurrent refresh elsewhere would.
    pub fn rotate_during(&self, path: &str, context: Arc<SessionContext>) {
        *self.rotate_on.lock().unwrap() = Some((path.to_string(), context));
    }

    pub fn set_valid_token(&self, token: &str) {
        *self.valid_token.lock().unwrap() = token.to_string();
    }

    pub fn valid_token(&self) -> String {
        self.valid_token.lock().unwrap().clone()
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn served(&self) -> Vec<ApiRequest> {
        self.served.lock().unwrap().clone()
    }

    pub fn served_to(&self, path: &str) -> Vec<ApiRequest> {
        self.served()
            .into_iter()
            .filter(|request| request.path == path)
            .collect()
    }

    async fn refresh(&self) -> HttpResponse {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if self.gated {
            self.refresh_gate
                .acquire()
                .await
                .expect("refresh gate closed")
                .forget();
        }
        if *self.refresh_rejects.lock().unwrap() {
            return envelope(
                StatusCode::UNAUTHORIZED,
                "Refresh token not found",
                Value::Null,
            );
        }
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let token = format!("token-{}", n);
        self.set_valid_token(&token);
        envelope(
            StatusCode::OK,
            "Token refreshed successfully",
            json!({ "accessToken": token, "username": "alice" }),
        )
    }
}

#[async_trait]
impl Transport for FakeBackend {
    async fn execute(&self, request: &ApiRequest) -> Result<HttpResponse> {
        self.served.lock().unwrap().push(request.clone());

        if request.path == REFRESH_PATH {
            return Ok(self.refresh().await);
        }

        let rotation = {
            let mut rotate_on = self.rotate_on.lock().unwrap();
            let matches = rotate_on
                .as_ref()
                .is_some_and(|(path, _)| *path == request.path);
            if matches { rotate_on.take() } else { None }
        };
        if let Some((_, context)) = rotation {
            context
                .tokens()
                .set(Some(Credential::new(self.valid_token())));
        }

        let authorized = request.bearer() == Some(self.valid_token().as_str())
            && !self.always_unauthorized.lock().unwrap().contains(&request.path);
        if !authorized {
            return Ok(envelope(StatusCode::UNAUTHORIZED, "Token expired", Value::Null));
        }
        Ok(envelope(
            StatusCode::OK,
            "Success",
            json!({ "path": request.path }),
        ))
    }
}

/// Counts sign-in redirects.
#[derive(Default)]
pub struct RecordingNavigator {
    locations: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn locations(&self) -> Vec<String> {
        self.locations.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect_to_sign_in(&self, location: &str) {
        self.locations.lock().unwrap().push(location.to_string());
    }
}

pub fn client_for(
    backend: Arc<FakeBackend>,
    navigator: Arc<RecordingNavigator>,
) -> Arc<ApiClient> {
    Arc::new(
        ApiClient::builder(backend, SessionContext::new())
            .navigator(navigator)
            .build(),
    )
}
