mod common;

use axum::body::to_bytes;
use axum::http::StatusCode;
use axum::http::header::LOCATION;
use common::{TEST_CONFIG, build_app, config_from_yaml, page_request};
use mockito::{Matcher, Server};
use tower::ServiceExt;

fn location(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get(LOCATION)
        .expect("Location header missing")
        .to_str()
        .expect("Location header not valid UTF-8")
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    String::from_utf8(bytes.to_vec()).expect("body should be UTF-8")
}

/// Protected pages without a session redirect to sign-in, keeping path and query.
#[tokio::test]
async fn test_protected_page_without_session_redirects_to_sign_in() {
    let app = build_app(config_from_yaml(TEST_CONFIG));

    let response = app
        .clone()
        .oneshot(page_request("/account/orders?tab=open", None))
        .await
        .expect("request should succeed");
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        location(&response),
        "/login?redirect=%2Faccount%2Forders%3Ftab%3Dopen"
    );

    let response = app
        .oneshot(page_request("/admin", Some("refreshToken=")))
        .await
        .expect("request should succeed");
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/login?redirect=%2Fadmin");
}

/// Guest-only pages with a session redirect to the landing page.
#[tokio::test]
async fn test_guest_page_with_session_redirects_to_landing() {
    let app = build_app(config_from_yaml(TEST_CONFIG));

    let response = app
        .oneshot(page_request("/login", Some("theme=dark; refreshToken=r1")))
        .await
        .expect("request should succeed");
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/account");
}

/// Allowed pages fall through to the renderer, which is absent here.
#[tokio::test]
async fn test_allowed_page_without_renderer_is_not_found() {
    let app = build_app(config_from_yaml(TEST_CONFIG));

    let response = app
        .oneshot(page_request("/account", Some("refreshToken=r1")))
        .await
        .expect("request should succeed");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(response).await, r#"{"error":"Not found"}"#);
}

/// Static assets under a protected prefix are never redirected.
#[tokio::test]
async fn test_assets_bypass_gate() {
    let app = build_app(config_from_yaml(TEST_CONFIG));

    for path in ["/account/avatar.png", "/_next/static/chunks/app.js", "/api/orders"] {
        let response = app
            .clone()
            .oneshot(page_request(path, None))
            .await
            .expect("request should succeed");
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", path);
        assert!(response.headers().get(LOCATION).is_none(), "{}", path);
    }
}

/// Allowed pages are forwarded to the renderer with their cookies.
#[tokio::test]
async fn test_allowed_page_is_forwarded_to_renderer() {
    let mut server = Server::new_async().await;
    let page_mock = server
        .mock("GET", "/account")
        .match_query(Matcher::UrlEncoded("tab".into(), "profile".into()))
        .match_header("cookie", "refreshToken=r1")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body("<html>account</html>")
        .create_async()
        .await;

    let yaml = format!("{}edge:\n  render_upstream: {}\n", TEST_CONFIG, server.url());
    let app = build_app(config_from_yaml(&yaml));

    let response = app
        .oneshot(page_request("/account?tab=profile", Some("refreshToken=r1")))
        .await
        .expect("request should succeed");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/html"
    );
    assert_eq!(body_text(response).await, "<html>account</html>");
    page_mock.assert_async().await;
}

/// Health and metrics are served locally and the gate decisions are counted.
#[tokio::test]
async fn test_health_and_metrics() {
    let app = build_app(config_from_yaml(TEST_CONFIG));

    let response = app
        .clone()
        .oneshot(page_request("/health", None))
        .await
        .expect("request should succeed");
    assert_eq!(response.status(), StatusCode::OK);
    let health: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["service"], "Sport Shop");

    app.clone()
        .oneshot(page_request("/account", None))
        .await
        .expect("request should succeed");

    let response = app
        .oneshot(page_request("/metrics", None))
        .await
        .expect("request should succeed");
    assert_eq!(response.status(), StatusCode::OK);
    let text = body_text(response).await;
    assert!(text.contains("gate_decisions_total{decision=\"redirect_sign_in\"} 1"));
}
