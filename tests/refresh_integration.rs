mod common;

use std::sync::Arc;

use common::{FakeBackend, RecordingNavigator, client_for, wait_until};
use futures::future::join_all;
use serde_json::Value;
use storefront::api::{ApiClient, ClientError, REFRESH_PATH};
use storefront::features::AuthSession;
use storefront::metrics::Metrics;
use storefront::session::{Credential, SessionContext};

/// Fires `n` requests with an expired credential while the refresh endpoint
/// is held closed, then releases it once every request is parked.
async fn burst(
    backend: &Arc<FakeBackend>,
    client: &Arc<ApiClient>,
    n: usize,
) -> Vec<Result<Value, ClientError>> {
    let handles: Vec<_> = (0..n)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move { client.get::<Value>(&format!("/orders/{}", i)).await })
        })
        .collect();

    let coordinator_client = client.clone();
    let refresh_backend = backend.clone();
    wait_until("every request to join the refresh", move || {
        refresh_backend.refresh_calls() == 1
            && coordinator_client.context().refresh().pending_waiters() == n - 1
    })
    .await;
    backend.release_refresh();

    join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.expect("request task panicked"))
        .collect()
}

async fn concurrent_expiry_shares_one_refresh(n: usize) {
    let backend = FakeBackend::gated();
    let navigator = Arc::new(RecordingNavigator::default());
    let client = client_for(backend.clone(), navigator.clone());
    client
        .context()
        .establish(Credential::from("expired"), Some("alice".to_string()));

    let results = burst(&backend, &client, n).await;

    assert_eq!(backend.refresh_calls(), 1);
    for (i, result) in results.into_iter().enumerate() {
        let body = result.unwrap_or_else(|e| panic!("request {} failed: {:?}", i, e));
        assert_eq!(body["path"], format!("/orders/{}", i));
    }
    for i in 0..n {
        let served = backend.served_to(&format!("/orders/{}", i));
        assert_eq!(served.len(), 2, "request {} should be replayed exactly once", i);
        assert_eq!(served[0].bearer(), Some("expired"));
        assert_eq!(served[1].bearer(), Some("token-1"));
    }
    assert_eq!(
        client.context().tokens().get(),
        Some(Credential::from("token-1"))
    );
    assert!(!client.context().refresh().is_refreshing());
    assert!(navigator.locations().is_empty());
}

/// A single expired request refreshes once and is replayed.
#[tokio::test]
async fn test_single_expired_request_refreshes_once() {
    concurrent_expiry_shares_one_refresh(1).await;
}

/// Five concurrent expired requests share one refresh exchange.
#[tokio::test]
async fn test_five_concurrent_requests_share_one_refresh() {
    concurrent_expiry_shares_one_refresh(5).await;
}

/// A hundred concurrent expired requests still cause exactly one exchange.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_hundred_concurrent_requests_share_one_refresh() {
    concurrent_expiry_shares_one_refresh(100).await;
}

/// When the exchange fails every waiting request fails, the session is
/// cleared, and the user is sent to sign-in once.
#[tokio::test]
async fn test_refresh_failure_rejects_all_and_navigates_once() {
    let backend = FakeBackend::gated();
    backend.reject_refresh();
    let navigator = Arc::new(RecordingNavigator::default());
    let client = client_for(backend.clone(), navigator.clone());
    client
        .context()
        .establish(Credential::from("expired"), Some("alice".to_string()));

    let results = burst(&backend, &client, 5).await;

    assert_eq!(backend.refresh_calls(), 1);
    for result in results {
        match result {
            Err(ClientError::Refresh(err)) => {
                assert_eq!(err.status, Some(401));
                assert_eq!(err.message, "Refresh token not found");
            }
            other => panic!("expected a refresh failure, got {:?}", other),
        }
    }
    assert!(client.context().tokens().get().is_none());
    assert!(client.context().current_user().is_none());
    assert!(!client.context().refresh().is_refreshing());
    assert_eq!(navigator.locations(), vec!["/login".to_string()]);
    // Nothing was replayed after the failed exchange.
    assert_eq!(backend.served().len(), 5 + 1);
}

/// Session restore leads a failing exchange while expired requests queue
/// behind it: the requests fail and the user is sent to sign-in once.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failed_restore_with_waiting_requests_navigates_once() {
    let backend = FakeBackend::gated();
    backend.reject_refresh();
    let navigator = Arc::new(RecordingNavigator::default());
    let client = client_for(backend.clone(), navigator.clone());
    client
        .context()
        .establish(Credential::from("expired"), Some("alice".to_string()));
    let session = Arc::new(AuthSession::new(client.clone()));

    let restore = {
        let session = session.clone();
        tokio::spawn(async move { session.bootstrap().await })
    };
    let refresh_backend = backend.clone();
    wait_until("the restore to start the exchange", move || {
        refresh_backend.refresh_calls() == 1
    })
    .await;

    let requests: Vec<_> = (0..3)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move { client.get::<Value>(&format!("/orders/{}", i)).await })
        })
        .collect();
    let coordinator_client = client.clone();
    wait_until("every request to queue behind the restore", move || {
        coordinator_client.context().refresh().pending_waiters() == 3
    })
    .await;
    backend.release_refresh();

    assert!(!restore.await.expect("restore task panicked"));
    for joined in join_all(requests).await {
        match joined.expect("request task panicked") {
            Err(ClientError::Refresh(err)) => assert_eq!(err.status, Some(401)),
            other => panic!("expected a refresh failure, got {:?}", other),
        }
    }
    assert_eq!(backend.refresh_calls(), 1);
    assert!(!session.is_authenticated());
    assert_eq!(navigator.locations(), vec!["/login".to_string()]);
}

/// A failed restore with nothing waiting on it stays on the current page.
#[tokio::test]
async fn test_failed_restore_alone_does_not_navigate() {
    let backend = FakeBackend::new();
    backend.reject_refresh();
    let navigator = Arc::new(RecordingNavigator::default());
    let client = client_for(backend.clone(), navigator.clone());
    let session = AuthSession::new(client);

    assert!(!session.bootstrap().await);
    assert_eq!(backend.refresh_calls(), 1);
    assert!(navigator.locations().is_empty());
}

/// A 401 on a replayed request is final: no second refresh, no loop.
#[tokio::test]
async fn test_unauthorized_after_replay_is_terminal() {
    let backend = FakeBackend::new();
    backend.always_unauthorized("/admin/reports");
    let navigator = Arc::new(RecordingNavigator::default());
    let client = client_for(backend.clone(), navigator.clone());
    client.context().tokens().set(Some(Credential::from("expired")));

    let err = client.get::<Value>("/admin/reports").await.unwrap_err();

    assert!(matches!(err, ClientError::Unauthorized { ref message } if message == "Token expired"));
    assert_eq!(backend.refresh_calls(), 1);
    assert_eq!(backend.served_to("/admin/reports").len(), 2);
    // The refresh itself succeeded, so the session survives.
    assert_eq!(
        client.context().tokens().get(),
        Some(Credential::from("token-1"))
    );
    assert!(navigator.locations().is_empty());
}

/// Once a refresh completes the window reopens for the next expiry.
#[tokio::test]
async fn test_consecutive_expiries_each_refresh() {
    let backend = FakeBackend::new();
    let navigator = Arc::new(RecordingNavigator::default());
    let client = client_for(backend.clone(), navigator);
    client.context().tokens().set(Some(Credential::from("expired")));

    client.get::<Value>("/orders").await.unwrap();
    assert_eq!(backend.refresh_calls(), 1);

    backend.set_valid_token("rotated-elsewhere");
    client.get::<Value>("/orders").await.unwrap();
    assert_eq!(backend.refresh_calls(), 2);
    assert_eq!(
        client.context().tokens().get(),
        Some(Credential::from("token-2"))
    );
}

/// Requests joined on one task reuse the credential from the first refresh.
#[tokio::test]
async fn test_joined_requests_exchange_once() {
    let backend = FakeBackend::new();
    let navigator = Arc::new(RecordingNavigator::default());
    let client = client_for(backend.clone(), navigator);
    client.context().tokens().set(Some(Credential::from("expired")));

    let (a, b) = tokio::join!(
        client.get::<Value>("/orders/a"),
        client.get::<Value>("/orders/b")
    );
    a.unwrap();
    b.unwrap();

    assert_eq!(backend.refresh_calls(), 1);
    assert_eq!(backend.served_to(REFRESH_PATH).len(), 1);
}

/// A credential rotated while the request was in flight is reused without
/// another exchange.
#[tokio::test]
async fn test_rotated_credential_replays_without_refresh() {
    let backend = FakeBackend::new();
    backend.set_valid_token("fresh-from-elsewhere");
    let context = SessionContext::new();
    context.tokens().set(Some(Credential::from("expired")));
    backend.rotate_during("/orders/7", context.clone());
    let client = ApiClient::builder(backend.clone(), context).build();

    let body: Value = client.get("/orders/7").await.unwrap();

    assert_eq!(body["path"], "/orders/7");
    assert_eq!(backend.refresh_calls(), 0);
    let served = backend.served_to("/orders/7");
    assert_eq!(served.len(), 2);
    assert_eq!(served[1].bearer(), Some("fresh-from-elsewhere"));
}

/// Refresh outcomes and released waiters are counted.
#[tokio::test]
async fn test_refresh_metrics_are_recorded() {
    let backend = FakeBackend::new();
    let metrics = Metrics::new();
    let client = ApiClient::builder(backend, SessionContext::new())
        .metrics(metrics.clone())
        .build();
    client.context().tokens().set(Some(Credential::from("expired")));

    client.get::<Value>("/orders").await.unwrap();

    let text = metrics.render();
    assert!(text.contains("refresh_exchanges_total{result=\"success\"} 1"));
}
