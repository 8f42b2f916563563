use futures_util::future::join_all;
use rentdesk_session::{
    ApiRequest, CredentialPair, MemoryTokenStore, RefreshError, SessionError, SessionManager,
    StoreError, TokenStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    session: SessionManager,
    store: Arc<MemoryTokenStore>,
    redirects: Arc<AtomicUsize>,
}

fn setup(server: &MockServer, credentials: Option<CredentialPair>) -> Harness {
    let store = Arc::new(match credentials {
        Some(pair) => MemoryTokenStore::with_credentials(&pair),
        None => MemoryTokenStore::new(),
    });
    let redirects = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&redirects);

    let session = SessionManager::builder(server.uri().parse().unwrap())
        .store(store.clone())
        .navigator(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }))
        .build();

    Harness {
        session,
        store,
        redirects,
    }
}

async fn mount_refresh(server: &MockServer, refresh_token: &str, new_access: &str, calls: u64) {
    Mock::given(method("POST"))
        .and(path("/auth/refresh/"))
        .and(body_json(json!({ "refresh": refresh_token })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access": new_access })))
        .expect(calls)
        .mount(server)
        .await;
}

async fn mount_rooms_for_token(server: &MockServer, token: &str, status: u16) {
    let template = if status == 200 {
        ResponseTemplate::new(200).set_body_json(json!([{ "id": 1 }]))
    } else {
        ResponseTemplate::new(status).set_body_json(json!({ "detail": "Token is invalid or expired" }))
    };
    Mock::given(method("GET"))
        .and(path("/rooms/"))
        .and(header("Authorization", format!("Bearer {}", token).as_str()))
        .respond_with(template)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_attaches_bearer_token() {
    let server = MockServer::start().await;
    let h = setup(&server, Some(CredentialPair::new("access-1", "refresh-1")));

    Mock::given(method("GET"))
        .and(path("/user/profile/"))
        .and(header("Authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 7 })))
        .expect(1)
        .mount(&server)
        .await;

    let response = h.session.send(ApiRequest::get("/user/profile/")).await.unwrap();
    assert_eq!(response.status(), 200);
    assert!(h.session.is_authenticated());
}

#[tokio::test]
async fn test_sends_anonymous_request_without_token() {
    let server = MockServer::start().await;
    let h = setup(&server, None);

    Mock::given(method("POST"))
        .and(path("/auth/login/"))
        .and(header_exists("Authorization"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access": "a", "refresh": "r" })))
        .expect(1)
        .mount(&server)
        .await;

    let request = ApiRequest::post("/auth/login/")
        .json(&json!({ "email": "jo@example.com", "password": "Secret123" }))
        .unwrap();
    let response = h.session.send(request).await.unwrap();

    assert_eq!(response.status(), 200);
    assert!(!h.session.is_authenticated());
}

#[tokio::test]
async fn test_refreshes_and_retries_once() {
    let server = MockServer::start().await;
    let h = setup(&server, Some(CredentialPair::new("stale", "refresh-1")));

    mount_refresh(&server, "refresh-1", "fresh", 1).await;
    mount_rooms_for_token(&server, "stale", 401).await;
    mount_rooms_for_token(&server, "fresh", 200).await;

    let response = h
        .session
        .send(ApiRequest::get("/rooms/").query("include_deleted", false))
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, json!([{ "id": 1 }]));
    assert_eq!(h.store.get(ACCESS_TOKEN_KEY).as_deref(), Some("fresh"));
    assert_eq!(h.store.get(REFRESH_TOKEN_KEY).as_deref(), Some("refresh-1"));
    assert_eq!(h.redirects.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_concurrent_failures_share_one_refresh() {
    let server = MockServer::start().await;
    let h = setup(&server, Some(CredentialPair::new("stale", "refresh-1")));

    Mock::given(method("POST"))
        .and(path("/auth/refresh/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access": "fresh" }))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_rooms_for_token(&server, "stale", 401).await;
    mount_rooms_for_token(&server, "fresh", 200).await;

    let requests = (0..5).map(|_| h.session.send(ApiRequest::get("/rooms/")));
    let responses = join_all(requests).await;

    for response in responses {
        assert_eq!(response.unwrap().status(), 200);
    }

    let retried_with_fresh = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|req| req.url.path() == "/rooms/")
        .count();
    assert_eq!(retried_with_fresh, 10);
    assert_eq!(h.store.get(ACCESS_TOKEN_KEY).as_deref(), Some("fresh"));
}

#[tokio::test]
async fn test_refresh_failure_clears_tokens_and_redirects() {
    let server = MockServer::start().await;
    let h = setup(&server, Some(CredentialPair::new("stale", "revoked")));

    Mock::given(method("POST"))
        .and(path("/auth/refresh/"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "detail": "Token is blacklisted" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rooms/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let result = h.session.send(ApiRequest::get("/rooms/")).await;

    match result {
        Err(SessionError::RefreshFailed(RefreshError::Rejected { status, body })) => {
            assert_eq!(status, 401);
            assert!(body.contains("blacklisted"));
        }
        other => panic!("Expected RefreshFailed, got {:?}", other),
    }
    assert_eq!(h.store.get(ACCESS_TOKEN_KEY), None);
    assert_eq!(h.store.get(REFRESH_TOKEN_KEY), None);
    assert_eq!(h.redirects.load(Ordering::SeqCst), 1);
    assert!(!h.session.is_authenticated());
}

#[tokio::test]
async fn test_concurrent_failures_share_one_failed_refresh() {
    let server = MockServer::start().await;
    let h = setup(&server, Some(CredentialPair::new("stale", "revoked")));

    Mock::given(method("POST"))
        .and(path("/auth/refresh/"))
        .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(200)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rooms/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let requests = (0..3).map(|_| h.session.send(ApiRequest::get("/rooms/")));
    let results = join_all(requests).await;

    for result in results {
        assert!(matches!(result, Err(SessionError::RefreshFailed(_))));
    }
    assert_eq!(h.redirects.load(Ordering::SeqCst), 1);
    assert!(!h.session.is_authenticated());
}

#[tokio::test]
async fn test_second_401_is_final() {
    let server = MockServer::start().await;
    let h = setup(&server, Some(CredentialPair::new("stale", "refresh-1")));

    mount_refresh(&server, "refresh-1", "fresh", 1).await;
    Mock::given(method("GET"))
        .and(path("/rooms/3/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let result = h.session.send(ApiRequest::get("/rooms/3/")).await;

    assert!(matches!(result, Err(SessionError::Unauthorized)));
    // The refresh itself succeeded, so the session stays
    assert_eq!(h.store.get(ACCESS_TOKEN_KEY).as_deref(), Some("fresh"));
    assert_eq!(h.redirects.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_missing_refresh_token_forces_logout() {
    let server = MockServer::start().await;
    let h = setup(&server, None);
    h.store.set(ACCESS_TOKEN_KEY, "stale").unwrap();

    Mock::given(method("POST"))
        .and(path("/auth/refresh/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rooms/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let result = h.session.send(ApiRequest::get("/rooms/")).await;

    assert!(matches!(
        result,
        Err(SessionError::RefreshFailed(RefreshError::MissingRefreshToken))
    ));
    assert_eq!(h.store.get(ACCESS_TOKEN_KEY), None);
    assert_eq!(h.redirects.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_anonymous_401_passes_through() {
    let server = MockServer::start().await;
    let h = setup(&server, None);

    Mock::given(method("POST"))
        .and(path("/auth/refresh/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/login/"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "error": "Invalid credentials" })),
        )
        .mount(&server)
        .await;

    let response = h.session.send(ApiRequest::post("/auth/login/")).await.unwrap();

    assert_eq!(response.status(), 401);
    assert_eq!(h.redirects.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_server_errors_pass_through_without_refresh() {
    let server = MockServer::start().await;
    let h = setup(&server, Some(CredentialPair::new("access-1", "refresh-1")));

    mount_refresh(&server, "refresh-1", "fresh", 0).await;
    Mock::given(method("DELETE"))
        .and(path("/rooms/4/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let response = h.session.send(ApiRequest::delete("/rooms/4/")).await.unwrap();

    assert_eq!(response.status(), 500);
    assert_eq!(response.text().await.unwrap(), "boom");
}

#[tokio::test]
async fn test_rotated_refresh_token_is_stored() {
    let server = MockServer::start().await;
    let h = setup(&server, Some(CredentialPair::new("stale", "refresh-1")));

    Mock::given(method("POST"))
        .and(path("/auth/refresh/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access": "fresh", "refresh": "refresh-2" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let token = h.session.refresh().await.unwrap();

    assert_eq!(token, "fresh");
    assert_eq!(h.session.access_token().as_deref(), Some("fresh"));
    assert_eq!(h.session.refresh_token().as_deref(), Some("refresh-2"));
}

#[tokio::test]
async fn test_auto_refresh_disabled_returns_401() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryTokenStore::with_credentials(&CredentialPair::new(
        "stale",
        "refresh-1",
    )));
    let session = SessionManager::builder(server.uri().parse().unwrap())
        .store(store)
        .auto_refresh(false)
        .build();

    mount_refresh(&server, "refresh-1", "fresh", 0).await;
    Mock::given(method("GET"))
        .and(path("/rooms/"))
        .and(query_param("include_deleted", "true"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let response = session
        .send(ApiRequest::get("/rooms/").query("include_deleted", true))
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn test_end_session_clears_and_redirects() {
    let server = MockServer::start().await;
    let h = setup(&server, Some(CredentialPair::new("a", "r")));

    h.session.end_session();

    assert!(!h.session.is_authenticated());
    assert_eq!(h.session.refresh_token(), None);
    assert_eq!(h.redirects.load(Ordering::SeqCst), 1);
}

/// Store whose access-token removal always fails
struct StuckAccessTokenStore {
    inner: MemoryTokenStore,
}

impl TokenStore for StuckAccessTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        if key == ACCESS_TOKEN_KEY {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only session file",
            )));
        }
        self.inner.remove(key)
    }
}

#[tokio::test]
async fn test_clear_credentials_removes_refresh_token_when_access_removal_fails() {
    let server = MockServer::start().await;
    let session = SessionManager::builder(server.uri().parse().unwrap())
        .store(Arc::new(StuckAccessTokenStore {
            inner: MemoryTokenStore::with_credentials(&CredentialPair::new("a", "r")),
        }))
        .build();

    let err = session.clear_credentials().unwrap_err();

    assert!(matches!(err, SessionError::Storage(StoreError::Io(_))));
    assert_eq!(session.refresh_token(), None);
}
