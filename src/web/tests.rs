//! Tests for the web route layer

use super::*;
use crate::config::{AppConfig, CursorMode};
use crate::pager::PageFetcher;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(authority: &str, graph_url: &str, cursor_mode: &str) -> AppConfig {
    let cursor_mode = cursor_mode.to_string();
    AppConfig::from_lookup(move |key| match key {
        "MAILWALK_CLIENT_ID" => Some("client-123".to_string()),
        "MAILWALK_CLIENT_SECRET" => Some("secret-456".to_string()),
        "MAILWALK_TENANT" => Some(authority.to_string()),
        "MAILWALK_GRAPH_URL" => Some(graph_url.to_string()),
        "MAILWALK_CURSOR_MODE" => Some(cursor_mode.clone()),
        _ => None,
    })
    .unwrap()
}

async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response {
    let mut request = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Mount a Graph token endpoint returning a fixed bearer token
async fn mount_token_endpoint(mock_server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/oauth2/v2.0/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-xyz",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_homepage_renders() {
    let config = config_for("https://login.example.com", "https://graph.example.com", "shared");
    let app = router(AppState::from_config(&config).unwrap());

    let response = get(&app, "/", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_string(response).await;
    assert!(body.contains("Mailwalk Generator"));
}

#[tokio::test]
async fn test_login_redirects_to_provider() {
    let config = config_for("https://login.example.com", "https://graph.example.com", "shared");
    let app = router(AppState::from_config(&config).unwrap());

    let response = get(&app, "/login", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let location = response.headers()[header::LOCATION].to_str().unwrap();
    assert!(location.starts_with("https://login.example.com/oauth2/v2.0/authorize"));
    assert!(location.contains("client_id=client-123"));
    assert!(location.contains("response_type=code"));
    assert!(location.contains("state="));
}

#[tokio::test]
async fn test_generator_requires_login() {
    let config = config_for("https://login.example.com", "https://graph.example.com", "shared");
    let app = router(AppState::from_config(&config).unwrap());

    let response = get(&app, "/generator", None).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_string(response).await;
    assert!(body.contains("Not logged in"));
}

#[tokio::test]
async fn test_authorized_reports_provider_error() {
    let config = config_for("https://login.example.com", "https://graph.example.com", "shared");
    let app = router(AppState::from_config(&config).unwrap());

    let response = get(
        &app,
        "/login/authorized?error=access_denied&error_description=nope",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_string(response).await;
    assert!(body.contains("access_denied"));
}

#[tokio::test]
async fn test_authorized_without_code() {
    let config = config_for("https://login.example.com", "https://graph.example.com", "shared");
    let app = router(AppState::from_config(&config).unwrap());

    let response = get(&app, "/login/authorized", None).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_string(response).await;
    assert!(body.contains("missing authorization code"));
}

#[tokio::test]
async fn test_login_walk_shared_cursor() {
    let mock_server = MockServer::start().await;
    mount_token_endpoint(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/me/messages"))
        .and(query_param("$skip", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"subject": "third"}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/me/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"subject": "first"}, {"subject": "second"}],
            "@odata.nextLink": format!("{}/me/messages?$skip=2", mock_server.uri())
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = config_for(&mock_server.uri(), &mock_server.uri(), "shared");
    let app = router(AppState::from_config(&config).unwrap());

    // Complete the login round trip
    let oauth_state = URL_SAFE_NO_PAD.encode("/generator");
    let response = get(
        &app,
        &format!("/login/authorized?code=auth-code&state={oauth_state}"),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[header::LOCATION].to_str().unwrap(),
        "/generator"
    );

    // Every request advances the same process-wide cursor
    for expected in ["first", "second", "third"] {
        let response = get(&app, "/generator", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        let body = body_string(response).await;
        assert!(body.contains(expected), "expected {expected} in {body}");
    }

    // Exhausted: rendered as end of collection, no further fetches
    let response = get(&app, "/generator", None).await;
    let body = body_string(response).await;
    assert!(body.contains("End of collection"));
}

#[tokio::test]
async fn test_per_session_cursors_do_not_interleave() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"subject": "first"}, {"subject": "second"}]
        })))
        .mount(&mock_server)
        .await;

    let config = config_for("https://login.example.com", &mock_server.uri(), "per-session");
    let state = AppState::from_config(&config).unwrap();
    state.session.set_token("tok", Some(3600)).await;
    let app = router(state);

    // First request gets a fresh cursor and a session cookie
    let response = get(&app, "/generator", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with(CURSOR_COOKIE));
    let body = body_string(response).await;
    assert!(body.contains("first"));

    // Same cookie advances the same cursor
    let response = get(&app, "/generator", Some(&cookie)).await;
    let body = body_string(response).await;
    assert!(body.contains("second"));

    // A cookieless request starts over from the beginning
    let response = get(&app, "/generator", None).await;
    assert!(response.headers().contains_key(header::SET_COOKIE));
    let body = body_string(response).await;
    assert!(body.contains("first"));
}

/// Fetcher whose first call stalls until released
struct StallingFetcher {
    calls: AtomicUsize,
    entered: Notify,
    release: Notify,
}

impl StallingFetcher {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl PageFetcher for StallingFetcher {
    async fn fetch_page(&self, _endpoint: &str) -> crate::error::Result<Value> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call == 0 {
            self.entered.notify_one();
            self.release.notified().await;
        }
        Ok(json!({"value": [call]}))
    }
}

#[tokio::test]
async fn test_per_session_fetch_does_not_block_other_sessions() {
    let fetcher = Arc::new(StallingFetcher::new());
    let store = Arc::new(CursorStore::new(
        CursorMode::PerSession,
        fetcher.clone(),
        "me/messages",
    ));

    // First session enters its fetch and stalls there
    let slow = tokio::spawn({
        let store = store.clone();
        async move { store.next_item(Some("tab-a")).await }
    });
    fetcher.entered.notified().await;

    // A second session advances while the first is still mid-fetch
    let step = store.next_item(Some("tab-b")).await.unwrap();
    assert!(step.item.is_some());

    fetcher.release.notify_one();
    let step = slow.await.unwrap().unwrap();
    assert!(step.item.is_some());
}

/// Fetcher serving one single-item page to every caller
struct SinglePageFetcher;

#[async_trait]
impl PageFetcher for SinglePageFetcher {
    async fn fetch_page(&self, _endpoint: &str) -> crate::error::Result<Value> {
        Ok(json!({"value": [1]}))
    }
}

#[tokio::test]
async fn test_per_session_cursor_count_is_bounded() {
    let store = CursorStore::new(
        CursorMode::PerSession,
        Arc::new(SinglePageFetcher),
        "me/messages",
    );

    for i in 0..(MAX_SESSION_CURSORS + 50) {
        let key = format!("session-{i}");
        store.next_item(Some(&key)).await.unwrap();
    }

    assert_eq!(store.cursor_count().await, MAX_SESSION_CURSORS);
}

#[tokio::test]
async fn test_static_assets_served() {
    let config = config_for("https://login.example.com", "https://graph.example.com", "shared");
    let app = router(AppState::from_config(&config).unwrap());

    let response = get(&app, "/static/site.css", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}
