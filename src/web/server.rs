//! HTTP routes for the sample application
//!
//! Three routes of interest: home, the OAuth login pair, and the generator
//! route that advances the pagination cursor by one item per request. Static
//! assets are served from the `static/` directory.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::Deserialize;
use std::sync::Arc;
use tera::Tera;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::cursor::{CursorStore, CURSOR_COOKIE};
use super::views;
use crate::config::AppConfig;
use crate::error::Result;
use crate::session::GraphSession;

/// Where the browser lands after a successful login
const POST_LOGIN_TARGET: &str = "/generator";

/// App state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Authenticated session shared by every request
    pub session: Arc<GraphSession>,
    /// Pagination cursor(s)
    pub cursors: Arc<CursorStore>,
    /// Template registry
    pub templates: Arc<Tera>,
}

impl AppState {
    /// Build state from application config
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let session = Arc::new(GraphSession::new(config));
        let cursors = Arc::new(CursorStore::new(
            config.cursor_mode,
            session.clone(),
            config.start_endpoint(),
        ));
        let templates = Arc::new(views::templates()?);
        Ok(Self {
            session,
            cursors,
            templates,
        })
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(homepage))
        .route("/login", get(login))
        .route("/login/authorized", get(authorized))
        .route("/generator", get(generator))
        .nest_service("/static", ServeDir::new("static"))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server
pub async fn serve(config: AppConfig) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::from_config(&config)?;
    let app = router(state);

    info!("Starting server on http://{addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Render the home page
async fn homepage(State(state): State<AppState>) -> Response {
    match views::render_home(&state.templates) {
        Ok(body) => Html(body).into_response(),
        Err(e) => error_page(&state, &e.to_string()),
    }
}

/// Redirect the browser to the provider's authorize URL
async fn login(State(state): State<AppState>) -> Response {
    // The post-login target rides in the OAuth state parameter
    let oauth_state = URL_SAFE_NO_PAD.encode(POST_LOGIN_TARGET);
    match state.session.authorize_url(&oauth_state) {
        Ok(url) => Redirect::to(url.as_str()).into_response(),
        Err(e) => error_page(&state, &e.to_string()),
    }
}

/// Query parameters of the provider redirect
#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Handler for the application's redirect URI
async fn authorized(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Response {
    if let Some(error) = params.error {
        let detail = params.error_description.unwrap_or_default();
        return error_page(&state, &format!("Login refused: {error} {detail}"));
    }

    let Some(code) = params.code else {
        return error_page(&state, "Login callback missing authorization code");
    };

    if let Err(e) = state.session.redeem_code(&code).await {
        return error_page(&state, &e.to_string());
    }

    Redirect::to(&decode_target(params.state.as_deref())).into_response()
}

/// Pull the next item from the cursor and render it
async fn generator(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if !state.session.is_authenticated().await {
        return error_page(&state, "Not logged in, visit /login first");
    }

    let session_key = cookie_value(&headers, CURSOR_COOKIE);
    let step = match state.cursors.next_item(session_key.as_deref()).await {
        Ok(step) => step,
        Err(e) => return error_page(&state, &e.to_string()),
    };

    let body = match &step.item {
        Some(item) => views::render_item(&state.templates, item),
        None => views::render_done(&state.templates),
    };

    match body {
        Ok(body) => {
            let mut response = Html(body).into_response();
            if let Some(key) = step.new_session_key {
                let cookie = format!("{CURSOR_COOKIE}={key}; Path=/; HttpOnly");
                if let Ok(value) = header::HeaderValue::from_str(&cookie) {
                    response.headers_mut().insert(header::SET_COOKIE, value);
                }
            }
            response
        }
        Err(e) => error_page(&state, &e.to_string()),
    }
}

/// Render any failure as a 500 with the error template
fn error_page(state: &AppState, message: &str) -> Response {
    warn!("Request failed: {message}");
    match views::render_error(&state.templates, message) {
        Ok(body) => (StatusCode::INTERNAL_SERVER_ERROR, Html(body)).into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, message.to_string()).into_response(),
    }
}

/// Decode the post-login target from the OAuth state parameter.
///
/// Only local absolute paths are honored; anything else falls back to the
/// default target.
fn decode_target(raw: Option<&str>) -> String {
    raw.and_then(|raw| URL_SAFE_NO_PAD.decode(raw).ok())
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .filter(|target| target.starts_with('/') && !target.starts_with("//"))
        .unwrap_or_else(|| POST_LOGIN_TARGET.to_string())
}

/// Extract a cookie value from request headers
fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}
