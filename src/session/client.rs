//! Graph session implementation
//!
//! Wraps a reqwest client with the OAuth authorization-code flow and bearer
//! token handling. Tokens are cached behind an `RwLock` so one login serves
//! every subsequent request for the lifetime of the process.

use super::types::CachedToken;
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::pager::PageFetcher;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

/// Authenticated session against a Graph-style API
pub struct GraphSession {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    scopes: Vec<String>,
    authorize_endpoint: String,
    token_endpoint: String,
    base_url: String,
    http: Client,
    token: Arc<RwLock<Option<CachedToken>>>,
}

impl GraphSession {
    /// Create a session from application config
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            scopes: config.scopes.clone(),
            authorize_endpoint: config.authorize_endpoint(),
            token_endpoint: config.token_endpoint(),
            base_url: config.graph_url.clone(),
            http: Client::new(),
            token: Arc::new(RwLock::new(None)),
        }
    }

    /// Build the provider authorize URL the browser is redirected to.
    ///
    /// `state` is returned verbatim by the provider on the redirect and
    /// carries the post-login target through the round trip.
    pub fn authorize_url(&self, state: &str) -> Result<Url> {
        let url = Url::parse_with_params(
            &self.authorize_endpoint,
            &[
                ("client_id", self.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("scope", &self.scopes.join(" ")),
                ("state", state),
            ],
        )?;
        Ok(url)
    }

    /// Exchange an authorization code for an access token and cache it
    pub async fn redeem_code(&self, code: &str) -> Result<()> {
        let form = [
            ("grant_type", "authorization_code"),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("code", code),
            ("redirect_uri", &self.redirect_uri),
            ("scope", &self.scopes.join(" ")),
        ];

        let response = self
            .http
            .post(&self.token_endpoint)
            .form(&form)
            .send()
            .await
            .map_err(Error::Http)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::token_exchange(format!(
                "Token request failed with status {status}: {body}"
            )));
        }

        let token_response: TokenResponse = response.json().await.map_err(Error::Http)?;
        debug!("Redeemed authorization code for access token");

        let mut cached = self.token.write().await;
        *cached = Some(token_response.into_cached_token());
        Ok(())
    }

    /// Install a pre-issued token (CLI fetch mode, tests)
    pub async fn set_token(&self, token: impl Into<String>, expires_in: Option<i64>) {
        let cached_token = match expires_in {
            Some(secs) => CachedToken::expires_in(token.into(), secs),
            None => CachedToken::new(token.into(), None),
        };
        let mut cached = self.token.write().await;
        *cached = Some(cached_token);
    }

    /// Whether a non-expired token is cached
    pub async fn is_authenticated(&self) -> bool {
        let cached = self.token.read().await;
        cached.as_ref().is_some_and(|t| !t.is_expired())
    }

    /// Issue an authenticated GET and parse the JSON body.
    ///
    /// `path` may be relative to the Graph base URL or a full URL, as next
    /// links returned by the service are absolute.
    pub async fn get_json(&self, path: &str) -> Result<Value> {
        let token = {
            let cached = self.token.read().await;
            match cached.as_ref() {
                Some(t) if !t.is_expired() => t.token.clone(),
                Some(_) => return Err(Error::not_authenticated("access token expired")),
                None => return Err(Error::not_authenticated("no access token, log in first")),
            }
        };

        let url = self.build_url(path);
        debug!("GET {url}");

        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(Error::Http)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::http_status(status.as_u16(), body));
        }

        let body: Value = response.json().await.map_err(Error::Http)?;
        Ok(body)
    }

    /// Build full URL from path
    fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }
}

impl std::fmt::Debug for GraphSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphSession")
            .field("client_id", &self.client_id)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl PageFetcher for GraphSession {
    async fn fetch_page(&self, endpoint: &str) -> Result<Value> {
        self.get_json(endpoint).await
    }
}

/// OAuth2 token response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    #[allow(dead_code)]
    token_type: Option<String>,
}

impl TokenResponse {
    fn into_cached_token(self) -> CachedToken {
        match self.expires_in {
            Some(secs) => CachedToken::expires_in(self.access_token, secs),
            None => CachedToken::new(self.access_token, None),
        }
    }
}
