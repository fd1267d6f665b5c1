//! Application configuration
//!
//! Credentials and endpoints are sourced from `MAILWALK_*` environment
//! variables. Everything except the client id and secret has a default
//! suitable for running the sample against Microsoft Graph locally.

use crate::error::{Error, Result};
use std::str::FromStr;

/// Default permission scopes requested at login
pub const DEFAULT_SCOPES: &[&str] = &["User.Read", "Mail.Read"];

/// Default OAuth authority (tenant)
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com/common";

/// Default Graph API base URL
pub const DEFAULT_GRAPH_URL: &str = "https://graph.microsoft.com/v1.0";

/// How the `/generator` route scopes its pagination cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorMode {
    /// One process-wide cursor; every request advances the same sequence.
    /// Faithful to the original sample: concurrent browser tabs interleave.
    #[default]
    Shared,
    /// One cursor per browser session, keyed by cookie.
    PerSession,
}

impl FromStr for CursorMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "shared" => Ok(Self::Shared),
            "per-session" | "per_session" => Ok(Self::PerSession),
            other => Err(Error::config(format!(
                "Unknown cursor mode '{other}' (expected 'shared' or 'per-session')"
            ))),
        }
    }
}

/// Runtime configuration for the application
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// OAuth client id
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Redirect URI registered with the provider
    pub redirect_uri: String,
    /// Requested permission scopes
    pub scopes: Vec<String>,
    /// OAuth authority base URL (authorize/token endpoints hang off this)
    pub authority: String,
    /// Graph API base URL
    pub graph_url: String,
    /// Optional mail folder to scope the listing to
    pub folder: Option<String>,
    /// Cursor scoping for the generator route
    pub cursor_mode: CursorMode,
    /// Bind host for the web server
    pub host: String,
    /// Bind port for the web server
    pub port: u16,
}

impl AppConfig {
    /// Load configuration from `MAILWALK_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let client_id = lookup("MAILWALK_CLIENT_ID")
            .ok_or_else(|| Error::missing_field("MAILWALK_CLIENT_ID"))?;
        let client_secret = lookup("MAILWALK_CLIENT_SECRET")
            .ok_or_else(|| Error::missing_field("MAILWALK_CLIENT_SECRET"))?;

        let scopes = lookup("MAILWALK_SCOPES").map_or_else(
            || DEFAULT_SCOPES.iter().map(ToString::to_string).collect(),
            |raw| {
                raw.split([' ', ','])
                    .filter(|s| !s.is_empty())
                    .map(ToString::to_string)
                    .collect()
            },
        );

        let cursor_mode = match lookup("MAILWALK_CURSOR_MODE") {
            Some(raw) => raw.parse()?,
            None => CursorMode::default(),
        };

        let port = match lookup("MAILWALK_PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| Error::config(format!("Invalid MAILWALK_PORT: {raw}")))?,
            None => 5000,
        };

        Ok(Self {
            client_id,
            client_secret,
            redirect_uri: lookup("MAILWALK_REDIRECT_URI")
                .unwrap_or_else(|| "http://localhost:5000/login/authorized".to_string()),
            scopes,
            authority: lookup("MAILWALK_TENANT").unwrap_or_else(|| DEFAULT_AUTHORITY.to_string()),
            graph_url: lookup("MAILWALK_GRAPH_URL")
                .unwrap_or_else(|| DEFAULT_GRAPH_URL.to_string()),
            folder: lookup("MAILWALK_FOLDER").filter(|f| !f.is_empty()),
            cursor_mode,
            host: lookup("MAILWALK_HOST").unwrap_or_else(|| "localhost".to_string()),
            port,
        })
    }

    /// Authorize endpoint derived from the authority
    pub fn authorize_endpoint(&self) -> String {
        format!("{}/oauth2/v2.0/authorize", self.authority.trim_end_matches('/'))
    }

    /// Token endpoint derived from the authority
    pub fn token_endpoint(&self) -> String {
        format!("{}/oauth2/v2.0/token", self.authority.trim_end_matches('/'))
    }

    /// Starting listing endpoint, scoped to the configured folder if any.
    ///
    /// The unscoped listing is `me/messages`; a named folder maps to
    /// `me/mailFolders/{folder}/messages`.
    pub fn start_endpoint(&self) -> String {
        match &self.folder {
            Some(folder) => format!("me/mailFolders/{folder}/messages"),
            None => "me/messages".to_string(),
        }
    }
}
