//! Cursor scoping for the generator route
//!
//! The original sample used one process-wide cursor: every request to the
//! generator advanced the same sequence, so two browser tabs interleave.
//! That behavior is kept as the default [`CursorMode::Shared`]; the
//! [`CursorMode::PerSession`] mode instead keys a cursor per browser session
//! via cookie.

use crate::config::CursorMode;
use crate::error::Result;
use crate::pager::{PageFetcher, Pager};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Cookie carrying the per-session cursor key
pub const CURSOR_COOKIE: &str = "mailwalk_cursor";

/// Upper bound on live per-session cursors. Cookieless visitors each get a
/// fresh cursor, so without a cap the map grows for the process lifetime.
pub const MAX_SESSION_CURSORS: usize = 256;

/// Holds the pagination cursor(s) behind the generator route
pub struct CursorStore {
    fetcher: Arc<dyn PageFetcher>,
    start_endpoint: String,
    state: StoreState,
}

enum StoreState {
    /// Single process-wide cursor
    Shared(Mutex<Pager>),
    /// One cursor per session key. Each pager carries its own lock so the
    /// map lock is never held across a fetch.
    PerSession(Mutex<HashMap<String, Arc<Mutex<Pager>>>>),
}

/// One advancement of a cursor
#[derive(Debug)]
pub struct CursorStep {
    /// The item pulled, or `None` when the sequence ended
    pub item: Option<Value>,
    /// Session key assigned on first use in per-session mode
    pub new_session_key: Option<String>,
}

impl CursorStore {
    /// Create a store for the given mode and starting endpoint
    pub fn new(
        mode: CursorMode,
        fetcher: Arc<dyn PageFetcher>,
        start_endpoint: impl Into<String>,
    ) -> Self {
        let start_endpoint = start_endpoint.into();
        let state = match mode {
            CursorMode::Shared => StoreState::Shared(Mutex::new(Pager::new(
                fetcher.clone(),
                start_endpoint.clone(),
            ))),
            CursorMode::PerSession => StoreState::PerSession(Mutex::new(HashMap::new())),
        };
        Self {
            fetcher,
            start_endpoint,
            state,
        }
    }

    /// The configured cursor mode
    pub fn mode(&self) -> CursorMode {
        match self.state {
            StoreState::Shared(_) => CursorMode::Shared,
            StoreState::PerSession(_) => CursorMode::PerSession,
        }
    }

    /// Advance the cursor belonging to `session_key` by one item.
    ///
    /// In shared mode the key is ignored and the single process-wide cursor
    /// advances. In per-session mode an unknown or missing key gets a fresh
    /// cursor starting at the beginning of the collection; cursors for
    /// different sessions fetch independently, only same-session requests
    /// serialize.
    pub async fn next_item(&self, session_key: Option<&str>) -> Result<CursorStep> {
        match &self.state {
            StoreState::Shared(pager) => {
                let item = pager.lock().await.next_item().await?;
                Ok(CursorStep {
                    item,
                    new_session_key: None,
                })
            }
            StoreState::PerSession(cursors) => {
                let (key, new_session_key) = match session_key {
                    Some(key) => (key.to_string(), None),
                    None => {
                        let key = Uuid::new_v4().to_string();
                        (key.clone(), Some(key))
                    }
                };

                // Clone the entry out and release the map lock before the
                // fetch; holding it across the await would stall every
                // other session behind one upstream round trip.
                let pager = {
                    let mut cursors = cursors.lock().await;
                    if !cursors.contains_key(&key) && cursors.len() >= MAX_SESSION_CURSORS {
                        // At capacity: drop an arbitrary cursor. Its owner
                        // starts over from the beginning on the next visit.
                        if let Some(evicted) = cursors.keys().next().cloned() {
                            cursors.remove(&evicted);
                        }
                    }
                    cursors
                        .entry(key)
                        .or_insert_with(|| {
                            Arc::new(Mutex::new(Pager::new(
                                self.fetcher.clone(),
                                self.start_endpoint.clone(),
                            )))
                        })
                        .clone()
                };

                let item = pager.lock().await.next_item().await?;
                Ok(CursorStep {
                    item,
                    new_session_key,
                })
            }
        }
    }

    /// Number of live cursors
    pub async fn cursor_count(&self) -> usize {
        match &self.state {
            StoreState::Shared(_) => 1,
            StoreState::PerSession(cursors) => cursors.lock().await.len(),
        }
    }
}

impl std::fmt::Debug for CursorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CursorStore")
            .field("mode", &self.mode())
            .field("start_endpoint", &self.start_endpoint)
            .finish_non_exhaustive()
    }
}
