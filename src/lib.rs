//! # Mailwalk
//!
//! A minimal sample web application demonstrating pagination against a
//! Graph-style REST API using a lazy pull-based pager. It authenticates a
//! user via the OAuth authorization-code flow, then walks a paginated
//! mail-message listing page by page, yielding one item per request to a
//! web view.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mailwalk::{config::AppConfig, pager::Pager, session::GraphSession};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> mailwalk::Result<()> {
//!     let config = AppConfig::from_env()?;
//!     let session = Arc::new(GraphSession::new(&config));
//!     session.set_token("pre-issued-token", None).await;
//!
//!     let mut pager = Pager::new(session, config.start_endpoint());
//!     while let Some(message) = pager.next_item().await? {
//!         println!("{message}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! browser ──> web (axum routes) ──> CursorStore ──> Pager ──> GraphSession ──> Graph API
//!                    │                                              │
//!                    └── tera views                                 └── OAuth token cache
//! ```

#![warn(clippy::all)]

/// Error types
pub mod error;

/// Application configuration
pub mod config;

/// Authenticated Graph session (OAuth login + GET-as-JSON)
pub mod session;

/// Lazy pagination over the listing endpoint
pub mod pager;

/// Web route layer
pub mod web;

/// Command-line interface
pub mod cli;

pub use error::{Error, Result};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
