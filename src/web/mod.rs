//! Web route layer
//!
//! Thin axum glue: the routes delegate to the session for auth and to the
//! cursor store for pagination; rendering goes through tera templates.

mod cursor;
mod server;
mod views;

pub use cursor::{CursorStep, CursorStore, CURSOR_COOKIE, MAX_SESSION_CURSORS};
pub use server::{router, serve, AppState};

#[cfg(test)]
mod tests;
