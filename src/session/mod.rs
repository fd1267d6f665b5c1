//! Authenticated Graph session
//!
//! OAuth authorization-code login and an authenticated "GET resource, parse
//! JSON" operation. The rest of the application never talks to the provider
//! directly; it goes through [`GraphSession`].

mod client;
mod types;

pub use client::GraphSession;
pub use types::CachedToken;
