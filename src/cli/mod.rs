//! CLI module
//!
//! # Commands
//!
//! - `serve` - Start the web server
//! - `fetch` - Walk the listing to stdout with a pre-issued token

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
