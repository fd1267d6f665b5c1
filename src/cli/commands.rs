//! CLI commands and argument parsing

use clap::{Parser, Subcommand};

/// Mailwalk pagination sample CLI
#[derive(Parser, Debug)]
#[command(name = "mailwalk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the web server
    Serve {
        /// Bind host (overrides MAILWALK_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides MAILWALK_PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Mail folder to walk (overrides MAILWALK_FOLDER)
        #[arg(long)]
        folder: Option<String>,

        /// Cursor scoping: "shared" or "per-session"
        #[arg(long)]
        cursor_mode: Option<String>,
    },

    /// Walk the listing to stdout using a pre-issued access token
    Fetch {
        /// Bearer token (or MAILWALK_ACCESS_TOKEN)
        #[arg(long)]
        token: Option<String>,

        /// Mail folder to walk (overrides MAILWALK_FOLDER)
        #[arg(long)]
        folder: Option<String>,

        /// Maximum items to print (0 = unlimited)
        #[arg(long, default_value = "25")]
        max_items: usize,
    },
}
