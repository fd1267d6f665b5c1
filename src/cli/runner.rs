//! Command execution

use super::commands::{Cli, Commands};
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::pager::Pager;
use crate::session::GraphSession;
use crate::web;
use std::sync::Arc;
use tracing::info;

/// Executes a parsed CLI invocation
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a runner for the parsed CLI
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the selected command
    pub async fn run(self) -> Result<()> {
        match self.cli.command {
            Commands::Serve {
                host,
                port,
                folder,
                cursor_mode,
            } => {
                let mut config = AppConfig::from_env()?;
                if let Some(host) = host {
                    config.host = host;
                }
                if let Some(port) = port {
                    config.port = port;
                }
                if let Some(folder) = folder {
                    config.folder = Some(folder);
                }
                if let Some(mode) = cursor_mode {
                    config.cursor_mode = mode.parse()?;
                }
                web::serve(config).await
            }

            Commands::Fetch {
                token,
                folder,
                max_items,
            } => {
                let mut config = AppConfig::from_env()?;
                if let Some(folder) = folder {
                    config.folder = Some(folder);
                }

                let token = token
                    .or_else(|| std::env::var("MAILWALK_ACCESS_TOKEN").ok())
                    .ok_or_else(|| Error::missing_field("MAILWALK_ACCESS_TOKEN"))?;

                let session = Arc::new(GraphSession::new(&config));
                session.set_token(token, None).await;

                let mut pager = Pager::new(session, config.start_endpoint());
                let mut printed = 0usize;
                while let Some(item) = pager.next_item().await? {
                    println!("{}", serde_json::to_string(&item)?);
                    printed += 1;
                    if max_items > 0 && printed >= max_items {
                        break;
                    }
                }

                info!(
                    "Fetched {printed} items over {} pages",
                    pager.pages_fetched()
                );
                Ok(())
            }
        }
    }
}
