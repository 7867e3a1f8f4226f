//! Search command implementation.

use crate::browser::Browser;
use crate::config::Config;
use crate::error::LookupError;
use crate::format::Formatter;
use crate::justwatch::Session;
use anyhow::{Context, Result};
use tracing::info;

/// Executes a one-shot title lookup.
pub struct SearchCommand {
    config: Config,
}

impl SearchCommand {
    /// Creates a new search command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Starts a browser, runs the search, and returns formatted output. The
    /// browser is released whether or not the search succeeds.
    pub async fn execute(&self, title: &str) -> Result<String> {
        let mut session =
            Session::launch(&self.config).await.context("Failed to start browser session")?;

        let result = self.execute_with_session(&session, title).await;
        session.close().await;
        result
    }

    /// Runs the search on an existing session (for testing and replay).
    pub async fn execute_with_session<B: Browser>(
        &self,
        session: &Session<B>,
        title: &str,
    ) -> Result<String> {
        let entries = match session.search(title).await {
            Ok(entries) => entries,
            Err(LookupError::NoResults { .. }) => Vec::new(),
            Err(e) => return Err(e).with_context(|| format!("Search for '{}' failed", title)),
        };

        info!("Found {} titles for {}", entries.len(), title);

        let formatter = Formatter::new(self.config.format);
        Ok(formatter.format_entries(&entries))
    }
}
