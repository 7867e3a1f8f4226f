//! Replay command: run the extraction pipeline against a saved results page.
//!
//! Useful when JustWatch changes its markup: save the page from a real
//! browser, replay it, and compare with the selectors.

use crate::browser::FixtureBrowser;
use crate::commands::SearchCommand;
use crate::config::Config;
use crate::justwatch::Session;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

/// Extracts results from a saved HTML page instead of a live browser.
pub struct ReplayCommand {
    config: Config,
}

impl ReplayCommand {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Serves `page` for every URL and searches it for `title`.
    pub async fn execute(&self, page: &Path, title: &str) -> Result<String> {
        let html = std::fs::read_to_string(page)
            .with_context(|| format!("Failed to read saved page: {}", page.display()))?;
        debug!("Replaying {} ({} bytes)", page.display(), html.len());

        let browser = FixtureBrowser::new().with_fallback_page(&html);
        let mut session = Session::open(browser, self.config.session_options())
            .await
            .context("Failed to open replay session")?;

        let result =
            SearchCommand::new(self.config.clone()).execute_with_session(&session, title).await;
        session.close().await;
        result
    }
}
