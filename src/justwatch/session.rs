//! A browser session on JustWatch: bootstrap, consent, searches, shutdown.

use crate::browser::{Browser, DriverError, Element, WebDriverBrowser};
use crate::config::Config;
use crate::error::LookupError;
use crate::justwatch::country::Country;
use crate::justwatch::extract::{self, ExtractContext};
use crate::justwatch::models::MediaEntry;
use crate::justwatch::selectors::{self, consent, search};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Bounded waits used by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Default wait for elements expected on the page.
    pub implicit: Duration,
    /// Wait for the consent overlay and its accept button.
    pub consent: Duration,
    /// Wait for the first result row of a search.
    pub results: Duration,
    /// Wait for the home page during bootstrap. Zero leaves it unbounded.
    pub page_load: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            implicit: Duration::from_secs(10),
            consent: Duration::from_secs(10),
            results: Duration::from_secs(10),
            page_load: Duration::from_secs(30),
        }
    }
}

/// Everything a session needs besides the browser itself.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub country: Country,
    pub base_url: String,
    pub timeouts: Timeouts,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            country: Country::default(),
            base_url: selectors::BASE_URL.to_string(),
            timeouts: Timeouts::default(),
        }
    }
}

/// A live browser parked on JustWatch, ready to run searches.
///
/// Searches run one at a time; callers sharing a session across tasks must
/// serialize access (see [`crate::server`]).
pub struct Session<B: Browser> {
    browser: B,
    options: SessionOptions,
    closed: bool,
}

impl Session<WebDriverBrowser> {
    /// Launches headless Firefox as configured and opens a session on it.
    pub async fn launch(config: &Config) -> Result<Self, LookupError> {
        info!("Setting up browser...");
        let browser =
            WebDriverBrowser::launch(&config.launch_options()).await.map_err(LookupError::Bootstrap)?;
        Self::open(browser, config.session_options()).await
    }
}

impl<B: Browser> Session<B> {
    /// Opens the site's home page and dismisses the consent overlay.
    ///
    /// If the home page does not load in time the browser is released before
    /// the error is returned.
    pub async fn open(mut browser: B, options: SessionOptions) -> Result<Self, LookupError> {
        info!("Opening {}...", options.base_url);

        // A zero page-load bound means wait as long as the driver does
        let limit = options.timeouts.page_load;
        let loaded = if limit.is_zero() {
            browser.goto(&options.base_url).await
        } else {
            match tokio::time::timeout(limit, browser.goto(&options.base_url)).await {
                Ok(result) => result,
                Err(_) => Err(DriverError::Timeout { target: options.base_url.clone(), waited: limit }),
            }
        };

        if let Err(e) = loaded {
            if let Err(cleanup) = browser.quit().await {
                warn!("Failed to release browser after bootstrap error: {}", cleanup);
            }
            return Err(LookupError::Bootstrap(e));
        }

        let session = Self { browser, options, closed: false };
        info!("Accepting cookies...");
        session.accept_cookies().await;
        info!("JustWatch ready ({})", session.options.country);

        Ok(session)
    }

    pub fn country(&self) -> &Country {
        &self.options.country
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn browser(&self) -> &B {
        &self.browser
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Clicks "accept all" on the consent overlay if one is shown.
    ///
    /// Never fails: some regions show no overlay, and the page is usable
    /// either way.
    pub async fn accept_cookies(&self) {
        match self.try_accept_cookies().await {
            Ok(true) => debug!("Consent overlay dismissed"),
            Ok(false) => debug!("No consent overlay within {:?}", self.options.timeouts.consent),
            Err(e) => warn!("Could not dismiss consent overlay: {}", e),
        }
    }

    async fn try_accept_cookies(&self) -> Result<bool, DriverError> {
        let wait = self.options.timeouts.consent;

        let Some(overlay) = self.browser.find_all(&consent::OVERLAY, wait).await?.into_iter().next()
        else {
            return Ok(false);
        };

        let shadow = overlay.shadow_root().await?;
        let Some(button) = shadow.find_clickable(&consent::ACCEPT_BUTTON, wait).await? else {
            return Ok(false);
        };

        button.click().await?;
        Ok(true)
    }

    /// Searches for `name` and extracts every result row in page order.
    ///
    /// Returns [`LookupError::NoResults`] if no row appears within the results
    /// timeout.
    pub async fn search(&self, name: &str) -> Result<Vec<MediaEntry>, LookupError> {
        if self.closed {
            return Err(LookupError::Closed);
        }

        let country = &self.options.country;
        info!("Looking up {} (country: {})...", name, country);
        let url = selectors::search_url(&self.options.base_url, country, name);
        self.browser.goto(&url).await?;

        info!("Parsing response for {} (country: {})...", name, country);
        let waited = self.options.timeouts.results;
        let rows = self.browser.find_all(&search::ROW, waited).await?;
        if rows.is_empty() {
            return Err(LookupError::NoResults { query: name.to_string(), waited });
        }

        let ctx = ExtractContext { wait: self.options.timeouts.implicit, base_url: &self.options.base_url };
        let mut entries = Vec::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            entries.push(extract::parse_entry(row, index, &ctx).await?);
        }

        debug!("Extracted {} entries for {}", entries.len(), name);
        Ok(entries)
    }

    /// Releases the browser. Safe to call more than once; errors are logged.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Err(e) = self.browser.quit().await {
            warn!("Error while closing browser: {}", e);
        }
    }
}
