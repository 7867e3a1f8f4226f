//! DOM-query abstraction over a live (or recorded) browser page.
//!
//! Every lookup takes an explicit timeout. A lookup waits until at least one
//! element matches or the timeout elapses; a zero timeout performs a single
//! check without polling.

pub mod fixture;
pub mod webdriver;

use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub use fixture::{FixtureBrowser, FixtureElement, Journal};
pub use webdriver::{LaunchOptions, WebDriverBrowser};

/// How an element is located on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator {
    /// Element with the given `id` attribute.
    Id(&'static str),
    /// Element carrying the given class.
    Class(&'static str),
    /// Element with the given tag name.
    Tag(&'static str),
    /// Element with the given tag and an attribute equal to a value.
    Attr { tag: &'static str, name: &'static str, value: &'static str },
    /// Element matching any of the listed locators.
    AnyOf(&'static [Locator]),
}

impl Locator {
    /// Renders the locator as a CSS selector.
    pub fn css(&self) -> String {
        match self {
            Locator::Id(id) => format!("#{}", id),
            Locator::Class(class) => format!(".{}", class),
            Locator::Tag(tag) => (*tag).to_string(),
            Locator::Attr { tag, name, value } => format!("{}[{}=\"{}\"]", tag, name, value),
            Locator::AnyOf(alternatives) => {
                alternatives.iter().map(Locator::css).collect::<Vec<_>>().join(", ")
            }
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.css())
    }
}

/// Errors raised by a browser backend.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("timed out after {waited:?} waiting for {target}")]
    Timeout { target: String, waited: Duration },

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("element {0} has no shadow root")]
    NoShadowRoot(String),

    #[error("failed to launch driver at {}: {source}", path.display())]
    Launch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("browser session is closed")]
    Closed,

    #[error(transparent)]
    WebDriver(#[from] thirtyfour::error::WebDriverError),
}

/// A handle to one element of the current page.
#[async_trait]
pub trait Element: Clone + Send + Sync + Sized {
    /// Returns every descendant matching `locator`, waiting up to `timeout`
    /// for the first one to appear. An empty result means the wait timed out.
    async fn find_all(&self, locator: &Locator, timeout: Duration)
        -> Result<Vec<Self>, DriverError>;

    /// Waits up to `timeout` for a matching descendant that can be clicked.
    async fn find_clickable(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Option<Self>, DriverError>;

    /// Enters the element's shadow root. Lookups on the returned handle see the
    /// encapsulated subtree instead of the light DOM.
    async fn shadow_root(&self) -> Result<Self, DriverError>;

    /// Rendered text content, whitespace-normalized.
    async fn text(&self) -> Result<String, DriverError>;

    /// Raw attribute value.
    async fn attr(&self, name: &str) -> Result<Option<String>, DriverError>;

    async fn click(&self) -> Result<(), DriverError>;

    /// First matching descendant, or [`DriverError::Timeout`] if none appears.
    async fn find(&self, locator: &Locator, timeout: Duration) -> Result<Self, DriverError> {
        self.find_all(locator, timeout).await?.into_iter().next().ok_or_else(|| {
            DriverError::Timeout { target: locator.to_string(), waited: timeout }
        })
    }
}

/// A browser holding one page at a time.
#[async_trait]
pub trait Browser: Send + Sync {
    type Element: Element;

    /// Navigates the browser to `url` and waits for the document to load.
    async fn goto(&self, url: &str) -> Result<(), DriverError>;

    /// Page-level lookup, same waiting rules as [`Element::find_all`].
    async fn find_all(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Vec<Self::Element>, DriverError>;

    /// Releases the browser and any driver process. Calling it again is a no-op.
    async fn quit(&mut self) -> Result<(), DriverError>;
}
