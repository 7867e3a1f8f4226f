//! Live browser backend: headless Firefox driven over WebDriver.

use super::{Browser, DriverError, Element, Locator};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thirtyfour::extensions::query::ElementQuery;
use thirtyfour::prelude::*;
use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

/// Interval between polls while an element lookup waits.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// How long a freshly spawned driver may take to accept connections.
const DRIVER_STARTUP: Duration = Duration::from_secs(10);

/// Options for starting the browser.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Firefox executable; the driver's default lookup is used when unset.
    pub browser_binary: Option<PathBuf>,
    /// geckodriver executable. When set, it is spawned on `driver_port` and
    /// owned by the browser handle.
    pub driver_path: Option<PathBuf>,
    pub driver_port: u16,
    /// WebDriver endpoint used when no driver is spawned.
    pub webdriver_url: String,
    pub headless: bool,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            browser_binary: None,
            driver_path: None,
            driver_port: 4444,
            webdriver_url: "http://localhost:4444".to_string(),
            headless: true,
        }
    }
}

impl LaunchOptions {
    /// Endpoint the WebDriver client connects to.
    pub fn endpoint(&self) -> String {
        if self.driver_path.is_some() {
            format!("http://localhost:{}", self.driver_port)
        } else {
            self.webdriver_url.clone()
        }
    }
}

/// A WebDriver session plus the driver process it runs on, if spawned here.
pub struct WebDriverBrowser {
    driver: Option<WebDriver>,
    service: Option<Child>,
}

impl WebDriverBrowser {
    /// Starts the driver (when configured) and opens a browser session.
    ///
    /// On failure everything started so far is torn down before returning.
    pub async fn launch(options: &LaunchOptions) -> Result<Self, DriverError> {
        let mut browser = Self { driver: None, service: None };

        if let Err(e) = browser.start(options).await {
            if let Err(cleanup) = browser.quit().await {
                warn!("Cleanup after failed launch also failed: {}", cleanup);
            }
            return Err(e);
        }

        Ok(browser)
    }

    async fn start(&mut self, options: &LaunchOptions) -> Result<(), DriverError> {
        if let Some(path) = &options.driver_path {
            info!("Starting driver {} on port {}", path.display(), options.driver_port);
            let child = Command::new(path)
                .arg("--port")
                .arg(options.driver_port.to_string())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .kill_on_drop(true)
                .spawn()
                .map_err(|source| DriverError::Launch { path: path.clone(), source })?;
            let child = self.service.insert(child);
            wait_for_port(child, path, options.driver_port, DRIVER_STARTUP).await?;
        }

        let mut caps = DesiredCapabilities::firefox();
        if options.headless {
            caps.set_headless()?;
        }
        if let Some(binary) = &options.browser_binary {
            caps.set_firefox_binary(&binary.to_string_lossy())?;
        }

        let endpoint = options.endpoint();
        debug!("Connecting to WebDriver at {}", endpoint);
        let driver = WebDriver::new(endpoint.as_str(), caps).await?;
        // Waiting is done per lookup; the session-wide implicit wait stays off.
        driver.set_implicit_wait_timeout(Duration::ZERO).await?;
        self.driver = Some(driver);

        Ok(())
    }

    fn driver(&self) -> Result<&WebDriver, DriverError> {
        self.driver.as_ref().ok_or(DriverError::Closed)
    }
}

/// Polls until the spawned driver accepts TCP connections on `port`.
///
/// Fails if the driver exits first, e.g. because a stale driver already holds
/// the port; connecting to that one would silently reuse it.
async fn wait_for_port(
    child: &mut Child,
    path: &Path,
    port: u16,
    limit: Duration,
) -> Result<(), DriverError> {
    let deadline = Instant::now() + limit;
    loop {
        let exited = child
            .try_wait()
            .map_err(|source| DriverError::Launch { path: path.to_path_buf(), source })?;
        if let Some(status) = exited {
            return Err(DriverError::Launch {
                path: path.to_path_buf(),
                source: std::io::Error::other(format!(
                    "driver exited ({}) before accepting connections on port {}",
                    status, port
                )),
            });
        }
        if TcpStream::connect(("127.0.0.1", port)).await.is_ok() {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(DriverError::Timeout {
                target: format!("driver on port {}", port),
                waited: limit,
            });
        }
        sleep(Duration::from_millis(100)).await;
    }
}

fn with_timeout(query: ElementQuery, timeout: Duration) -> ElementQuery {
    if timeout.is_zero() {
        query.nowait()
    } else {
        query.wait(timeout, POLL_INTERVAL)
    }
}

#[async_trait]
impl Browser for WebDriverBrowser {
    type Element = WebElement;

    async fn goto(&self, url: &str) -> Result<(), DriverError> {
        debug!("GET {}", url);
        self.driver()?.goto(url).await?;
        Ok(())
    }

    async fn find_all(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Vec<WebElement>, DriverError> {
        let query = self.driver()?.query(By::Css(locator.css()));
        Ok(with_timeout(query, timeout).all_from_selector().await?)
    }

    async fn quit(&mut self) -> Result<(), DriverError> {
        let mut result = Ok(());

        if let Some(driver) = self.driver.take() {
            info!("Closing browser session");
            if let Err(e) = driver.quit().await {
                result = Err(DriverError::from(e));
            }
        }

        if let Some(mut child) = self.service.take() {
            debug!("Stopping driver process");
            if let Err(e) = child.kill().await {
                warn!("Failed to stop driver process: {}", e);
            }
        }

        result
    }
}

#[async_trait]
impl Element for WebElement {
    async fn find_all(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Vec<Self>, DriverError> {
        let query = self.query(By::Css(locator.css()));
        Ok(with_timeout(query, timeout).all_from_selector().await?)
    }

    async fn find_clickable(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Option<Self>, DriverError> {
        let query = self.query(By::Css(locator.css())).and_clickable();
        Ok(with_timeout(query, timeout).all_from_selector().await?.into_iter().next())
    }

    async fn shadow_root(&self) -> Result<Self, DriverError> {
        Ok(self.get_shadow_root().await?)
    }

    async fn text(&self) -> Result<String, DriverError> {
        Ok(WebElement::text(self).await?.trim().to_string())
    }

    async fn attr(&self, name: &str) -> Result<Option<String>, DriverError> {
        Ok(WebElement::attr(self, name).await?)
    }

    async fn click(&self) -> Result<(), DriverError> {
        Ok(WebElement::click(self).await?)
    }
}
