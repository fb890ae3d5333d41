//! Headless Chromium backend using chromiumoxide.
//!
//! Every call launches its own browser and tears it down before returning,
//! on success and on every error path. No pooling.

use crate::config::ScraperConfig;
use crate::error::{ReportError, ReportResult};
use crate::models::{RawRow, RawTable};
use crate::utils::Timer;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use super::IndexPageSource;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Browser binary to launch: explicit config, then `GOOGLE_CHROME_BIN`.
/// `None` leaves discovery to chromiumoxide.
pub fn resolve_chrome_path(config: &ScraperConfig) -> Option<PathBuf> {
    if let Some(p) = &config.chrome_path {
        return Some(p.clone());
    }
    std::env::var_os("GOOGLE_CHROME_BIN")
        .map(PathBuf::from)
        .filter(|p| p.exists())
}

fn visibility_script(selector: &str) -> String {
    // serde_json gives a correctly escaped JS string literal
    let sel = serde_json::to_string(selector).unwrap_or_else(|_| "\"table\"".into());
    format!(
        "(() => {{ const el = document.querySelector({sel}); if (!el) return false; \
         const r = el.getBoundingClientRect(); const s = window.getComputedStyle(el); \
         return r.width > 0 && r.height > 0 && s.visibility !== 'hidden' && s.display !== 'none'; }})()"
    )
}

/// Body rows as arrays of each cell's `innerText`, or `null` without the table.
fn rows_script(selector: &str) -> String {
    let sel = serde_json::to_string(selector).unwrap_or_else(|_| "\"table\"".into());
    format!(
        "(() => {{ const el = document.querySelector({sel}); if (!el) return null; \
         return Array.from(el.querySelectorAll('tbody tr'), \
           tr => Array.from(tr.cells, td => td.innerText.trim())); }})()"
    )
}

// ── Session ───────────────────────────────────────────────────────────────────

/// A launched browser plus the task pumping its CDP event stream.
struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl BrowserSession {
    async fn launch(config: &ScraperConfig) -> ReportResult<Self> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .request_timeout(Duration::from_secs(config.navigation_timeout_secs));

        if let Some(path) = resolve_chrome_path(config) {
            debug!("Using browser binary {:?}", path);
            builder = builder.chrome_executable(path);
        }

        let browser_config = builder.build().map_err(ReportError::BrowserLaunch)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ReportError::BrowserLaunch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        Ok(Self { browser, handler })
    }

    async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Browser close failed: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            warn!("Browser process wait failed: {}", e);
        }
        debug!("Browser closed");
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

// ── Source ────────────────────────────────────────────────────────────────────

pub struct ChromiumPageSource {
    config: ScraperConfig,
}

impl ChromiumPageSource {
    pub fn new(config: &ScraperConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    async fn scrape(&self, browser: &Browser) -> ReportResult<RawTable> {
        let url = &self.config.page_url;
        let selector = &self.config.table_selector;

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ReportError::BrowserLaunch(format!("new page: {e}")))?;

        info!("Navigating to {}", url);
        let nav_secs = self.config.navigation_timeout_secs;
        match timeout(Duration::from_secs(nav_secs), page.goto(url.as_str())).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                return Err(ReportError::Navigation {
                    url: url.clone(),
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                return Err(ReportError::Navigation {
                    url: url.clone(),
                    reason: format!("timed out after {}s", nav_secs),
                });
            }
        }

        sleep(Duration::from_millis(self.config.settle_delay_ms)).await;

        self.wait_visible(&page).await?;

        let capture_err = |reason: String| ReportError::Navigation {
            url: url.clone(),
            reason: format!("table capture: {reason}"),
        };
        let rows: Option<Vec<RawRow>> = page
            .evaluate(rows_script(selector))
            .await
            .map_err(|e| capture_err(e.to_string()))?
            .into_value()
            .map_err(|e| capture_err(e.to_string()))?;

        match rows {
            Some(rows) => {
                debug!("Captured {} rendered rows", rows.len());
                Ok(RawTable::Rendered(rows))
            }
            None => Err(ReportError::TableMissing {
                selector: selector.clone(),
            }),
        }
    }

    async fn wait_visible(&self, page: &Page) -> ReportResult<()> {
        let selector = &self.config.table_selector;
        let script = visibility_script(selector);
        let limit = self.config.visibility_timeout_secs;

        let poll = async {
            loop {
                match page.evaluate(script.as_str()).await {
                    Ok(r) => {
                        if r.into_value::<bool>().unwrap_or(false) {
                            return;
                        }
                    }
                    // the execution context can be swapped out while the page hydrates
                    Err(e) => debug!("Visibility check failed: {}", e),
                }
                sleep(POLL_INTERVAL).await;
            }
        };

        timeout(Duration::from_secs(limit), poll)
            .await
            .map_err(|_| ReportError::ScrapeTimeout {
                selector: selector.clone(),
                timeout_secs: limit,
            })
    }
}

#[async_trait]
impl IndexPageSource for ChromiumPageSource {
    async fn fetch_indices_page(&self) -> ReportResult<RawTable> {
        let _t = Timer::start("Browser scrape");
        let session = BrowserSession::launch(&self.config).await?;
        let result = self.scrape(&session.browser).await;
        session.close().await;
        result
    }

    fn name(&self) -> &'static str {
        "chromium"
    }
}
