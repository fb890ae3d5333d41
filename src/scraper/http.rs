use crate::config::ScraperConfig;
use crate::error::{ReportError, ReportResult};
use crate::models::RawTable;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

use super::IndexPageSource;
use super::extractor::find_table;

/// Fetches the server-rendered markup with a single GET. Cheaper than the
/// browser but blind to anything built client-side.
pub struct HttpPageSource {
    inner: reqwest::Client,
    config: ScraperConfig,
}

impl HttpPageSource {
    pub fn new(config: &ScraperConfig) -> ReportResult<Self> {
        let inner = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.navigation_timeout_secs))
            .gzip(true)
            // consent redirects set cookies before landing on the page
            .cookie_store(true)
            .build()
            .map_err(|e| ReportError::Navigation {
                url: config.page_url.clone(),
                reason: format!("client build: {e}"),
            })?;

        Ok(Self {
            inner,
            config: config.clone(),
        })
    }

    fn nav_error(&self, reason: impl Into<String>) -> ReportError {
        ReportError::Navigation {
            url: self.config.page_url.clone(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl IndexPageSource for HttpPageSource {
    async fn fetch_indices_page(&self) -> ReportResult<RawTable> {
        let url = &self.config.page_url;
        info!("GET {}", url);

        let resp = self
            .inner
            .get(url)
            .send()
            .await
            .map_err(|e| self.nav_error(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(self.nav_error(format!("HTTP {}", status)));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| self.nav_error(format!("body read: {e}")))?;
        debug!("{} bytes from {}", body.len(), url);

        find_table(&body, &self.config.table_selector)?.ok_or_else(|| ReportError::TableMissing {
            selector: self.config.table_selector.clone(),
        })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
