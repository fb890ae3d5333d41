pub mod browser;
pub mod extractor;
pub mod http;

use crate::config::{Backend, ScraperConfig};
use crate::error::{ReportError, ReportResult};
use crate::models::RawTable;
use async_trait::async_trait;
use tracing::info;
use url::Url;

use self::browser::ChromiumPageSource;
use self::http::HttpPageSource;

// ── Source trait ──────────────────────────────────────────────────────────────

/// Swappable page backend. Every implementation yields the world-indices
/// table, as markup or as rendered rows; an empty table is a valid result.
#[async_trait]
pub trait IndexPageSource: Send + Sync {
    async fn fetch_indices_page(&self) -> ReportResult<RawTable>;

    /// Short label for logs.
    fn name(&self) -> &'static str;
}

/// Build the backend selected in config.
pub fn build_source(config: &ScraperConfig) -> ReportResult<Box<dyn IndexPageSource>> {
    Url::parse(&config.page_url).map_err(|e| ReportError::Navigation {
        url: config.page_url.clone(),
        reason: format!("invalid URL: {e}"),
    })?;

    let source: Box<dyn IndexPageSource> = match config.backend {
        Backend::Chromium => Box::new(ChromiumPageSource::new(config)),
        Backend::Http => Box::new(HttpPageSource::new(config)?),
    };
    info!("Page source: {}", source.name());
    Ok(source)
}
