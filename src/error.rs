//! Error taxonomy for the scrape → report → email flow.

/// Everything that can go wrong between opening the indices page and
/// handing the report to the SMTP server.
#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("table `{selector}` not visible after {timeout_secs}s")]
    ScrapeTimeout { selector: String, timeout_secs: u64 },

    #[error("table `{selector}` not present in page")]
    TableMissing { selector: String },

    #[error("invalid CSS selector `{0}`")]
    InvalidSelector(String),

    #[error("failed to launch browser: {0}")]
    BrowserLaunch(String),

    #[error("row {row} has {found} cells, expected {expected}")]
    SchemaMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("not a percentage: {value:?}")]
    Parse { value: String },

    #[error("email transport: {0}")]
    EmailTransport(String),

    #[error("email setting `{0}` is empty")]
    MissingEmailSetting(&'static str),
}

pub type ReportResult<T> = Result<T, ReportError>;

impl From<lettre::transport::smtp::Error> for ReportError {
    fn from(e: lettre::transport::smtp::Error) -> Self {
        ReportError::EmailTransport(e.to_string())
    }
}

impl From<lettre::error::Error> for ReportError {
    fn from(e: lettre::error::Error) -> Self {
        ReportError::EmailTransport(format!("message build: {e}"))
    }
}

impl From<lettre::address::AddressError> for ReportError {
    fn from(e: lettre::address::AddressError) -> Self {
        ReportError::EmailTransport(format!("bad address: {e}"))
    }
}
