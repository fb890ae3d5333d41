use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub email: EmailConfig,
}

/// Which page-fetching backend to run.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Headless Chromium; renders client-side content.
    #[default]
    Chromium,
    /// Plain GET of the server-rendered markup.
    Http,
}

/// Scraper configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScraperConfig {
    #[serde(default)]
    pub backend: Backend,

    #[serde(default = "default_page_url")]
    pub page_url: String,

    #[serde(default = "default_quote_url_base")]
    pub quote_url_base: String,

    #[serde(default = "default_table_selector")]
    pub table_selector: String,

    #[serde(default = "default_navigation_timeout_secs")]
    pub navigation_timeout_secs: u64,

    #[serde(default = "default_visibility_timeout_secs")]
    pub visibility_timeout_secs: u64,

    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Browser binary; `GOOGLE_CHROME_BIN` is consulted when unset.
    #[serde(default)]
    pub chrome_path: Option<PathBuf>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// How the normaliser treats rows whose width is not nine cells.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MismatchPolicy {
    /// Drop the row and log a warning.
    #[default]
    Reject,
    /// Pad with empty cells or truncate, then keep the row (flagged in the log).
    Pad,
}

/// View derivation configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilterConfig {
    #[serde(default = "default_major_symbols")]
    pub major_symbols: Vec<String>,

    #[serde(default = "default_upper_threshold")]
    pub upper_threshold: f64,

    #[serde(default = "default_lower_threshold")]
    pub lower_threshold: f64,

    #[serde(default)]
    pub mismatch_policy: MismatchPolicy,
}

/// SMTP configuration. Identities have no defaults and must come from the
/// environment or a local config file.
#[derive(Clone, Deserialize, Serialize)]
pub struct EmailConfig {
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    #[serde(default)]
    pub sender: String,

    #[serde(default)]
    pub credential: String,

    #[serde(default)]
    pub recipient: String,

    #[serde(default = "default_smtp_timeout_secs")]
    pub timeout_secs: u64,
}

impl fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("sender", &self.sender)
            .field("credential", &"<redacted>")
            .field("recipient", &self.recipient)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_page_url() -> String {
    "https://finance.yahoo.com/markets/world-indices/".to_string()
}
fn default_quote_url_base() -> String {
    "https://finance.yahoo.com/quote/".to_string()
}
fn default_table_selector() -> String {
    "table[data-testid='table-container']".to_string()
}
fn default_navigation_timeout_secs() -> u64 {
    60
}
fn default_visibility_timeout_secs() -> u64 {
    30
}
fn default_settle_delay_ms() -> u64 {
    3000
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36"
        .to_string()
}
fn default_major_symbols() -> Vec<String> {
    vec!["^GSPC".into(), "^DJI".into(), "^IXIC".into()]
}
fn default_upper_threshold() -> f64 {
    0.75
}
fn default_lower_threshold() -> f64 {
    -1.0
}
fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}
fn default_smtp_port() -> u16 {
    587
}
fn default_smtp_timeout_secs() -> u64 {
    30
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            page_url: default_page_url(),
            quote_url_base: default_quote_url_base(),
            table_selector: default_table_selector(),
            navigation_timeout_secs: default_navigation_timeout_secs(),
            visibility_timeout_secs: default_visibility_timeout_secs(),
            settle_delay_ms: default_settle_delay_ms(),
            chrome_path: None,
            user_agent: default_user_agent(),
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            major_symbols: default_major_symbols(),
            upper_threshold: default_upper_threshold(),
            lower_threshold: default_lower_threshold(),
            mismatch_policy: MismatchPolicy::default(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            sender: String::new(),
            credential: String::new(),
            recipient: String::new(),
            timeout_secs: default_smtp_timeout_secs(),
        }
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

/// `WIR__` variables. Values stay strings until deserialised, so a credential
/// such as `00123456` is never coerced into a number.
fn environment() -> config::Environment {
    config::Environment::with_prefix("WIR")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("filter.major_symbols")
}

impl AppConfig {
    /// Load configuration from file + environment overrides
    /// (`WIR__EMAIL__SENDER`, `WIR__FILTER__UPPER_THRESHOLD`, ...).
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(environment())
            .build()?;

        Ok(cfg.try_deserialize()?)
    }
}
