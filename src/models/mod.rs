use chrono::DateTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

// ── Raw scrape output ─────────────────────────────────────────────────────────

/// Trimmed cell text of one `<tr>`, in DOM order.
pub type RawRow = Vec<String>;

/// The indices table as captured from the page.
#[derive(Debug, Clone, PartialEq)]
pub enum RawTable {
    /// `<table>` markup from a static fetch; cell text is recovered by the extractor.
    Markup(String),
    /// Cell `innerText` per body row, read inside a live browser.
    Rendered(Vec<RawRow>),
}

impl Default for RawTable {
    fn default() -> Self {
        RawTable::Rendered(vec![])
    }
}

impl RawTable {
    pub fn new(html: impl Into<String>) -> Self {
        RawTable::Markup(html.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            RawTable::Markup(html) => html.trim().is_empty(),
            RawTable::Rendered(rows) => rows.is_empty(),
        }
    }
}

// ── Column schema ─────────────────────────────────────────────────────────────

/// Column names of the world-indices table, in page order.
pub const INDEX_COLUMNS: [&str; 9] = [
    "Symbol",
    "Name",
    "Unused",
    "Price",
    "Change",
    "Change %",
    "Volume",
    "Day Range",
    "52 Wk Range",
];

pub const COL_SYMBOL: usize = 0;
pub const COL_NAME: usize = 1;
pub const COL_PRICE: usize = 3;
pub const COL_CHANGE: usize = 4;
pub const COL_CHANGE_PCT: usize = 5;

// ── Normalised rows ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IndexRecord {
    pub symbol: String,
    pub name: String,
    pub price: String,
    pub change: String,
    pub change_percent: String,
}

/// An [`IndexRecord`] plus its quote-page link.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinkedRecord {
    #[serde(flatten)]
    pub record: IndexRecord,
    pub link: String,
}

// ── Derived views ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MajorIndexView {
    /// Allow-list the rows were selected with.
    pub symbols: Vec<String>,
    pub rows: Vec<LinkedRecord>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MoverView {
    pub upper_threshold: f64,
    pub lower_threshold: f64,
    /// Sorted by parsed change percent, largest first.
    pub rows: Vec<LinkedRecord>,
}

// ── Report ────────────────────────────────────────────────────────────────────

/// Rendered HTML report, stamped in US Eastern time.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub generated_at: DateTime<Tz>,
    pub html: String,
}
