use crate::config::MismatchPolicy;
use crate::error::ReportError;
use crate::models::{
    COL_CHANGE, COL_CHANGE_PCT, COL_NAME, COL_PRICE, COL_SYMBOL, INDEX_COLUMNS, IndexRecord,
    RawRow,
};
use tracing::warn;

/// Records that bound cleanly, plus what was done about the ones that did not.
#[derive(Debug, Default)]
pub struct Normalized {
    pub records: Vec<IndexRecord>,
    /// One `SchemaMismatch` per row dropped under [`MismatchPolicy::Reject`].
    pub rejected: Vec<ReportError>,
    /// Rows kept under [`MismatchPolicy::Pad`] after padding or truncation.
    pub padded: usize,
}

/// Bind each row onto the nine-column page schema and keep the five
/// columns the report uses.
///
/// The page is an external contract that drifts; a row whose width is not
/// exactly nine cells is never bound silently.
pub fn normalize(rows: Vec<RawRow>, policy: MismatchPolicy) -> Normalized {
    let expected = INDEX_COLUMNS.len();
    let mut out = Normalized::default();

    for (i, mut row) in rows.into_iter().enumerate() {
        if row.len() != expected {
            let mismatch = ReportError::SchemaMismatch {
                row: i,
                expected,
                found: row.len(),
            };
            match policy {
                MismatchPolicy::Reject => {
                    warn!("Dropping row: {} ({:?})", mismatch, row.first());
                    out.rejected.push(mismatch);
                    continue;
                }
                MismatchPolicy::Pad => {
                    warn!("Binding anyway: {} ({:?})", mismatch, row.first());
                    row.resize(expected, String::new());
                    out.padded += 1;
                }
            }
        }

        out.records.push(bind(row));
    }

    if !out.rejected.is_empty() && out.records.is_empty() {
        warn!(
            "Every row ({}) failed the {}-column check; page layout has likely changed",
            out.rejected.len(),
            expected
        );
    }

    out
}

fn bind(mut row: RawRow) -> IndexRecord {
    let mut take = |i: usize| std::mem::take(&mut row[i]);
    IndexRecord {
        symbol: take(COL_SYMBOL),
        name: take(COL_NAME),
        price: take(COL_PRICE),
        change: take(COL_CHANGE),
        change_percent: take(COL_CHANGE_PCT),
    }
}
