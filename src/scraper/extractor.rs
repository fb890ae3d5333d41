use crate::error::{ReportError, ReportResult};
use crate::models::{RawRow, RawTable};
use scraper::{ElementRef, Html, Node, Selector};
use tracing::debug;

fn selector(s: &str) -> ReportResult<Selector> {
    Selector::parse(s).map_err(|_| ReportError::InvalidSelector(s.to_string()))
}

// ── Cell text ─────────────────────────────────────────────────────────────────

/// Elements whose text a browser never renders.
fn is_unrendered(el: &ElementRef) -> bool {
    let v = el.value();
    if matches!(v.name(), "script" | "style" | "template" | "noscript") {
        return true;
    }
    if v.attr("hidden").is_some() || v.attr("aria-hidden") == Some("true") {
        return true;
    }
    v.attr("style")
        .map(|s| {
            let s: String = s.chars().filter(|c| !c.is_whitespace()).collect();
            let s = s.to_ascii_lowercase();
            s.contains("display:none") || s.contains("visibility:hidden")
        })
        .unwrap_or(false)
}

fn collect_text(el: ElementRef, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(t) => out.push_str(t),
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    if !is_unrendered(&child_el) {
                        collect_text(child_el, out);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Approximate `innerText` for static markup: hidden and non-visual
/// subtrees dropped, whitespace runs collapsed to one space.
pub fn cell_text(td: ElementRef) -> String {
    let mut raw = String::new();
    collect_text(td, &mut raw);
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ── Rows ──────────────────────────────────────────────────────────────────────

/// Split the captured table into rows of trimmed cell text.
///
/// Rows and cells keep DOM order because column position is what the
/// normaliser binds on. Header rows (`<thead>`) are skipped; body rows are
/// emitted whatever their width. Rows read in a live browser are passed
/// through with only a trim.
pub fn extract_rows(table: &RawTable) -> ReportResult<Vec<RawRow>> {
    let html = match table {
        RawTable::Rendered(rows) => {
            debug!("{} rows rendered by browser", rows.len());
            return Ok(rows
                .iter()
                .map(|r| r.iter().map(|c| c.trim().to_string()).collect())
                .collect());
        }
        RawTable::Markup(html) if html.trim().is_empty() => return Ok(vec![]),
        RawTable::Markup(html) => html,
    };

    let doc = Html::parse_fragment(html);
    let tr_sel = selector("tbody tr")?;
    let td_sel = selector("td")?;

    let rows: Vec<RawRow> = doc
        .select(&tr_sel)
        .map(|tr| tr.select(&td_sel).map(cell_text).collect())
        .collect();

    debug!("Extracted {} rows", rows.len());
    Ok(rows)
}

// ── Static page lookup ────────────────────────────────────────────────────────

/// Locate the indices table in a full HTML document.
pub fn find_table(page_html: &str, table_selector: &str) -> ReportResult<Option<RawTable>> {
    let doc = Html::parse_document(page_html);
    let sel = selector(table_selector)?;
    Ok(doc.select(&sel).next().map(|t| RawTable::new(t.html())))
}
