use crate::models::LinkedRecord;
use std::time::{Duration, Instant};
use tracing::info;

/// Logs how long a stage took when dropped.
pub struct Timer {
    label: &'static str,
    start: Instant,
}

impl Timer {
    pub fn start(label: &'static str) -> Self {
        info!("⏱  {}...", label);
        Self {
            label,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        info!("⏱  {} done in {:.2?}", self.label, self.elapsed());
    }
}

/// Plain-text table of a view for the terminal.
pub fn format_view(title: &str, rows: &[LinkedRecord]) -> String {
    const HEADERS: [&str; 6] = ["Symbol", "Name", "Price", "Change", "Change %", "Link"];

    let cells: Vec<[&str; 6]> = rows
        .iter()
        .map(|r| {
            [
                r.record.symbol.as_str(),
                r.record.name.as_str(),
                r.record.price.as_str(),
                r.record.change.as_str(),
                r.record.change_percent.as_str(),
                r.link.as_str(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &cells {
        for (w, c) in widths.iter_mut().zip(row) {
            *w = (*w).max(c.chars().count());
        }
    }

    let line = |row: &[&str; 6]| {
        row.iter()
            .zip(widths)
            .map(|(c, w)| format!("{:<w$}", c, w = w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = format!("{}\n{}\n", title, line(&HEADERS));
    out.push_str(&"─".repeat(widths.iter().sum::<usize>() + 2 * (widths.len() - 1)));
    out.push('\n');
    if cells.is_empty() {
        out.push_str("(none)\n");
    }
    for row in &cells {
        out.push_str(&line(row));
        out.push('\n');
    }
    out
}
