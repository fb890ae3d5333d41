use crate::error::{ReportError, ReportResult};
use crate::models::{IndexRecord, LinkedRecord, MajorIndexView, MoverView};
use std::cmp::Ordering;
use tracing::debug;

// ── Links ─────────────────────────────────────────────────────────────────────

/// Quote-page URL for a symbol. Every `^` becomes `%5E`; nothing else is
/// touched. `"^GSPC"` → `{base}%5EGSPC/`
pub fn quote_link(base: &str, symbol: &str) -> String {
    let base = base.trim_end_matches('/');
    format!("{}/{}/", base, symbol.replace('^', "%5E"))
}

fn linked(record: IndexRecord, quote_base: &str) -> LinkedRecord {
    let link = quote_link(quote_base, &record.symbol);
    LinkedRecord { record, link }
}

// ── Percentages ───────────────────────────────────────────────────────────────

/// Parse a change-percent cell in percentage points.
/// `"+1.01%"` → 1.01 | `"-1.25%"` → -1.25 | `"N/A"` → error
pub fn parse_change_pct(s: &str) -> ReportResult<f64> {
    let num = s.trim().trim_end_matches('%').trim();
    match num.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ReportError::Parse {
            value: s.to_string(),
        }),
    }
}

// ── Views ─────────────────────────────────────────────────────────────────────

/// Rows whose symbol is on the allow-list, in input order.
pub fn derive_major_indices(
    records: &[IndexRecord],
    symbols: &[String],
    quote_base: &str,
) -> MajorIndexView {
    let rows = records
        .iter()
        .filter(|r| symbols.iter().any(|s| *s == r.symbol))
        .cloned()
        .map(|r| linked(r, quote_base))
        .collect();

    MajorIndexView {
        symbols: symbols.to_vec(),
        rows,
    }
}

/// Rows with `pct > upper || pct < lower`, largest move first.
///
/// Cells that do not parse are left out of this view only.
pub fn derive_movers(
    records: &[IndexRecord],
    upper_threshold: f64,
    lower_threshold: f64,
    quote_base: &str,
) -> MoverView {
    let mut scored: Vec<(f64, &IndexRecord)> = records
        .iter()
        .filter_map(|r| match parse_change_pct(&r.change_percent) {
            Ok(v) => Some((v, r)),
            Err(e) => {
                debug!("{}: {}", r.symbol, e);
                None
            }
        })
        .filter(|(v, _)| *v > upper_threshold || *v < lower_threshold)
        .collect();

    // stable: equal moves keep page order (0.0 and -0.0 included)
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

    MoverView {
        upper_threshold,
        lower_threshold,
        rows: scored
            .into_iter()
            .map(|(_, r)| linked(r.clone(), quote_base))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://finance.yahoo.com/quote/";

    fn rec(symbol: &str, pct: &str) -> IndexRecord {
        IndexRecord {
            symbol: symbol.into(),
            name: format!("{} name", symbol),
            price: "1.00".into(),
            change: "0.00".into(),
            change_percent: pct.into(),
        }
    }

    fn majors() -> Vec<String> {
        vec!["^GSPC".into(), "^DJI".into(), "^IXIC".into()]
    }

    #[test]
    fn test_quote_link_replaces_every_caret() {
        assert_eq!(quote_link(BASE, "^GSPC"), "https://finance.yahoo.com/quote/%5EGSPC/");
        assert_eq!(quote_link(BASE, "^^X^"), "https://finance.yahoo.com/quote/%5E%5EX%5E/");
        assert_eq!(quote_link(BASE, "000001.SS"), "https://finance.yahoo.com/quote/000001.SS/");
        assert_eq!(quote_link("https://q.example", "DX-Y.NYB"), "https://q.example/DX-Y.NYB/");
    }

    #[test]
    fn test_parse_change_pct() {
        assert_eq!(parse_change_pct("+1.01%").unwrap(), 1.01);
        assert_eq!(parse_change_pct("-1.25%").unwrap(), -1.25);
        assert_eq!(parse_change_pct(" 0.05 %% ").unwrap(), 0.05);
        assert_eq!(parse_change_pct("3").unwrap(), 3.0);
        for bad in ["N/A", "-", "", "%", "NaN%", "inf%", "1,2%"] {
            assert!(
                matches!(parse_change_pct(bad), Err(ReportError::Parse { .. })),
                "{bad:?} should not parse"
            );
        }
    }

    #[test]
    fn test_major_indices_keep_input_order() {
        let records = vec![rec("^IXIC", "+0.1%"), rec("^FTSE", "+2%"), rec("^GSPC", "-0.2%")];
        let view = derive_major_indices(&records, &majors(), BASE);
        let symbols: Vec<_> = view.rows.iter().map(|r| r.record.symbol.as_str()).collect();
        assert_eq!(symbols, ["^IXIC", "^GSPC"]);
        assert_eq!(view.rows[0].link, "https://finance.yahoo.com/quote/%5EIXIC/");
        assert_eq!(view.symbols, majors());
    }

    #[test]
    fn test_major_match_is_exact() {
        let records = vec![rec("^gspc", "+0.1%"), rec(" ^DJI", "+0.1%"), rec("^DJIA", "+0.1%")];
        assert!(derive_major_indices(&records, &majors(), BASE).rows.is_empty());
    }

    #[test]
    fn test_movers_sorted_and_bounded() {
        let records = vec![
            rec("A", "+0.75%"),
            rec("B", "-1.00%"),
            rec("C", "-3.10%"),
            rec("D", "+0.76%"),
            rec("E", "+2.40%"),
            rec("F", "-1.01%"),
            rec("G", "N/A"),
            rec("H", "+0.10%"),
        ];
        let view = derive_movers(&records, 0.75, -1.0, BASE);
        let symbols: Vec<_> = view.rows.iter().map(|r| r.record.symbol.as_str()).collect();
        assert_eq!(symbols, ["E", "D", "F", "C"]);

        let values: Vec<f64> = view
            .rows
            .iter()
            .map(|r| parse_change_pct(&r.record.change_percent).unwrap())
            .collect();
        assert!(values.windows(2).all(|w| w[0] >= w[1]));
        assert!(values.iter().all(|v| *v > 0.75 || *v < -1.0));
    }

    #[test]
    fn test_movers_ties_keep_page_order() {
        let records = vec![rec("X", "+1.50%"), rec("Y", "+1.5%"), rec("Z", "+1.50")];
        let view = derive_movers(&records, 0.75, -1.0, BASE);
        let symbols: Vec<_> = view.rows.iter().map(|r| r.record.symbol.as_str()).collect();
        assert_eq!(symbols, ["X", "Y", "Z"]);
    }

    #[test]
    fn test_signed_zero_moves_tie() {
        let records = vec![rec("N", "-0.00%"), rec("P", "0.00%"), rec("Q", "+0.00%")];
        let view = derive_movers(&records, -0.5, -1.0, BASE);
        let symbols: Vec<_> = view.rows.iter().map(|r| r.record.symbol.as_str()).collect();
        assert_eq!(symbols, ["N", "P", "Q"]);
    }

    #[test]
    fn test_unparsable_rows_only_leave_movers() {
        let records = vec![rec("^GSPC", "N/A"), rec("^DJI", "-")];
        assert!(derive_movers(&records, 0.75, -1.0, BASE).rows.is_empty());
        assert_eq!(derive_major_indices(&records, &majors(), BASE).rows.len(), 2);
    }
}
