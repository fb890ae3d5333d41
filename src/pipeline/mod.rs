//! Pipeline orchestrator: page source → rows → records → views → report.
//!
//! One run is fully sequential and rebuilds everything from scratch. The
//! only thing handed back to the caller is the [`PipelineOutput`]; sending
//! it anywhere is the caller's business.

pub mod derive;
pub mod normalizer;

use crate::config::AppConfig;
use crate::error::ReportResult;
use crate::models::{MajorIndexView, MoverView, RawTable, Report};
use crate::report::eastern_now;
use crate::scraper::IndexPageSource;
use crate::scraper::extractor::extract_rows;
use chrono::DateTime;
use chrono_tz::Tz;
use tracing::info;

use self::derive::{derive_major_indices, derive_movers};
use self::normalizer::normalize;

pub struct Pipeline {
    config: AppConfig,
}

impl Pipeline {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Scrape the page and build the report. Scrape failures abort the run;
    /// no partial report is produced.
    pub async fn run(&self, source: &dyn IndexPageSource) -> ReportResult<PipelineOutput> {
        info!("=== Fetching indices page ({}) ===", source.name());
        let table = source.fetch_indices_page().await?;
        self.build(&table, eastern_now())
    }

    /// Everything after the fetch. Deterministic for a given table and time.
    pub fn build(&self, table: &RawTable, generated_at: DateTime<Tz>) -> ReportResult<PipelineOutput> {
        let filter = &self.config.filter;
        let quote_base = &self.config.scraper.quote_url_base;

        let rows = extract_rows(table)?;
        let rows_scraped = rows.len();

        let normalized = normalize(rows, filter.mismatch_policy);
        let records = normalized.records;

        let majors = derive_major_indices(&records, &filter.major_symbols, quote_base);
        let movers = derive_movers(
            &records,
            filter.upper_threshold,
            filter.lower_threshold,
            quote_base,
        );
        let report = Report::build(generated_at, &majors, &movers);

        let stats = PipelineStats {
            rows_scraped,
            records: records.len(),
            rows_rejected: normalized.rejected.len(),
            rows_padded: normalized.padded,
            majors: majors.rows.len(),
            movers: movers.rows.len(),
        };

        info!(
            "=== Done: {} rows | {} records | {} rejected | {} majors | {} movers ===",
            stats.rows_scraped, stats.records, stats.rows_rejected, stats.majors, stats.movers,
        );

        Ok(PipelineOutput {
            majors,
            movers,
            report,
            stats,
        })
    }
}

#[derive(Debug)]
pub struct PipelineOutput {
    pub majors: MajorIndexView,
    pub movers: MoverView,
    pub report: Report,
    pub stats: PipelineStats,
}

#[derive(Debug, Default, PartialEq)]
pub struct PipelineStats {
    pub rows_scraped: usize,
    pub records: usize,
    pub rows_rejected: usize,
    pub rows_padded: usize,
    pub majors: usize,
    pub movers: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use chrono_tz::US::Eastern;
    use tokio_test::{assert_err, assert_ok};

    /// Returns the table, or times out when there is none.
    struct CannedSource(Option<RawTable>);

    #[async_trait]
    impl IndexPageSource for CannedSource {
        async fn fetch_indices_page(&self) -> ReportResult<RawTable> {
            self.0.clone().ok_or_else(|| ReportError::ScrapeTimeout {
                selector: "table".into(),
                timeout_secs: 30,
            })
        }

        fn name(&self) -> &'static str {
            "canned"
        }
    }

    fn table(rows: &[&[&str]]) -> RawTable {
        let body: String = rows
            .iter()
            .map(|r| {
                let tds: String = r.iter().map(|c| format!("<td>{c}</td>")).collect();
                format!("<tr>{tds}</tr>")
            })
            .collect();
        RawTable::new(format!(
            "<table data-testid=\"table-container\"><thead><tr><th>Symbol</th></tr></thead><tbody>{body}</tbody></table>"
        ))
    }

    fn at() -> DateTime<Tz> {
        Eastern.with_ymd_and_hms(2025, 3, 14, 16, 0, 0).single().unwrap()
    }

    fn symbols(rows: &[crate::models::LinkedRecord]) -> Vec<&str> {
        rows.iter().map(|r| r.record.symbol.as_str()).collect()
    }

    #[test]
    fn test_three_index_scenario() {
        let t = table(&[
            &["^GSPC", "S&amp;P 500", "-", "5,000.00", "+50.00", "+1.01%", "-", "-", "-"],
            &["^DJI", "Dow", "-", "40,000", "-500", "-1.25%", "-", "-", "-"],
            &["^IXIC", "Nasdaq", "-", "16,000", "+10", "+0.05%", "-", "-", "-"],
        ]);
        let out = Pipeline::new(AppConfig::default()).build(&t, at()).unwrap();

        assert_eq!(symbols(&out.majors.rows), ["^GSPC", "^DJI", "^IXIC"]);
        assert_eq!(symbols(&out.movers.rows), ["^GSPC", "^DJI"]);
        assert_eq!(out.majors.rows[0].record.name, "S&P 500");
        assert_eq!(out.movers.rows[1].link, "https://finance.yahoo.com/quote/%5EDJI/");
        assert_eq!(
            out.stats,
            PipelineStats {
                rows_scraped: 3,
                records: 3,
                rows_rejected: 0,
                rows_padded: 0,
                majors: 3,
                movers: 2,
            }
        );
        assert!(out.report.html.contains("2025-03-14 16:00:00"));
    }

    #[test]
    fn test_empty_table_still_renders() {
        let pipeline = Pipeline::new(AppConfig::default());
        for t in [RawTable::default(), table(&[])] {
            let out = pipeline.build(&t, at()).unwrap();
            assert!(out.majors.rows.is_empty());
            assert!(out.movers.rows.is_empty());
            assert_eq!(out.report.html.matches("<table>").count(), 2);
        }
    }

    #[test]
    fn test_eight_cell_row_rejected() {
        let t = table(&[
            &["^DJI", "Dow", "-", "40,000", "-500", "-1.25%", "-", "-"],
            &["^IXIC", "Nasdaq", "-", "16,000", "+10", "+0.05%", "-", "-", "-"],
        ]);
        let out = Pipeline::new(AppConfig::default()).build(&t, at()).unwrap();
        assert_eq!(out.stats.rows_rejected, 1);
        assert_eq!(symbols(&out.majors.rows), ["^IXIC"]);
        assert!(out.movers.rows.is_empty());
    }

    #[test]
    fn test_same_input_same_report() {
        let t = table(&[&["^GSPC", "S&amp;P 500", "-", "5,000.00", "+50.00", "+1.01%", "-", "-", "-"]]);
        let pipeline = Pipeline::new(AppConfig::default());
        let a = pipeline.build(&t, at()).unwrap();
        let b = pipeline.build(&t, at()).unwrap();
        assert_eq!(a.report.html, b.report.html);
    }

    #[tokio::test]
    async fn test_run_uses_source() {
        let source = CannedSource(Some(table(&[&[
            "^FTSE", "FTSE 100", "-", "8,100", "-120", "-1.46%", "-", "-", "-",
        ]])));
        let out = assert_ok!(Pipeline::new(AppConfig::default()).run(&source).await);
        assert_eq!(symbols(&out.movers.rows), ["^FTSE"]);
        assert!(out.majors.rows.is_empty());
    }

    #[tokio::test]
    async fn test_scrape_failure_aborts_run() {
        let source = CannedSource(None);
        let err = assert_err!(Pipeline::new(AppConfig::default()).run(&source).await);
        assert!(matches!(err, ReportError::ScrapeTimeout { .. }));
    }
}
