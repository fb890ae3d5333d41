mod config;
mod error;
mod mailer;
mod models;
mod pipeline;
mod report;
mod scraper;
mod utils;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::AppConfig;
use crate::pipeline::{Pipeline, PipelineOutput};

#[derive(Parser)]
#[command(name = "world-indices-report", about = "World market indices report", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape the world-indices page and show the two views
    Scrape {
        /// Print the views as JSON instead of text tables
        #[arg(long)]
        json: bool,

        /// Also write the HTML report to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Scrape, render and email the report
    Email {
        /// Recipient (overrides WIR__EMAIL__RECIPIENT)
        #[arg(long)]
        to: Option<String>,
    },
}

async fn scrape(config: &AppConfig) -> Result<PipelineOutput> {
    let source = scraper::build_source(&config.scraper).context("Failed to build page source")?;
    Pipeline::new(config.clone())
        .run(source.as_ref())
        .await
        .context("Scrape failed; no report generated")
}

/// JSON shape of `scrape --json`. The timestamp is Eastern wall-clock time
/// without an offset, so the key names the zone.
fn views_json(out: &PipelineOutput) -> serde_json::Value {
    serde_json::json!({
        "generatedAtEastern": out.report.timestamp(),
        "majorIndices": out.majors,
        "movers": out.movers,
    })
}

fn show(out: &PipelineOutput, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&views_json(out))?);
        return Ok(());
    }

    println!("Date and Time (Eastern): {}\n", out.report.timestamp());
    println!("{}", utils::format_view("USA Major Indices", &out.majors.rows));
    println!("{}", utils::format_view("Indices on the Move", &out.movers.rows));
    println!(
        "{} rows scraped, {} kept ({} padded), {} rejected",
        out.stats.rows_scraped, out.stats.records, out.stats.rows_padded, out.stats.rows_rejected
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "world_indices_report=info,warn",
        1 => "world_indices_report=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::new(filter))
        .init();

    let mut config = AppConfig::load().context("Failed to load configuration")?;

    match cli.command {
        Command::Scrape { json, output } => {
            let out = scrape(&config).await?;
            show(&out, json)?;

            if let Some(path) = output {
                std::fs::write(&path, &out.report.html)
                    .with_context(|| format!("Failed to write {:?}", path))?;
                info!("Report written to {:?}", path);
            }
        }

        Command::Email { to } => {
            if let Some(to) = to {
                config.email.recipient = to;
            }
            // fail on missing settings before spending a browser launch
            mailer::check_settings(&config.email)?;

            let out = scrape(&config).await?;
            show(&out, false)?;

            let _t = utils::Timer::start("Email send");
            mailer::send_report(&config.email, &out.report)
                .await
                .context("Failed to send email")?;
            println!("Report emailed to {}", config.email.recipient);
        }
    }

    Ok(())
}
