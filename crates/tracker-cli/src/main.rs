//! Command-line interface for the gaming stock tracker
//!
//! Subcommands cover the daily cron entry point (`update`), historical
//! backfill, report regeneration, quarterly financials refresh, webhook
//! notification, store patches, and a status table.

use anyhow::{Context, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use comfy_table::Table;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracker_core::{FiscalQuarter, TrackerConfig};
use tracker_pipeline::{Pipeline, UpdateOptions};
use tracker_providers::{
    AnthropicGenerator, GoogleSearchClient, SecEdgarFinancials, SlackWebhook, YahooMarketData,
};
use tracker_store::{FinancialsPatch, FinancialsStore, HistoryStore};

#[derive(Parser, Debug)]
#[command(name = "tracker")]
#[command(about = "Gaming stock tracker - daily material changes and quarterly earnings")]
struct Args {
    /// Directory holding the persisted stores and the rendered report
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze one trading day and merge it into history
    Update {
        /// Target date (YYYY-MM-DD); defaults to yesterday
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Send the daily summary to the Slack webhook afterwards
        #[arg(long)]
        notify: bool,

        /// Leave placeholder narratives instead of researching
        #[arg(long)]
        skip_research: bool,
    },

    /// Analyze recent trading days that are missing from history
    Backfill {
        /// How many calendar days to look back
        #[arg(long, default_value_t = 30)]
        days: u32,
    },

    /// Regenerate the report from the persisted stores
    Render,

    /// Refresh quarterly financials for all tracked companies
    Earnings,

    /// Re-send the most recent day's summary to the Slack webhook
    Notify,

    /// Point fixes to the persisted stores
    #[command(subcommand)]
    Patch(PatchCommand),

    /// Show the tracked days
    Status,
}

#[derive(Subcommand, Debug)]
enum PatchCommand {
    /// Attach a researched narrative to a material change
    Narrative {
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        ticker: String,
        #[arg(long)]
        text: String,
    },

    /// Update raw figures or the summary for one company quarter
    Financials {
        #[arg(long)]
        ticker: String,
        /// Quarter key, e.g. "Q1 2025"
        #[arg(long)]
        quarter: String,
        #[arg(long)]
        revenue: Option<f64>,
        #[arg(long)]
        earnings: Option<f64>,
        #[arg(long)]
        summary: Option<String>,
    },
}

fn build_config(data_dir: Option<PathBuf>) -> anyhow::Result<TrackerConfig> {
    let mut builder = TrackerConfig::builder();
    if let Some(dir) = data_dir {
        builder = builder.data_dir(dir);
    }
    Ok(builder.build()?.with_env_credentials())
}

/// Wire the pipeline with whichever collaborators are configured
fn build_pipeline(config: &TrackerConfig) -> anyhow::Result<Pipeline> {
    let mut pipeline = Pipeline::new(config.clone(), Arc::new(YahooMarketData::new()));

    if let (Some(key), Some(engine_id)) = (&config.search_api_key, &config.search_engine_id) {
        pipeline = pipeline.with_search(Arc::new(GoogleSearchClient::new(
            key.as_str(),
            engine_id.as_str(),
            config.request_timeout,
        )?));
    }

    if let Some(key) = &config.anthropic_api_key {
        pipeline = pipeline.with_generator(Arc::new(AnthropicGenerator::new(
            key.as_str(),
            config.anthropic_model.as_str(),
            config.request_timeout,
        )?));
    }

    if let Some(url) = &config.slack_webhook_url {
        pipeline = pipeline.with_notifier(Arc::new(SlackWebhook::new(
            url.as_str(),
            config.request_timeout,
        )?));
    }

    Ok(pipeline)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracker_core::logging::init_tracing();

    let args = Args::parse();
    let config = build_config(args.data_dir)?;
    let pipeline = build_pipeline(&config)?;

    match args.command {
        Command::Update {
            date,
            notify,
            skip_research,
        } => {
            if notify {
                // Fail before any fetch rather than after the whole batch
                config.require_webhook()?;
            }

            let mut history = HistoryStore::open(&config.history_path)?;
            let record = pipeline
                .run_daily(
                    &mut history,
                    UpdateOptions {
                        date,
                        skip_research,
                        notify,
                    },
                )
                .await?;

            match record {
                Some(record) => {
                    println!("Updated {}", record.date_display());
                    println!("  Companies: {}", record.companies.len());
                    println!("  Material changes: {}", record.material_changes.len());
                    for change in &record.material_changes {
                        println!("  - {}: {:+.2}%", change.ticker, change.pct_change());
                    }
                }
                None => {
                    println!("No market data for that day (holiday or weekend); nothing to do.");
                }
            }
        }

        Command::Backfill { days } => {
            let mut history = HistoryStore::open(&config.history_path)?;
            let analyzed = pipeline.backfill(&mut history, days).await?;
            let report = pipeline.render_report(&history)?;
            println!("Backfill complete: {analyzed} days analyzed.");
            println!("Report: {}", report.display());
        }

        Command::Render => {
            let history = HistoryStore::open(&config.history_path)?;
            let report = pipeline.render_report(&history)?;
            println!("Report: {}", report.display());
        }

        Command::Earnings => {
            let provider =
                SecEdgarFinancials::new(config.sec_user_agent.as_str(), config.request_timeout)?;
            let mut store = FinancialsStore::open(&config.financials_path)?;
            pipeline.refresh_financials(&provider, &mut store).await?;

            let history = HistoryStore::open(&config.history_path)?;
            let report = pipeline.render_report(&history)?;
            println!("Financials refreshed for {} companies.", store.companies().len());
            println!("Report: {}", report.display());
        }

        Command::Notify => {
            config.require_webhook()?;
            let history = HistoryStore::open(&config.history_path)?;
            let Some(record) = history.latest() else {
                bail!("history is empty; run `tracker update` first");
            };
            pipeline.notify_day(record).await?;
            println!("Summary sent for {}.", record.date_display());
        }

        Command::Patch(patch) => {
            run_patch(&config, &pipeline, patch)?;
        }

        Command::Status => {
            let history = HistoryStore::open(&config.history_path)?;
            print_status(&config, &history);
        }
    }

    Ok(())
}

fn run_patch(
    config: &TrackerConfig,
    pipeline: &Pipeline,
    patch: PatchCommand,
) -> anyhow::Result<()> {
    match patch {
        PatchCommand::Narrative { date, ticker, text } => {
            let mut history = HistoryStore::open(&config.history_path)?;
            history.apply_narrative_patch(date, &ticker, text)?;
            history.save()?;
            info!(%date, %ticker, "narrative patched");

            let report = pipeline.render_report(&history)?;
            println!("Narrative updated; report rewritten: {}", report.display());
        }

        PatchCommand::Financials {
            ticker,
            quarter,
            revenue,
            earnings,
            summary,
        } => {
            let quarter: FiscalQuarter = quarter
                .parse()
                .with_context(|| format!("invalid quarter key {quarter:?}"))?;

            let patch = FinancialsPatch {
                revenue,
                earnings,
                presentation_summary: summary,
            };
            if patch.is_empty() {
                bail!("nothing to patch: pass --revenue, --earnings, or --summary");
            }

            let mut store = FinancialsStore::open(&config.financials_path)?;
            store.apply_financials_patch(&ticker, quarter, patch)?;
            store.save()?;
            info!(%ticker, %quarter, "financials patched");

            let history = HistoryStore::open(&config.history_path)?;
            let report = pipeline.render_report(&history)?;
            println!("Financials updated; report rewritten: {}", report.display());
        }
    }

    Ok(())
}

fn print_status(config: &TrackerConfig, history: &HistoryStore) {
    if history.is_empty() {
        println!("No tracked days yet. Run `tracker update` or `tracker backfill`.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec![
        "Date",
        "Companies",
        "Material changes",
        config.benchmark_name.as_str(),
    ]);

    let mut records: Vec<_> = history.records().iter().collect();
    records.sort_by(|a, b| b.date.cmp(&a.date));

    for record in records {
        let benchmark = record
            .benchmark
            .map(|q| format!("{:+.2}%", q.pct_change()))
            .unwrap_or_else(|| "-".to_string());

        table.add_row(vec![
            record.date.to_string(),
            record.companies.len().to_string(),
            record.material_changes.len().to_string(),
            benchmark,
        ]);
    }

    println!("{table}");
    println!(
        "{} days tracked across {} companies (threshold ±{}%).",
        history.len(),
        config.companies.len(),
        config.threshold_percent
    );
}
