use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{Duration, Local, NaiveDate};
use clap::Parser;
use tracing::{info, info_span, warn};
use tracing_subscriber::EnvFilter;

use mediapulse_common::config::{config_path_from_env, load_config};
use mediapulse_common::parse_date;
use mediapulse_pipeline::alerts::{alert_candidates, AlertLedger};
use mediapulse_pipeline::classify::LexiconScorer;
use mediapulse_pipeline::pipeline::{load_alias_index, DailyPipeline};
use mediapulse_pipeline::stats::RunStats;
use mediapulse_store::json_file::write_atomic;
use mediapulse_store::{AlertLedgerFile, EditableDir, JsonlSource, RollingIndexFile};

#[derive(Parser)]
#[command(name = "mediapulse", about = "Daily entity sentiment and control aggregation")]
struct Cli {
    /// Classification context, as named under [contexts] in the config
    #[arg(long, default_value = "news")]
    context: String,

    /// Path to config TOML file (default: $MEDIAPULSE_CONFIG or ./mediapulse.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Process a single date (YYYY-MM-DD)
    #[arg(long, conflicts_with = "backfill")]
    date: Option<String>,

    /// Process every date in an inclusive range
    #[arg(long, num_args = 2, value_names = ["START", "END"])]
    backfill: Option<Vec<String>>,

    /// Compute and report without touching the index, editable store or alert ledger
    #[arg(long)]
    skip_store: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

/// Which dates to run, and whether to stop at the first one with data.
struct DatePlan {
    dates: Vec<NaiveDate>,
    first_with_data: bool,
}

fn plan_dates(cli: &Cli, today: NaiveDate) -> Result<DatePlan> {
    if let Some(date) = &cli.date {
        return Ok(DatePlan {
            dates: vec![parse_date(date)?],
            first_with_data: false,
        });
    }
    if let Some(range) = &cli.backfill {
        let [start, end] = range.as_slice() else {
            bail!("--backfill takes exactly two dates");
        };
        let (mut start, mut end) = (parse_date(start)?, parse_date(end)?);
        if start > end {
            std::mem::swap(&mut start, &mut end);
        }
        return Ok(DatePlan {
            dates: start.iter_days().take_while(|d| *d <= end).collect(),
            first_with_data: false,
        });
    }
    Ok(DatePlan {
        dates: vec![today, today - Duration::days(1)],
        first_with_data: true,
    })
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::from_default_env().add_directive("mediapulse=info".parse()?);
    if cli.json_logs {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let run_id = uuid::Uuid::new_v4();
    let _span = info_span!("run", %run_id, context = cli.context.as_str()).entered();
    info!("MediaPulse starting...");

    // Load config. Any configuration failure aborts here, before a store is opened.
    let config_path = cli.config.clone().unwrap_or_else(config_path_from_env);
    let config = load_config(&config_path)?;
    config.log_summary();

    let aliases = load_alias_index(&config.paths).context("Failed to build alias index")?;
    let scorer = Arc::new(LexiconScorer::new(
        config.sentiment.lexicon.iter().map(|(word, v)| (word.as_str(), *v)),
    ));
    let pipeline = DailyPipeline::new(&config, &cli.context, aliases, scorer)?;

    let plan = plan_dates(&cli, Local::now().date_naive())?;

    let source = JsonlSource::new(config.paths.raw_dir.clone());
    let index_store = RollingIndexFile::new(config.paths.rolling_index(&cli.context));
    let editable = EditableDir::new(config.paths.editable_dir());
    let ledger_file = AlertLedgerFile::new(config.paths.alert_ledger());
    let mut ledger = AlertLedger::new(ledger_file.load()?);
    let mut ledger_dirty = false;

    let mut totals = RunStats::default();
    for date in &plan.dates {
        let date = *date;
        let output = if cli.skip_store {
            pipeline.prepare_day(date, &source, &editable)?
        } else {
            pipeline.process_day(date, &source, &index_store, &editable)?
        };
        let Some(mut output) = output else {
            totals.dates_skipped += 1;
            continue;
        };

        let daily_path = config
            .paths
            .daily_aggregates_dir()
            .join(format!("{date}-{}-aggregates.json", cli.context));
        write_atomic(&daily_path, &output.aggregates)?;

        let candidates = alert_candidates(&output.aggregates, config.alerts.negative_ratio_threshold);
        let due = ledger.due(&cli.context, candidates, date, &config.alerts);
        for c in &due {
            warn!(
                entity = c.entity_name.as_str(),
                negative = c.negative_count,
                total = c.total_count,
                "Negative coverage alert"
            );
        }
        output.stats.alerts_due = due.len() as u32;
        if !due.is_empty() && !cli.skip_store {
            let alerts_path = config
                .paths
                .alerts_dir()
                .join(format!("{date}-{}-alerts.json", cli.context));
            write_atomic(&alerts_path, &due)?;
            ledger.record(&cli.context, &due, date);
            ledger_dirty = true;
        }

        info!(%date, "Day complete. {}", output.stats);
        totals.absorb(&output.stats);

        if plan.first_with_data {
            break;
        }
    }

    if ledger_dirty {
        ledger_file.save(ledger.entries())?;
    }

    if totals.dates_processed == 0 {
        warn!(dates = plan.dates.len(), "No raw results found for any requested date");
    } else if plan.dates.len() > 1 {
        info!("Run complete. {totals}");
    }
    Ok(())
}
