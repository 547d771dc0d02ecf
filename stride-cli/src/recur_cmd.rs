use anyhow::{Context, Result};
use chrono::Utc;
use clap::Subcommand;
use std::path::{Path, PathBuf};
use stride_core::{RecurrenceOutcome, RecurrenceScanner, ScanReport, evaluate};
use tracing::{error, info};

use crate::config::Config;
use crate::state::{load_store, save_store};

#[derive(Subcommand, Debug)]
pub enum RecurCommand {
    /// Generate due instances of completed recurring tasks once
    Scan {
        /// Report what would be generated without writing the store
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },

    /// Keep scanning on the configured interval until interrupted
    Watch,

    /// Show the next occurrence of a task's series
    Next {
        /// Task id
        id: String,
    },
}

pub async fn run(cmd: RecurCommand, store: &Path, cfg: &Config) -> Result<()> {
    match cmd {
        RecurCommand::Scan { dry_run } => {
            let report = scan_once(store, cfg, dry_run)?;
            print_report(&report, dry_run);
            Ok(())
        }
        RecurCommand::Watch => watch(store, cfg).await,
        RecurCommand::Next { id } => next(store, &id),
    }
}

fn scan_once(store: &Path, cfg: &Config, dry_run: bool) -> Result<ScanReport> {
    let mut forest = load_store(store)?;
    let scanner = RecurrenceScanner::new(cfg.scan_policy(), cfg.timezone()?);
    let report = scanner.scan(&forest, Utc::now());

    if !dry_run && !report.is_empty() {
        report.clone().apply(&mut forest)?;
        save_store(store, &forest)?;
        info!(generated = report.generated.len(), store = %store.display(), "recurrence scan saved");
    }
    Ok(report)
}

/// `scan_once` on the blocking pool, so file I/O stays off the runtime threads.
async fn scan_blocking(store: PathBuf, cfg: Config) -> Result<ScanReport> {
    tokio::task::spawn_blocking(move || scan_once(&store, &cfg, false))
        .await
        .context("recurrence scan task failed")?
}

fn print_report(report: &ScanReport, dry_run: bool) {
    let verb = if dry_run { "Would generate" } else { "Generated" };
    println!("{} {} instance(s)", verb, report.generated.len());
    for t in &report.generated {
        let due = t
            .due_date
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".into());
        println!("- {} | {} | due {}", t.id, t.title, due);
    }
    for (id, reason) in &report.skipped {
        println!("  skipped {id}: {reason:?}");
    }
}

/// Single writer: one scan runs at a time and each tick reloads the store.
async fn watch(store: &Path, cfg: &Config) -> Result<()> {
    // Fail fast on a bad timezone rather than on every tick.
    cfg.timezone()?;
    let period = cfg.scan_interval();
    info!(every_secs = period.as_secs(), store = %store.display(), "watching recurring tasks");

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match scan_blocking(store.to_path_buf(), cfg.clone()).await {
                    Ok(report) if !report.is_empty() => print_report(&report, false),
                    Ok(_) => {}
                    Err(e) => error!("recurrence scan failed: {e:#}"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("stopping recurrence watch");
                return Ok(());
            }
        }
    }
}

fn next(store: &Path, id: &str) -> Result<()> {
    let forest = load_store(store)?;
    let Some(task) = forest.get(id) else {
        anyhow::bail!("no task with id {id}");
    };
    match evaluate(task) {
        RecurrenceOutcome::Next(dt) => println!("{}", dt.format("%Y-%m-%d %H:%M")),
        RecurrenceOutcome::NotRecurring => println!("{id} is not recurring"),
        RecurrenceOutcome::MissingDueDate => println!("{id} has no due date to recur from"),
        RecurrenceOutcome::Ended { next, end_date } => println!(
            "series ended: next would be {} but it ends {}",
            next.format("%Y-%m-%d"),
            end_date.format("%Y-%m-%d")
        ),
        RecurrenceOutcome::Unsupported(why) => println!("unsupported recurrence: {why:?}"),
    }
    Ok(())
}
