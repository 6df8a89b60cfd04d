//! CLI entry point for the disclosure scraper.

use std::io::{self, IsTerminal};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use disclosure_scraper::{
    AcquisitionMode, BatchItem, BatchRunner, BrowserLauncher, Exporter, Interrupt, ScrapeConfig,
    merge_snapshots,
};
use tracing::{debug, error, info, warn};

mod cli;
mod progress;

use cli::Args;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(args.default_log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let mut config = ScrapeConfig::resolve(args.config.as_deref()).context("loading configuration")?;
    args.apply_to(&mut config);
    config.validate().context("validating configuration")?;

    let mode = if args.dynamic {
        AcquisitionMode::Dynamic
    } else {
        AcquisitionMode::Static
    };
    info!(urls = args.urls.len(), %mode, output_dir = %config.output_dir.display(), "scraper starting");

    let interrupt = Interrupt::new();
    let signal = interrupt.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, finishing current waits");
            signal.trigger();
        }
    });

    let mut runner = BatchRunner::new(config.clone(), mode)?
        .with_interrupt(interrupt)
        .with_report(!args.no_report);
    if let Some(launcher) = browser_launcher() {
        runner = runner.with_launcher(launcher);
    }

    let use_spinner = io::stderr().is_terminal() && !args.quiet && args.urls.len() > 1;
    let (progress_handle, progress_stop) =
        progress::spawn_progress_ui(use_spinner, runner.stats(), args.urls.len());

    let items = runner.run(&args.urls).await;

    progress_stop.store(true, std::sync::atomic::Ordering::SeqCst);
    if let Some(handle) = progress_handle {
        let _ = handle.await;
    }

    print_summary(&items);

    let snapshots: Vec<_> = items
        .iter()
        .filter_map(|item| item.result.as_ref().ok())
        .map(|outcome| outcome.snapshot.clone())
        .collect();
    if snapshots.len() > 1 {
        let exporter = Exporter::new(&config.output_dir, config.file_prefix.clone());
        let path = exporter
            .write_aggregate(&merge_snapshots(&snapshots), Utc::now())
            .await
            .context("writing merged document")?;
        println!("merged {} snapshots -> {}", snapshots.len(), path.display());
    }

    let failed = items.iter().filter(|item| item.result.is_err()).count();
    info!(succeeded = items.len() - failed, failed, "scraper finished");
    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[cfg(feature = "browser")]
fn browser_launcher() -> Option<Arc<dyn BrowserLauncher>> {
    Some(Arc::new(disclosure_scraper::render::ChromeLauncher::new()))
}

#[cfg(not(feature = "browser"))]
fn browser_launcher() -> Option<Arc<dyn BrowserLauncher>> {
    None
}

fn print_summary(items: &[BatchItem]) {
    for item in items {
        match &item.result {
            Ok(outcome) => {
                println!(
                    "ok   {}: {} table(s), {} record(s), {} issue(s)",
                    item.url,
                    outcome.snapshot.tables.len(),
                    outcome.records.records.len(),
                    outcome.validation.issues.len()
                );
                if let Some(paths) = &outcome.exported {
                    for path in paths.iter() {
                        println!("       {}", path.display());
                    }
                }
                if let Some(report) = &outcome.report {
                    println!("       {}", report.display());
                }
            }
            Err(e) => {
                error!(url = %item.url, error = %e, "scrape failed");
                println!("FAIL {}: {e}", item.url);
            }
        }
    }
}
