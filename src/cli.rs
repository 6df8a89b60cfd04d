//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use disclosure_scraper::ScrapeConfig;

/// Scrape bank net-value disclosure pages into JSON and CSV.
///
/// Each URL is fetched (or rendered in a headless browser with --dynamic),
/// its tables, metadata and sections are extracted, net-value rows are
/// normalized, and the results are written to the output directory.
#[derive(Parser, Debug)]
#[command(name = "disclosure-scraper")]
#[command(author, version, about)]
pub struct Args {
    /// Disclosure page URLs
    #[arg(required = true, value_name = "URL")]
    pub urls: Vec<String>,

    /// Render pages in a headless browser (needs the `browser` feature)
    #[arg(short, long)]
    pub dynamic: bool,

    /// Directory for exported files [default: output]
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Static fetch timeout in seconds (1-3600)
    #[arg(short, long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub timeout: Option<u64>,

    /// Maximum retry attempts for transient failures (0-10)
    #[arg(short = 'r', long, value_parser = clap::value_parser!(u32).range(0..=10))]
    pub max_retries: Option<u32>,

    /// Show the browser window in dynamic mode
    #[arg(long)]
    pub headful: bool,

    /// Pages of a paginated listing to capture in dynamic mode (1-100)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..=100))]
    pub max_pages: Option<u32>,

    /// URLs scraped at once (1-16)
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=16))]
    pub concurrency: Option<u8>,

    /// Fail a URL when its tables have validation issues
    #[arg(long)]
    pub strict: bool,

    /// Config file [default: $XDG_CONFIG_HOME/disclosure-scraper/config.toml]
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Skip the plain-text report
    #[arg(long)]
    pub no_report: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Log filter used when `RUST_LOG` is unset.
    ///
    /// Priority: quiet flag > verbose count > info.
    #[must_use]
    pub fn default_log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    /// Overrides file and default values with the flags that were given.
    pub fn apply_to(&self, config: &mut ScrapeConfig) {
        if let Some(dir) = &self.output_dir {
            config.output_dir.clone_from(dir);
        }
        if let Some(timeout) = self.timeout {
            config.timeout_seconds = timeout;
        }
        if let Some(retries) = self.max_retries {
            config.max_retries = retries;
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = usize::from(concurrency);
        }
        if self.headful {
            config.headless = false;
        }
        if let Some(pages) = self.max_pages {
            config.max_pages = pages;
        }
        if self.strict {
            config.strict_validation = true;
        }
    }
}
