//! Disclosure Scraper Library
//!
//! Retrieves net-value disclosure pages published by banks and turns their
//! tables into typed, exportable records.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`fetch`] - Static page fetch with retries and exponential backoff
//! - [`render`] - Headless-browser loader for JavaScript-rendered pages
//! - [`extract`] - Tables, metadata, sections and URL parameters from markup
//! - [`normalize`] - Numeric cleaning, validation, record extraction, merging
//! - [`export`] - JSON, CSV and report files with atomic writes
//! - [`pipeline`] - One URL end to end
//! - [`batch`] - Many URLs with bounded concurrency
//! - [`config`] - TOML configuration and defaults

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod batch;
pub mod config;
pub mod export;
pub mod extract;
pub mod fetch;
pub mod interrupt;
pub mod normalize;
pub mod pipeline;
pub mod render;
mod user_agent;

// Re-export commonly used types
pub use batch::{BatchError, BatchItem, BatchRunner, BatchStats};
pub use config::{ConfigError, ScrapeConfig};
pub use export::{ExportError, ExportPaths, Exporter, render_report};
pub use extract::{PageSnapshot, Section, Table, extract, extract_at, extract_pages_at};
pub use fetch::{FetchConfig, FetchResult, FetchStatus, Fetcher};
pub use interrupt::Interrupt;
pub use normalize::{
    AggregatedResult, NormalizedRecord, RecordExtraction, ValidationReport, clean_numeric,
    extract_financial_records, filter_tables_by_header, merge_snapshots, validate,
};
pub use pipeline::{AcquisitionMode, Pipeline, PipelineError, ScrapeOutcome};
pub use render::{
    BrowserLauncher, BrowserSession, ContentKind, DynamicLoader, LoadError, LoaderConfig,
};
pub use user_agent::BROWSER_USER_AGENT;
