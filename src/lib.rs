//! Keiba Archive: an incremental netkeiba page harvester
//!
//! This crate collects raw race, horse, and leading-board pages from
//! netkeiba.com into a local file store, fetching politely within a daily
//! request budget and never downloading the same page twice.

pub mod config;
pub mod crawler;
pub mod dates;
pub mod output;
pub mod parser;
pub mod site;
pub mod storage;

use thiserror::Error;

/// Main error type for crawl operations
#[derive(Debug, Error)]
pub enum KeibaError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Date error: {0}")]
    Date(#[from] DateError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Parse error: {0}")]
    Parse(#[from] parser::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("daily request budget exhausted ({consumed}/{limit})")]
    BudgetExhausted { consumed: u32, limit: u32 },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Errors from date and month token handling
#[derive(Debug, Error)]
pub enum DateError {
    #[error(
        "unrecognized date '{0}' (accepted: YYYY-MM-DD, YYYYMMDD, today, yesterday, \
         last_week, last_month, or offsets like -7days)"
    )]
    BadDate(String),

    #[error("unrecognized month '{0}' (accepted: YYYY-MM, YYYY/MM, or YYYYMM)")]
    BadMonth(String),

    #[error("span starts at {start} but ends at {end}")]
    InvertedSpan { start: String, end: String },
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, KeibaError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for date handling
pub type DateResult<T> = std::result::Result<T, DateError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, CrawlOptions, CrawlOutcome, CrawlReport, FetchOutcome, Fetcher};
pub use dates::{CrawlSpan, YearMonth};
pub use site::{Endpoints, LeadingBoard};
pub use storage::{EntityKind, PageStore};
