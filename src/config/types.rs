use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub request: RequestSettings,
    pub timeouts: TimeoutSettings,
    pub storage: StorageSettings,
    pub scraper: SpanSettings,
}

/// Request pacing and daily allowances.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RequestSettings {
    /// Minimum gap between consecutive requests (milliseconds)
    #[serde(rename = "min-interval-ms")]
    pub min_interval_ms: u64,

    /// Requests allowed per weekday
    #[serde(rename = "max-requests-weekday")]
    pub max_requests_weekday: u32,

    /// Requests allowed per Saturday or Sunday, kept low because race days
    /// are when the site is busiest
    #[serde(rename = "max-requests-weekend")]
    pub max_requests_weekend: u32,
}

impl Default for RequestSettings {
    fn default() -> Self {
        Self {
            min_interval_ms: 1500,
            max_requests_weekday: 8000,
            max_requests_weekend: 150,
        }
    }
}

/// HTTP timeout settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimeoutSettings {
    /// Whole-request timeout for page fetches (seconds)
    #[serde(rename = "scraping-secs")]
    pub scraping_secs: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self { scraping_secs: 10 }
    }
}

/// Where fetched pages land on disk
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Root directory of the page store
    pub root: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data"),
        }
    }
}

/// Default crawl span, used when the command line names none.
///
/// Month and date pairs are both accepted; when both are present the month
/// pair wins. Each pair must be complete.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SpanSettings {
    /// First month to crawl (e.g. "2024-11")
    #[serde(rename = "start-month")]
    pub start_month: Option<String>,

    /// Last month to crawl, inclusive
    #[serde(rename = "end-month")]
    pub end_month: Option<String>,

    /// First date to crawl (e.g. "2024-11-23")
    #[serde(rename = "start-date")]
    pub start_date: Option<String>,

    /// Last date to crawl, inclusive
    #[serde(rename = "end-date")]
    pub end_date: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.request.min_interval_ms, 1500);
        assert_eq!(config.request.max_requests_weekday, 8000);
        assert_eq!(config.request.max_requests_weekend, 150);
        assert_eq!(config.timeouts.scraping_secs, 10);
        assert_eq!(config.storage.root, PathBuf::from("data"));
        assert!(config.scraper.start_month.is_none());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
[request]
min-interval-ms = 200
"#,
        )
        .unwrap();
        assert_eq!(config.request.min_interval_ms, 200);
        assert_eq!(config.request.max_requests_weekday, 8000);
        assert_eq!(config.request.max_requests_weekend, 150);
    }

    #[test]
    fn test_full_config_parses() {
        let config: Config = toml::from_str(
            r#"
[request]
min-interval-ms = 1000
max-requests-weekday = 5000
max-requests-weekend = 100

[timeouts]
scraping-secs = 20

[storage]
root = "archive"

[scraper]
start-month = "2024-10"
end-month = "2024-12"
"#,
        )
        .unwrap();
        assert_eq!(config.request.max_requests_weekend, 100);
        assert_eq!(config.timeouts.scraping_secs, 20);
        assert_eq!(config.storage.root, PathBuf::from("archive"));
        assert_eq!(config.scraper.start_month.as_deref(), Some("2024-10"));
        assert_eq!(config.scraper.end_month.as_deref(), Some("2024-12"));
    }
}
