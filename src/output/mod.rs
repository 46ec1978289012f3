//! Run reporting
//!
//! Counters collected during a crawl and the formatted summaries printed
//! when a run finishes.

mod stats;

pub use stats::{print_budget, print_statistics, CrawlStats, StageCounts};
