//! Crawling pipeline
//!
//! The crawler walks the site hierarchy one month at a time:
//! calendar pages name the meeting days, each day names its races, and each
//! stored race page names the horses to fetch. All traffic flows through a
//! single [`Fetcher`] that enforces the daily request budget, the minimum
//! request gap, and bounded retries.

mod budget;
mod coordinator;
mod discovery;
mod fetcher;

pub use budget::{daily_limit, BudgetStatus, DayCategory, RequestBudget};
pub use coordinator::{Coordinator, CrawlOptions, CrawlOutcome, CrawlReport};
pub use discovery::{extract_horse_ids, list_meeting_days, list_race_ids};
pub use fetcher::{FetchOutcome, Fetcher};
