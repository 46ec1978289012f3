//! Crawl statistics
//!
//! Counters are split per stage of the descent (races, horses, pedigrees) so
//! the end-of-run summary can show how much work was fresh, cached, or lost.

use crate::crawler::BudgetStatus;

/// Counters for one stage of the crawl.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageCounts {
    /// Entities the crawl looked at.
    pub processed: u64,

    /// Entities fetched from the network and stored.
    pub succeeded: u64,

    /// Entities already on disk from an earlier run.
    pub skipped: u64,
}

impl StageCounts {
    /// Entities that could not be fetched or stored.
    pub fn failed(&self) -> u64 {
        self.processed.saturating_sub(self.succeeded + self.skipped)
    }
}

/// Everything a crawl counted, by stage.
#[derive(Debug, Clone, Default)]
pub struct CrawlStats {
    /// Meeting days whose race list was worked through completely.
    pub dates_processed: u64,

    pub races: StageCounts,
    pub horses: StageCounts,
    pub pedigrees: StageCounts,
}

/// Prints the end-of-run summary to stdout.
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStats) {
    println!("=== Crawl Statistics ===\n");

    println!("Meeting days processed: {}", stats.dates_processed);
    println!();

    for (label, counts) in [
        ("Races", &stats.races),
        ("Horses", &stats.horses),
        ("Pedigrees", &stats.pedigrees),
    ] {
        println!("{}:", label);
        println!("  Processed: {}", counts.processed);
        println!("  Fetched: {}", counts.succeeded);
        println!("  Skipped (cached): {}", counts.skipped);
        println!("  Failed: {}", counts.failed());
        println!();
    }

    if stats.races.processed > 0 {
        let hit_rate = (stats.races.skipped as f64 / stats.races.processed as f64) * 100.0;
        println!("Race cache hit rate: {:.1}%", hit_rate);
    }
}

/// Prints the current request-budget state to stdout.
pub fn print_budget(status: &BudgetStatus) {
    println!(
        "Request budget for {} ({}):",
        status.date,
        status.category.as_str()
    );
    println!("  Used: {} / {}", status.consumed, status.limit);
    println!("  Remaining: {}", status.remaining());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_is_the_remainder() {
        let counts = StageCounts {
            processed: 10,
            succeeded: 6,
            skipped: 3,
        };
        assert_eq!(counts.failed(), 1);
    }

    #[test]
    fn test_failed_never_underflows() {
        let counts = StageCounts {
            processed: 2,
            succeeded: 2,
            skipped: 1,
        };
        assert_eq!(counts.failed(), 0);
    }

    #[test]
    fn test_default_stats_are_zeroed() {
        let stats = CrawlStats::default();
        assert_eq!(stats.dates_processed, 0);
        assert_eq!(stats.races, StageCounts::default());
        assert_eq!(stats.horses.failed(), 0);
    }
}
