//! Crawl orchestration
//!
//! The [`Coordinator`] owns the fetcher, the page store, and the running
//! statistics, and drives one crawl over a span:
//! - Meeting days come from the monthly calendars, then days outside the
//!   span are dropped
//! - Race pages are fetched once and kept; a cached page is a skip
//! - Horse ids are read back out of the stored race page, so horse and
//!   pedigree fetches work identically for fresh and cached races
//! - A spent request budget ends the run cleanly instead of erroring out

use crate::config::Config;
use crate::crawler::budget::BudgetStatus;
use crate::crawler::discovery::{extract_horse_ids, list_meeting_days, list_race_ids};
use crate::crawler::{FetchOutcome, Fetcher};
use crate::dates::{day_type_label, CrawlSpan};
use crate::output::CrawlStats;
use crate::site::{Endpoints, LeadingBoard};
use crate::storage::{EntityKind, PageStore};
use chrono::{Local, NaiveDate};
use std::time::Duration;

const PAUSE_BETWEEN_HORSES: Duration = Duration::from_millis(300);
const PAUSE_BETWEEN_RACES: Duration = Duration::from_millis(500);
const PAUSE_BETWEEN_MONTHS: Duration = Duration::from_millis(500);

/// Which descent steps a crawl performs.
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// Fetch each race's horse result pages.
    pub fetch_horses: bool,
    /// Fetch each horse's pedigree page. Only applies when horses are
    /// fetched.
    pub fetch_pedigrees: bool,
    /// Leave today's meeting alone; its pages are still changing.
    pub skip_today: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            fetch_horses: true,
            fetch_pedigrees: true,
            skip_today: true,
        }
    }
}

/// How a crawl ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlOutcome {
    /// Every day in the span was visited.
    Completed,
    /// The daily request budget ran out mid-span.
    BudgetExhausted,
}

/// What a finished crawl hands back to the caller.
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub stats: CrawlStats,
    pub outcome: CrawlOutcome,
    pub budget: BudgetStatus,
}

enum StepResult {
    Fetched,
    Skipped,
    Failed,
}

pub struct Coordinator {
    endpoints: Endpoints,
    options: CrawlOptions,
    fetcher: Fetcher,
    store: PageStore,
    stats: CrawlStats,
}

impl Coordinator {
    pub fn new(config: &Config, endpoints: Endpoints, options: CrawlOptions) -> crate::Result<Self> {
        let fetcher = Fetcher::new(config)?;
        Self::with_fetcher(config, endpoints, options, fetcher)
    }

    /// Builds a coordinator around an existing fetcher, so callers can
    /// preset the budget.
    pub fn with_fetcher(
        config: &Config,
        endpoints: Endpoints,
        options: CrawlOptions,
        fetcher: Fetcher,
    ) -> crate::Result<Self> {
        Ok(Self {
            endpoints,
            options,
            fetcher,
            store: PageStore::open(&config.storage.root)?,
            stats: CrawlStats::default(),
        })
    }

    pub async fn budget_status(&self) -> BudgetStatus {
        self.fetcher.status().await
    }

    /// Refreshes the jockey, trainer, and sire leading boards.
    ///
    /// The boards change daily, so existing snapshots are overwritten.
    /// Returns how many boards were refreshed; individual fetch failures are
    /// logged and skipped, only a spent budget is an error.
    pub async fn refresh_leading(&self) -> crate::Result<u32> {
        let mut refreshed = 0;
        for board in LeadingBoard::ALL {
            match self.fetcher.fetch(&self.endpoints.leading(board)).await {
                FetchOutcome::Fetched(bytes) => {
                    match self.store.write(EntityKind::Leading(board), board.slug(), &bytes) {
                        Ok(()) => {
                            refreshed += 1;
                            tracing::info!("{} leading board refreshed", board.slug());
                        }
                        Err(err) => {
                            tracing::error!(
                                "could not store {} leading board: {}",
                                board.slug(),
                                err
                            );
                        }
                    }
                }
                FetchOutcome::BudgetExhausted { consumed, limit } => {
                    return Err(crate::KeibaError::BudgetExhausted { consumed, limit });
                }
                FetchOutcome::NotFound => {
                    tracing::warn!("{} leading board not found", board.slug());
                }
                FetchOutcome::Failed { reason } => {
                    tracing::warn!("{} leading board fetch failed: {}", board.slug(), reason);
                }
            }
        }
        Ok(refreshed)
    }

    /// Crawls every meeting day in the span.
    ///
    /// Budget exhaustion is a normal outcome here, reported in the returned
    /// [`CrawlReport`] with whatever was collected before the stop.
    pub async fn run(&mut self, span: &CrawlSpan) -> crate::Result<CrawlReport> {
        let outcome = match self.crawl_span(span).await {
            Ok(()) => CrawlOutcome::Completed,
            Err(crate::KeibaError::BudgetExhausted { consumed, limit }) => {
                tracing::warn!(
                    "crawl stopped early, daily request budget exhausted ({}/{})",
                    consumed,
                    limit
                );
                CrawlOutcome::BudgetExhausted
            }
            Err(err) => return Err(err),
        };

        Ok(CrawlReport {
            stats: self.stats.clone(),
            outcome,
            budget: self.fetcher.status().await,
        })
    }

    async fn crawl_span(&mut self, span: &CrawlSpan) -> crate::Result<()> {
        tracing::info!("collecting meeting days for {}", span);
        let days = self.meeting_days(span).await?;
        if days.is_empty() {
            tracing::warn!("no meeting days found in {}", span);
            return Ok(());
        }

        let preview: Vec<String> = days.iter().take(10).map(|day| day.to_string()).collect();
        let suffix = if days.len() > 10 { ", ..." } else { "" };
        tracing::info!(
            "found {} meeting days: {}{}",
            days.len(),
            preview.join(", "),
            suffix
        );

        let estimated_races = days.len() as u64 * 10;
        let estimated_horses = estimated_races * 15;
        let estimated_minutes = (estimated_races * 2 + estimated_horses * 3) as f64 / 60.0;
        tracing::info!(
            "estimated workload: about {} races and {} horses, roughly {:.1} minutes at the configured pace",
            estimated_races,
            estimated_horses,
            estimated_minutes
        );

        let today = Local::now().date_naive();
        for day in days {
            if self.options.skip_today && day == today {
                tracing::info!("{}: today's meeting skipped, pages are still changing", day);
                continue;
            }
            self.crawl_day(day).await?;
        }
        Ok(())
    }

    async fn meeting_days(&self, span: &CrawlSpan) -> crate::Result<Vec<NaiveDate>> {
        let mut days = Vec::new();
        for (index, month) in span.months().iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(PAUSE_BETWEEN_MONTHS).await;
            }
            let found =
                list_meeting_days(&self.fetcher, &self.endpoints, month.year, month.month).await?;
            days.extend(found);
        }
        days.sort();
        days.dedup();
        days.retain(|day| span.contains(*day));
        Ok(days)
    }

    async fn crawl_day(&mut self, day: NaiveDate) -> crate::Result<()> {
        tracing::info!("processing {} ({})", day, day_type_label(day));

        let race_ids = list_race_ids(&self.fetcher, &self.endpoints, day).await?;
        if race_ids.is_empty() {
            tracing::warn!("no races found for {}", day);
            return Ok(());
        }
        tracing::info!("{} races found on {}", race_ids.len(), day);

        for (index, race_id) in race_ids.iter().enumerate() {
            tracing::info!("[{}/{}] race {}", index + 1, race_ids.len(), race_id);
            self.crawl_race(race_id).await?;

            let status = self.fetcher.status().await;
            if status.remaining() <= 5 {
                tracing::warn!("only {} requests left today", status.remaining());
                if status.remaining() == 0 {
                    return Err(crate::KeibaError::BudgetExhausted {
                        consumed: status.consumed,
                        limit: status.limit,
                    });
                }
            }
            tokio::time::sleep(PAUSE_BETWEEN_RACES).await;
        }

        // A day only counts once its whole race list went through.
        self.stats.dates_processed += 1;
        Ok(())
    }

    async fn crawl_race(&mut self, race_id: &str) -> crate::Result<()> {
        self.stats.races.processed += 1;
        match self.fetch_into_store(EntityKind::Race, race_id).await? {
            StepResult::Fetched => {
                self.stats.races.succeeded += 1;
                tracing::info!("race {} fetched", race_id);
            }
            StepResult::Skipped => {
                self.stats.races.skipped += 1;
                tracing::debug!("race {} already cached", race_id);
            }
            StepResult::Failed => {
                tracing::warn!("race {} unavailable, skipping its horses", race_id);
                return Ok(());
            }
        }

        if !self.options.fetch_horses {
            return Ok(());
        }

        // The stored page is the source of horse ids, whether it was written
        // just now or in an earlier run.
        let horse_ids = match self.store.read(EntityKind::Race, race_id) {
            Ok(page) => extract_horse_ids(&page),
            Err(err) => {
                tracing::warn!("could not read stored race {}: {}", race_id, err);
                Vec::new()
            }
        };
        if horse_ids.is_empty() {
            return Ok(());
        }
        tracing::info!("{} horses linked from race {}", horse_ids.len(), race_id);

        for horse_id in &horse_ids {
            self.crawl_horse(horse_id).await?;
            tokio::time::sleep(PAUSE_BETWEEN_HORSES).await;
        }
        Ok(())
    }

    async fn crawl_horse(&mut self, horse_id: &str) -> crate::Result<()> {
        self.stats.horses.processed += 1;
        match self.fetch_into_store(EntityKind::HorseResult, horse_id).await? {
            StepResult::Fetched => self.stats.horses.succeeded += 1,
            StepResult::Skipped => self.stats.horses.skipped += 1,
            StepResult::Failed => {}
        }

        if self.options.fetch_pedigrees {
            self.stats.pedigrees.processed += 1;
            match self.fetch_into_store(EntityKind::HorsePedigree, horse_id).await? {
                StepResult::Fetched => self.stats.pedigrees.succeeded += 1,
                StepResult::Skipped => self.stats.pedigrees.skipped += 1,
                StepResult::Failed => {}
            }
        }
        Ok(())
    }

    /// Fetches one page into the store unless it is already there.
    async fn fetch_into_store(&self, kind: EntityKind, id: &str) -> crate::Result<StepResult> {
        if self.store.contains(kind, id) {
            return Ok(StepResult::Skipped);
        }

        match self.fetcher.fetch(&self.page_url(kind, id)).await {
            FetchOutcome::Fetched(bytes) => {
                if let Err(err) = self.store.write(kind, id, &bytes) {
                    tracing::error!("could not store {} {}: {}", kind.label(), id, err);
                    return Ok(StepResult::Failed);
                }
                Ok(StepResult::Fetched)
            }
            FetchOutcome::NotFound => {
                tracing::warn!("{} {} not found", kind.label(), id);
                Ok(StepResult::Failed)
            }
            FetchOutcome::Failed { reason } => {
                tracing::warn!("{} {} fetch failed: {}", kind.label(), id, reason);
                Ok(StepResult::Failed)
            }
            FetchOutcome::BudgetExhausted { consumed, limit } => {
                Err(crate::KeibaError::BudgetExhausted { consumed, limit })
            }
        }
    }

    fn page_url(&self, kind: EntityKind, id: &str) -> String {
        match kind {
            EntityKind::Race => self.endpoints.race(id),
            EntityKind::HorseResult => self.endpoints.horse_result(id),
            EntityKind::HorsePedigree => self.endpoints.horse_pedigree(id),
            EntityKind::Leading(board) => self.endpoints.leading(board),
        }
    }
}
