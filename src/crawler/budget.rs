//! Daily request budget
//!
//! Every network request drawn from one shared counter that resets when the
//! local date changes. Weekdays carry a large allowance for backfills;
//! weekends are capped hard because that is when races actually run and the
//! site is busiest.

use crate::config::RequestSettings;
use crate::dates::is_weekend;
use chrono::NaiveDate;

/// Which daily limit applies to a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayCategory {
    Weekday,
    Weekend,
}

impl DayCategory {
    /// Classifies a date. Saturday and Sunday are weekend, everything else
    /// (holidays included) is weekday.
    pub fn of(date: NaiveDate) -> Self {
        if is_weekend(date) {
            DayCategory::Weekend
        } else {
            DayCategory::Weekday
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DayCategory::Weekday => "weekday",
            DayCategory::Weekend => "weekend",
        }
    }
}

/// The configured request limit for a date.
pub fn daily_limit(settings: &RequestSettings, date: NaiveDate) -> u32 {
    match DayCategory::of(date) {
        DayCategory::Weekday => settings.max_requests_weekday,
        DayCategory::Weekend => settings.max_requests_weekend,
    }
}

/// Snapshot of budget state, taken for logging and preflight checks.
#[derive(Debug, Clone, Copy)]
pub struct BudgetStatus {
    pub date: NaiveDate,
    pub consumed: u32,
    pub limit: u32,
    pub category: DayCategory,
}

impl BudgetStatus {
    /// Requests still allowed today.
    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.consumed)
    }
}

/// Counter of requests issued on one calendar date.
///
/// The budget does not sleep or retry. When it is spent, callers get a
/// refusal and are expected to stop for the day.
#[derive(Debug, Clone)]
pub struct RequestBudget {
    date: NaiveDate,
    consumed: u32,
}

impl RequestBudget {
    /// A fresh budget for the given date.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            date: today,
            consumed: 0,
        }
    }

    /// A budget with some requests already spent. Intended for tests that
    /// start near the limit.
    pub fn with_consumed(today: NaiveDate, consumed: u32) -> Self {
        Self {
            date: today,
            consumed,
        }
    }

    /// Resets the counter when the local date has moved on.
    pub fn roll_over(&mut self, settings: &RequestSettings, today: NaiveDate) {
        if today != self.date {
            tracing::info!(
                "request counter reset for {} ({} limit: {})",
                today,
                DayCategory::of(today).as_str(),
                daily_limit(settings, today)
            );
            self.date = today;
            self.consumed = 0;
        }
    }

    /// Records one issued request.
    pub fn consume(&mut self) {
        self.consumed += 1;
    }

    pub fn consumed(&self) -> u32 {
        self.consumed
    }

    /// Requests still allowed on the budget's date.
    pub fn remaining(&self, settings: &RequestSettings) -> u32 {
        daily_limit(settings, self.date).saturating_sub(self.consumed)
    }

    pub fn status(&self, settings: &RequestSettings) -> BudgetStatus {
        BudgetStatus {
            date: self.date,
            consumed: self.consumed,
            limit: daily_limit(settings, self.date),
            category: DayCategory::of(self.date),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn settings() -> RequestSettings {
        RequestSettings {
            min_interval_ms: 1500,
            max_requests_weekday: 8000,
            max_requests_weekend: 150,
        }
    }

    #[test]
    fn test_category_split() {
        assert_eq!(DayCategory::of(date(2024, 12, 6)), DayCategory::Weekday); // Friday
        assert_eq!(DayCategory::of(date(2024, 12, 7)), DayCategory::Weekend); // Saturday
        assert_eq!(DayCategory::of(date(2024, 12, 8)), DayCategory::Weekend); // Sunday
    }

    #[test]
    fn test_daily_limit_by_category() {
        let settings = settings();
        assert_eq!(daily_limit(&settings, date(2024, 12, 6)), 8000);
        assert_eq!(daily_limit(&settings, date(2024, 12, 7)), 150);
    }

    #[test]
    fn test_consume_counts_down_remaining() {
        let settings = settings();
        let mut budget = RequestBudget::new(date(2024, 12, 7));
        assert_eq!(budget.remaining(&settings), 150);
        budget.consume();
        budget.consume();
        assert_eq!(budget.consumed(), 2);
        assert_eq!(budget.remaining(&settings), 148);
    }

    #[test]
    fn test_roll_over_resets_on_new_date() {
        let settings = settings();
        let mut budget = RequestBudget::with_consumed(date(2024, 12, 7), 150);
        assert_eq!(budget.remaining(&settings), 0);

        budget.roll_over(&settings, date(2024, 12, 8));
        assert_eq!(budget.consumed(), 0);
        assert_eq!(budget.remaining(&settings), 150);
    }

    #[test]
    fn test_roll_over_same_date_keeps_count() {
        let settings = settings();
        let mut budget = RequestBudget::with_consumed(date(2024, 12, 6), 42);
        budget.roll_over(&settings, date(2024, 12, 6));
        assert_eq!(budget.consumed(), 42);
    }

    #[test]
    fn test_status_snapshot() {
        let settings = settings();
        let budget = RequestBudget::with_consumed(date(2024, 12, 7), 149);
        let status = budget.status(&settings);
        assert_eq!(status.date, date(2024, 12, 7));
        assert_eq!(status.consumed, 149);
        assert_eq!(status.limit, 150);
        assert_eq!(status.category, DayCategory::Weekend);
        assert_eq!(status.remaining(), 1);
    }

    #[test]
    fn test_remaining_never_underflows() {
        let settings = settings();
        let budget = RequestBudget::with_consumed(date(2024, 12, 7), 200);
        assert_eq!(budget.remaining(&settings), 0);
    }
}
