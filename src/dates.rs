//! Date handling for crawl spans
//!
//! This module covers:
//! - Parsing the flexible date and month tokens accepted on the command line
//! - The `CrawlSpan` type describing which calendar months and days a run visits
//! - Weekend and public-holiday classification used for day labels and the
//!   daily request budget

use crate::DateError;
use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// A calendar year and month, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    /// Creates a year-month, rejecting months outside 1-12.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// The month containing the given date.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The following month, rolling over the year boundary.
    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// The date extent of one crawl run.
///
/// A month span visits every meeting day in the listed months. A date span
/// still discovers days through the monthly calendars, then keeps only the
/// days inside the range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlSpan {
    Months { start: YearMonth, end: YearMonth },
    Dates { start: NaiveDate, end: NaiveDate },
}

impl CrawlSpan {
    /// Builds a month span, rejecting inverted ranges.
    pub fn between_months(start: YearMonth, end: YearMonth) -> Result<Self, DateError> {
        if start > end {
            return Err(DateError::InvertedSpan {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(CrawlSpan::Months { start, end })
    }

    /// Builds a date span, rejecting inverted ranges.
    pub fn between_dates(start: NaiveDate, end: NaiveDate) -> Result<Self, DateError> {
        if start > end {
            return Err(DateError::InvertedSpan {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(CrawlSpan::Dates { start, end })
    }

    /// The month containing the day one week before `today`.
    ///
    /// This is the fallback span when no range is configured anywhere.
    pub fn last_week(today: NaiveDate) -> Self {
        let anchor = today - Duration::days(7);
        let month = YearMonth::containing(anchor);
        CrawlSpan::Months {
            start: month,
            end: month,
        }
    }

    /// Every calendar month the span touches, in ascending order.
    pub fn months(&self) -> Vec<YearMonth> {
        let (mut current, end) = match self {
            CrawlSpan::Months { start, end } => (*start, *end),
            CrawlSpan::Dates { start, end } => {
                (YearMonth::containing(*start), YearMonth::containing(*end))
            }
        };
        let mut months = Vec::new();
        while current <= end {
            months.push(current);
            current = current.next();
        }
        months
    }

    /// Whether a meeting day falls inside the span.
    pub fn contains(&self, date: NaiveDate) -> bool {
        match self {
            CrawlSpan::Months { start, end } => {
                let month = YearMonth::containing(date);
                *start <= month && month <= *end
            }
            CrawlSpan::Dates { start, end } => *start <= date && date <= *end,
        }
    }
}

impl std::fmt::Display for CrawlSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CrawlSpan::Months { start, end } => write!(f, "{} to {}", start, end),
            CrawlSpan::Dates { start, end } => write!(f, "{} to {}", start, end),
        }
    }
}

/// Parses a date token.
///
/// Accepted forms:
/// - `YYYY-MM-DD` (e.g. `2025-12-06`)
/// - `YYYYMMDD` (e.g. `20251206`)
/// - `today`, `yesterday`, `last_week` (7 days back), `last_month` (30 days back)
/// - relative offsets: `-7days`, `+30days`, `14days` (unsigned means forward)
///
/// # Arguments
///
/// * `token` - The raw token
/// * `today` - The date relative tokens are resolved against
pub fn parse_date_token(token: &str, today: NaiveDate) -> Result<NaiveDate, DateError> {
    match token {
        "today" => Ok(today),
        "yesterday" => shift(today, -1, token),
        "last_week" => shift(today, -7, token),
        "last_month" => shift(today, -30, token),
        _ if token.ends_with("days") => {
            let number_part = &token[..token.len() - 4];
            let (negative, digits) = match number_part.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, number_part.strip_prefix('+').unwrap_or(number_part)),
            };
            let days: i64 = digits
                .parse()
                .map_err(|_| DateError::BadDate(token.to_string()))?;
            shift(today, if negative { -days } else { days }, token)
        }
        _ if token.len() == 10 && token.matches('-').count() == 2 => {
            NaiveDate::parse_from_str(token, "%Y-%m-%d")
                .map_err(|_| DateError::BadDate(token.to_string()))
        }
        _ if token.len() == 8 && token.chars().all(|c| c.is_ascii_digit()) => {
            NaiveDate::parse_from_str(token, "%Y%m%d")
                .map_err(|_| DateError::BadDate(token.to_string()))
        }
        _ => Err(DateError::BadDate(token.to_string())),
    }
}

fn shift(base: NaiveDate, days: i64, token: &str) -> Result<NaiveDate, DateError> {
    base.checked_add_signed(Duration::days(days))
        .ok_or_else(|| DateError::BadDate(token.to_string()))
}

/// Parses a month token.
///
/// Accepted forms: `YYYY-MM`, `YYYY/MM`, and `YYYYMM`.
pub fn parse_month_token(token: &str) -> Result<YearMonth, DateError> {
    let parts = if token.len() == 7 && token.matches('-').count() == 1 {
        token.split_once('-')
    } else if token.len() == 7 && token.matches('/').count() == 1 {
        token.split_once('/')
    } else if token.len() == 6 && token.chars().all(|c| c.is_ascii_digit()) {
        Some((&token[..4], &token[4..]))
    } else {
        None
    };

    let (year_part, month_part) = parts.ok_or_else(|| DateError::BadMonth(token.to_string()))?;
    let year: i32 = year_part
        .parse()
        .map_err(|_| DateError::BadMonth(token.to_string()))?;
    let month: u32 = month_part
        .parse()
        .map_err(|_| DateError::BadMonth(token.to_string()))?;

    YearMonth::new(year, month).ok_or_else(|| DateError::BadMonth(token.to_string()))
}

/// Whether the date is a Saturday or Sunday.
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Approximate Japanese public-holiday check.
///
/// Floating "Nth Monday" holidays are widened to whole-week windows, so false
/// positives are expected and accepted. The result only labels meeting days in
/// logs; the request budget keys off the weekend split alone.
pub fn is_public_holiday(date: NaiveDate) -> bool {
    match (date.month(), date.day()) {
        (1, 1) => true,        // New Year's Day
        (1, 8..=14) => true,   // Coming of Age Day (second Monday, widened)
        (2, 11) => true,       // National Foundation Day
        (2, 23) => true,       // Emperor's Birthday
        (3, 20..=21) => true,  // Vernal Equinox
        (4, 29) => true,       // Showa Day
        (5, 3..=5) => true,    // Constitution Day through Children's Day
        (7, 15..=21) => true,  // Marine Day (third Monday, widened)
        (8, 11) => true,       // Mountain Day
        (9, 15..=21) => true,  // Respect for the Aged Day (third Monday, widened)
        (9, 22..=23) => true,  // Autumnal Equinox
        (10, 8..=14) => true,  // Sports Day (second Monday, widened)
        (11, 3) => true,       // Culture Day
        (11, 23) => true,      // Labor Thanksgiving Day
        _ => false,
    }
}

/// Log label for a meeting day combining the weekend and holiday checks.
pub fn day_type_label(date: NaiveDate) -> &'static str {
    match (is_weekend(date), is_public_holiday(date)) {
        (true, true) => "weekend/holiday",
        (true, false) => "weekend",
        (false, true) => "holiday",
        (false, false) => "weekday",
    }
}
