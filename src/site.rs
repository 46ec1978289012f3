//! Endpoint catalogue for the netkeiba site family
//!
//! Every URL the crawler touches is built here. Two hosts are involved:
//! - `race.netkeiba.com` serves the monthly calendar, per-day race lists,
//!   and live win odds
//! - `db.netkeiba.com` serves race results, horse pages, and leading boards
//!
//! Path and query shapes are a fixed upstream contract and must not change;
//! only the bases are overridable so tests can point the crawler at a mock
//! server.

use chrono::NaiveDate;

/// Default base for the calendar / race-list / odds host.
pub const DEFAULT_RACE_BASE: &str = "https://race.netkeiba.com";

/// Default base for the database host (races, horses, leading boards).
pub const DEFAULT_DB_BASE: &str = "https://db.netkeiba.com";

/// A leaderboard page that is refreshed on every run.
///
/// Unlike race and horse pages, leading boards are mutable upstream, so the
/// cache always overwrites them instead of skipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeadingBoard {
    Jockey,
    Trainer,
    Sire,
}

impl LeadingBoard {
    /// All boards, in refresh order.
    pub const ALL: [LeadingBoard; 3] = [
        LeadingBoard::Jockey,
        LeadingBoard::Trainer,
        LeadingBoard::Sire,
    ];

    /// URL path segment, doubling as the cache file stem.
    pub fn slug(&self) -> &'static str {
        match self {
            LeadingBoard::Jockey => "jockey",
            LeadingBoard::Trainer => "trainer",
            LeadingBoard::Sire => "sire",
        }
    }
}

/// URL builder for the upstream site.
#[derive(Debug, Clone)]
pub struct Endpoints {
    race_base: String,
    db_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            race_base: DEFAULT_RACE_BASE.to_string(),
            db_base: DEFAULT_DB_BASE.to_string(),
        }
    }
}

impl Endpoints {
    /// Creates endpoints with custom bases.
    ///
    /// Trailing slashes are trimmed so path joins stay single-slashed.
    ///
    /// # Arguments
    ///
    /// * `race_base` - Base URL for the calendar/race-list/odds host
    /// * `db_base` - Base URL for the database host
    pub fn new(race_base: &str, db_base: &str) -> Self {
        Self {
            race_base: race_base.trim_end_matches('/').to_string(),
            db_base: db_base.trim_end_matches('/').to_string(),
        }
    }

    /// Points both hosts at a single base, typically a test mock server.
    pub fn with_base(base: &str) -> Self {
        Self::new(base, base)
    }

    /// Monthly calendar page listing meeting days.
    ///
    /// The month is deliberately not zero-padded; the site expects `month=3`,
    /// not `month=03`.
    pub fn calendar(&self, year: i32, month: u32) -> String {
        format!(
            "{}/top/calendar.html?year={}&month={}",
            self.race_base, year, month
        )
    }

    /// Race list for a single meeting day.
    pub fn race_list(&self, day: NaiveDate) -> String {
        format!(
            "{}/top/race_list_sub.html?kaisai_date={}",
            self.race_base,
            day.format("%Y%m%d")
        )
    }

    /// Race result page for a 12-digit race id.
    pub fn race(&self, race_id: &str) -> String {
        format!("{}/race/{}/", self.db_base, race_id)
    }

    /// A horse's career results page.
    pub fn horse_result(&self, horse_id: &str) -> String {
        format!("{}/horse/result/{}/", self.db_base, horse_id)
    }

    /// A horse's pedigree page.
    pub fn horse_pedigree(&self, horse_id: &str) -> String {
        format!("{}/horse/ped/{}/", self.db_base, horse_id)
    }

    /// A leading board page.
    pub fn leading(&self, board: LeadingBoard) -> String {
        format!("{}/leading/{}/", self.db_base, board.slug())
    }

    /// Live win-odds page for a race.
    pub fn win_odds(&self, race_id: &str) -> String {
        format!(
            "{}/odds/index.html?race_id={}&rf=race_submenu",
            self.race_base, race_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_calendar_url_month_not_padded() {
        let endpoints = Endpoints::default();
        assert_eq!(
            endpoints.calendar(2025, 3),
            "https://race.netkeiba.com/top/calendar.html?year=2025&month=3"
        );
        assert_eq!(
            endpoints.calendar(2024, 11),
            "https://race.netkeiba.com/top/calendar.html?year=2024&month=11"
        );
    }

    #[test]
    fn test_race_list_url_uses_compact_date() {
        let endpoints = Endpoints::default();
        assert_eq!(
            endpoints.race_list(day(2024, 11, 23)),
            "https://race.netkeiba.com/top/race_list_sub.html?kaisai_date=20241123"
        );
        assert_eq!(
            endpoints.race_list(day(2025, 1, 5)),
            "https://race.netkeiba.com/top/race_list_sub.html?kaisai_date=20250105"
        );
    }

    #[test]
    fn test_db_host_urls() {
        let endpoints = Endpoints::default();
        assert_eq!(
            endpoints.race("202412050611"),
            "https://db.netkeiba.com/race/202412050611/"
        );
        assert_eq!(
            endpoints.horse_result("2019104567"),
            "https://db.netkeiba.com/horse/result/2019104567/"
        );
        assert_eq!(
            endpoints.horse_pedigree("2019104567"),
            "https://db.netkeiba.com/horse/ped/2019104567/"
        );
    }

    #[test]
    fn test_leading_urls() {
        let endpoints = Endpoints::default();
        assert_eq!(
            endpoints.leading(LeadingBoard::Jockey),
            "https://db.netkeiba.com/leading/jockey/"
        );
        assert_eq!(
            endpoints.leading(LeadingBoard::Trainer),
            "https://db.netkeiba.com/leading/trainer/"
        );
        assert_eq!(
            endpoints.leading(LeadingBoard::Sire),
            "https://db.netkeiba.com/leading/sire/"
        );
    }

    #[test]
    fn test_win_odds_url() {
        let endpoints = Endpoints::default();
        assert_eq!(
            endpoints.win_odds("202412050611"),
            "https://race.netkeiba.com/odds/index.html?race_id=202412050611&rf=race_submenu"
        );
    }

    #[test]
    fn test_custom_base_trims_trailing_slash() {
        let endpoints = Endpoints::with_base("http://127.0.0.1:9999/");
        assert_eq!(
            endpoints.race("202412050611"),
            "http://127.0.0.1:9999/race/202412050611/"
        );
        assert_eq!(
            endpoints.calendar(2024, 12),
            "http://127.0.0.1:9999/top/calendar.html?year=2024&month=12"
        );
    }
}
