//! Extraction of structured data from stored pages
//!
//! Parsing never happens during the crawl itself; it reads the raw bytes the
//! store already holds. The parsers are deliberately tolerant: a malformed
//! row or a missing field degrades to `None` rather than failing the page.

mod decode;
mod odds;
mod race;

pub use decode::decode_html;
pub use odds::{apply_win_odds, fetch_win_odds, parse_win_odds, DEFAULT_NEUTRAL_ODDS};
pub use race::{
    parse_race, Direction, Grade, HorseRow, ParsedRace, RaceRecord, Sex, Surface, TableLayout,
};

use thiserror::Error;

/// Errors surfaced by the page parsers.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("page bytes are not valid EUC-JP, UTF-8, or Shift_JIS")]
    Decode,

    #[error("no runner table found in race page {race_id}")]
    TableNotFound { race_id: String },
}

/// Concatenated element text with each fragment trimmed.
pub(crate) fn tidy_text(el: &scraper::ElementRef<'_>) -> String {
    el.text().map(str::trim).collect()
}

/// Concatenated element text with whitespace kept, for regex scans that rely
/// on separators.
pub(crate) fn raw_text(el: &scraper::ElementRef<'_>) -> String {
    el.text().collect()
}
