//! Live win-odds board
//!
//! Odds move until post time, so the board is always fetched fresh and never
//! written to the page store.

use super::race::HorseRow;
use super::{decode_html, tidy_text};
use crate::crawler::{FetchOutcome, Fetcher};
use crate::site::Endpoints;
use scraper::{Html, Selector};
use std::collections::HashMap;

/// Odds assigned to runners the board carries no price for.
///
/// 5.0 sits near the middle of a typical field, so a missing price reads as
/// a neutral runner instead of a longshot or a favorite.
pub const DEFAULT_NEUTRAL_ODDS: f64 = 5.0;

/// Fetches the current win-odds board for a race.
///
/// A spent request budget is an error; any other failure degrades to an
/// empty board so callers can still fall back to defaults.
pub async fn fetch_win_odds(
    fetcher: &Fetcher,
    endpoints: &Endpoints,
    race_id: &str,
) -> crate::Result<HashMap<u32, f64>> {
    let url = endpoints.win_odds(race_id);
    match fetcher.fetch(&url).await {
        FetchOutcome::Fetched(bytes) => match decode_html(&bytes) {
            Ok(html) => Ok(parse_win_odds(&html)),
            Err(_) => {
                tracing::warn!("could not decode odds page for race {}", race_id);
                Ok(HashMap::new())
            }
        },
        FetchOutcome::BudgetExhausted { consumed, limit } => {
            Err(crate::KeibaError::BudgetExhausted { consumed, limit })
        }
        FetchOutcome::NotFound => {
            tracing::warn!("odds page not found for race {}", race_id);
            Ok(HashMap::new())
        }
        FetchOutcome::Failed { reason } => {
            tracing::warn!("odds fetch failed for race {}: {}", race_id, reason);
            Ok(HashMap::new())
        }
    }
}

/// Extracts horse number to win odds pairs from an odds page.
///
/// Rows that do not parse as a number-odds pair are skipped, which covers
/// header rows and the `---.-` placeholder shown before betting opens.
pub fn parse_win_odds(html: &str) -> HashMap<u32, f64> {
    let mut board = HashMap::new();

    let table = match Selector::parse("table.Odds_Table") {
        Ok(selector) => selector,
        Err(_) => return board,
    };
    let rows = match Selector::parse("tr") {
        Ok(selector) => selector,
        Err(_) => return board,
    };
    let cells = match Selector::parse("td") {
        Ok(selector) => selector,
        Err(_) => return board,
    };

    let document = Html::parse_document(html);
    let table = match document.select(&table).next() {
        Some(table) => table,
        None => return board,
    };

    for row in table.select(&rows) {
        let row_cells: Vec<_> = row.select(&cells).collect();
        if row_cells.len() < 2 {
            continue;
        }
        let number: u32 = match tidy_text(&row_cells[0]).parse() {
            Ok(number) => number,
            Err(_) => continue,
        };
        if let Ok(value) = tidy_text(&row_cells[1]).parse::<f64>() {
            board.insert(number, value);
        }
    }

    board
}

/// Overlays board odds onto runners by horse number, then fills every runner
/// still without a price with [`DEFAULT_NEUTRAL_ODDS`].
pub fn apply_win_odds(horses: &mut [HorseRow], board: &HashMap<u32, f64>) {
    for horse in horses.iter_mut() {
        if let Some(number) = horse.number {
            if let Some(value) = board.get(&number) {
                horse.win_odds = Some(*value);
            }
        }
        if horse.win_odds.is_none() {
            horse.win_odds = Some(DEFAULT_NEUTRAL_ODDS);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_page(rows: &str) -> String {
        format!(
            "<html><body><table class=\"Odds_Table\"><tbody>\
             <tr><th>馬番</th><th>オッズ</th></tr>{rows}\
             </tbody></table></body></html>"
        )
    }

    #[test]
    fn test_parse_board() {
        let page = board_page(
            "<tr><td>1</td><td>2.4</td></tr>\
             <tr><td>2</td><td>15.8</td></tr>\
             <tr><td>3</td><td>102.3</td></tr>",
        );
        let board = parse_win_odds(&page);
        assert_eq!(board.len(), 3);
        assert_eq!(board.get(&1), Some(&2.4));
        assert_eq!(board.get(&3), Some(&102.3));
    }

    #[test]
    fn test_unreadable_rows_are_skipped() {
        let page = board_page(
            "<tr><td>1</td><td>---.-</td></tr>\
             <tr><td>取消</td><td>4.2</td></tr>\
             <tr><td>2</td><td>6.1</td></tr>\
             <tr><td>3</td></tr>",
        );
        let board = parse_win_odds(&page);
        assert_eq!(board.len(), 1);
        assert_eq!(board.get(&2), Some(&6.1));
    }

    #[test]
    fn test_missing_table_yields_empty_board() {
        let board = parse_win_odds("<html><body><p>no odds yet</p></body></html>");
        assert!(board.is_empty());
    }

    #[test]
    fn test_apply_overlays_and_fills() {
        let mut horses = vec![
            HorseRow {
                number: Some(1),
                win_odds: None,
                ..named("priced")
            },
            HorseRow {
                number: Some(2),
                win_odds: Some(9.9),
                ..named("overlaid")
            },
            HorseRow {
                number: Some(3),
                win_odds: None,
                ..named("unpriced")
            },
            HorseRow {
                number: None,
                win_odds: None,
                ..named("numberless")
            },
        ];
        let board = HashMap::from([(1, 2.4), (2, 3.0)]);

        apply_win_odds(&mut horses, &board);

        assert_eq!(horses[0].win_odds, Some(2.4));
        // The board wins over a previously parsed price.
        assert_eq!(horses[1].win_odds, Some(3.0));
        assert_eq!(horses[2].win_odds, Some(DEFAULT_NEUTRAL_ODDS));
        assert_eq!(horses[3].win_odds, Some(DEFAULT_NEUTRAL_ODDS));
    }

    #[test]
    fn test_apply_keeps_parsed_price_without_overlay() {
        let mut horses = vec![HorseRow {
            number: Some(7),
            win_odds: Some(41.2),
            ..named("held")
        }];
        apply_win_odds(&mut horses, &HashMap::new());
        assert_eq!(horses[0].win_odds, Some(41.2));
    }

    fn named(name: &str) -> HorseRow {
        HorseRow {
            gate: None,
            number: None,
            name: name.to_string(),
            sex: None,
            age: None,
            carried_weight: None,
            jockey: None,
            trainer: None,
            win_odds: None,
            body_weight: None,
            weight_change: None,
        }
    }
}
