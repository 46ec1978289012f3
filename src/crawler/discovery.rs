//! Discovery of meeting days, race ids, and horse ids
//!
//! Discovery pages are navigation, not data, so they are fetched every run
//! and never stored. The listing functions degrade to empty results on fetch
//! or decode failure; only a spent budget stops the run.

use crate::crawler::{FetchOutcome, Fetcher};
use crate::parser::decode_html;
use crate::site::Endpoints;
use chrono::NaiveDate;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;

static DAY_LINKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".Calendar_Table .Week > td > a").unwrap());
static KAISAI_DATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"kaisai_date=(\d+)").unwrap());
static RACE_LINKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"li.RaceList_DataItem a[href*="/race/"]"#).unwrap());
static RACE_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"race_id=(\d+)").unwrap());
static HORSE_LINKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"a[href*="/horse/"]"#).unwrap());
static HORSE_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/horse/(\d+)/").unwrap());

/// Days with at least one race meeting in the given month, ascending.
pub async fn list_meeting_days(
    fetcher: &Fetcher,
    endpoints: &Endpoints,
    year: i32,
    month: u32,
) -> crate::Result<Vec<NaiveDate>> {
    let url = endpoints.calendar(year, month);
    match fetch_listing(fetcher, &url).await? {
        Some(html) => Ok(parse_meeting_days(&html)),
        None => Ok(Vec::new()),
    }
}

/// Race ids run on the given day, in the order the site lists them.
pub async fn list_race_ids(
    fetcher: &Fetcher,
    endpoints: &Endpoints,
    day: NaiveDate,
) -> crate::Result<Vec<String>> {
    let url = endpoints.race_list(day);
    match fetch_listing(fetcher, &url).await? {
        Some(html) => Ok(parse_race_ids(&html)),
        None => Ok(Vec::new()),
    }
}

async fn fetch_listing(fetcher: &Fetcher, url: &str) -> crate::Result<Option<String>> {
    match fetcher.fetch(url).await {
        FetchOutcome::Fetched(bytes) => match decode_html(&bytes) {
            Ok(html) => Ok(Some(html)),
            Err(_) => {
                tracing::warn!("could not decode listing page {}", url);
                Ok(None)
            }
        },
        FetchOutcome::BudgetExhausted { consumed, limit } => {
            Err(crate::KeibaError::BudgetExhausted { consumed, limit })
        }
        FetchOutcome::NotFound => {
            tracing::warn!("listing page not found: {}", url);
            Ok(None)
        }
        FetchOutcome::Failed { reason } => {
            tracing::warn!("listing fetch failed for {}: {}", url, reason);
            Ok(None)
        }
    }
}

/// Pulls meeting days out of a monthly calendar page.
///
/// Calendar cells link to the day's race list with a `kaisai_date` query
/// parameter; that parameter is the date.
fn parse_meeting_days(html: &str) -> Vec<NaiveDate> {
    let document = Html::parse_document(html);
    let mut days = Vec::new();
    for link in document.select(&DAY_LINKS) {
        if let Some(href) = link.value().attr("href") {
            if let Some(caps) = KAISAI_DATE.captures(href) {
                if let Ok(day) = NaiveDate::parse_from_str(&caps[1], "%Y%m%d") {
                    if !days.contains(&day) {
                        days.push(day);
                    }
                }
            }
        }
    }
    days.sort();
    days
}

/// Pulls race ids out of a daily race-list page, first-seen order.
fn parse_race_ids(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut race_ids = Vec::new();
    for link in document.select(&RACE_LINKS) {
        if let Some(href) = link.value().attr("href") {
            if let Some(caps) = RACE_ID.captures(href) {
                let race_id = caps[1].to_string();
                if !race_ids.contains(&race_id) {
                    race_ids.push(race_id);
                }
            }
        }
    }
    race_ids
}

/// Horse ids linked from a stored race page, first-seen order.
///
/// Works on cached bytes, so an undecodable page cannot stop the crawl; it
/// just contributes no horses.
pub fn extract_horse_ids(page: &[u8]) -> Vec<String> {
    let html = match decode_html(page) {
        Ok(html) => html,
        Err(_) => {
            tracing::warn!("could not decode cached race page while collecting horse ids");
            return Vec::new();
        }
    };

    let document = Html::parse_document(&html);
    let mut horse_ids = Vec::new();
    for link in document.select(&HORSE_LINKS) {
        if let Some(href) = link.value().attr("href") {
            if let Some(caps) = HORSE_ID.captures(href) {
                let horse_id = caps[1].to_string();
                if !horse_ids.contains(&horse_id) {
                    horse_ids.push(horse_id);
                }
            }
        }
    }
    horse_ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_meeting_days_sorted_and_deduped() {
        let html = r#"<table class="Calendar_Table">
            <tr class="Week">
              <td><a href="../top/race_list.html?kaisai_date=20241208">8</a></td>
              <td><a href="../top/race_list.html?kaisai_date=20241201">1</a></td>
              <td><a href="../top/race_list.html?kaisai_date=20241208">8</a></td>
              <td>9</td>
              <td><a href="../top/other.html">x</a></td>
            </tr>
        </table>"#;
        let days = parse_meeting_days(html);
        assert_eq!(
            days,
            vec![
                NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 12, 8).unwrap(),
            ]
        );
    }

    #[test]
    fn test_parse_meeting_days_empty_page() {
        assert!(parse_meeting_days("<html><body></body></html>").is_empty());
    }

    #[test]
    fn test_parse_meeting_days_consecutive_months() {
        // A multi-month span parses calendars back to back.
        let november = r#"<table class="Calendar_Table">
            <tr class="Week">
              <td><a href="../top/race_list.html?kaisai_date=20241102">2</a></td>
            </tr>
        </table>"#;
        let december = r#"<table class="Calendar_Table">
            <tr class="Week">
              <td><a href="../top/race_list.html?kaisai_date=20241201">1</a></td>
            </tr>
        </table>"#;
        assert_eq!(
            parse_meeting_days(november),
            vec![NaiveDate::from_ymd_opt(2024, 11, 2).unwrap()]
        );
        assert_eq!(
            parse_meeting_days(december),
            vec![NaiveDate::from_ymd_opt(2024, 12, 1).unwrap()]
        );
    }

    #[test]
    fn test_parse_race_ids_keeps_site_order() {
        let html = r#"<ul>
            <li class="RaceList_DataItem">
              <a href="../race/result.html?race_id=202406050811&rf=race_list">11R</a>
            </li>
            <li class="RaceList_DataItem">
              <a href="../race/result.html?race_id=202406050801&rf=race_list">1R</a>
              <a href="../race/shutuba.html?race_id=202406050801">card</a>
            </li>
            <li class="RaceList_DataItem">
              <a href="../odds/index.html?rf=race_list">odds</a>
            </li>
        </ul>"#;
        let race_ids = parse_race_ids(html);
        assert_eq!(race_ids, vec!["202406050811", "202406050801"]);
    }

    #[test]
    fn test_extract_horse_ids_first_seen_order() {
        let html = r#"<table>
            <td><a href="/horse/2019104308/">A</a></td>
            <td><a href="/horse/2020101234/">B</a></td>
            <td><a href="/horse/2019104308/">A again</a></td>
            <td><a href="/horse/ped/2020109999/">ped link, no id segment</a></td>
            <td><a href="/jockey/00666/">not a horse</a></td>
        </table>"#;
        let horse_ids = extract_horse_ids(html.as_bytes());
        assert_eq!(horse_ids, vec!["2019104308", "2020101234"]);
    }

    #[test]
    fn test_extract_horse_ids_garbage_bytes() {
        // 0xFF is invalid in every candidate encoding.
        let raw = vec![0xFF, 0xFE, 0xFF, 0x00, 0xFF];
        assert!(extract_horse_ids(&raw).is_empty());
    }
}
