//! Race page parsing
//!
//! A stored race page is either a finished-race result table or a pre-race
//! card (shutuba). Both layouts share one output shape; fields a layout does
//! not carry stay `None`. Rows that do not yield a horse name are dropped.

use super::{decode_html, raw_text, tidy_text, ParseError};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static SEX_AGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([牡牝セ])(\d+)").unwrap());
static BODY_WEIGHT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\(([+-]?\d+)\)").unwrap());
static TRAINER_REGION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[.\](.+)").unwrap());
static DISTANCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([芝ダ障])(\d+)m").unwrap());
static WEATHER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"天候\s*:\s*(\S+)").unwrap());
static GOING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"馬場\s*:\s*(\S+)").unwrap());
static HEAD_COUNT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)頭").unwrap());

/// Condition markers that can appear as standalone spans in the race header.
const RACE_SYMBOLS: [&str; 13] = [
    "牝",
    "牡",
    "混",
    "ハンデ",
    "定量",
    "別定",
    "馬齢",
    "見習騎手",
    "せん",
    "国際",
    "指定",
    "特指",
    "抽選",
];

/// Which table layout the page carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableLayout {
    /// Finished race with a `race_table_01` result table.
    Result,
    /// Pre-race card with a `Shutuba_Table` runner list.
    Shutuba,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Turf,
    Dirt,
    Obstacle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Right,
    Left,
    Straight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grade {
    G1,
    G2,
    G3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sex {
    Stallion,
    Mare,
    Gelding,
}

/// One runner extracted from the table.
///
/// Only `name` is mandatory; everything else is best-effort and absent when
/// the cell is missing or unreadable.
#[derive(Debug, Clone, PartialEq)]
pub struct HorseRow {
    pub gate: Option<u32>,
    pub number: Option<u32>,
    pub name: String,
    pub sex: Option<Sex>,
    pub age: Option<u32>,
    /// Assigned weight carried in the race, in kilograms.
    pub carried_weight: Option<f64>,
    pub jockey: Option<String>,
    pub trainer: Option<String>,
    pub win_odds: Option<f64>,
    /// Horse's own weight in kilograms.
    pub body_weight: Option<u32>,
    /// Change from the previous start, kilograms.
    pub weight_change: Option<i32>,
}

impl HorseRow {
    fn named(name: String) -> Self {
        Self {
            gate: None,
            number: None,
            name,
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

/// Race-level metadata from the page header.
#[derive(Debug, Clone, PartialEq)]
pub struct RaceRecord {
    pub race_id: String,
    pub name: Option<String>,
    pub grade: Option<Grade>,
    pub distance_meters: Option<u32>,
    pub surface: Option<Surface>,
    pub direction: Option<Direction>,
    pub weather: Option<String>,
    pub going: Option<String>,
    pub racetrack: Option<String>,
    /// Race number on the card, from the last two digits of the race id.
    pub race_number: Option<u32>,
    pub race_class: Option<String>,
    pub symbols: Vec<String>,
    /// Field size announced in the header, when present.
    pub declared_runners: Option<u32>,
    /// Number of runner rows actually extracted.
    pub horse_count: usize,
}

impl RaceRecord {
    fn new(race_id: &str) -> Self {
        Self {
            race_id: race_id.to_string(),
            name: None,
            grade: None,
            distance_meters: None,
            surface: None,
            direction: None,
            weather: None,
            going: None,
            racetrack: None,
            race_number: None,
            race_class: None,
            symbols: Vec::new(),
            declared_runners: None,
            horse_count: 0,
        }
    }
}

/// A fully parsed race page.
#[derive(Debug, Clone)]
pub struct ParsedRace {
    pub layout: TableLayout,
    pub record: RaceRecord,
    pub horses: Vec<HorseRow>,
}

/// Parses a stored race page.
///
/// The bytes are decoded, the runner table located by probing the known
/// layouts, and the header and rows extracted. A page with no recognizable
/// table is an error; a recognizable table with unreadable rows is not.
///
/// # Arguments
///
/// * `race_id` - The 12-digit race id the page was stored under
/// * `raw` - The page bytes exactly as fetched
pub fn parse_race(race_id: &str, raw: &[u8]) -> Result<ParsedRace, ParseError> {
    let html = decode_html(raw)?;
    let document = Html::parse_document(&html);

    let (table, layout) =
        find_runner_table(&document).ok_or_else(|| ParseError::TableNotFound {
            race_id: race_id.to_string(),
        })?;

    let mut record = parse_race_metadata(&document, race_id);
    let horses = match layout {
        TableLayout::Result => parse_result_rows(table),
        TableLayout::Shutuba => parse_shutuba_rows(table),
    };
    record.horse_count = horses.len();

    Ok(ParsedRace {
        layout,
        record,
        horses,
    })
}

fn find_runner_table(document: &Html) -> Option<(ElementRef<'_>, TableLayout)> {
    let probes = [
        ("table.race_table_01", TableLayout::Result),
        ("table.Shutuba_Table", TableLayout::Shutuba),
        (r#"table[summary="出馬表"]"#, TableLayout::Shutuba),
    ];
    for (css, layout) in probes {
        if let Ok(selector) = Selector::parse(css) {
            if let Some(table) = document.select(&selector).next() {
                return Some((table, layout));
            }
        }
    }
    None
}

fn parse_race_metadata(document: &Html, race_id: &str) -> RaceRecord {
    let mut record = RaceRecord::new(race_id);

    if let Ok(selector) = Selector::parse("h1.RaceName") {
        if let Some(title) = document.select(&selector).next() {
            let name = tidy_text(&title);
            if !name.is_empty() {
                record.grade = detect_grade(&name);
                record.name = Some(name);
            }
        }
    }

    if let Ok(selector) = Selector::parse("div.RaceData01") {
        if let Some(header) = document.select(&selector).next() {
            let text = raw_text(&header);
            if let Some(caps) = DISTANCE.captures(&text) {
                record.surface = Some(match &caps[1] {
                    "芝" => Surface::Turf,
                    "ダ" => Surface::Dirt,
                    _ => Surface::Obstacle,
                });
                record.distance_meters = caps[2].parse().ok();
            }
            record.direction = detect_direction(&text);
            if let Some(caps) = WEATHER.captures(&text) {
                record.weather = Some(caps[1].to_string());
            }
            if let Some(caps) = GOING.captures(&text) {
                record.going = Some(caps[1].to_string());
            }
        }
    }

    if let Ok(selector) = Selector::parse("div.RaceData02 span") {
        let spans: Vec<ElementRef<'_>> = document.select(&selector).collect();
        // spans[0] is the meeting ordinal, spans[1] the track name.
        if spans.len() >= 2 {
            let racetrack = tidy_text(&spans[1]);
            if !racetrack.is_empty() {
                record.racetrack = Some(racetrack);
            }
            for span in &spans {
                let text = tidy_text(span);
                if RACE_SYMBOLS.contains(&text.as_str()) {
                    record.symbols.push(text.clone());
                }
                if text.contains("サラ") || text.contains('系') {
                    record.race_class = Some(text.clone());
                }
                if let Some(caps) = HEAD_COUNT.captures(&text) {
                    record.declared_runners = caps[1].parse().ok();
                }
            }
        }
    }

    if race_id.len() == 12 {
        if let Some(digits) = race_id.get(10..12) {
            record.race_number = digits.parse().ok();
        }
    }

    record
}

fn detect_grade(name: &str) -> Option<Grade> {
    // Checked longest-first so "GIII" is not misread as "GI".
    if name.contains("G3") || name.contains("GIII") {
        Some(Grade::G3)
    } else if name.contains("G2") || name.contains("GII") {
        Some(Grade::G2)
    } else if name.contains("G1") || name.contains("GI") {
        Some(Grade::G1)
    } else {
        None
    }
}

fn detect_direction(text: &str) -> Option<Direction> {
    // Both ASCII and full-width parentheses occur in the header.
    if text.contains("(右)") || text.contains("（右）") {
        Some(Direction::Right)
    } else if text.contains("(左)") || text.contains("（左）") {
        Some(Direction::Left)
    } else if text.contains("(直線)") || text.contains("（直線）") {
        Some(Direction::Straight)
    } else {
        None
    }
}

fn sex_from_kanji(kanji: &str) -> Option<Sex> {
    match kanji {
        "牡" => Some(Sex::Stallion),
        "牝" => Some(Sex::Mare),
        "セ" => Some(Sex::Gelding),
        _ => None,
    }
}

fn strip_region(trainer: &str) -> String {
    // "[東]藤沢和雄" carries the training-center tag in front of the name.
    match TRAINER_REGION.captures(trainer) {
        Some(caps) => caps[1].to_string(),
        None => trainer.to_string(),
    }
}

struct RowSelectors {
    cell: Selector,
    anchor: Selector,
    horse_name: Selector,
}

fn row_selectors() -> Option<RowSelectors> {
    Some(RowSelectors {
        cell: Selector::parse("td").ok()?,
        anchor: Selector::parse("a").ok()?,
        horse_name: Selector::parse("span.HorseName").ok()?,
    })
}

fn cell_link_text(cell: &ElementRef<'_>, selectors: &RowSelectors) -> String {
    match cell.select(&selectors.anchor).next() {
        Some(link) => tidy_text(&link),
        None => tidy_text(cell),
    }
}

fn parse_result_rows(table: ElementRef<'_>) -> Vec<HorseRow> {
    let selectors = match row_selectors() {
        Some(selectors) => selectors,
        None => return Vec::new(),
    };
    let rows = match Selector::parse("tr") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    let mut horses = Vec::new();
    for row in table.select(&rows) {
        let cells: Vec<ElementRef<'_>> = row.select(&selectors.cell).collect();
        if cells.len() < 8 {
            continue;
        }
        if let Some(horse) = parse_result_row(&cells, &selectors) {
            horses.push(horse);
        }
    }
    horses
}

/// Result-table cells: [0] finish [1] gate [2] number [3] name [4] sex-age
/// [5] carried weight [6] jockey, win odds at index 12 (11 in narrow
/// tables), body weight at 14, trainer at 18.
fn parse_result_row(cells: &[ElementRef<'_>], selectors: &RowSelectors) -> Option<HorseRow> {
    let name = cell_link_text(&cells[3], selectors);
    if name.is_empty() {
        return None;
    }
    let mut horse = HorseRow::named(name);

    horse.gate = tidy_text(&cells[1]).parse().ok();
    horse.number = tidy_text(&cells[2]).parse().ok();

    if let Some(caps) = SEX_AGE.captures(&tidy_text(&cells[4])) {
        horse.sex = sex_from_kanji(&caps[1]);
        horse.age = caps[2].parse().ok();
    }
    horse.carried_weight = tidy_text(&cells[5]).parse().ok();

    let jockey = cell_link_text(&cells[6], selectors);
    if !jockey.is_empty() {
        horse.jockey = Some(jockey);
    }

    let odds_idx = if cells.len() > 12 {
        Some(12)
    } else if cells.len() > 11 {
        Some(11)
    } else {
        None
    };
    if let Some(idx) = odds_idx {
        horse.win_odds = tidy_text(&cells[idx]).parse().ok();
    }

    if cells.len() > 14 {
        if let Some(caps) = BODY_WEIGHT.captures(&tidy_text(&cells[14])) {
            horse.body_weight = caps[1].parse().ok();
            horse.weight_change = caps[2].parse().ok();
        }
    }

    if cells.len() > 18 {
        let trainer = strip_region(&tidy_text(&cells[18]));
        if !trainer.is_empty() {
            horse.trainer = Some(trainer);
        }
    }

    Some(horse)
}

fn parse_shutuba_rows(table: ElementRef<'_>) -> Vec<HorseRow> {
    let selectors = match row_selectors() {
        Some(selectors) => selectors,
        None => return Vec::new(),
    };
    let rows = match Selector::parse("tr.HorseList") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    let mut horses = Vec::new();
    for row in table.select(&rows) {
        let cells: Vec<ElementRef<'_>> = row.select(&selectors.cell).collect();
        if cells.len() < 8 {
            continue;
        }
        if let Some(horse) = parse_shutuba_row(&cells, &selectors) {
            horses.push(horse);
        }
    }
    horses
}

/// Card-table cells (`tr.HorseList`): [0] gate [1] number [2] checkbox
/// [3] name [4] sex-age [5] carried weight [6] jockey [7] trainer
/// [8] body weight. The card page carries no win odds.
fn parse_shutuba_row(cells: &[ElementRef<'_>], selectors: &RowSelectors) -> Option<HorseRow> {
    let name_cell = &cells[3];
    let name = match name_cell.select(&selectors.horse_name).next() {
        Some(span) => tidy_text(&span),
        None => cell_link_text(name_cell, selectors),
    };
    if name.is_empty() {
        return None;
    }
    let mut horse = HorseRow::named(name);

    horse.gate = tidy_text(&cells[0]).parse().ok();
    horse.number = tidy_text(&cells[1]).parse().ok();

    if let Some(caps) = SEX_AGE.captures(&tidy_text(&cells[4])) {
        horse.sex = sex_from_kanji(&caps[1]);
        horse.age = caps[2].parse().ok();
    }
    horse.carried_weight = tidy_text(&cells[5]).parse().ok();

    let jockey = cell_link_text(&cells[6], selectors);
    if !jockey.is_empty() {
        horse.jockey = Some(jockey);
    }

    let trainer = strip_region(&cell_link_text(&cells[7], selectors));
    if !trainer.is_empty() {
        horse.trainer = Some(trainer);
    }

    if cells.len() > 8 {
        if let Some(caps) = BODY_WEIGHT.captures(&tidy_text(&cells[8])) {
            horse.body_weight = caps[1].parse().ok();
            horse.weight_change = caps[2].parse().ok();
        }
    }

    Some(horse)
}
