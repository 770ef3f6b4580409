use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{DateRange, Place, SwimResult};

// ── Labels printed by the site ────────────────────────────────────────────────

static RESULT_LABELS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Timp realizat:|Locul obtinut:").expect("result label regex"));

static BEST_STYLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(.*?)Timp:").expect("style regex"));
static BEST_TIME: Lazy<Regex> = Lazy::new(|| Regex::new(r"Timp: ([\d:.]+)").expect("time regex"));
static BEST_COMPETITION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Competitie: (.*?)Data:").expect("competition regex"));
static BEST_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Data: (.*)$").expect("date regex"));

/// "12 Martie 2023", "1 May 2023", "3 sept. 2022"
static MONTH_NAME_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})\s+(\p{L}+)\.?\s+(\d{4})$").expect("month date regex"));

/// Romanian month names; any prefix of three or more letters also matches.
const ROMANIAN_MONTHS: [&str; 12] = [
    "ianuarie",
    "februarie",
    "martie",
    "aprilie",
    "mai",
    "iunie",
    "iulie",
    "august",
    "septembrie",
    "octombrie",
    "noiembrie",
    "decembrie",
];

// ── Text ──────────────────────────────────────────────────────────────────────

/// Collapse runs of whitespace (including newlines from markup) into single spaces.
pub fn clean_text(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip a literal label prefix, e.g. "Oras: Cluj" → "Cluj". A label with
/// no value stays empty.
pub fn strip_label(text: &str, label: &str) -> String {
    let value = text.trim();
    value.strip_prefix(label).unwrap_or(value).trim().to_string()
}

// ── Dates ─────────────────────────────────────────────────────────────────────

/// Parse the date formats seen on the site: "01.05.2023", ISO, "01/05/2023",
/// "01-05-2023", and day / month name / year in English or Romanian.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    for fmt in ["%d.%m.%Y", "%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y.%m.%d", "%d %B %Y", "%d %b %Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    parse_romanian_date(s)
}

fn parse_romanian_date(s: &str) -> Option<NaiveDate> {
    let caps = MONTH_NAME_DATE.captures(s)?;
    let day: u32 = caps[1].parse().ok()?;
    let month = romanian_month(&caps[2])?;
    let year: i32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn romanian_month(name: &str) -> Option<u32> {
    let name = name.to_lowercase();
    if name.chars().count() < 3 {
        return None;
    }
    ROMANIAN_MONTHS
        .iter()
        .position(|m| m.starts_with(name.as_str()))
        .map(|i| i as u32 + 1)
}

/// Split a heading like "2023-05-01 - 2023-05-03" or "01.05.2023-03.05.2023"
/// into start/end tokens. Without a range separator, end is start.
pub fn split_date_range(text: &str) -> (String, String) {
    let text = text.trim();

    if let Some((start, end)) = text.split_once(" - ") {
        return finish_range(start, end);
    }

    // A bare '-' separates the range only when both sides are dates; otherwise it
    // belongs to a single ISO or dashed date.
    let dashes: Vec<usize> = text.match_indices('-').map(|(i, _)| i).collect();
    for &i in &dashes {
        let (start, end) = (&text[..i], &text[i + 1..]);
        if parse_date(start).is_some() && parse_date(end).is_some() {
            return finish_range(start, end);
        }
    }
    if dashes.len() == 1 && parse_date(text).is_none() {
        let (start, end) = text.split_at(dashes[0]);
        return finish_range(start, &end[1..]);
    }

    (text.to_string(), text.to_string())
}

fn finish_range(start: &str, end: &str) -> (String, String) {
    let start = start.trim().to_string();
    let end = end.trim();
    if end.is_empty() {
        (start.clone(), start)
    } else {
        (start, end.to_string())
    }
}

pub fn parse_date_range(text: &str) -> Option<DateRange> {
    let (start, end) = split_date_range(text);
    let start = parse_date(&start)?;
    let end = parse_date(&end).unwrap_or(start);
    Some(DateRange { start, end })
}

// ── Result lines ──────────────────────────────────────────────────────────────

/// "50m Liber Timp realizat: 00:28:50 Locul obtinut: 2" → style, time, place.
/// `None` unless all three parts are non-empty.
pub fn parse_result_line(text: &str) -> Option<SwimResult> {
    let parts: Vec<&str> = RESULT_LABELS.split(text).map(str::trim).collect();

    let [style, time, place, ..] = parts.as_slice() else {
        return None;
    };
    if style.is_empty() || time.is_empty() || place.is_empty() {
        return None;
    }

    Some(SwimResult {
        style: style.to_string(),
        time: time.to_string(),
        place: Place::parse(place),
    })
}

// ── Personal bests ────────────────────────────────────────────────────────────

/// Raw personal-best fields; all four patterns must match.
#[derive(Debug, Clone, PartialEq)]
pub struct BestLine {
    pub style: String,
    pub time: String,
    pub competition: String,
    pub date: String,
}

pub fn parse_best_line(text: &str) -> Option<BestLine> {
    let style = BEST_STYLE.captures(text)?;
    let time = BEST_TIME.captures(text)?;
    let competition = BEST_COMPETITION.captures(text)?;
    let date = BEST_DATE.captures(text)?;

    Some(BestLine {
        style: style[1].trim().to_string(),
        time: time[1].trim().to_string(),
        competition: competition[1].trim().to_string(),
        date: date[1].trim().to_string(),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
