use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::models::{BasicInfo, ClubRecord, Participation, PersonalBest, SkipReport};
use crate::scraper::cleaner::{
    clean_text, parse_best_line, parse_date, parse_date_range, parse_result_line, strip_label,
};

// ── Page layout ───────────────────────────────────────────────────────────────
//
// Everything positional about the site lives here. A layout change on lpin.ro
// should only ever touch this block.

/// The swimmer's name is the page title after this prefix.
pub const NAME_PREFIX: &str = "Detalii sportiv - ";

/// Scalar fields of the swimmer info table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasicField {
    Gender,
    BirthYear,
    Club,
    LpinLicense,
    FederationLicense,
}

/// Row index → field, value is always the second cell.
pub const BASIC_INFO_ROWS: [(usize, BasicField); 5] = [
    (0, BasicField::Gender),
    (1, BasicField::BirthYear),
    (2, BasicField::Club),
    (3, BasicField::LpinLicense),
    (4, BasicField::FederationLicense),
];

const VALUE_CELL: usize = 1;

/// Club panel paragraph index → label prefix, in `ClubRecord` field order
/// (city, address, phone, email, website, coach).
pub const CLUB_DETAIL_LABELS: [(usize, &str); 6] = [
    (0, "Oras:"),
    (1, "Adresa:"),
    (2, "Telefon:"),
    (3, "Email:"),
    (4, "Website:"),
    (5, "Antrenor:"),
];

fn sel(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("bad selector {:?}: {:?}", css, e))
}

static PAGE_BODY: Lazy<Selector> = Lazy::new(|| sel(".container .row"));
static SWIMMER_NAME: Lazy<Selector> = Lazy::new(|| sel("h2"));
static NOT_FOUND_ALERT: Lazy<Selector> = Lazy::new(|| sel(".alert-danger"));
static INFO_TABLE: Lazy<Selector> = Lazy::new(|| sel(".table"));
static TR: Lazy<Selector> = Lazy::new(|| sel("tr"));
static TD: Lazy<Selector> = Lazy::new(|| sel("td"));
static PANEL: Lazy<Selector> = Lazy::new(|| sel(".panel.panel-default"));
static PANEL_HEADING: Lazy<Selector> = Lazy::new(|| sel(".panel-heading"));
static COMPETITION_NAME: Lazy<Selector> = Lazy::new(|| sel("h4"));
static COMPETITION_DATES: Lazy<Selector> = Lazy::new(|| sel("h5"));
static PANEL_LINES: Lazy<Selector> = Lazy::new(|| sel(".panel-body p"));
static BEST_LINES: Lazy<Selector> = Lazy::new(|| sel("#bestof .panel-body p"));
static CLUB_NAME: Lazy<Selector> = Lazy::new(|| sel(".panel-heading h3"));

// ── Swimmer page ──────────────────────────────────────────────────────────────

/// Everything extracted from one swimmer detail page.
#[derive(Debug, Clone, PartialEq)]
pub enum SwimmerPage {
    /// The page exists but has no swimmer on it.
    Missing,
    /// A swimmer page whose info table is unusable.
    Unparseable(String),
    Parsed(ParsedSwimmer),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSwimmer {
    pub basic: BasicInfo,
    pub participations: Vec<Participation>,
    pub personal_bests: Vec<PersonalBest>,
    pub skipped: SkipReport,
}

pub fn parse_swimmer_page(html: &str) -> SwimmerPage {
    let doc = Html::parse_document(html);

    if doc.select(&NOT_FOUND_ALERT).next().is_some() || doc.select(&PAGE_BODY).next().is_none() {
        return SwimmerPage::Missing;
    }

    let basic = match parse_basic_info(&doc) {
        Ok(b) => b,
        Err(reason) => return SwimmerPage::Unparseable(reason),
    };

    let mut skipped = SkipReport::default();
    let participations = parse_participations(&doc, &mut skipped);
    let personal_bests = parse_personal_bests(&doc, &mut skipped);

    SwimmerPage::Parsed(ParsedSwimmer { basic, participations, personal_bests, skipped })
}

fn cell_text(row: ElementRef<'_>, index: usize) -> Option<String> {
    row.select(&TD).nth(index).map(|td| clean_text(&td.text().collect::<String>()))
}

/// Page title without [`NAME_PREFIX`]; empty when there is no title.
pub fn parse_swimmer_name(doc: &Html) -> String {
    let title = doc
        .select(&SWIMMER_NAME)
        .next()
        .map(|h| clean_text(&h.text().collect::<String>()))
        .unwrap_or_default();
    let prefix = NAME_PREFIX.trim_end();
    title.strip_prefix(prefix).unwrap_or(&title).trim().to_string()
}

/// Read the title and the info table through [`BASIC_INFO_ROWS`] and check
/// the values are plausible.
pub fn parse_basic_info(doc: &Html) -> Result<BasicInfo, String> {
    let table = doc.select(&INFO_TABLE).next().ok_or("no info table")?;
    let rows: Vec<ElementRef<'_>> = table.select(&TR).collect();

    let mut info = BasicInfo {
        name: parse_swimmer_name(doc),
        ..Default::default()
    };
    let mut birth_year = None;

    for (row, field) in BASIC_INFO_ROWS {
        let value = rows.get(row).and_then(|r| cell_text(*r, VALUE_CELL)).unwrap_or_default();
        match field {
            BasicField::Gender => info.gender = value,
            BasicField::BirthYear => birth_year = value.parse::<i32>().ok(),
            BasicField::Club => info.club_name = value,
            BasicField::LpinLicense => info.lpin_license_number = value,
            BasicField::FederationLicense => info.federation_license_number = value,
        }
    }

    info.birth_year = match birth_year {
        Some(y) if (1900..=2100).contains(&y) => y,
        _ => return Err("birth year is not a year".to_string()),
    };
    if info.name.is_empty() {
        return Err("name is empty".to_string());
    }
    if info.gender.is_empty() {
        return Err("gender is empty".to_string());
    }
    if info.club_name.is_empty() {
        return Err("club is empty".to_string());
    }

    Ok(info)
}

fn panel_lines(panel: ElementRef<'_>) -> impl Iterator<Item = String> + '_ {
    panel.select(&PANEL_LINES).map(|p| clean_text(&p.text().collect::<String>()))
}

/// One participation per competition panel, in page order.
pub fn parse_participations(doc: &Html, skipped: &mut SkipReport) -> Vec<Participation> {
    let mut out = Vec::new();

    for panel in doc.select(&PANEL) {
        let Some(heading) = panel.select(&PANEL_HEADING).next() else { continue };

        // Panels without a competition heading (e.g. personal bests) are not participations.
        let name = heading
            .select(&COMPETITION_NAME)
            .next()
            .map(|h| clean_text(&h.text().collect::<String>()))
            .unwrap_or_default();
        if name.is_empty() {
            continue;
        }

        let dates = heading
            .select(&COMPETITION_DATES)
            .next()
            .map(|h| clean_text(&h.text().collect::<String>()))
            .unwrap_or_default();

        let Some(date_range) = parse_date_range(&dates) else {
            debug!("Dropping participation {:?}: unreadable dates {:?}", name, dates);
            skipped.participations += 1;
            continue;
        };

        let mut results = Vec::new();
        for line in panel_lines(panel) {
            match parse_result_line(&line) {
                Some(r) => results.push(r),
                None => {
                    debug!("Dropping result line {:?}", line);
                    skipped.results += 1;
                }
            }
        }

        out.push(Participation { competition_name: name, date_range, results });
    }

    out
}

pub fn parse_personal_bests(doc: &Html, skipped: &mut SkipReport) -> Vec<PersonalBest> {
    let mut out = Vec::new();

    for p in doc.select(&BEST_LINES) {
        let text = clean_text(&p.text().collect::<String>());

        let best = parse_best_line(&text).and_then(|b| {
            let date = parse_date(&b.date)?;
            Some(PersonalBest { style: b.style, time: b.time, competition: b.competition, date })
        });

        match best {
            Some(b) => out.push(b),
            None => {
                debug!("Dropping personal best line {:?}", text);
                skipped.personal_bests += 1;
            }
        }
    }

    out
}

// ── Club listing ──────────────────────────────────────────────────────────────

/// One club per listing panel with a non-empty name.
pub fn parse_club_listing(html: &str) -> (Vec<ClubRecord>, SkipReport) {
    let doc = Html::parse_document(html);
    let mut skipped = SkipReport::default();
    let mut clubs = Vec::new();

    for panel in doc.select(&PANEL) {
        let name = panel
            .select(&CLUB_NAME)
            .next()
            .map(|h| clean_text(&h.text().collect::<String>()))
            .unwrap_or_default();
        if name.is_empty() {
            skipped.clubs += 1;
            continue;
        }

        let details: Vec<String> = panel_lines(panel).collect();
        let [city, address, phone, email, website, coach] = CLUB_DETAIL_LABELS.map(|(idx, label)| {
            strip_label(details.get(idx).map(String::as_str).unwrap_or(""), label)
        });

        clubs.push(ClubRecord { name, city, address, phone, email, website, coach });
    }

    (clubs, skipped)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
