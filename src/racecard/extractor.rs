//! Race card extraction from a parsed document
//!
//! The same extractor serves both the plain HTTP tier and the browser tier:
//! it only ever sees an [`Html`] tree. Selectors and patterns are compiled
//! once in [`RaceCardExtractor::new`] from the tables in [`rules`](super::rules).

use crate::racecard::rules::{self, FieldRule, FieldSpec};
use crate::racecard::types::{Entrant, ExtractionMethod, RaceCardResult, RaceInfo, NOT_AVAILABLE};
use crate::ScrapeError;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// Compiles a selector, reporting the offending text on failure
fn compile(selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector).map_err(|e| ScrapeError::Selector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// Text content of an element with runs of whitespace collapsed
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Non-empty text or the sentinel
fn or_sentinel(text: Option<String>) -> String {
    text.filter(|t| !t.is_empty())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// A [`FieldRule`] with its selector compiled
#[derive(Debug)]
enum CompiledRule {
    Select(Selector),
    Cell {
        index: usize,
        accept: rules::TextPredicate,
    },
    ScanCells(rules::TextPredicate),
}

/// A [`FieldSpec`] ready to run against rows
#[derive(Debug)]
struct CompiledField {
    rules: Vec<CompiledRule>,
    placeholders: &'static [&'static str],
}

impl CompiledField {
    fn compile(spec: &FieldSpec) -> Result<Self, ScrapeError> {
        let rules = spec
            .rules
            .iter()
            .map(|rule| -> Result<CompiledRule, ScrapeError> {
                Ok(match *rule {
                    FieldRule::Select(selector) => CompiledRule::Select(compile(selector)?),
                    FieldRule::Cell { index, accept } => CompiledRule::Cell { index, accept },
                    FieldRule::ScanCells(accept) => CompiledRule::ScanCells(accept),
                })
            })
            .collect::<Result<Vec<_>, ScrapeError>>()?;

        Ok(Self {
            rules,
            placeholders: spec.placeholders,
        })
    }

    /// Runs the rule chain, returning the sentinel when nothing matches
    fn extract(&self, row: &Row<'_>) -> String {
        let found = self.rules.iter().find_map(|rule| {
            let text = match rule {
                CompiledRule::Select(selector) => row.element.select(selector).next().map(element_text),
                CompiledRule::Cell { index, accept } => row
                    .cells
                    .get(*index)
                    .map(|&cell| element_text(cell))
                    .filter(|text| accept(text.as_str())),
                CompiledRule::ScanCells(accept) => row
                    .cells
                    .iter()
                    .map(|&cell| element_text(cell))
                    .find(|text| accept(text.as_str())),
            };
            text.filter(|t| !t.is_empty())
        });

        match found {
            Some(text) if !self.placeholders.contains(&text.as_str()) => text,
            _ => NOT_AVAILABLE.to_string(),
        }
    }
}

/// An entry row together with its data cells
struct Row<'a> {
    element: ElementRef<'a>,
    cells: Vec<ElementRef<'a>>,
}

/// Per-field compiled rule chains
#[derive(Debug)]
struct EntrantFields {
    frame: CompiledField,
    horse_number: CompiledField,
    age: CompiledField,
    weight: CompiledField,
    odds: CompiledField,
    popularity: CompiledField,
    jockey: CompiledField,
    trainer: CompiledField,
}

/// Extracts race cards from netkeiba entry pages
///
/// # Example
///
/// ```
/// use keiba_racecard::{ExtractionMethod, RaceCardExtractor};
/// use scraper::Html;
///
/// let html = r#"<table class="ShutubaTable"><tr class="HorseList">
///   <td class="Waku1">1</td><td class="Umaban1">1</td>
///   <td><span class="HorseName"><a href="/horse/2019104567/">ドウデュース</a></span></td>
/// </tr></table>"#;
///
/// let extractor = RaceCardExtractor::new().unwrap();
/// let card = extractor.extract(&Html::parse_document(html), ExtractionMethod::Static);
/// assert_eq!(card.total_horses(), 1);
/// assert_eq!(card.horses()[0].horse_id.as_deref(), Some("2019104567"));
/// ```
#[derive(Debug)]
pub struct RaceCardExtractor {
    rows: Selector,
    header_cells: Selector,
    cells: Selector,
    name_link: Selector,
    containers: Selector,
    table_rows: Selector,
    horse_id: Regex,
    fields: EntrantFields,
    title: Vec<Selector>,
    date: Vec<Selector>,
    course: Vec<Selector>,
    class: Vec<Selector>,
}

impl RaceCardExtractor {
    /// Compiles every selector and pattern used during extraction
    pub fn new() -> Result<Self, ScrapeError> {
        let chain = |selectors: &[&str]| -> Result<Vec<Selector>, ScrapeError> {
            selectors.iter().map(|selector| compile(selector)).collect()
        };

        Ok(Self {
            rows: compile(&rules::ROW_SELECTORS.join(", "))?,
            header_cells: compile("th")?,
            cells: compile("td")?,
            name_link: compile(&rules::NAME_LINK_SELECTORS.join(", "))?,
            containers: compile(&rules::CONTAINER_SELECTORS.join(", "))?,
            table_rows: compile("table tr")?,
            horse_id: Regex::new(rules::HORSE_ID_PATTERN)?,
            fields: EntrantFields {
                frame: CompiledField::compile(&rules::FRAME)?,
                horse_number: CompiledField::compile(&rules::HORSE_NUMBER)?,
                age: CompiledField::compile(&rules::AGE)?,
                weight: CompiledField::compile(&rules::WEIGHT)?,
                odds: CompiledField::compile(&rules::ODDS)?,
                popularity: CompiledField::compile(&rules::POPULARITY)?,
                jockey: CompiledField::compile(&rules::JOCKEY)?,
                trainer: CompiledField::compile(&rules::TRAINER)?,
            },
            title: chain(rules::RACE_TITLE)?,
            date: chain(rules::RACE_DATE)?,
            course: chain(rules::RACE_COURSE)?,
            class: chain(rules::RACE_CLASS)?,
        })
    }

    /// Checks whether the document contains an entry table at all
    ///
    /// Known container classes are checked first. Failing that, any table row
    /// mentioning at least two of the header words (枠, 馬番, 馬名) counts.
    pub fn has_race_table(&self, document: &Html) -> bool {
        if document.select(&self.containers).next().is_some() {
            return true;
        }

        document.select(&self.table_rows).any(|row| {
            let text = element_text(row);
            rules::TABLE_MARKERS
                .iter()
                .filter(|marker| text.contains(*marker))
                .count()
                >= rules::MIN_MARKERS
        })
    }

    /// Extracts race metadata and all entrants
    ///
    /// Header rows and rows without a horse-name link are skipped silently.
    pub fn extract(&self, document: &Html, method: ExtractionMethod) -> RaceCardResult {
        let race_info = self.extract_race_info(document);

        let horses: Vec<Entrant> = document
            .select(&self.rows)
            .filter_map(|row| self.extract_entrant(row))
            .collect();

        tracing::debug!("Extracted {} entrants ({})", horses.len(), method);

        RaceCardResult::new(race_info, horses, method)
    }

    /// Extracts race-level metadata, falling back to the sentinel per field
    pub fn extract_race_info(&self, document: &Html) -> RaceInfo {
        let first_text = |selectors: &[Selector]| {
            or_sentinel(selectors.iter().find_map(|selector| {
                document
                    .select(selector)
                    .map(element_text)
                    .find(|t| !t.is_empty())
            }))
        };

        RaceInfo {
            title: first_text(self.title.as_slice()),
            date: first_text(self.date.as_slice()),
            course: first_text(self.course.as_slice()),
            class: first_text(self.class.as_slice()),
        }
    }

    /// Builds an entrant from a row, or `None` for header/decoration rows
    fn extract_entrant(&self, element: ElementRef<'_>) -> Option<Entrant> {
        if element.select(&self.header_cells).next().is_some() {
            return None;
        }

        let link = element.select(&self.name_link).next()?;
        let name = element_text(link);
        if name.is_empty() {
            return None;
        }

        let url = link.value().attr("href").map(str::to_string);
        let horse_id = self.horse_id_from_url(url.as_deref());

        let row = Row {
            element,
            cells: element.select(&self.cells).collect(),
        };
        let fields = &self.fields;

        Some(Entrant {
            frame_number: fields.frame.extract(&row),
            horse_number: fields.horse_number.extract(&row),
            name,
            url,
            horse_id,
            age: fields.age.extract(&row),
            weight: fields.weight.extract(&row),
            odds: fields.odds.extract(&row),
            popularity: fields.popularity.extract(&row),
            jockey: fields.jockey.extract(&row),
            trainer: fields.trainer.extract(&row),
        })
    }

    /// Pulls the numeric horse id out of a detail-page URL
    ///
    /// `/horse/2019104567/` yields `2019104567`; a missing URL or one without
    /// the `horse/<digits>` segment yields `None`.
    pub fn horse_id_from_url(&self, url: Option<&str>) -> Option<String> {
        let url = url?;
        self.horse_id
            .captures(url)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}
