//! Selector fallback rules for the entry table
//!
//! netkeiba serves more than one markup layout at a time and has changed its
//! class names over the years. Each field is therefore described by an
//! ordered list of rules; the first rule that yields non-empty text wins and
//! the field falls back to [`NOT_AVAILABLE`](super::NOT_AVAILABLE) when none
//! does. Supporting a new layout means adding a rule here, not a branch in
//! the extractor.

/// Predicate over a cell's trimmed text
pub type TextPredicate = fn(&str) -> bool;

/// One way of locating a field inside an entry row
#[derive(Debug, Clone, Copy)]
pub enum FieldRule {
    /// Text of the first element matched by a CSS selector group
    Select(&'static str),

    /// Text of the `td` at a fixed position, if it passes the predicate
    Cell {
        index: usize,
        accept: TextPredicate,
    },

    /// Text of the first `td` that passes the predicate
    ScanCells(TextPredicate),
}

/// The rule chain for one entrant field
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub rules: &'static [FieldRule],
    /// Texts meaning "not published yet", mapped to the sentinel
    pub placeholders: &'static [&'static str],
}

/// Row patterns, matched as one group so each row is visited once in
/// document order
pub const ROW_SELECTORS: &[&str] = &[
    ".HorseList",
    r#"tr[id^="tr_"]"#,
    ".RaceTable01 tr",
    ".ShutubaTable tr",
    ".Shutuba_Table tr",
];

/// Link carrying the horse name and detail URL
pub const NAME_LINK_SELECTORS: &[&str] = &[
    ".HorseName a",
    ".HorseInfo .HorseName a",
    r#"td a[href*="/horse/"]"#,
];

/// Entry table containers across known layouts
pub const CONTAINER_SELECTORS: &[&str] = &[".ShutubaTable", ".RaceTable01", ".Shutuba_Table"];

/// Header words of the entry table: 枠 (bracket), 馬番 (number), 馬名 (name)
pub const TABLE_MARKERS: &[&str] = &["枠", "馬番", "馬名"];

/// How many markers a row must contain to identify an entry table
pub const MIN_MARKERS: usize = 2;

/// Path keyword preceding the numeric horse id in detail URLs
pub const HORSE_ID_PATTERN: &str = r"horse/(\d+)";

pub const FRAME: FieldSpec = FieldSpec {
    name: "frame",
    rules: &[
        FieldRule::Select(r#"[class*="Waku"], td.waku"#),
        FieldRule::Cell {
            index: 0,
            accept: is_number,
        },
    ],
    placeholders: &[],
};

pub const HORSE_NUMBER: FieldSpec = FieldSpec {
    name: "horse_number",
    rules: &[
        FieldRule::Select(r#"[class*="Umaban"], td.umaban"#),
        FieldRule::Cell {
            index: 1,
            accept: is_number,
        },
    ],
    placeholders: &[],
};

pub const AGE: FieldSpec = FieldSpec {
    name: "age",
    rules: &[
        FieldRule::Select(".Barei, td.barei"),
        FieldRule::ScanCells(is_sex_age),
    ],
    placeholders: &[],
};

pub const WEIGHT: FieldSpec = FieldSpec {
    name: "weight",
    rules: &[
        FieldRule::Select(".Futan, td.futan"),
        FieldRule::ScanCells(is_plausible_weight),
    ],
    placeholders: &[],
};

pub const ODDS: FieldSpec = FieldSpec {
    name: "odds",
    rules: &[FieldRule::Select(
        r#"[id^="odds-"], .Popular span, .odds, td.odds"#,
    )],
    placeholders: &["---.-", "**"],
};

pub const POPULARITY: FieldSpec = FieldSpec {
    name: "popularity",
    rules: &[FieldRule::Select(
        r#"[id^="ninki-"], .Popular_Ninki span, td.ninki"#,
    )],
    placeholders: &["**"],
};

pub const JOCKEY: FieldSpec = FieldSpec {
    name: "jockey",
    rules: &[FieldRule::Select(
        r#".Jockey a, td.jockey a, [class*="jockey"] a, a[href*="/jockey/"]"#,
    )],
    placeholders: &[],
};

pub const TRAINER: FieldSpec = FieldSpec {
    name: "trainer",
    rules: &[FieldRule::Select(
        r#".Trainer a, td.trainer a, [class*="trainer"] a, a[href*="/trainer/"]"#,
    )],
    placeholders: &[],
};

/// Race-level metadata: each selector is tried in order
pub const RACE_TITLE: &[&str] = &[".RaceName", ".race_name", "h1.raceTitle", "h1"];
pub const RACE_DATE: &[&str] = &[".RaceData01", ".race_date", ".raceData01"];
pub const RACE_COURSE: &[&str] = &[".RaceData02", ".course_info", ".raceData02"];
pub const RACE_CLASS: &[&str] = &[".RaceData03", ".race_class", ".raceData03"];

/// Purely numeric text, e.g. a bracket or saddle-cloth number
pub fn is_number(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

/// Sex marker (牡 colt, 牝 filly, セ gelding) followed by an age
pub fn is_sex_age(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some('牡' | '牝' | 'セ')) && is_number(chars.as_str())
}

/// Decimal number within the range of assigned weights (48-65 kg)
pub fn is_plausible_weight(text: &str) -> bool {
    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (text, None),
    };

    if !is_number(whole) || fraction.is_some_and(|f| !is_number(f)) {
        return false;
    }

    text.parse::<f64>()
        .map(|kg| (48.0..=65.0).contains(&kg))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_number() {
        assert!(is_number("1"));
        assert!(is_number("18"));
        assert!(!is_number(""));
        assert!(!is_number("1a"));
        assert!(!is_number("５"));
    }

    #[test]
    fn test_is_sex_age() {
        assert!(is_sex_age("牡3"));
        assert!(is_sex_age("牝4"));
        assert!(is_sex_age("セ10"));
        assert!(!is_sex_age("牡"));
        assert!(!is_sex_age("3牡"));
        assert!(!is_sex_age("騙5"));
    }

    #[test]
    fn test_is_plausible_weight() {
        assert!(is_plausible_weight("54.0"));
        assert!(is_plausible_weight("48"));
        assert!(is_plausible_weight("65.0"));
        assert!(!is_plausible_weight("2"));
        assert!(!is_plausible_weight("47.5"));
        assert!(!is_plausible_weight("480"));
        assert!(!is_plausible_weight("54."));
        assert!(!is_plausible_weight("54.0kg"));
        assert!(!is_plausible_weight(""));
    }

    #[test]
    fn test_every_field_has_rules() {
        for spec in [
            FRAME,
            HORSE_NUMBER,
            AGE,
            WEIGHT,
            ODDS,
            POPULARITY,
            JOCKEY,
            TRAINER,
        ] {
            assert!(!spec.rules.is_empty(), "{} has no rules", spec.name);
        }
    }
}
