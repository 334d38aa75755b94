//! Mojibake detection
//!
//! Text decoded with the wrong charset either carries replacement characters
//! and stray control codes, or reads as Latin noise with almost no kana or
//! kanji. Both are cheap to spot.

/// Thresholds for the Japanese-script ratio check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GarbleThresholds {
    /// Minimum share of Japanese-script characters
    pub min_japanese_ratio: f64,

    /// Texts with this many characters or fewer skip the ratio check
    pub min_sample_chars: usize,
}

impl Default for GarbleThresholds {
    fn default() -> Self {
        Self {
            min_japanese_ratio: 0.05,
            min_sample_chars: 100,
        }
    }
}

/// Returns true for hiragana, katakana (full and half width) and CJK ideographs
pub fn is_japanese_char(c: char) -> bool {
    matches!(c,
        '\u{3040}'..='\u{309F}'
        | '\u{30A0}'..='\u{30FF}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{4E00}'..='\u{9FFF}'
        | '\u{F900}'..='\u{FAFF}'
        | '\u{FF66}'..='\u{FF9F}')
}

/// Control characters that never appear in well-formed HTML text
fn is_disallowed_control(c: char) -> bool {
    c.is_control() && !matches!(c, '\t' | '\n' | '\r' | '\u{0C}')
}

/// Share of Japanese-script characters in `text`, 0.0 for empty text
pub fn japanese_ratio(text: &str) -> f64 {
    let mut total = 0usize;
    let mut japanese = 0usize;
    for c in text.chars() {
        total += 1;
        if is_japanese_char(c) {
            japanese += 1;
        }
    }

    if total == 0 {
        0.0
    } else {
        japanese as f64 / total as f64
    }
}

/// Decides whether decoded text looks like mojibake
///
/// Flags text containing U+FFFD or disallowed control characters, and text
/// longer than `min_sample_chars` whose Japanese-script ratio is below
/// `min_japanese_ratio`.
pub fn looks_garbled(text: &str, thresholds: &GarbleThresholds) -> bool {
    if text
        .chars()
        .any(|c| c == char::REPLACEMENT_CHARACTER || is_disallowed_control(c))
    {
        return true;
    }

    if text.chars().count() > thresholds.min_sample_chars {
        return japanese_ratio(text) < thresholds.min_japanese_ratio;
    }

    false
}
