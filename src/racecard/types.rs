use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use std::fmt;

/// Placeholder for any field the page did not provide
pub const NOT_AVAILABLE: &str = "N/A";

/// How a race card was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    /// Plain HTTP fetch of the server-rendered page
    Static,
    /// Headless browser render
    Dynamic,
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionMethod::Static => write!(f, "static"),
            ExtractionMethod::Dynamic => write!(f, "dynamic"),
        }
    }
}

/// Race-level metadata shown above the entry table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RaceInfo {
    pub title: String,
    pub date: String,
    pub course: String,
    pub class: String,
}

impl Default for RaceInfo {
    fn default() -> Self {
        Self {
            title: NOT_AVAILABLE.to_string(),
            date: NOT_AVAILABLE.to_string(),
            course: NOT_AVAILABLE.to_string(),
            class: NOT_AVAILABLE.to_string(),
        }
    }
}

/// One horse in the entry list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entrant {
    /// Bracket (枠番)
    pub frame_number: String,

    /// Saddle-cloth number (馬番)
    pub horse_number: String,

    /// Horse name, never empty
    pub name: String,

    /// Link to the horse's detail page, as written in the markup
    pub url: Option<String>,

    /// Numeric horse id taken from `url`
    pub horse_id: Option<String>,

    /// Sex marker plus age, e.g. `牡3`
    pub age: String,

    /// Assigned weight in kg, e.g. `54.0`
    pub weight: String,

    pub odds: String,
    pub popularity: String,
    pub jockey: String,
    pub trainer: String,
}

impl Entrant {
    /// Creates an entrant with every optional field set to [`NOT_AVAILABLE`]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            frame_number: NOT_AVAILABLE.to_string(),
            horse_number: NOT_AVAILABLE.to_string(),
            name: name.into(),
            url: None,
            horse_id: None,
            age: NOT_AVAILABLE.to_string(),
            weight: NOT_AVAILABLE.to_string(),
            odds: NOT_AVAILABLE.to_string(),
            popularity: NOT_AVAILABLE.to_string(),
            jockey: NOT_AVAILABLE.to_string(),
            trainer: NOT_AVAILABLE.to_string(),
        }
    }
}

/// A scraped race card
///
/// The entrant count is always derived from the entrant list; there is no
/// way to set it independently.
#[derive(Debug, Clone, PartialEq)]
pub struct RaceCardResult {
    pub race_info: RaceInfo,
    horses: Vec<Entrant>,
    pub scraped_at: DateTime<Utc>,
    pub method: ExtractionMethod,
}

impl RaceCardResult {
    /// Creates a result stamped with the current time
    pub fn new(race_info: RaceInfo, horses: Vec<Entrant>, method: ExtractionMethod) -> Self {
        Self {
            race_info,
            horses,
            scraped_at: Utc::now(),
            method,
        }
    }

    /// Entrants in document order
    pub fn horses(&self) -> &[Entrant] {
        &self.horses
    }

    pub fn into_horses(self) -> Vec<Entrant> {
        self.horses
    }

    pub fn total_horses(&self) -> usize {
        self.horses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.horses.is_empty()
    }

    /// Capture timestamp in ISO-8601 with millisecond precision
    pub fn scraped_at_iso(&self) -> String {
        self.scraped_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Returns the same card relabeled with another extraction method
    pub fn with_method(mut self, method: ExtractionMethod) -> Self {
        self.method = method;
        self
    }
}

impl Serialize for RaceCardResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("RaceCardResult", 5)?;
        state.serialize_field("raceInfo", &self.race_info)?;
        state.serialize_field("horses", &self.horses)?;
        state.serialize_field("totalHorses", &self.total_horses())?;
        state.serialize_field("scrapedAt", &self.scraped_at_iso())?;
        state.serialize_field("method", &self.method)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_horses_tracks_entrants() {
        let result = RaceCardResult::new(
            RaceInfo::default(),
            vec![Entrant::named("A"), Entrant::named("B")],
            ExtractionMethod::Static,
        );
        assert_eq!(result.total_horses(), 2);
        assert_eq!(result.total_horses(), result.horses().len());
    }

    #[test]
    fn test_defaults_use_sentinel() {
        let info = RaceInfo::default();
        assert_eq!(info.title, NOT_AVAILABLE);
        assert_eq!(info.class, NOT_AVAILABLE);

        let entrant = Entrant::named("ドウデュース");
        assert_eq!(entrant.jockey, NOT_AVAILABLE);
        assert_eq!(entrant.horse_id, None);
    }

    #[test]
    fn test_json_shape() {
        let result = RaceCardResult::new(
            RaceInfo::default(),
            vec![Entrant::named("A")],
            ExtractionMethod::Dynamic,
        );
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["totalHorses"], 1);
        assert_eq!(json["method"], "dynamic");
        assert_eq!(json["raceInfo"]["class"], NOT_AVAILABLE);
        assert_eq!(json["horses"][0]["frameNumber"], NOT_AVAILABLE);
        assert!(json["horses"][0]["horseId"].is_null());
        assert!(json["scrapedAt"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_method_display() {
        assert_eq!(ExtractionMethod::Static.to_string(), "static");
        assert_eq!(ExtractionMethod::Dynamic.to_string(), "dynamic");
    }
}
