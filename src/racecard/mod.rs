//! Race card scraping
//!
//! This module contains the scraping subsystem:
//! - Selector fallback rules for every field
//! - Extraction from a parsed document
//! - The plain HTTP tier and the headless browser tier
//! - The orchestrator that chains them

mod browser;
mod extractor;
mod orchestrator;
pub mod rules;
mod static_fetch;
mod types;

pub use browser::{DynamicFetcher, WAIT_SELECTORS};
pub use extractor::{element_text, RaceCardExtractor};
pub use orchestrator::{DynamicTier, RaceCardScraper, StaticTier};
pub use static_fetch::{build_http_client, race_card_url, StaticFetcher};
pub use types::{Entrant, ExtractionMethod, RaceCardResult, RaceInfo, NOT_AVAILABLE};

use crate::config::Config;
use crate::ScrapeError;

/// Fetches a race card with a scraper built from `config`
///
/// Builds the HTTP client and extractor on every call; hold on to a
/// [`RaceCardScraper`] when looking up more than one race.
pub async fn get_race_card(config: &Config, race_id: &str) -> Result<RaceCardResult, ScrapeError> {
    RaceCardScraper::from_config(config)?
        .get_race_card(race_id)
        .await
}
