//! Two-tier race card lookup
//!
//! The cheap tier (plain HTTP) runs first. Only when it produces no entrants
//! does the expensive tier (browser launch plus multi-second waits) run.

use crate::config::Config;
use crate::encoding::EncodingResolver;
use crate::racecard::browser::DynamicFetcher;
use crate::racecard::extractor::RaceCardExtractor;
use crate::racecard::static_fetch::{build_http_client, StaticFetcher};
use crate::racecard::types::{ExtractionMethod, RaceCardResult};
use crate::ScrapeError;
use async_trait::async_trait;
use std::sync::Arc;

/// A fetch tier that degrades silently
#[async_trait]
pub trait StaticTier: Send + Sync {
    /// Returns `None` when this tier could not produce a card
    async fn fetch_static(&self, race_id: &str) -> Option<RaceCardResult>;
}

/// The last-resort fetch tier
#[async_trait]
pub trait DynamicTier: Send + Sync {
    async fn fetch_dynamic(&self, race_id: &str) -> Result<RaceCardResult, ScrapeError>;
}

#[async_trait]
impl StaticTier for StaticFetcher {
    async fn fetch_static(&self, race_id: &str) -> Option<RaceCardResult> {
        StaticFetcher::fetch_static(self, race_id).await
    }
}

#[async_trait]
impl DynamicTier for DynamicFetcher {
    async fn fetch_dynamic(&self, race_id: &str) -> Result<RaceCardResult, ScrapeError> {
        DynamicFetcher::fetch_dynamic(self, race_id).await
    }
}

/// Public entry point for race card lookups
///
/// # Example
///
/// ```no_run
/// use keiba_racecard::{Config, RaceCardScraper};
///
/// # async fn run() -> Result<(), keiba_racecard::ScrapeError> {
/// let scraper = RaceCardScraper::from_config(&Config::default())?;
/// let card = scraper.get_race_card("202505030211").await?;
/// println!("{} horses ({})", card.total_horses(), card.method);
/// # Ok(())
/// # }
/// ```
pub struct RaceCardScraper<S = StaticFetcher, D = DynamicFetcher> {
    static_tier: S,
    dynamic_tier: D,
}

impl RaceCardScraper {
    /// Builds both tiers from configuration, sharing one extractor
    pub fn from_config(config: &Config) -> Result<Self, ScrapeError> {
        let extractor = Arc::new(RaceCardExtractor::new()?);
        let resolver = EncodingResolver::from_config(&config.encoding)?;

        let client = build_http_client(&config.site, &config.static_fetch).map_err(|source| {
            ScrapeError::Http {
                url: config.site.base_url.clone(),
                source,
            }
        })?;

        let static_tier =
            StaticFetcher::new(client, config.site.clone(), resolver, Arc::clone(&extractor));
        let dynamic_tier =
            DynamicFetcher::new(config.site.clone(), config.browser.clone(), extractor);

        Ok(Self::with_tiers(static_tier, dynamic_tier))
    }
}

impl<S: StaticTier, D: DynamicTier> RaceCardScraper<S, D> {
    pub fn with_tiers(static_tier: S, dynamic_tier: D) -> Self {
        Self {
            static_tier,
            dynamic_tier,
        }
    }

    /// Fetches the race card for `race_id`
    ///
    /// Returns the plain HTTP result when it has at least one entrant;
    /// otherwise renders the page in the browser exactly once. Any failure of
    /// the browser tier is wrapped with the race id.
    pub async fn get_race_card(&self, race_id: &str) -> Result<RaceCardResult, ScrapeError> {
        match self.static_tier.fetch_static(race_id).await {
            Some(card) if !card.is_empty() => {
                tracing::info!(
                    "Race {}: {} entrants via static fetch",
                    race_id,
                    card.total_horses()
                );
                return Ok(card);
            }
            Some(_) => tracing::info!("Race {}: static fetch found no entrants", race_id),
            None => tracing::info!("Race {}: static fetch failed", race_id),
        }

        tracing::info!("Race {}: falling back to headless browser", race_id);

        match self.dynamic_tier.fetch_dynamic(race_id).await {
            Ok(card) => {
                tracing::info!(
                    "Race {}: {} entrants via browser",
                    race_id,
                    card.total_horses()
                );
                Ok(card.with_method(ExtractionMethod::Dynamic))
            }
            Err(e) => {
                tracing::error!("Race {}: browser fetch failed: {}", race_id, e);
                Err(ScrapeError::RaceCard {
                    race_id: race_id.to_string(),
                    message: e.to_string(),
                })
            }
        }
    }

    /// Runs only the plain HTTP tier
    ///
    /// Useful where no browser is available; an empty or failed fetch is
    /// reported as an error instead of falling back.
    pub async fn get_race_card_static(
        &self,
        race_id: &str,
    ) -> Result<RaceCardResult, ScrapeError> {
        match self.static_tier.fetch_static(race_id).await {
            Some(card) if !card.is_empty() => Ok(card),
            _ => Err(ScrapeError::RaceCard {
                race_id: race_id.to_string(),
                message: "static fetch returned no entrants".to_string(),
            }),
        }
    }
}
