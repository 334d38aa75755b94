//! Plain HTTP tier
//!
//! This module fetches the entry page without running any page script:
//! - Building an HTTP client that looks like a desktop browser
//! - Fetching the raw body as bytes
//! - Decoding it through the [`EncodingResolver`]
//! - Checking for an entry table and extracting it
//!
//! Nothing here returns an error for a failed fetch. A timeout, a bad status
//! or a page without an entry table all come back as `None` so the caller
//! can fall back to the browser tier.

use crate::config::{SiteConfig, StaticFetchConfig};
use crate::encoding::{EncodingResolver, TransportHints};
use crate::racecard::extractor::RaceCardExtractor;
use crate::racecard::types::{ExtractionMethod, RaceCardResult};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{redirect::Policy, Client};
use scraper::Html;
use std::sync::Arc;
use url::Url;

/// Builds the race card URL for a race id
///
/// The id is opaque here and only placed into the `race_id` query parameter.
///
/// # Example
///
/// ```
/// use keiba_racecard::config::SiteConfig;
/// use keiba_racecard::racecard::race_card_url;
///
/// let url = race_card_url(&SiteConfig::default(), "202505030211").unwrap();
/// assert_eq!(
///     url.as_str(),
///     "https://race.netkeiba.com/race/shutuba.html?race_id=202505030211"
/// );
/// ```
pub fn race_card_url(site: &SiteConfig, race_id: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(&site.base_url)?.join(&site.race_path)?;
    url.query_pairs_mut().append_pair("race_id", race_id);
    Ok(url)
}

/// Builds an HTTP client with browser-like default headers
///
/// # Arguments
///
/// * `site` - User agent and language settings
/// * `fetch` - Timeout and redirect limits
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(
    site: &SiteConfig,
    fetch: &StaticFetchConfig,
) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    if let Ok(language) = HeaderValue::from_str(&site.accept_language) {
        headers.insert(header::ACCEPT_LANGUAGE, language);
    }
    headers.insert(
        header::ACCEPT_ENCODING,
        HeaderValue::from_static("gzip, deflate, br"),
    );
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(
        header::UPGRADE_INSECURE_REQUESTS,
        HeaderValue::from_static("1"),
    );

    Client::builder()
        .user_agent(site.user_agent.as_str())
        .default_headers(headers)
        .timeout(fetch.timeout())
        .redirect(Policy::limited(fetch.max_redirects))
        .gzip(true)
        .brotli(true)
        .deflate(true)
        .build()
}

/// Fetches race cards over plain HTTP
#[derive(Debug, Clone)]
pub struct StaticFetcher {
    client: Client,
    site: SiteConfig,
    resolver: EncodingResolver,
    extractor: Arc<RaceCardExtractor>,
}

impl StaticFetcher {
    pub fn new(
        client: Client,
        site: SiteConfig,
        resolver: EncodingResolver,
        extractor: Arc<RaceCardExtractor>,
    ) -> Self {
        Self {
            client,
            site,
            resolver,
            extractor,
        }
    }

    /// Fetches and extracts the race card, or `None` when this tier cannot
    ///
    /// A `Some` result may still hold zero entrants if an entry table was
    /// present but had no usable rows.
    pub async fn fetch_static(&self, race_id: &str) -> Option<RaceCardResult> {
        let url = match race_card_url(&self.site, race_id) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Cannot build URL for race {}: {}", race_id, e);
                return None;
            }
        };

        tracing::debug!("Fetching {}", url);

        let (body, hints) = match self.fetch_body(&url).await {
            Ok(fetched) => fetched,
            Err(message) => {
                tracing::warn!("Static fetch of {} failed: {}", url, message);
                return None;
            }
        };

        let decoded = self.resolver.resolve(&body, &hints);
        tracing::debug!(
            "Decoded {} bytes as {} ({} alternatives tried)",
            body.len(),
            decoded.encoding.name(),
            decoded.alternatives_tried
        );

        self.extract(&decoded.text)
    }

    /// Parses decoded markup and extracts the card if an entry table exists
    pub fn extract(&self, markup: &str) -> Option<RaceCardResult> {
        let document = Html::parse_document(markup);

        if !self.extractor.has_race_table(&document) {
            tracing::info!("Race table not found in static markup");
            return None;
        }

        Some(self.extractor.extract(&document, ExtractionMethod::Static))
    }

    /// GETs the page and returns the raw body with its transport hints
    async fn fetch_body(&self, url: &Url) -> Result<(Vec<u8>, TransportHints), String> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(describe_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP status {}", status.as_u16()));
        }

        let hints = TransportHints::from_headers(response.headers());
        let body = response.bytes().await.map_err(describe_error)?;

        Ok((body.to_vec(), hints))
    }
}

/// Classifies a transport error for logging
fn describe_error(e: reqwest::Error) -> String {
    if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else if e.is_redirect() {
        format!("Too many redirects: {}", e)
    } else {
        e.to_string()
    }
}
