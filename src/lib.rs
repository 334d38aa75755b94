//! keiba-racecard: netkeiba race card scraper
//!
//! This crate fetches a race entry list ("出馬表") from netkeiba and turns it
//! into a structured [`RaceCardResult`]. A plain HTTP fetch is tried first;
//! when it yields no entrants a headless browser renders the page instead.

pub mod config;
pub mod encoding;
pub mod racecard;
pub mod render;

use thiserror::Error;

/// Main error type for race card scraping
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Timed out after {seconds}s while {stage}")]
    Timeout { stage: String, seconds: u64 },

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("No entrants found for race {race_id}")]
    EmptyRaceCard { race_id: String },

    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Failed to scrape race data for {race_id}: {message}")]
    RaceCard { race_id: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Unknown character encoding: {0}")]
    UnknownEncoding(String),
}

/// Result type alias for scraping operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use encoding::{DecodedText, EncodingResolver, TransportHints};
pub use racecard::{
    Entrant, ExtractionMethod, RaceCardExtractor, RaceCardResult, RaceCardScraper, RaceInfo,
    NOT_AVAILABLE,
};
