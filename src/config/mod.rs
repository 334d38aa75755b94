//! Configuration module for keiba-racecard
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default, so an empty file (or no file at all) is valid.
//!
//! # Example
//!
//! ```no_run
//! use keiba_racecard::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("racecard.toml")).unwrap();
//! println!("Fetching from: {}", config.site.base_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{BrowserConfig, Config, EncodingConfig, SiteConfig, StaticFetchConfig};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
