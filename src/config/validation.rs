use crate::config::types::{BrowserConfig, Config, EncodingConfig, SiteConfig, StaticFetchConfig};
use crate::encoding::lookup_charset;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_static_fetch_config(&config.static_fetch)?;
    validate_browser_config(&config.browser)?;
    validate_encoding_config(&config.encoding)?;
    Ok(())
}

/// Validates target site configuration
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "base-url '{}' must use http or https",
            config.base_url
        )));
    }

    if !config.race_path.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "race-path must start with '/', got '{}'",
            config.race_path
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates plain HTTP tier configuration
fn validate_static_fetch_config(config: &StaticFetchConfig) -> Result<(), ConfigError> {
    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "static-fetch timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.max_redirects > 20 {
        return Err(ConfigError::Validation(format!(
            "max-redirects must be <= 20, got {}",
            config.max_redirects
        )));
    }

    Ok(())
}

/// Validates browser tier configuration
fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    if config.navigation_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "browser navigation-timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.selector_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "browser selector-timeout-secs must be >= 1".to_string(),
        ));
    }

    if let Some(path) = &config.chrome_executable {
        if path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "chrome-executable cannot be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates encoding detection configuration
fn validate_encoding_config(config: &EncodingConfig) -> Result<(), ConfigError> {
    if lookup_charset(&config.default).is_none() {
        return Err(ConfigError::UnknownEncoding(config.default.clone()));
    }

    if !(0.0..=1.0).contains(&config.min_japanese_ratio) {
        return Err(ConfigError::Validation(format!(
            "min-japanese-ratio must be between 0 and 1, got {}",
            config.min_japanese_ratio
        )));
    }

    Ok(())
}
