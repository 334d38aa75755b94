use serde::Deserialize;
use std::time::Duration;

/// Browser-like user agent sent by both fetch tiers
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Main configuration structure for keiba-racecard
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(rename = "static-fetch")]
    pub static_fetch: StaticFetchConfig,
    pub browser: BrowserConfig,
    pub encoding: EncodingConfig,
}

/// Target site configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SiteConfig {
    /// Scheme and host of the race site
    pub base_url: String,

    /// Path of the entry-list page; the race id is passed as `race_id`
    pub race_path: String,

    /// User agent for HTTP and browser requests
    pub user_agent: String,

    /// Accept-Language header for plain HTTP requests
    pub accept_language: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://race.netkeiba.com".to_string(),
            race_path: "/race/shutuba.html".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: "ja,en-US;q=0.7,en;q=0.3".to_string(),
        }
    }
}

/// Plain HTTP tier configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StaticFetchConfig {
    /// Whole-request timeout (seconds)
    pub timeout_secs: u64,

    /// Maximum number of redirects followed
    pub max_redirects: usize,
}

impl Default for StaticFetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_redirects: 5,
        }
    }
}

impl StaticFetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Headless browser tier configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BrowserConfig {
    /// Run Chromium without a window
    pub headless: bool,

    /// Bound on page navigation (seconds)
    pub navigation_timeout_secs: u64,

    /// Bound on waiting for the race table to appear (seconds)
    pub selector_timeout_secs: u64,

    /// Fixed delay after the table appears, for late widgets such as odds (milliseconds)
    pub settle_delay_ms: u64,

    /// Accept-Language header sent by the browser
    pub accept_language: String,

    /// Explicit Chromium binary; auto-detected when unset
    pub chrome_executable: Option<String>,

    /// Additional Chromium command-line arguments
    pub extra_args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            navigation_timeout_secs: 30,
            selector_timeout_secs: 15,
            settle_delay_ms: 3000,
            accept_language: "ja-JP,ja;q=0.9,en;q=0.8".to_string(),
            chrome_executable: None,
            extra_args: Vec::new(),
        }
    }
}

impl BrowserConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn selector_timeout(&self) -> Duration {
        Duration::from_secs(self.selector_timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// Character encoding detection configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EncodingConfig {
    /// Encoding assumed when neither headers nor markup declare one
    pub default: String,

    /// Minimum share of Japanese-script characters for text to count as clean
    pub min_japanese_ratio: f64,

    /// Texts at or below this many characters skip the ratio check
    pub min_sample_chars: usize,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            default: "EUC-JP".to_string(),
            min_japanese_ratio: 0.05,
            min_sample_chars: 100,
        }
    }
}
