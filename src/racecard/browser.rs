//! Headless browser tier
//!
//! Some entry pages only fill their table (and the odds column) from client
//! script. This tier drives a headless Chromium over the DevTools protocol,
//! waits for the table to appear, lets late widgets settle, and feeds the
//! rendered markup through the same [`RaceCardExtractor`] as the HTTP tier.
//!
//! Each fetch launches its own browser and always shuts it down again, on
//! success and on every error path.

use crate::config::{BrowserConfig, SiteConfig};
use crate::racecard::extractor::RaceCardExtractor;
use crate::racecard::static_fetch::race_card_url;
use crate::racecard::types::{ExtractionMethod, RaceCardResult};
use crate::ScrapeError;
use scraper::Html;
use std::sync::Arc;
use std::time::Duration;

/// Selectors polled until the entry table (or any table) is on the page
pub const WAIT_SELECTORS: &[&str] = &[".ShutubaTable", ".RaceTable01", ".Shutuba_Table", "table"];

/// Delay between selector polls
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Injected before any page script runs to hide automation markers
const STEALTH_SCRIPT: &str = r#"
    Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
    Object.defineProperty(navigator, 'languages', { get: () => ['ja-JP', 'ja', 'en'] });
    window.chrome = { runtime: {} };
"#;

/// Fetches race cards by rendering the page in headless Chromium
#[derive(Debug, Clone)]
pub struct DynamicFetcher {
    site: SiteConfig,
    browser: BrowserConfig,
    extractor: Arc<RaceCardExtractor>,
}

impl DynamicFetcher {
    pub fn new(site: SiteConfig, browser: BrowserConfig, extractor: Arc<RaceCardExtractor>) -> Self {
        Self {
            site,
            browser,
            extractor,
        }
    }

    /// Renders the entry page and extracts the race card
    ///
    /// Unlike the HTTP tier this one has nothing to fall back to: launch,
    /// navigation and selector-wait failures are returned as errors, and so
    /// is a rendered page without a single entrant.
    pub async fn fetch_dynamic(&self, race_id: &str) -> Result<RaceCardResult, ScrapeError> {
        let url = race_card_url(&self.site, race_id)?;

        tracing::info!("Rendering {} in headless browser", url);
        let markup = self.render(url.as_str()).await?;

        let card = self.extract(&markup);
        if card.is_empty() {
            return Err(ScrapeError::EmptyRaceCard {
                race_id: race_id.to_string(),
            });
        }

        Ok(card)
    }

    /// Extracts a race card from rendered markup
    pub fn extract(&self, markup: &str) -> RaceCardResult {
        let document = Html::parse_document(markup);
        self.extractor.extract(&document, ExtractionMethod::Dynamic)
    }

    #[cfg(not(feature = "browser"))]
    async fn render(&self, _url: &str) -> Result<String, ScrapeError> {
        Err(ScrapeError::Browser(
            "headless browser support was not compiled in (enable the `browser` feature)"
                .to_string(),
        ))
    }

    #[cfg(feature = "browser")]
    async fn render(&self, url: &str) -> Result<String, ScrapeError> {
        let mut session = session::BrowserSession::launch(&self.browser).await?;
        let result = session.render(url, &self.site, &self.browser).await;
        session.close().await;
        result
    }
}

#[cfg(feature = "browser")]
mod session {
    use super::{POLL_INTERVAL, STEALTH_SCRIPT, WAIT_SELECTORS};
    use crate::config::{BrowserConfig, SiteConfig};
    use crate::ScrapeError;
    use chromiumoxide::browser::{Browser, BrowserConfig as LaunchConfig};
    use chromiumoxide::cdp::browser_protocol::network::{
        Headers, SetExtraHttpHeadersParams, SetUserAgentOverrideParams,
    };
    use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
    use chromiumoxide::Page;
    use futures::StreamExt;
    use tokio::task::JoinHandle;

    fn browser_error(e: impl std::fmt::Display) -> ScrapeError {
        ScrapeError::Browser(e.to_string())
    }

    /// A launched browser plus the task pumping its DevTools connection
    pub(super) struct BrowserSession {
        browser: Browser,
        handler: JoinHandle<()>,
    }

    impl BrowserSession {
        pub(super) async fn launch(config: &BrowserConfig) -> Result<Self, ScrapeError> {
            let mut builder = LaunchConfig::builder()
                .request_timeout(config.navigation_timeout())
                .arg("--disable-blink-features=AutomationControlled")
                .arg("--disable-features=VizDisplayCompositor")
                .arg("--disable-infobars")
                .arg("--disable-dev-shm-usage")
                .arg("--no-first-run")
                .arg("--no-sandbox")
                .arg("--disable-setuid-sandbox")
                .arg("--lang=ja-JP");

            if !config.headless {
                builder = builder.with_head();
            }

            if let Some(path) = &config.chrome_executable {
                builder = builder.chrome_executable(path);
            }

            for arg in &config.extra_args {
                builder = builder.arg(arg.as_str());
            }

            let launch_config = builder.build().map_err(ScrapeError::Browser)?;

            tracing::debug!("Launching browser (headless={})", config.headless);
            let (browser, mut handler) = Browser::launch(launch_config)
                .await
                .map_err(|e| ScrapeError::Browser(format!("Failed to launch browser: {}", e)))?;

            let handler = tokio::spawn(async move { while handler.next().await.is_some() {} });

            Ok(Self { browser, handler })
        }

        /// Navigates, waits for the table, settles, and returns the page markup
        pub(super) async fn render(
            &self,
            url: &str,
            site: &SiteConfig,
            config: &BrowserConfig,
        ) -> Result<String, ScrapeError> {
            let page = self
                .browser
                .new_page("about:blank")
                .await
                .map_err(browser_error)?;

            let result = Self::render_page(&page, url, site, config).await;

            if let Err(e) = page.close().await {
                tracing::debug!("Failed to close page: {}", e);
            }

            result
        }

        async fn render_page(
            page: &Page,
            url: &str,
            site: &SiteConfig,
            config: &BrowserConfig,
        ) -> Result<String, ScrapeError> {
            let user_agent = SetUserAgentOverrideParams::builder()
                .user_agent(site.user_agent.clone())
                .accept_language(config.accept_language.clone())
                .build()
                .map_err(ScrapeError::Browser)?;
            page.execute(user_agent).await.map_err(browser_error)?;

            let headers = Headers::new(serde_json::json!({
                "Accept-Language": config.accept_language,
            }));
            page.execute(SetExtraHttpHeadersParams::new(headers))
                .await
                .map_err(browser_error)?;

            if let Err(e) = page
                .execute(AddScriptToEvaluateOnNewDocumentParams::new(STEALTH_SCRIPT))
                .await
            {
                tracing::debug!("Stealth script injection skipped: {}", e);
            }

            let navigation_timeout = config.navigation_timeout();
            match tokio::time::timeout(navigation_timeout, page.goto(url)).await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    return Err(ScrapeError::Browser(format!(
                        "Navigation to {} failed: {}",
                        url, e
                    )))
                }
                Err(_) => {
                    return Err(ScrapeError::Timeout {
                        stage: format!("loading {}", url),
                        seconds: navigation_timeout.as_secs(),
                    })
                }
            }

            Self::wait_for_table(page, config).await?;

            // Odds and popularity widgets fill in after the table itself
            tokio::time::sleep(config.settle_delay()).await;

            if let Ok(charset) = page.evaluate("document.characterSet").await {
                if let Ok(charset) = charset.into_value::<String>() {
                    tracing::debug!("Page charset: {}", charset);
                }
            }

            page.content().await.map_err(browser_error)
        }

        /// Polls the container selectors until one matches or time runs out
        async fn wait_for_table(page: &Page, config: &BrowserConfig) -> Result<(), ScrapeError> {
            let selector_timeout = config.selector_timeout();

            let found = tokio::time::timeout(selector_timeout, async {
                loop {
                    for selector in WAIT_SELECTORS {
                        if page.find_element(*selector).await.is_ok() {
                            return *selector;
                        }
                    }
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
            })
            .await;

            match found {
                Ok(selector) => {
                    tracing::debug!("Found '{}' on rendered page", selector);
                    Ok(())
                }
                Err(_) => Err(ScrapeError::Timeout {
                    stage: "waiting for the race table".to_string(),
                    seconds: selector_timeout.as_secs(),
                }),
            }
        }

        /// Shuts the browser down; safe to call on any exit path
        pub(super) async fn close(&mut self) {
            if let Err(e) = self.browser.close().await {
                tracing::warn!("Failed to close browser: {}", e);
            }
            if let Err(e) = self.browser.wait().await {
                tracing::debug!("Failed to reap browser process: {}", e);
            }
            self.handler.abort();
        }
    }

    impl Drop for BrowserSession {
        fn drop(&mut self) {
            // Covers cancellation before close() ran; Browser's own Drop
            // kills the child process
            self.handler.abort();
        }
    }
}
