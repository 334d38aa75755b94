//! End-to-end tests for the plain HTTP tier and the tier fallback

use async_trait::async_trait;
use encoding_rs::{EUC_JP, SHIFT_JIS};
use keiba_racecard::config::{Config, SiteConfig, StaticFetchConfig};
use keiba_racecard::racecard::{build_http_client, DynamicTier, StaticFetcher};
use keiba_racecard::{
    EncodingResolver, Entrant, ExtractionMethod, RaceCardExtractor, RaceCardResult,
    RaceCardScraper, RaceInfo, ScrapeError, NOT_AVAILABLE,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RACE_ID: &str = "202505030211";

const ENTRY_PAGE: &str = r#"<html><head><title>出馬表 | netkeiba</title></head><body>
<div class="RaceList_Item02">
  <h1 class="RaceName">日本ダービー</h1>
  <div class="RaceData01">15:40発走 / 芝2400m (左 A)</div>
  <div class="RaceData02"><span>2回</span> <span>東京</span> <span>12日目</span></div>
</div>
<div class="RaceNote">
  <p>三歳馬の頂点を決める東京優駿は、皐月賞を制した馬と別路線から挑む素質馬が東京競馬場の芝二千四百メートルで激突する一戦です。</p>
  <p>長い直線での末脚比べが見どころとなり、枠順や馬場状態、当日の気配にも注目が集まります。出走馬の調教内容や騎手の手腕も勝敗を大きく左右します。</p>
  <p>発走時刻や馬体重、単勝オッズは当日の発表をご確認ください。</p>
</div>
<table class="Shutuba_Table RaceTable01 ShutubaTable">
  <tr class="Header"><th>枠</th><th>馬番</th><th>馬名</th><th>性齢</th><th>斤量</th></tr>
  <tr class="HorseList" id="tr_1">
    <td class="Waku1"><span>1</span></td><td class="Umaban1">1</td>
    <td class="HorseInfo"><span class="HorseName"><a href="https://db.netkeiba.com/horse/2022105001">レガレイラ</a></span></td>
    <td class="Barei">牝3</td><td>55.0</td>
    <td class="Jockey"><a href="/jockey/result/recent/05339/">ルメール</a></td>
    <td class="Trainer"><a href="/trainer/result/recent/01126/">木村</a></td>
    <td class="Popular"><span id="odds-1_01">3.5</span></td>
    <td class="Popular_Ninki"><span id="ninki-1_01">1</span></td>
  </tr>
  <tr class="HorseList" id="tr_2">
    <td class="Waku2"><span>2</span></td><td class="Umaban2">3</td>
    <td class="HorseInfo"><span class="HorseName"><a href="https://db.netkeiba.com/horse/2022104567">ジャスティンミラノ</a></span></td>
    <td class="Barei">牡3</td><td>57.0</td>
    <td class="Jockey"><a href="/jockey/result/recent/01126/">戸崎圭</a></td>
    <td class="Trainer"><a href="/trainer/result/recent/01184/">友道</a></td>
    <td class="Popular"><span id="odds-1_03">---.-</span></td>
    <td class="Popular_Ninki"><span id="ninki-1_03">**</span></td>
  </tr>
  <tr class="HorseList" id="tr_3">
    <td class="Waku3"><span>3</span></td><td class="Umaban3">5</td>
    <td class="HorseInfo"><span class="HorseName"><a href="/horse/2021105872/">シンエンペラー</a></span></td>
    <td class="Barei">牡3</td><td>57.0</td>
    <td class="Jockey"><a href="/jockey/result/recent/01075/">坂井</a></td>
    <td class="Trainer"><a href="/trainer/result/recent/01157/">矢作</a></td>
    <td class="Popular"><span id="odds-1_05">8.1</span></td>
    <td class="Popular_Ninki"><span id="ninki-1_05">4</span></td>
  </tr>
</table>
</body></html>"#;

/// Creates a configuration whose site points at the mock server
fn create_test_config(base_url: &str) -> Config {
    Config {
        site: SiteConfig {
            base_url: base_url.to_string(),
            ..SiteConfig::default()
        },
        static_fetch: StaticFetchConfig {
            timeout_secs: 2,
            max_redirects: 5,
        },
        ..Config::default()
    }
}

fn create_static_fetcher(config: &Config) -> StaticFetcher {
    let client = build_http_client(&config.site, &config.static_fetch)
        .expect("Failed to build HTTP client");
    StaticFetcher::new(
        client,
        config.site.clone(),
        EncodingResolver::from_config(&config.encoding).expect("Invalid encoding config"),
        Arc::new(RaceCardExtractor::new().expect("Failed to compile selectors")),
    )
}

/// Mounts the entry page for `RACE_ID`, encoded as the site serves it
async fn mount_entry_page(server: &MockServer, body: Vec<u8>, content_type: &str) {
    Mock::given(method("GET"))
        .and(path("/race/shutuba.html"))
        .and(query_param("race_id", RACE_ID))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, content_type))
        .mount(server)
        .await;
}

fn euc_jp_page(markup: &str) -> Vec<u8> {
    EUC_JP.encode(markup).0.into_owned()
}

/// Dynamic tier stand-in that counts how often it is asked
#[derive(Default)]
struct CountingDynamic {
    calls: AtomicUsize,
}

#[async_trait]
impl DynamicTier for CountingDynamic {
    async fn fetch_dynamic(&self, race_id: &str) -> Result<RaceCardResult, ScrapeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let horses = vec![Entrant::named("ドウデュース"), Entrant::named("イクイノックス")];
        let card = RaceCardResult::new(RaceInfo::default(), horses, ExtractionMethod::Dynamic);
        assert_eq!(race_id, RACE_ID);
        Ok(card)
    }
}

#[tokio::test]
async fn test_static_fetch_euc_jp_page() {
    let mock_server = MockServer::start().await;
    mount_entry_page(
        &mock_server,
        euc_jp_page(ENTRY_PAGE),
        "text/html; charset=EUC-JP",
    )
    .await;

    let config = create_test_config(&mock_server.uri());
    let card = create_static_fetcher(&config)
        .fetch_static(RACE_ID)
        .await
        .expect("Static fetch should succeed");

    assert_eq!(card.method, ExtractionMethod::Static);
    assert_eq!(card.total_horses(), 3);
    assert_eq!(card.race_info.title, "日本ダービー");
    assert_eq!(card.race_info.course, "2回 東京 12日目");

    let first = &card.horses()[0];
    assert_eq!(first.name, "レガレイラ");
    assert_eq!(first.horse_id.as_deref(), Some("2022105001"));
    assert_eq!(first.jockey, "ルメール");
    assert_eq!(first.odds, "3.5");

    let second = &card.horses()[1];
    assert_eq!(second.horse_number, "3");
    assert_eq!(second.odds, NOT_AVAILABLE);
    assert_eq!(second.popularity, NOT_AVAILABLE);

    let json = serde_json::to_value(&card).unwrap();
    assert_eq!(json["totalHorses"], 3);
    assert_eq!(json["method"], "static");
    assert_eq!(json["horses"][2]["horseId"], "2021105872");
}

#[tokio::test]
async fn test_static_fetch_sends_browser_headers() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/race/shutuba.html"))
        .and(header_exists("user-agent"))
        .and(header_exists("accept-language"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(euc_jp_page(ENTRY_PAGE), "text/html; charset=EUC-JP"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let card = create_static_fetcher(&config).fetch_static(RACE_ID).await;

    assert!(card.is_some());
}

#[tokio::test]
async fn test_meta_charset_wins_over_transport_hint() {
    let mock_server = MockServer::start().await;
    let markup = ENTRY_PAGE.replace(
        "<head>",
        r#"<head><meta http-equiv="Content-Type" content="text/html; charset=Shift_JIS">"#,
    );
    let body = SHIFT_JIS.encode(&markup).0.into_owned();
    mount_entry_page(&mock_server, body, "text/html; charset=EUC-JP").await;

    let config = create_test_config(&mock_server.uri());
    let card = create_static_fetcher(&config)
        .fetch_static(RACE_ID)
        .await
        .expect("Static fetch should succeed");

    assert_eq!(card.race_info.title, "日本ダービー");
    assert_eq!(card.horses()[1].name, "ジャスティンミラノ");
}

#[tokio::test]
async fn test_static_fetch_without_table_is_none() {
    let mock_server = MockServer::start().await;
    mount_entry_page(
        &mock_server,
        euc_jp_page("<html><body><div id=\"app\">読み込み中...</div></body></html>"),
        "text/html; charset=EUC-JP",
    )
    .await;

    let config = create_test_config(&mock_server.uri());
    let card = create_static_fetcher(&config).fetch_static(RACE_ID).await;

    assert!(card.is_none());
}

#[tokio::test]
async fn test_static_fetch_error_status_is_none() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/race/shutuba.html"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let card = create_static_fetcher(&config).fetch_static(RACE_ID).await;

    assert!(card.is_none());
}

#[tokio::test]
async fn test_static_fetch_timeout_is_none() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/race/shutuba.html"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(euc_jp_page(ENTRY_PAGE), "text/html; charset=EUC-JP")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri());
    config.static_fetch.timeout_secs = 1;
    let card = create_static_fetcher(&config).fetch_static(RACE_ID).await;

    assert!(card.is_none());
}

#[tokio::test]
async fn test_scraper_returns_static_card_without_browser() {
    let mock_server = MockServer::start().await;
    mount_entry_page(
        &mock_server,
        euc_jp_page(ENTRY_PAGE),
        "text/html; charset=EUC-JP",
    )
    .await;

    let config = create_test_config(&mock_server.uri());
    let scraper =
        RaceCardScraper::with_tiers(create_static_fetcher(&config), CountingDynamic::default());

    let card = scraper.get_race_card(RACE_ID).await.unwrap();

    assert_eq!(card.method, ExtractionMethod::Static);
    assert_eq!(card.total_horses(), 3);
}

#[tokio::test]
async fn test_scraper_falls_back_when_table_is_missing() {
    let mock_server = MockServer::start().await;
    mount_entry_page(
        &mock_server,
        euc_jp_page("<html><body><script src=\"/js/shutuba.js\"></script></body></html>"),
        "text/html; charset=EUC-JP",
    )
    .await;

    let config = create_test_config(&mock_server.uri());
    let dynamic = CountingDynamic::default();
    let scraper = RaceCardScraper::with_tiers(create_static_fetcher(&config), dynamic);

    let card = scraper.get_race_card(RACE_ID).await.unwrap();

    assert_eq!(card.method, ExtractionMethod::Dynamic);
    assert_eq!(card.total_horses(), 2);
    assert_eq!(card.horses()[0].name, "ドウデュース");
}

#[tokio::test]
async fn test_scraper_falls_back_once_on_server_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/race/shutuba.html"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let dynamic = Arc::new(CountingDynamic::default());
    let scraper =
        RaceCardScraper::with_tiers(create_static_fetcher(&config), SharedDynamic(dynamic.clone()));

    let card = scraper.get_race_card(RACE_ID).await.unwrap();

    assert_eq!(card.method, ExtractionMethod::Dynamic);
    assert_eq!(dynamic.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_static_only_lookup_reports_failure() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/race/shutuba.html"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let dynamic = Arc::new(CountingDynamic::default());
    let scraper =
        RaceCardScraper::with_tiers(create_static_fetcher(&config), SharedDynamic(dynamic.clone()));

    let err = scraper.get_race_card_static(RACE_ID).await.unwrap_err();

    assert!(err.to_string().contains(RACE_ID));
    assert_eq!(dynamic.calls.load(Ordering::SeqCst), 0);
}

/// Lets a test keep a handle on the dynamic tier after handing it over
struct SharedDynamic(Arc<CountingDynamic>);

#[async_trait]
impl DynamicTier for SharedDynamic {
    async fn fetch_dynamic(&self, race_id: &str) -> Result<RaceCardResult, ScrapeError> {
        self.0.fetch_dynamic(race_id).await
    }
}
