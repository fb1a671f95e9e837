//! Trend extraction and hedge analysis over synchronized prices

use chrono::{Duration, TimeZone, Utc};
use football_trader::analysis::{extract_trends, PnlReport, TrendDirection};
use football_trader::config::AnalysisConfig;
use football_trader::query::MarketQuery;
use football_trader::store::Store;
use football_trader::testkit::{self, FakeExchange, DORTMUND, MAINZ};
use rust_decimal_macros::dec;

async fn synchronized_store(passes: usize) -> Store {
    let fake = FakeExchange::mainz_dortmund();
    let query = MarketQuery {
        league_ids: vec!["59".to_string()],
        ..Default::default()
    };
    let start = Utc.with_ymd_and_hms(2022, 4, 1, 9, 0, 0).unwrap();

    let mut store = Store::new();
    for pass in 0..passes {
        store
            .synchronize_at(&fake, &query, start + Duration::hours(pass as i64))
            .await
            .unwrap();
    }
    store
}

#[tokio::test]
async fn test_trends_from_two_snapshots() {
    let store = synchronized_store(2).await;
    let trends = extract_trends(&store);

    assert_eq!(trends.len(), 2);

    // sorted ascending by delta
    let mainz = &trends[0];
    assert_eq!(mainz.team, "Mainz");
    assert!(mainz.home);
    assert_eq!(mainz.start_price, dec!(3.7));
    assert_eq!(mainz.start_lay_price, dec!(3.75));
    assert_eq!(mainz.current_price, dec!(3.8));
    assert_eq!(mainz.current_lay_price, dec!(3.75));
    assert_eq!(mainz.delta, dec!(-0.1));
    assert_eq!(mainz.sample_number, 2);
    assert_eq!(mainz.direction, TrendDirection::Drifting);

    let dortmund = &trends[1];
    assert_eq!(dortmund.team, "Dortmund");
    assert!(!dortmund.home);
    assert_eq!(dortmund.start_price, dec!(2.86));
    assert_eq!(dortmund.current_price, dec!(2.92));
    assert_eq!(dortmund.delta, dec!(-0.06));
}

#[tokio::test]
async fn test_report_places_trends_in_their_ranges() {
    let store = synchronized_store(2).await;
    let report = PnlReport::build(&extract_trends(&store), &AnalysisConfig::default());

    let twos = &report.buckets[1];
    assert_eq!(twos.lines.len(), 1);
    assert_eq!(twos.lines[0].trend.team, "Dortmund");
    // 286 / 2.90 = 98.62..
    let hedge = twos.lines[0].hedge.unwrap();
    assert_eq!(hedge.lay_stake, dec!(98.62));
    assert_eq!(hedge.profit, dec!(-1.38));
    assert_eq!(twos.losers, 1);
    assert_eq!(twos.cumulative_loss, dec!(-1.38));

    let threes = &report.buckets[2];
    assert_eq!(threes.lines.len(), 1);
    // 370 / 3.78 = 97.88..
    assert_eq!(threes.cumulative_loss, dec!(-2.12));
    assert_eq!(threes.winners, 0);
}

#[tokio::test]
async fn test_no_trends_when_side_unbound() {
    // fixture discovered but the market never matched
    let fake = FakeExchange::new().with_events(vec![testkit::mainz_dortmund_event()]);
    let query = MarketQuery {
        league_ids: vec!["59".to_string()],
        ..Default::default()
    };
    let mut store = Store::new();
    store.synchronize(&fake, &query).await.unwrap();

    let fixture = store.fixture("59", testkit::MAINZ_DORTMUND_EVENT).unwrap();
    assert!(fixture.history(MAINZ).is_empty());
    assert!(fixture.history(DORTMUND).is_empty());
    assert!(extract_trends(&store).is_empty());
}
