//! Store persistence across runs

use football_trader::query::MarketQuery;
use football_trader::store::Store;
use football_trader::testkit::{FakeExchange, MAINZ, MAINZ_DORTMUND_EVENT};
use tempfile::TempDir;

fn query() -> MarketQuery {
    MarketQuery {
        league_ids: vec!["59".to_string()],
        ..Default::default()
    }
}

#[tokio::test]
async fn test_track_twice_across_saves() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("store.json");
    let fake = FakeExchange::mainz_dortmund();

    let mut store = Store::load(&path);
    assert!(store.is_empty());
    store.synchronize(&fake, &query()).await.unwrap();
    assert!(store.save(&path).unwrap().is_none());

    let mut store = Store::load(&path);
    assert_eq!(store.fixture_count(), 1);
    store.synchronize(&fake, &query()).await.unwrap();
    let backup = store.save(&path).unwrap().unwrap();

    let reloaded = Store::load(&path);
    assert_eq!(reloaded, store);
    let fixture = reloaded.fixture("59", MAINZ_DORTMUND_EVENT).unwrap();
    assert_eq!(fixture.history(MAINZ).len(), 2);

    // the backup holds the first generation
    let previous = Store::load(&backup);
    let fixture = previous.fixture("59", MAINZ_DORTMUND_EVENT).unwrap();
    assert_eq!(fixture.history(MAINZ).len(), 1);
}

#[tokio::test]
async fn test_saved_document_layout() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("store.json");
    let fake = FakeExchange::mainz_dortmund();

    let mut store = Store::new();
    store.synchronize(&fake, &query()).await.unwrap();
    store.save(&path).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let fixture = &json["59"]["fixture1"];
    assert_eq!(fixture["fixture"], "Mainz v Dortmund");
    assert_eq!(fixture["market_id"], "1.195693926");
    assert_eq!(fixture["home_runner"], 64374);
    assert_eq!(fixture["away_runner"], 44785);
    assert_eq!(fixture["history"]["64374"][0]["back_price"], 3.7);
    assert_eq!(fixture["history"]["44785"][0]["lay_amount"], 194.9);
}
