//! Store synchronization against the fake exchange

use chrono::{DateTime, Duration, TimeZone, Utc};
use football_trader::exchange::SESSION_EXPIRED_CODE;
use football_trader::query::MarketQuery;
use football_trader::store::{MatchResult, MatchStatus, Store};
use football_trader::testkit::{
    self, FailurePoint, FakeExchange, DORTMUND, MAINZ, MAINZ_DORTMUND_EVENT,
    MAINZ_DORTMUND_MARKET, THE_DRAW,
};
use rust_decimal_macros::dec;
use tokio_test::{assert_err, assert_ok};

const LEAGUE: &str = "59";

fn query() -> MarketQuery {
    MarketQuery {
        league_ids: vec![LEAGUE.to_string()],
        min_days: 0,
        max_days: 7,
        ..Default::default()
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2022, 4, 1, 9, 0, 0).unwrap()
}

#[tokio::test]
async fn test_mainz_dortmund_first_pass() {
    let fake = FakeExchange::mainz_dortmund();
    let mut store = Store::new();

    let summary = assert_ok!(store.synchronize_at(&fake, &query(), now()).await);
    assert_eq!(summary.leagues_with_events, 1);
    assert_eq!(summary.fixtures_added, 1);
    assert_eq!(summary.markets_bound, 1);
    assert_eq!(summary.snapshots_recorded, 2);

    let fixture = store.fixture(LEAGUE, MAINZ_DORTMUND_EVENT).unwrap();
    assert_eq!(fixture.name, "Mainz v Dortmund");
    assert_eq!(fixture.date, testkit::mainz_dortmund_kick_off());
    assert_eq!(fixture.status, MatchStatus::Scheduled);
    assert_eq!(fixture.outcome, MatchResult::Unresolved);
    assert_eq!(fixture.market_id, MAINZ_DORTMUND_MARKET);
    assert_eq!(fixture.home_runner_id, MAINZ);
    assert_eq!(fixture.away_runner_id, DORTMUND);

    let mainz = fixture.history(MAINZ);
    assert_eq!(mainz.len(), 1);
    assert_eq!(mainz[0].timestamp, now());
    assert_eq!(mainz[0].back_price, dec!(3.7));
    assert_eq!(mainz[0].back_amount, dec!(777.45));
    assert_eq!(mainz[0].lay_price, dec!(3.75));
    assert_eq!(mainz[0].lay_amount, dec!(718.45));

    let dortmund = fixture.history(DORTMUND);
    assert_eq!(dortmund.len(), 1);
    assert_eq!(dortmund[0].back_price, dec!(2.86));
    assert_eq!(dortmund[0].lay_price, dec!(2.9));

    // the draw is never tracked
    assert!(fixture.history(THE_DRAW).is_empty());
}

#[tokio::test]
async fn test_second_pass_appends_without_duplicating_fixture() {
    let fake = FakeExchange::mainz_dortmund();
    let mut store = Store::new();

    assert_ok!(store.synchronize_at(&fake, &query(), now()).await);
    let later = now() + Duration::hours(1);
    let summary = assert_ok!(store.synchronize_at(&fake, &query(), later).await);

    assert_eq!(summary.fixtures_added, 0);
    assert_eq!(summary.snapshots_recorded, 2);
    assert_eq!(store.fixture_count(), 1);

    let fixture = store.fixture(LEAGUE, MAINZ_DORTMUND_EVENT).unwrap();
    let mainz = fixture.history(MAINZ);
    assert_eq!(mainz.len(), 2);
    assert_eq!(mainz[1].timestamp, later);
    assert_eq!(mainz[1].back_price, dec!(3.75));
    assert_eq!(mainz[1].lay_price, dec!(3.8));
    assert_eq!(fixture.history(DORTMUND)[1].lay_price, dec!(2.92));

    assert_eq!(fake.event_calls(), 2);
    assert_eq!(fake.book_calls(), 2);
}

#[tokio::test]
async fn test_event_failure_aborts_before_changes() {
    let fake = FakeExchange::mainz_dortmund().failing_at(FailurePoint::Events, "TOO_MUCH_DATA");
    let mut store = Store::new();

    let err = assert_err!(store.synchronize_at(&fake, &query(), now()).await);
    assert!(err.to_string().contains("TOO_MUCH_DATA"));
    assert!(store.is_empty());
    assert_eq!(fake.catalogue_calls(), 0);
}

#[tokio::test]
async fn test_catalogue_failure_keeps_new_fixture_unbound() {
    let fake = FakeExchange::mainz_dortmund().failing_at(FailurePoint::Catalogue, "TOO_MUCH_DATA");
    let mut store = Store::new();

    assert_err!(store.synchronize_at(&fake, &query(), now()).await);

    let fixture = store.fixture(LEAGUE, MAINZ_DORTMUND_EVENT).unwrap();
    assert!(!fixture.is_bound());
    assert_eq!(fake.book_calls(), 0);
}

#[tokio::test]
async fn test_book_failure_records_nothing() {
    let fake = FakeExchange::mainz_dortmund().failing_at(FailurePoint::Book, SESSION_EXPIRED_CODE);
    let mut store = Store::new();

    let err = assert_err!(store.synchronize_at(&fake, &query(), now()).await);
    assert!(err.is_session_expired());

    let fixture = store.fixture(LEAGUE, MAINZ_DORTMUND_EVENT).unwrap();
    assert!(fixture.is_bound());
    assert!(fixture.price_history.is_empty());
}

#[tokio::test]
async fn test_league_without_events_is_skipped() {
    let fake = FakeExchange::new();
    let mut store = Store::new();

    let summary = assert_ok!(store.synchronize_at(&fake, &query(), now()).await);
    assert_eq!(summary.leagues_with_events, 0);
    assert!(store.is_empty());
    assert_eq!(fake.catalogue_calls(), 0);
}

#[tokio::test]
async fn test_unmatched_catalogue_skips_book_call() {
    let fake = FakeExchange::new()
        .with_events(vec![testkit::mainz_dortmund_event()])
        .with_catalogues(vec![testkit::match_odds_catalogue(
            "1.196124802",
            &[(48224, "Leeds"), (48461, "Southampton"), (58805, "The Draw")],
        )])
        .with_books(testkit::mainz_dortmund_books());
    let mut store = Store::new();

    let summary = assert_ok!(store.synchronize_at(&fake, &query(), now()).await);
    assert_eq!(summary.fixtures_added, 1);
    assert_eq!(summary.markets_bound, 0);
    assert_eq!(fake.book_calls(), 0);
}

#[tokio::test]
async fn test_each_queried_league_is_synchronized() {
    let fake = FakeExchange::mainz_dortmund();
    let query = MarketQuery {
        league_ids: vec!["59".to_string(), "81".to_string()],
        ..Default::default()
    };
    let mut store = Store::new();

    let summary = assert_ok!(store.synchronize_at(&fake, &query, now()).await);

    // the fake returns the same event for both leagues
    assert_eq!(summary.leagues_with_events, 2);
    assert_eq!(summary.fixtures_added, 2);
    assert_eq!(store.fixture_count(), 2);
    assert_eq!(fake.event_calls(), 2);
}

#[tokio::test]
async fn test_failure_in_later_league_keeps_earlier_changes() {
    let fake = FakeExchange::mainz_dortmund().failing_at_call(FailurePoint::Book, 2, "TOO_MUCH_DATA");
    let query = MarketQuery {
        league_ids: vec!["59".to_string(), "81".to_string()],
        ..Default::default()
    };
    let mut store = Store::new();

    let err = assert_err!(store.synchronize_at(&fake, &query, now()).await);
    assert!(err.to_string().contains("TOO_MUCH_DATA"));

    let first = store.fixture("59", MAINZ_DORTMUND_EVENT).unwrap();
    assert_eq!(first.market_id, MAINZ_DORTMUND_MARKET);
    assert_eq!(first.history(MAINZ).len(), 1);
    assert_eq!(first.history(DORTMUND).len(), 1);

    // the market binds the first matching fixture, so the later league's copy stays unbound
    let second = store.fixture("81", MAINZ_DORTMUND_EVENT).unwrap();
    assert!(!second.is_bound());
    assert!(second.price_history.is_empty());
    assert_eq!(fake.book_calls(), 2);
}

#[tokio::test]
async fn test_out_of_range_window_fails_before_any_call() {
    let fake = FakeExchange::mainz_dortmund();
    let query = MarketQuery {
        min_days: 100_000_000,
        ..query()
    };
    let mut store = Store::new();

    let err = assert_err!(store.synchronize_at(&fake, &query, now()).await);
    assert!(err.to_string().contains("out of range"));
    assert!(!err.is_session_expired());
    assert!(store.is_empty());
    assert_eq!(fake.event_calls(), 0);
}
