//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! [`FakeExchange`] is an in-memory [`MarketDataSource`] with canned events,
//! catalogues and a script of market books, plus failure injection at each
//! of the three calls.

use crate::exchange::{
    Event, EventResult, ExchangeError, ExchangePrices, MarketBook, MarketCatalogue,
    MarketDataSource, MarketFilter, PriceProjection, PriceSize, RunnerBook, RunnerCatalog,
    SelectionId,
};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

pub const MAINZ_DORTMUND_EVENT: &str = "fixture1";
pub const MAINZ_DORTMUND_MARKET: &str = "1.195693926";
pub const MAINZ: SelectionId = 64374;
pub const DORTMUND: SelectionId = 44785;
pub const THE_DRAW: SelectionId = 58805;

/// Call at which the fake fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
    Events,
    Catalogue,
    Book,
}

#[derive(Debug, Clone)]
struct Failure {
    point: FailurePoint,
    code: String,
    once: bool,
    /// Fail only the nth call at `point`, counting from one
    on_call: Option<u32>,
}

/// In-memory market data source
pub struct FakeExchange {
    events: Vec<EventResult>,
    catalogues: Vec<MarketCatalogue>,
    books: Mutex<VecDeque<Vec<MarketBook>>>,
    failure: Mutex<Option<Failure>>,
    event_calls: AtomicU32,
    catalogue_calls: AtomicU32,
    book_calls: AtomicU32,
}

impl FakeExchange {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            catalogues: Vec::new(),
            books: Mutex::new(VecDeque::new()),
            failure: Mutex::new(None),
            event_calls: AtomicU32::new(0),
            catalogue_calls: AtomicU32::new(0),
            book_calls: AtomicU32::new(0),
        }
    }

    /// Mainz v Dortmund with two successive market books
    pub fn mainz_dortmund() -> Self {
        Self::new()
            .with_events(vec![mainz_dortmund_event()])
            .with_catalogues(vec![mainz_dortmund_catalogue()])
            .with_books(mainz_dortmund_books())
    }

    pub fn with_events(mut self, events: Vec<EventResult>) -> Self {
        self.events = events;
        self
    }

    pub fn with_catalogues(mut self, catalogues: Vec<MarketCatalogue>) -> Self {
        self.catalogues = catalogues;
        self
    }

    /// Book responses in call order; the last one repeats once reached
    pub fn with_books(self, books: Vec<Vec<MarketBook>>) -> Self {
        *self.books.lock().unwrap_or_else(|e| e.into_inner()) = books.into();
        self
    }

    /// Fail every call at `point` with an API error carrying `code`
    pub fn failing_at(self, point: FailurePoint, code: &str) -> Self {
        self.set_failure(point, code, false, None);
        self
    }

    /// Fail only the next call at `point`
    pub fn failing_once_at(self, point: FailurePoint, code: &str) -> Self {
        self.set_failure(point, code, true, None);
        self
    }

    /// Fail the `call`th call at `point`; earlier and later calls succeed
    pub fn failing_at_call(self, point: FailurePoint, call: u32, code: &str) -> Self {
        self.set_failure(point, code, true, Some(call));
        self
    }

    fn set_failure(&self, point: FailurePoint, code: &str, once: bool, on_call: Option<u32>) {
        *self.failure.lock().unwrap_or_else(|e| e.into_inner()) = Some(Failure {
            point,
            code: code.to_string(),
            once,
            on_call,
        });
    }

    fn check_failure(&self, point: FailurePoint, call: u32) -> Result<(), ExchangeError> {
        let mut failure = self.failure.lock().unwrap_or_else(|e| e.into_inner());
        let Some(current) = failure
            .as_ref()
            .filter(|f| f.point == point && f.on_call.map_or(true, |n| n == call))
            .cloned()
        else {
            return Ok(());
        };
        if current.once {
            *failure = None;
        }
        Err(ExchangeError::Api {
            code: current.code,
            message: format!("injected failure at {:?}", point),
        })
    }

    pub fn event_calls(&self) -> u32 {
        self.event_calls.load(Ordering::SeqCst)
    }

    pub fn catalogue_calls(&self) -> u32 {
        self.catalogue_calls.load(Ordering::SeqCst)
    }

    pub fn book_calls(&self) -> u32 {
        self.book_calls.load(Ordering::SeqCst)
    }
}

impl Default for FakeExchange {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataSource for FakeExchange {
    async fn list_events(&self, _filter: &MarketFilter) -> Result<Vec<EventResult>, ExchangeError> {
        let call = self.event_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.check_failure(FailurePoint::Events, call)?;
        Ok(self.events.clone())
    }

    async fn list_market_catalogue(
        &self,
        _filter: &MarketFilter,
        max_results: usize,
    ) -> Result<Vec<MarketCatalogue>, ExchangeError> {
        let call = self.catalogue_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.check_failure(FailurePoint::Catalogue, call)?;

        Ok(self.catalogues.iter().take(max_results).cloned().collect())
    }

    async fn list_market_book(
        &self,
        market_ids: &[String],
        _projection: &PriceProjection,
    ) -> Result<Vec<MarketBook>, ExchangeError> {
        let call = self.book_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.check_failure(FailurePoint::Book, call)?;

        let mut books = self.books.lock().unwrap_or_else(|e| e.into_inner());
        let current = if books.len() > 1 {
            books.pop_front().unwrap_or_default()
        } else {
            books.front().cloned().unwrap_or_default()
        };

        Ok(current
            .into_iter()
            .filter(|book| market_ids.contains(&book.market_id))
            .collect())
    }
}

/// A price level
pub fn level(price: Decimal, size: Decimal) -> PriceSize {
    PriceSize { price, size }
}

/// An active runner with the given ladders
pub fn runner_book(selection_id: SelectionId, back: Vec<PriceSize>, lay: Vec<PriceSize>) -> RunnerBook {
    RunnerBook {
        selection_id,
        handicap: Decimal::ZERO,
        status: Some("ACTIVE".to_string()),
        last_price_traded: None,
        ex: ExchangePrices {
            available_to_back: back,
            available_to_lay: lay,
        },
    }
}

/// An open, pre-play market book
pub fn market_book(market_id: &str, runners: Vec<RunnerBook>) -> MarketBook {
    MarketBook {
        market_id: market_id.to_string(),
        status: Some("OPEN".to_string()),
        inplay: false,
        runners,
    }
}

/// An event with one market
pub fn event(id: &str, name: &str, open_date: DateTime<Utc>) -> EventResult {
    EventResult {
        event: Event {
            id: id.to_string(),
            name: name.to_string(),
            country_code: Some("DE".to_string()),
            timezone: Some("GMT".to_string()),
            open_date,
        },
        market_count: 1,
    }
}

/// A match odds catalogue listing home, away and the draw
pub fn match_odds_catalogue(market_id: &str, runners: &[(SelectionId, &str)]) -> MarketCatalogue {
    MarketCatalogue {
        market_id: market_id.to_string(),
        market_name: "Match Odds".to_string(),
        total_matched: Some(dec!(101.56)),
        runners: runners
            .iter()
            .enumerate()
            .map(|(i, (selection_id, name))| RunnerCatalog {
                selection_id: *selection_id,
                runner_name: name.to_string(),
                handicap: Decimal::ZERO,
                sort_priority: i as u32 + 1,
            })
            .collect(),
    }
}

/// Scheduled kick-off of Mainz v Dortmund
pub fn mainz_dortmund_kick_off() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2022, 4, 6, 16, 30, 0)
        .single()
        .unwrap_or_default()
}

pub fn mainz_dortmund_event() -> EventResult {
    event(
        MAINZ_DORTMUND_EVENT,
        "Mainz v Dortmund",
        mainz_dortmund_kick_off(),
    )
}

pub fn mainz_dortmund_catalogue() -> MarketCatalogue {
    match_odds_catalogue(
        MAINZ_DORTMUND_MARKET,
        &[(MAINZ, "Mainz"), (DORTMUND, "Dortmund"), (THE_DRAW, "The Draw")],
    )
}

/// Two successive books: both teams settled, then Mainz drifting out
pub fn mainz_dortmund_books() -> Vec<Vec<MarketBook>> {
    let draw = || {
        runner_book(
            THE_DRAW,
            vec![
                level(dec!(2.56), dec!(70.4)),
                level(dec!(2.54), dec!(202.55)),
                level(dec!(2.52), dec!(1061.69)),
            ],
            vec![
                level(dec!(2.6), dec!(171.1)),
                level(dec!(2.62), dec!(1049.66)),
                level(dec!(2.64), dec!(407.99)),
            ],
        )
    };

    let first = market_book(
        MAINZ_DORTMUND_MARKET,
        vec![
            runner_book(
                MAINZ,
                vec![
                    level(dec!(3.7), dec!(777.45)),
                    level(dec!(3.65), dec!(1164.38)),
                    level(dec!(3.6), dec!(1019.41)),
                ],
                vec![
                    level(dec!(3.75), dec!(718.45)),
                    level(dec!(3.8), dec!(1145.15)),
                    level(dec!(3.85), dec!(1505.97)),
                ],
            ),
            runner_book(
                DORTMUND,
                vec![
                    level(dec!(2.86), dec!(537.2)),
                    level(dec!(2.84), dec!(167.17)),
                    level(dec!(2.82), dec!(833.53)),
                ],
                vec![
                    level(dec!(2.9), dec!(194.9)),
                    level(dec!(2.92), dec!(1168.09)),
                    level(dec!(2.94), dec!(526.12)),
                ],
            ),
            draw(),
        ],
    );

    let second = market_book(
        MAINZ_DORTMUND_MARKET,
        vec![
            runner_book(
                MAINZ,
                vec![
                    level(dec!(3.75), dec!(777.45)),
                    level(dec!(3.7), dec!(1164.38)),
                    level(dec!(3.65), dec!(1019.41)),
                ],
                vec![
                    level(dec!(3.8), dec!(718.45)),
                    level(dec!(3.85), dec!(1145.15)),
                    level(dec!(3.9), dec!(1505.97)),
                ],
            ),
            runner_book(
                DORTMUND,
                vec![
                    level(dec!(2.84), dec!(537.2)),
                    level(dec!(2.82), dec!(167.17)),
                    level(dec!(2.8), dec!(833.53)),
                ],
                vec![
                    level(dec!(2.92), dec!(194.9)),
                    level(dec!(2.94), dec!(1168.09)),
                    level(dec!(2.96), dec!(526.12)),
                ],
            ),
            draw(),
        ],
    );

    vec![vec![first], vec![second]]
}
