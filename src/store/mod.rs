//! Price store
//!
//! Owns every tracked fixture and its price history, keyed by league and
//! fixture id. The store is synchronized against a [`MarketDataSource`]
//! and persisted as a single JSON document.
//!
//! [`MarketDataSource`]: crate::exchange::MarketDataSource

mod persist;
mod sync;

pub use persist::StoreError;
pub use sync::{select_best_price, Preference, SyncSummary};

use crate::exchange::{Event, RunnerBook, SelectionId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fixtures of one league, keyed by event id
pub type League = BTreeMap<String, FixturePrices>;

/// Separator between home and away team in a fixture name
pub const TEAM_SEPARATOR: &str = " v ";

/// Whether the fixture has been played
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    #[default]
    Scheduled,
    Played,
}

/// Final result of a fixture
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchResult {
    /// Not yet resolved
    #[default]
    #[serde(rename = "")]
    Unresolved,
    Home,
    Away,
    Draw,
}

/// Best back and lay offers for a runner at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    #[serde(rename = "time_stamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(with = "rust_decimal::serde::float")]
    pub back_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub lay_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub back_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub lay_amount: Decimal,
}

impl Price {
    /// Best back (highest) and best lay (lowest) offers of a runner.
    ///
    /// A side with no offers yields a zero price, meaning no liquidity.
    pub fn from_runner(runner: &RunnerBook, observed_at: DateTime<Utc>) -> Self {
        let back = select_best_price(&runner.ex.available_to_back, Preference::Highest);
        let lay = select_best_price(&runner.ex.available_to_lay, Preference::Lowest);

        Self {
            timestamp: observed_at,
            back_price: back.price,
            lay_price: lay.price,
            back_amount: back.size,
            lay_amount: lay.size,
        }
    }

    /// Difference between lay and back price
    pub fn spread(&self) -> Decimal {
        self.lay_price - self.back_price
    }
}

/// A tracked fixture and the price history of its home and away runners
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixturePrices {
    /// Display name, `"<Home> v <Away>"`
    #[serde(rename = "fixture")]
    pub name: String,
    /// Scheduled kick-off
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub status: MatchStatus,
    #[serde(default)]
    pub outcome: MatchResult,
    pub event_id: String,
    /// Match odds market, empty until the catalogue has been matched
    #[serde(default)]
    pub market_id: String,
    /// Zero until the catalogue has been matched
    #[serde(default, rename = "home_runner")]
    pub home_runner_id: SelectionId,
    /// Zero until the catalogue has been matched
    #[serde(default, rename = "away_runner")]
    pub away_runner_id: SelectionId,
    /// Snapshots per runner, oldest first
    #[serde(default, rename = "history")]
    pub price_history: BTreeMap<SelectionId, Vec<Price>>,
}

impl FixturePrices {
    /// A newly discovered, unplayed fixture with no prices
    pub fn scheduled(event: &Event) -> Self {
        Self {
            name: event.name.clone(),
            date: event.open_date,
            status: MatchStatus::Scheduled,
            outcome: MatchResult::Unresolved,
            event_id: event.id.clone(),
            market_id: String::new(),
            home_runner_id: 0,
            away_runner_id: 0,
            price_history: BTreeMap::new(),
        }
    }

    /// Home and away team names, if the name has exactly one separator
    pub fn teams(&self) -> Option<(&str, &str)> {
        let mut parts = self.name.split(TEAM_SEPARATOR);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(home), Some(away), None) => Some((home, away)),
            _ => None,
        }
    }

    /// Whether the name mentions both runner names
    pub fn matches_runners(&self, home: &str, away: &str) -> bool {
        self.name.contains(home) && self.name.contains(away)
    }

    /// Attach the match odds market and its home/away selections
    pub fn bind_market(&mut self, market_id: &str, home: SelectionId, away: SelectionId) {
        self.market_id = market_id.to_string();
        self.home_runner_id = home;
        self.away_runner_id = away;
    }

    /// Whether `selection` is the bound home or away runner
    pub fn is_tracked_runner(&self, selection: SelectionId) -> bool {
        self.is_bound() && (selection == self.home_runner_id || selection == self.away_runner_id)
    }

    /// Whether runner ids have been bound from a market catalogue
    pub fn is_bound(&self) -> bool {
        self.home_runner_id != 0 || self.away_runner_id != 0
    }

    /// Price history of a runner, empty if never observed
    pub fn history(&self, selection: SelectionId) -> &[Price] {
        self.price_history
            .get(&selection)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Append a snapshot to a runner's history
    pub fn record(&mut self, selection: SelectionId, price: Price) {
        self.price_history.entry(selection).or_default().push(price);
    }
}

/// All tracked fixtures, keyed by league id then event id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Store {
    leagues: BTreeMap<String, League>,
}

impl Store {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no league has been recorded
    pub fn is_empty(&self) -> bool {
        self.leagues.is_empty()
    }

    /// Iterate over leagues and their fixtures
    pub fn leagues(&self) -> impl Iterator<Item = (&String, &League)> {
        self.leagues.iter()
    }

    /// Fixtures of one league
    pub fn league(&self, league_id: &str) -> Option<&League> {
        self.leagues.get(league_id)
    }

    /// A single fixture
    pub fn fixture(&self, league_id: &str, event_id: &str) -> Option<&FixturePrices> {
        self.leagues.get(league_id)?.get(event_id)
    }

    /// Iterate over every fixture in every league
    pub fn fixtures(&self) -> impl Iterator<Item = &FixturePrices> {
        self.leagues.values().flat_map(|league| league.values())
    }

    /// Total number of fixtures
    pub fn fixture_count(&self) -> usize {
        self.leagues.values().map(League::len).sum()
    }

    /// Insert a fixture unless one already exists under the same key.
    ///
    /// Returns whether the fixture was added.
    pub fn insert_if_absent(&mut self, league_id: &str, fixture: FixturePrices) -> bool {
        let league = self.leagues.entry(league_id.to_string()).or_default();
        if league.contains_key(&fixture.event_id) {
            return false;
        }
        league.insert(fixture.event_id.clone(), fixture);
        true
    }

    /// Mutable access to a single fixture
    pub(crate) fn fixture_mut(
        &mut self,
        league_id: &str,
        event_id: &str,
    ) -> Option<&mut FixturePrices> {
        self.leagues.get_mut(league_id)?.get_mut(event_id)
    }
}
