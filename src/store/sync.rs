//! Store synchronization against a market data source
//!
//! One pass per league: discover fixtures, bind their match odds markets,
//! then append the current best prices of the home and away runners.

use super::{FixturePrices, Price, Store};
use crate::exchange::{
    ExchangeError, MarketBook, MarketCatalogue, MarketDataSource, MarketFilter, PriceProjection,
    PriceSize, TimeRange,
};
use crate::query::MarketQuery;
use chrono::{DateTime, Utc};

/// Which end of the ladder counts as best
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preference {
    /// Best back offer
    Highest,
    /// Best lay offer
    Lowest,
}

/// Pick the best level by linear scan.
///
/// The first level seeds the result and later levels replace it only on
/// strict improvement, so ties keep the earliest. No levels yields zero
/// price and size.
pub fn select_best_price(levels: &[PriceSize], preference: Preference) -> PriceSize {
    let mut levels = levels.iter();
    let Some(first) = levels.next() else {
        return PriceSize::default();
    };

    levels.fold(*first, |best, level| {
        let improves = match preference {
            Preference::Highest => level.price > best.price,
            Preference::Lowest => level.price < best.price,
        };
        if improves {
            *level
        } else {
            best
        }
    })
}

/// What a synchronization pass changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Leagues that returned at least one event
    pub leagues_with_events: usize,
    /// Fixtures seen for the first time
    pub fixtures_added: usize,
    /// Markets matched to a stored fixture
    pub markets_bound: usize,
    /// Price snapshots appended
    pub snapshots_recorded: usize,
}

impl Store {
    /// Merge current market data for the query's leagues into the store
    pub async fn synchronize<S>(
        &mut self,
        source: &S,
        query: &MarketQuery,
    ) -> Result<SyncSummary, ExchangeError>
    where
        S: MarketDataSource + ?Sized,
    {
        self.synchronize_at(source, query, Utc::now()).await
    }

    /// Synchronize with an explicit clock.
    ///
    /// `now` anchors the fixture window and stamps every snapshot. Leagues
    /// are processed in order; an upstream error stops the pass and leaves
    /// earlier leagues' changes in place.
    pub async fn synchronize_at<S>(
        &mut self,
        source: &S,
        query: &MarketQuery,
        now: DateTime<Utc>,
    ) -> Result<SyncSummary, ExchangeError>
    where
        S: MarketDataSource + ?Sized,
    {
        let window = query.window(now)?;
        let mut summary = SyncSummary::default();

        for league_id in &query.league_ids {
            self.synchronize_league(source, league_id, &window, now, &mut summary)
                .await?;
        }

        Ok(summary)
    }

    async fn synchronize_league<S>(
        &mut self,
        source: &S,
        league_id: &str,
        window: &TimeRange,
        now: DateTime<Utc>,
        summary: &mut SyncSummary,
    ) -> Result<(), ExchangeError>
    where
        S: MarketDataSource + ?Sized,
    {
        let filter = MarketFilter::competition_events(league_id, window.clone());
        let events = source.list_events(&filter).await?;
        if events.is_empty() {
            tracing::debug!(league = league_id, "No fixtures in window");
            return Ok(());
        }
        summary.leagues_with_events += 1;

        let mut event_ids = Vec::with_capacity(events.len());
        for result in &events {
            event_ids.push(result.event.id.clone());
            if self.insert_if_absent(league_id, FixturePrices::scheduled(&result.event)) {
                summary.fixtures_added += 1;
                tracing::info!(
                    league = league_id,
                    event_id = %result.event.id,
                    fixture = %result.event.name,
                    "Tracking new fixture"
                );
            }
        }

        let max_results = event_ids.len();
        let catalogues = source
            .list_market_catalogue(&MarketFilter::match_odds(event_ids), max_results)
            .await?;

        let market_ids = self.bind_markets(&catalogues);
        summary.markets_bound += market_ids.len();
        if market_ids.is_empty() {
            tracing::debug!(league = league_id, "No markets matched stored fixtures");
            return Ok(());
        }

        let books = source
            .list_market_book(&market_ids, &PriceProjection::best_offers())
            .await?;
        let recorded = self.record_books(league_id, &books, now);
        summary.snapshots_recorded += recorded;

        tracing::debug!(
            league = league_id,
            markets = market_ids.len(),
            snapshots = recorded,
            "League synchronized"
        );

        Ok(())
    }

    /// Bind each catalogue to the fixture named after its first two runners.
    ///
    /// Returns the ids of the markets that were bound.
    fn bind_markets(&mut self, catalogues: &[MarketCatalogue]) -> Vec<String> {
        let mut market_ids = Vec::new();

        for market in catalogues {
            let [home, away, ..] = market.runners.as_slice() else {
                tracing::debug!(market_id = %market.market_id, "Market has fewer than two runners");
                continue;
            };

            let Some((league_id, event_id)) =
                self.find_fixture_by_teams(&home.runner_name, &away.runner_name)
            else {
                tracing::debug!(
                    market_id = %market.market_id,
                    home = %home.runner_name,
                    away = %away.runner_name,
                    "No stored fixture for market"
                );
                continue;
            };

            if let Some(fixture) = self.fixture_mut(&league_id, &event_id) {
                fixture.bind_market(&market.market_id, home.selection_id, away.selection_id);
                market_ids.push(market.market_id.clone());
            }
        }

        market_ids
    }

    /// Append a snapshot for each tracked runner in the books
    fn record_books(
        &mut self,
        league_id: &str,
        books: &[MarketBook],
        observed_at: DateTime<Utc>,
    ) -> usize {
        let mut recorded = 0;

        for book in books {
            let Some(event_id) = self
                .find_fixture_by_market(league_id, &book.market_id)
                .map(str::to_string)
            else {
                tracing::debug!(market_id = %book.market_id, "No stored fixture for market book");
                continue;
            };
            let Some(fixture) = self.fixture_mut(league_id, &event_id) else {
                continue;
            };

            for runner in &book.runners {
                if fixture.is_tracked_runner(runner.selection_id) {
                    fixture.record(runner.selection_id, Price::from_runner(runner, observed_at));
                    recorded += 1;
                }
            }
        }

        recorded
    }

    /// First fixture, in key order across all leagues, whose name contains
    /// both team names. Returns `(league id, event id)`.
    pub fn find_fixture_by_teams(&self, home: &str, away: &str) -> Option<(String, String)> {
        self.leagues()
            .flat_map(|(league_id, league)| {
                league
                    .iter()
                    .map(move |(event_id, fixture)| (league_id, event_id, fixture))
            })
            .find(|(_, _, fixture)| fixture.matches_runners(home, away))
            .map(|(league_id, event_id, _)| (league_id.clone(), event_id.clone()))
    }

    /// Event id of the fixture in `league_id` bound to `market_id`
    pub fn find_fixture_by_market(&self, league_id: &str, market_id: &str) -> Option<&str> {
        if market_id.is_empty() {
            return None;
        }
        self.league(league_id)?
            .iter()
            .find(|(_, fixture)| fixture.market_id == market_id)
            .map(|(event_id, _)| event_id.as_str())
    }
}
