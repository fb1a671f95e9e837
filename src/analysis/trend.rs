//! Price trend extraction
//!
//! A runner's trend starts at its settled entry point, the first snapshot
//! whose back/lay spread is within two ticks, and runs to its latest
//! snapshot.

use crate::store::{FixturePrices, Price, Store};
use crate::tick::{round_2dp, tick_offset};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

/// Maximum spread, in ticks, for a market to count as settled
pub const SETTLED_SPREAD_TICKS: Decimal = dec!(2);

/// Direction of a runner's price since its entry point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    /// Exit price below entry, positive delta
    Shortening,
    /// Exit price at or above entry
    Drifting,
}

impl TrendDirection {
    fn from_delta(delta: Decimal) -> Self {
        if delta > Decimal::ZERO {
            Self::Shortening
        } else {
            Self::Drifting
        }
    }
}

/// Price movement of one team in one fixture
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trend {
    pub fixture: String,
    pub team: String,
    pub home: bool,
    /// Time of the settled entry point
    pub start_time: DateTime<Utc>,
    /// Back price at the entry point
    #[serde(with = "rust_decimal::serde::float")]
    pub start_price: Decimal,
    /// Lay price at the entry point
    #[serde(with = "rust_decimal::serde::float")]
    pub start_lay_price: Decimal,
    /// Lay price of the latest snapshot, the cost of laying off
    #[serde(with = "rust_decimal::serde::float")]
    pub current_price: Decimal,
    /// Back price of the latest snapshot
    #[serde(with = "rust_decimal::serde::float")]
    pub current_lay_price: Decimal,
    /// `start_price - current_price`, two decimal places
    #[serde(with = "rust_decimal::serde::float")]
    pub delta: Decimal,
    /// Snapshots from the entry point to the latest, inclusive
    pub sample_number: usize,
    pub direction: TrendDirection,
}

/// Index of the first snapshot whose spread is within two ticks
pub fn settled_entry_index(history: &[Price]) -> Option<usize> {
    history
        .iter()
        .position(|price| price.spread() <= SETTLED_SPREAD_TICKS * tick_offset(price.back_price))
}

/// Build the trend of one runner, or `None` if it never settled
fn runner_trend(fixture: &FixturePrices, team: &str, home: bool, history: &[Price]) -> Option<Trend> {
    let start_index = settled_entry_index(history)?;
    let start = &history[start_index];
    let latest = history.last()?;

    // Entry is taken at the back price; the exit is valued at the lay price
    let delta = round_2dp(start.back_price - latest.lay_price);

    Some(Trend {
        fixture: fixture.name.clone(),
        team: team.to_string(),
        home,
        start_time: start.timestamp,
        start_price: start.back_price,
        start_lay_price: start.lay_price,
        current_price: latest.lay_price,
        current_lay_price: latest.back_price,
        delta,
        sample_number: history.len() - start_index,
        direction: TrendDirection::from_delta(delta),
    })
}

/// Home and away trends of a fixture.
///
/// Fixtures whose name does not split into two teams, or where either side
/// never settled, yield nothing.
pub fn extract_fixture_trends(fixture: &FixturePrices) -> Option<[Trend; 2]> {
    let Some((home_team, away_team)) = fixture.teams() else {
        tracing::debug!(fixture = %fixture.name, "Fixture name does not split into two teams");
        return None;
    };

    let home = runner_trend(
        fixture,
        home_team,
        true,
        fixture.history(fixture.home_runner_id),
    )?;
    let away = runner_trend(
        fixture,
        away_team,
        false,
        fixture.history(fixture.away_runner_id),
    )?;

    Some([home, away])
}

/// Trends of every fixture in the store, sorted ascending by delta
pub fn extract_trends(store: &Store) -> Vec<Trend> {
    let mut trends: Vec<Trend> = store
        .fixtures()
        .filter_map(extract_fixture_trends)
        .flatten()
        .collect();

    trends.sort_by(|a, b| a.delta.cmp(&b.delta));
    trends
}
