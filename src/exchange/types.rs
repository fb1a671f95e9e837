//! Betfair Exchange API wire types
//!
//! Request filters and response records for the three betting operations
//! the tracker uses. Field names follow the API's camelCase JSON.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Betfair event type id for football
pub const FOOTBALL_EVENT_TYPE: &str = "1";

/// Market type code for the home/away/draw market
pub const MATCH_ODDS: &str = "MATCH_ODDS";

/// Selection identifier of a runner
pub type SelectionId = u64;

/// Time range used by market filters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

/// Filter shared by `listEvents` and `listMarketCatalogue`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketFilter {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub event_type_ids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub competition_ids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub event_ids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub market_type_codes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_start_time: Option<TimeRange>,
}

impl MarketFilter {
    /// Football events in one competition starting within `window`
    pub fn competition_events(competition_id: &str, window: TimeRange) -> Self {
        Self {
            event_type_ids: vec![FOOTBALL_EVENT_TYPE.to_string()],
            competition_ids: vec![competition_id.to_string()],
            market_start_time: Some(window),
            ..Default::default()
        }
    }

    /// Match odds markets for the given events
    pub fn match_odds(event_ids: Vec<String>) -> Self {
        Self {
            event_ids,
            market_type_codes: vec![MATCH_ODDS.to_string()],
            ..Default::default()
        }
    }
}

/// Which price data a market book request returns
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceProjection {
    pub price_data: Vec<String>,
}

impl PriceProjection {
    /// Best three back and lay offers per runner
    pub fn best_offers() -> Self {
        Self {
            price_data: vec!["EX_BEST_OFFERS".to_string()],
        }
    }
}

/// Event details returned by `listEvents`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    pub open_date: DateTime<Utc>,
}

/// One entry of the `listEvents` result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResult {
    pub event: Event,
    #[serde(default)]
    pub market_count: u32,
}

/// Runner description within a market catalogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerCatalog {
    pub selection_id: SelectionId,
    pub runner_name: String,
    #[serde(default)]
    pub handicap: Decimal,
    #[serde(default)]
    pub sort_priority: u32,
}

/// One entry of the `listMarketCatalogue` result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketCatalogue {
    pub market_id: String,
    pub market_name: String,
    #[serde(default)]
    pub total_matched: Option<Decimal>,
    /// Runners in sort priority order: home, away, draw for match odds
    #[serde(default)]
    pub runners: Vec<RunnerCatalog>,
}

/// A price level offered on the exchange
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSize {
    pub price: Decimal,
    pub size: Decimal,
}

/// Best available offers for a runner
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangePrices {
    #[serde(default)]
    pub available_to_back: Vec<PriceSize>,
    #[serde(default)]
    pub available_to_lay: Vec<PriceSize>,
}

/// Runner state within a market book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerBook {
    pub selection_id: SelectionId,
    #[serde(default)]
    pub handicap: Decimal,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub last_price_traded: Option<Decimal>,
    #[serde(default)]
    pub ex: ExchangePrices,
}

/// One entry of the `listMarketBook` result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketBook {
    pub market_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub inplay: bool,
    #[serde(default)]
    pub runners: Vec<RunnerBook>,
}
