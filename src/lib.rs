//! football-trader: Betfair football match odds tracker and hedge analyzer
//!
//! This library provides the core components for:
//! - Betfair JSON-RPC access with certificate login and session caching
//! - A persistent per-league store of best back/lay price history
//! - Price trend extraction from settled entry points
//! - Hedge profit and loss analysis by starting odds
//! - Structured logging

pub mod analysis;
pub mod cli;
pub mod config;
pub mod exchange;
pub mod query;
pub mod store;
pub mod telemetry;
pub mod tick;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
