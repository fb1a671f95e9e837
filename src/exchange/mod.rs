//! Exchange access module
//!
//! The market data source the price store synchronizes against, the Betfair
//! JSON-RPC client implementing it, and login/session handling.

mod betfair;
mod session;
mod types;

pub use betfair::{BetfairClient, BetfairConfig, BETTING_API_URL, IDENTITY_URL};
pub use session::{Credentials, SessionCache, SessionToken};
pub use types::{
    Event, EventResult, ExchangePrices, MarketBook, MarketCatalogue, MarketFilter,
    PriceProjection, PriceSize, RunnerBook, RunnerCatalog, SelectionId, TimeRange,
    FOOTBALL_EVENT_TYPE, MATCH_ODDS,
};

use crate::query::QueryError;
use async_trait::async_trait;
use thiserror::Error;

/// APING error code reported when the session token is no longer valid
pub const SESSION_EXPIRED_CODE: &str = "ANGX-0003";

/// Errors from the exchange API
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// The API answered with an error object
    #[error("API error {code}: {message}")]
    Api { code: String, message: String },
    /// Response body could not be decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Login was refused or could not be attempted
    #[error("Authentication failed: {0}")]
    Auth(String),
    /// Reading credentials or certificates failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Authentication did not finish within the configured deadline
    #[error("Authentication timed out after {0}s")]
    Timeout(u64),
    /// The query cannot be turned into a request
    #[error(transparent)]
    Query(#[from] QueryError),
}

impl ExchangeError {
    /// True when the failure means the session must be re-established
    pub fn is_session_expired(&self) -> bool {
        self.to_string().contains(SESSION_EXPIRED_CODE)
    }
}

/// Source of events, market catalogues and market books
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// List events matching the filter
    async fn list_events(&self, filter: &MarketFilter) -> Result<Vec<EventResult>, ExchangeError>;

    /// List market catalogues matching the filter
    async fn list_market_catalogue(
        &self,
        filter: &MarketFilter,
        max_results: usize,
    ) -> Result<Vec<MarketCatalogue>, ExchangeError>;

    /// List the current order book for each market
    async fn list_market_book(
        &self,
        market_ids: &[String],
        projection: &PriceProjection,
    ) -> Result<Vec<MarketBook>, ExchangeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_expired_detection() {
        let err = ExchangeError::Api {
            code: "INVALID_SESSION_INFORMATION".to_string(),
            message: "ANGX-0003".to_string(),
        };
        assert!(err.is_session_expired());

        let err = ExchangeError::Auth("session expired [ANGX-0003]".to_string());
        assert!(err.is_session_expired());
    }

    #[test]
    fn test_other_errors_not_session_expiry() {
        let err = ExchangeError::Api {
            code: "TOO_MUCH_DATA".to_string(),
            message: "ANGX-0001".to_string(),
        };
        assert!(!err.is_session_expired());
        assert!(!ExchangeError::Timeout(30).is_session_expired());
    }
}
