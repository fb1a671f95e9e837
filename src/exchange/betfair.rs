//! Betfair Exchange JSON-RPC client
//!
//! Implements [`MarketDataSource`] over the Sports API betting endpoint.
//! Authentication uses the non-interactive certificate login; the resulting
//! session token is reused from the [`SessionCache`] while it is valid.

use super::session::{Credentials, SessionCache, SessionToken};
use super::types::{EventResult, MarketBook, MarketCatalogue, MarketFilter, PriceProjection};
use super::{ExchangeError, MarketDataSource};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// JSON-RPC endpoint for betting operations
pub const BETTING_API_URL: &str = "https://api.betfair.com/exchange/betting/json-rpc/v1";

/// Non-interactive (certificate) login endpoint
pub const IDENTITY_URL: &str = "https://identitysso-cert.betfair.com/api/certlogin";

const SPORTS_API_PREFIX: &str = "SportsAPING/v1.0/";

/// Configuration for the Betfair client
#[derive(Debug, Clone)]
pub struct BetfairConfig {
    /// Betting JSON-RPC endpoint
    pub betting_url: String,
    /// Certificate login endpoint
    pub identity_url: String,
    /// Application key sent with every request
    pub app_key: String,
    /// Timeout for each HTTP request
    pub request_timeout: Duration,
    /// Deadline for the whole login step
    pub auth_timeout: Duration,
}

impl BetfairConfig {
    /// Default endpoints for the given application key
    pub fn new(app_key: impl Into<String>) -> Self {
        Self {
            betting_url: BETTING_API_URL.to_string(),
            identity_url: IDENTITY_URL.to_string(),
            app_key: app_key.into(),
            request_timeout: Duration::from_secs(30),
            auth_timeout: Duration::from_secs(30),
        }
    }
}

/// Authenticated client for the betting API
pub struct BetfairClient {
    config: BetfairConfig,
    client: Client,
    session_token: String,
}

impl BetfairClient {
    /// Create a client that uses an existing session token
    pub fn with_session(
        config: BetfairConfig,
        session_token: impl Into<String>,
    ) -> Result<Self, ExchangeError> {
        let client = Client::builder().timeout(config.request_timeout).build()?;

        Ok(Self {
            config,
            client,
            session_token: session_token.into(),
        })
    }

    /// Obtain an authenticated client.
    ///
    /// Unless `force_login` is set, a valid cached session is reused. A new
    /// login is bounded by `auth_timeout` and its token is written back to
    /// the cache.
    pub async fn authenticate(
        config: BetfairConfig,
        credentials: &Credentials,
        cache: &SessionCache,
        force_login: bool,
    ) -> Result<Self, ExchangeError> {
        if !force_login {
            if let Some(token) = cache.read_valid(Utc::now()) {
                tracing::debug!(expires_at = %token.expires_at, "Reusing cached session");
                return Self::with_session(config, token.key);
            }
        }

        let deadline = config.auth_timeout;
        let key = tokio::time::timeout(deadline, login(&config, credentials))
            .await
            .map_err(|_| ExchangeError::Timeout(deadline.as_secs()))??;

        tracing::info!(user = %credentials.user, "Logged in to Betfair");
        cache.store(&SessionToken::issued(&key, Utc::now(), cache.lifetime()));

        Self::with_session(config, key)
    }

    /// Invoke a Sports API operation
    async fn call<P, R>(&self, operation: &str, params: P) -> Result<R, ExchangeError>
    where
        P: Serialize + Send,
        R: DeserializeOwned + Send,
    {
        let request = RpcRequest {
            jsonrpc: "2.0",
            method: format!("{}{}", SPORTS_API_PREFIX, operation),
            params,
            id: 1,
        };

        tracing::debug!(method = %request.method, "Calling Betfair API");

        let response = self
            .client
            .post(&self.config.betting_url)
            .header("X-Application", &self.config.app_key)
            .header("X-Authentication", &self.session_token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        match decode_rpc_response(&body) {
            Ok(result) => Ok(result),
            Err(ExchangeError::Json(_)) if !status.is_success() => Err(ExchangeError::Api {
                code: status.to_string(),
                message: body,
            }),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl MarketDataSource for BetfairClient {
    async fn list_events(&self, filter: &MarketFilter) -> Result<Vec<EventResult>, ExchangeError> {
        self.call("listEvents", ListEventsParams { filter }).await
    }

    async fn list_market_catalogue(
        &self,
        filter: &MarketFilter,
        max_results: usize,
    ) -> Result<Vec<MarketCatalogue>, ExchangeError> {
        let params = ListMarketCatalogueParams {
            filter,
            max_results,
            market_projection: vec!["RUNNER_DESCRIPTION"],
        };
        self.call("listMarketCatalogue", params).await
    }

    async fn list_market_book(
        &self,
        market_ids: &[String],
        projection: &PriceProjection,
    ) -> Result<Vec<MarketBook>, ExchangeError> {
        let params = ListMarketBookParams {
            market_ids,
            price_projection: projection,
            order_projection: "EXECUTABLE",
            match_projection: "ROLLED_UP_BY_AVG_PRICE",
        };
        self.call("listMarketBook", params).await
    }
}

/// Perform the certificate login and return the session token
async fn login(config: &BetfairConfig, credentials: &Credentials) -> Result<String, ExchangeError> {
    let cert = tokio::fs::read(&credentials.cert_path).await?;
    let key = tokio::fs::read(&credentials.key_path).await?;
    let identity = reqwest::Identity::from_pkcs8_pem(&cert, &key)?;

    let mut builder = Client::builder()
        .identity(identity)
        .timeout(config.request_timeout);
    if let Some(ref ca_path) = credentials.root_ca_path {
        let pem = tokio::fs::read(ca_path).await?;
        builder = builder.add_root_certificate(reqwest::Certificate::from_pem(&pem)?);
    }
    let client = builder.build()?;

    let response = client
        .post(&config.identity_url)
        .header("X-Application", &config.app_key)
        .form(&[
            ("username", credentials.user.as_str()),
            ("password", credentials.password.as_str()),
        ])
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(ExchangeError::Auth(format!("{} - {}", status, body)));
    }

    let login: LoginResponse = response.json().await?;
    login.into_token()
}

/// JSON-RPC request envelope
#[derive(Debug, Serialize)]
struct RpcRequest<P> {
    jsonrpc: &'static str,
    method: String,
    params: P,
    id: u32,
}

/// JSON-RPC response envelope
#[derive(Debug, Deserialize)]
struct RpcResponse<R> {
    result: Option<R>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<RpcErrorData>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorData {
    #[serde(rename = "APINGException")]
    aping_exception: Option<ApingException>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApingException {
    error_code: String,
    #[serde(default)]
    error_details: Option<String>,
}

impl From<RpcError> for ExchangeError {
    fn from(error: RpcError) -> Self {
        match error.data.and_then(|d| d.aping_exception) {
            Some(exception) => {
                let message = match exception.error_details {
                    Some(details) if !details.is_empty() => {
                        format!("{} ({})", error.message, details)
                    }
                    _ => error.message,
                };
                ExchangeError::Api {
                    code: exception.error_code,
                    message,
                }
            }
            None => ExchangeError::Api {
                code: error.code.to_string(),
                message: error.message,
            },
        }
    }
}

fn decode_rpc_response<R: DeserializeOwned>(body: &str) -> Result<R, ExchangeError> {
    let response: RpcResponse<R> = serde_json::from_str(body)?;

    if let Some(error) = response.error {
        return Err(error.into());
    }

    response.result.ok_or_else(|| ExchangeError::Api {
        code: "EMPTY_RESPONSE".to_string(),
        message: "response carried neither result nor error".to_string(),
    })
}

#[derive(Debug, Serialize)]
struct ListEventsParams<'a> {
    filter: &'a MarketFilter,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListMarketCatalogueParams<'a> {
    filter: &'a MarketFilter,
    max_results: usize,
    market_projection: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListMarketBookParams<'a> {
    market_ids: &'a [String],
    price_projection: &'a PriceProjection,
    order_projection: &'static str,
    match_projection: &'static str,
}

/// Certificate login response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    #[serde(default)]
    session_token: Option<String>,
    login_status: String,
}

impl LoginResponse {
    fn into_token(self) -> Result<String, ExchangeError> {
        match (self.login_status.as_str(), self.session_token) {
            ("SUCCESS", Some(token)) => Ok(token),
            (status, _) => Err(ExchangeError::Auth(status.to_string())),
        }
    }
}
