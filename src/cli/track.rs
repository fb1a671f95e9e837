//! Track command implementation

use crate::config::Config;
use crate::exchange::{BetfairClient, Credentials, ExchangeError, MarketDataSource};
use crate::query::MarketQuery;
use crate::store::{Store, SyncSummary};
use anyhow::Context;
use clap::Args;
use std::future::Future;
use std::path::PathBuf;

/// Name of the store file inside the store directory
pub const STORE_FILE: &str = "store.json";

#[derive(Args, Debug)]
pub struct TrackArgs {
    /// JSON login file (certificate paths, user, password)
    #[arg(long)]
    pub login_file: PathBuf,

    /// JSON query file (league ids and fixture window)
    #[arg(long)]
    pub query_file: PathBuf,

    /// Directory holding store.json and its backups
    #[arg(long, default_value = ".")]
    pub store_dir: PathBuf,

    /// Betfair application key
    #[arg(long, env = "BETFAIR_APP_KEY", hide_env_values = true)]
    pub app_key: String,
}

impl TrackArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let credentials = Credentials::load(&self.login_file)
            .with_context(|| format!("Failed to read login file {:?}", self.login_file))?;
        let query = MarketQuery::load(&self.query_file)
            .with_context(|| format!("Failed to read query file {:?}", self.query_file))?;

        std::fs::create_dir_all(&self.store_dir)
            .with_context(|| format!("Failed to create store directory {:?}", self.store_dir))?;
        let store_path = self.store_dir.join(STORE_FILE);
        let mut store = Store::load(&store_path);

        let betfair = config.exchange.betfair_config(&self.app_key);
        let cache = config.session.cache();
        let (credentials, cache) = (&credentials, &cache);

        let summary = sync_with_reauth(&mut store, &query, move |force_login| {
            BetfairClient::authenticate(betfair.clone(), credentials, cache, force_login)
        })
        .await
        .context("Synchronization failed")?;

        tracing::info!(
            leagues = summary.leagues_with_events,
            fixtures_added = summary.fixtures_added,
            markets = summary.markets_bound,
            snapshots = summary.snapshots_recorded,
            "Prices synchronized"
        );

        store
            .save(&store_path)
            .with_context(|| format!("Failed to save store to {:?}", store_path))?;

        Ok(())
    }
}

/// Synchronize the store, logging in again once if the session expired.
///
/// `connect(force_login)` yields a data source; it is called with `false`
/// first and with `true` only after a session-expired failure. A retry runs
/// the whole pass again, so leagues completed before the failure receive a
/// second snapshot.
pub async fn sync_with_reauth<S, F, Fut>(
    store: &mut Store,
    query: &MarketQuery,
    mut connect: F,
) -> Result<SyncSummary, ExchangeError>
where
    S: MarketDataSource,
    F: FnMut(bool) -> Fut,
    Fut: Future<Output = Result<S, ExchangeError>>,
{
    let source = connect(false).await?;

    match store.synchronize(&source, query).await {
        Err(e) if e.is_session_expired() => {
            tracing::warn!(error = %e, "Session expired, logging in again");
            let source = connect(true).await?;
            store.synchronize(&source, query).await
        }
        result => result,
    }
}
