//! Integration tests against the in-memory exchange

mod analysis_test;
mod config_test;
mod persistence_test;
mod store_sync_test;
