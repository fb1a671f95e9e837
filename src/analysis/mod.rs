//! Trend extraction and hedge analysis over stored price histories

mod pnl;
mod trend;

pub use pnl::{BucketReport, Hedge, OddsRange, PnlLine, PnlReport, ODDS_RANGES};
pub use trend::{
    extract_fixture_trends, extract_trends, settled_entry_index, Trend, TrendDirection,
    SETTLED_SPREAD_TICKS,
};
