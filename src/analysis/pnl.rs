//! Hedge profit and loss by starting odds
//!
//! Each trend is treated as a back bet at its entry price that is laid off
//! at its latest lay price. Results are grouped by the odds range the entry
//! price falls in.

use super::trend::Trend;
use crate::config::AnalysisConfig;
use crate::tick::round_2dp;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::fmt::Write;

/// Inclusive range of starting back prices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OddsRange {
    #[serde(with = "rust_decimal::serde::float")]
    pub low: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub high: Decimal,
}

impl OddsRange {
    pub const fn new(low: Decimal, high: Decimal) -> Self {
        Self { low, high }
    }

    /// Whether `price` lies within `[low, high]`
    pub fn contains(&self, price: Decimal) -> bool {
        self.low <= price && price <= self.high
    }
}

/// Odds ranges reported, in order
pub const ODDS_RANGES: [OddsRange; 6] = [
    OddsRange::new(dec!(1.2), dec!(1.99)),
    OddsRange::new(dec!(2.0), dec!(2.99)),
    OddsRange::new(dec!(3.0), dec!(4.99)),
    OddsRange::new(dec!(5.0), dec!(9.99)),
    OddsRange::new(dec!(10.0), dec!(19.99)),
    OddsRange::new(dec!(20.0), dec!(29.99)),
];

/// Outcome of laying off a back bet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Hedge {
    /// Lay stake that equalizes the book
    #[serde(with = "rust_decimal::serde::float")]
    pub lay_stake: Decimal,
    /// Locked-in result, commission deducted from winnings
    #[serde(with = "rust_decimal::serde::float")]
    pub profit: Decimal,
    /// Stake minus the commission-adjusted lay stake
    #[serde(with = "rust_decimal::serde::float")]
    pub qualifying_loss: Decimal,
}

impl Hedge {
    /// Hedge a back bet at `back_price` with a lay at `lay_price`.
    ///
    /// Returns `None` when the lay price does not exceed the commission,
    /// which includes a zero price from a side without offers.
    pub fn calculate(back_price: Decimal, lay_price: Decimal, config: &AnalysisConfig) -> Option<Self> {
        if lay_price <= config.commission {
            return None;
        }

        let keep = Decimal::ONE - config.commission;
        let lay_stake = config.stake * back_price / (lay_price - config.commission);

        let mut profit = lay_stake - config.stake;
        if lay_stake > config.stake {
            profit *= keep;
        }

        let lay_stake = round_2dp(lay_stake);
        Some(Self {
            lay_stake,
            profit: round_2dp(profit),
            qualifying_loss: round_2dp(config.stake - lay_stake * keep),
        })
    }
}

/// One trend in a bucket with its hedge outcome
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PnlLine {
    #[serde(flatten)]
    pub trend: Trend,
    /// Delta as a percentage of the entry price
    #[serde(with = "rust_decimal::serde::float")]
    pub percent_move: Decimal,
    /// `None` when the exit price cannot be laid
    pub hedge: Option<Hedge>,
}

/// Trends and totals for one odds range
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketReport {
    pub range: OddsRange,
    pub lines: Vec<PnlLine>,
    /// Sum of hedge results of shortening trends
    #[serde(with = "rust_decimal::serde::float")]
    pub cumulative_profit: Decimal,
    /// Sum of hedge results of all other trends
    #[serde(with = "rust_decimal::serde::float")]
    pub cumulative_loss: Decimal,
    pub winners: usize,
    pub losers: usize,
    /// Trends left out of the totals
    pub unhedgeable: usize,
}

impl BucketReport {
    fn build(range: OddsRange, trends: &[Trend], config: &AnalysisConfig) -> Self {
        let mut bucket = Self {
            range,
            lines: Vec::new(),
            cumulative_profit: Decimal::ZERO,
            cumulative_loss: Decimal::ZERO,
            winners: 0,
            losers: 0,
            unhedgeable: 0,
        };

        for trend in trends.iter().filter(|t| range.contains(t.start_price)) {
            let hedge = Hedge::calculate(trend.start_price, trend.current_price, config);

            match hedge {
                Some(hedge) if trend.delta > Decimal::ZERO => {
                    bucket.cumulative_profit += hedge.profit;
                    bucket.winners += 1;
                }
                Some(hedge) => {
                    bucket.cumulative_loss += hedge.profit;
                    bucket.losers += 1;
                }
                None => {
                    tracing::debug!(
                        fixture = %trend.fixture,
                        team = %trend.team,
                        exit = %trend.current_price,
                        "Exit price cannot be laid"
                    );
                    bucket.unhedgeable += 1;
                }
            }

            bucket.lines.push(PnlLine {
                trend: trend.clone(),
                percent_move: round_2dp(trend.delta * dec!(100) / trend.start_price),
                hedge,
            });
        }

        bucket
    }
}

/// Hedge results across all odds ranges
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PnlReport {
    #[serde(with = "rust_decimal::serde::float")]
    pub stake: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub commission: Decimal,
    pub buckets: Vec<BucketReport>,
}

impl PnlReport {
    /// Bucket `trends` by [`ODDS_RANGES`], preserving their order
    pub fn build(trends: &[Trend], config: &AnalysisConfig) -> Self {
        Self {
            stake: config.stake,
            commission: config.commission,
            buckets: ODDS_RANGES
                .iter()
                .map(|range| BucketReport::build(*range, trends, config))
                .collect(),
        }
    }

    /// Trends counted in any bucket
    pub fn line_count(&self) -> usize {
        self.buckets.iter().map(|b| b.lines.len()).sum()
    }

    /// Format as table for CLI output
    pub fn format_table(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "══════════════════════════════════════════════════════");
        let _ = writeln!(out, "               HEDGE ANALYSIS");
        let _ = writeln!(out, "══════════════════════════════════════════════════════");
        let _ = writeln!(
            out,
            "Stake: £{:.2}   Commission: {:.2}%",
            self.stake,
            self.commission * dec!(100)
        );

        for bucket in &self.buckets {
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "ODDS {:.2} TO {:.2}",
                bucket.range.low, bucket.range.high
            );
            let _ = writeln!(out, "───────────────────────────────────────────────────────");

            for line in &bucket.lines {
                let trend = &line.trend;
                let _ = write!(
                    out,
                    "{} ({}) ({}) {:.2} {:.2} {:.2} {:+.2} --- {:+.2}% --- ",
                    trend.fixture,
                    trend.team,
                    trend.sample_number,
                    trend.start_price,
                    trend.start_lay_price,
                    trend.current_price,
                    trend.delta,
                    line.percent_move,
                );
                let _ = match line.hedge {
                    Some(hedge) => writeln!(
                        out,
                        "£{:.2} £{:.2} £{:+.2}",
                        hedge.lay_stake, hedge.qualifying_loss, hedge.profit
                    ),
                    None => writeln!(out, "unhedgeable"),
                };
            }

            let _ = writeln!(out, "───────────────────────────────────────────────────────");
            let _ = writeln!(
                out,
                "Cumulative Profit: {:+.2} ({})",
                bucket.cumulative_profit, bucket.winners
            );
            let _ = writeln!(
                out,
                "Cumulative Loss:   {:+.2} ({})",
                bucket.cumulative_loss, bucket.losers
            );
            if bucket.unhedgeable > 0 {
                let _ = writeln!(out, "Unhedgeable:       {}", bucket.unhedgeable);
            }
        }

        let _ = writeln!(out, "══════════════════════════════════════════════════════");
        out
    }
}
