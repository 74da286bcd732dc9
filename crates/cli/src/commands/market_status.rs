//! `newsflow market-status`: report whether the regular session is open.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::US::Eastern;
use clap::Args;
use newsflow_core::market_clock;

#[derive(Args, Debug, Clone)]
pub struct MarketStatusArgs {
    /// Instant to evaluate (RFC 3339), defaults to now
    #[arg(long)]
    pub at: Option<String>,
}

/// # Errors
/// Returns an error if `--at` is not a valid RFC 3339 timestamp.
pub fn run_market_status(args: &MarketStatusArgs) -> Result<()> {
    let now = match &args.at {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .with_context(|| format!("invalid --at timestamp {raw:?}"))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };
    println!("{}", describe(now));
    Ok(())
}

fn describe(now: DateTime<Utc>) -> String {
    let state = if market_clock::is_open(now) {
        "OPEN"
    } else {
        "CLOSED"
    };
    format!(
        "Market {state} at {} ET (trading date {})",
        now.with_timezone(&Eastern).format("%Y-%m-%d %H:%M:%S"),
        market_clock::trading_date(now)
    )
}
