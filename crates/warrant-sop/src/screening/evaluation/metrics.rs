use super::config::ScreeningConfig;
use crate::screening::schema::InstrumentRow;
use serde::{Deserialize, Serialize};

/// Spread reported when there is no bid; always fails any spread threshold.
pub const SPREAD_SENTINEL: f64 = 999.0;
/// Moneyness reported when the strike is missing; reads as deep out-of-the-money.
pub const MONEYNESS_SENTINEL: f64 = -999.0;

/// Quantities derived once per row from canonical fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub spread_pct: f64,
    pub circulation_pct: f64,
    /// Implied volatility on the percent scale.
    pub implied_vol: f64,
    /// Historical volatility on the percent scale.
    pub historical_vol: f64,
    pub premium_pct: f64,
    pub moneyness: f64,
}

impl DerivedMetrics {
    pub fn compute(row: &InstrumentRow, config: &ScreeningConfig) -> Self {
        let spread_pct = if row.bid_price > 0.0 {
            (row.ask_price - row.bid_price) / row.bid_price * 100.0
        } else {
            SPREAD_SENTINEL
        };

        let circulation_pct = if row.issued_units > 0.0 {
            row.outstanding_units / row.issued_units * 100.0
        } else {
            0.0
        };

        let threshold = config.vol_unit_threshold;
        let implied_vol = to_percent_scale(row.implied_vol, threshold);
        let historical_vol = to_percent_scale(row.historical_vol, threshold);
        let premium_pct = if config.normalize_premium_units {
            to_percent_scale(row.premium_pct, threshold)
        } else {
            row.premium_pct
        };

        let moneyness = if row.strike != 0.0 {
            (row.underlying_price - row.strike) / row.strike
        } else {
            MONEYNESS_SENTINEL
        };

        Self {
            spread_pct,
            circulation_pct,
            implied_vol,
            historical_vol,
            premium_pct,
            moneyness,
        }
    }
}

/// Rescales fraction-style values (`0.45`) onto the percent scale (`45`).
///
/// Heuristic: any non-zero magnitude below `threshold` is taken to be a fraction, so a
/// genuine 1.5% reading is indistinguishable from a 150% one.
pub(crate) fn to_percent_scale(value: f64, threshold: f64) -> f64 {
    if value != 0.0 && value.abs() < threshold {
        value * 100.0
    } else {
        value
    }
}
