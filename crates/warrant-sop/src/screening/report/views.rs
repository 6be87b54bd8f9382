use crate::screening::evaluation::{ScoreTier, ScreenedRow, ScreeningMode, SopRule};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct RuleRejectionEntry {
    pub rule: SopRule,
    pub label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TierCountEntry {
    pub tier: ScoreTier,
    pub label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateView {
    pub warrant_code: String,
    pub warrant_name: String,
    pub spread_pct: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i32>,
}

impl CandidateView {
    pub(crate) fn from_row(row: &ScreenedRow) -> Self {
        Self {
            warrant_code: row.instrument.warrant_code.clone(),
            warrant_name: row.instrument.warrant_name.clone(),
            spread_pct: row.metrics.spread_pct,
            score: row.evaluation.score,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScreeningSummary {
    pub mode: ScreeningMode,
    pub total: usize,
    pub passed: usize,
    pub rejected: usize,
    pub rule_rejections: Vec<RuleRejectionEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tier_counts: Vec<TierCountEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_candidate: Option<CandidateView>,
}

/// Flat, export-ready view of a screened row in rank order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenedRowRecord {
    pub rank: usize,
    pub warrant_code: String,
    pub warrant_name: String,
    pub underlying_code: String,
    pub underlying_name: String,
    pub issuer: String,
    pub status: &'static str,
    pub score: Option<i32>,
    pub tier: Option<&'static str>,
    pub reasons: String,
    pub underlying_price: f64,
    pub strike: f64,
    pub bid_price: f64,
    pub ask_price: f64,
    pub bid_size: f64,
    pub ask_size: f64,
    pub days_to_expiry: f64,
    pub outstanding_units: f64,
    pub issued_units: f64,
    pub delta: f64,
    pub gamma: f64,
    pub theta: f64,
    pub effective_leverage: f64,
    pub volume: f64,
    pub spread_pct: f64,
    pub circulation_pct: f64,
    pub implied_vol: f64,
    pub historical_vol: f64,
    pub premium_pct: f64,
    pub moneyness: f64,
    pub sort_weight: f64,
}

impl ScreenedRowRecord {
    pub(crate) fn from_row(rank: usize, row: &ScreenedRow) -> Self {
        let instrument = &row.instrument;
        let metrics = &row.metrics;
        Self {
            rank,
            warrant_code: instrument.warrant_code.clone(),
            warrant_name: instrument.warrant_name.clone(),
            underlying_code: instrument.underlying_code.clone(),
            underlying_name: instrument.underlying_name.clone(),
            issuer: instrument.issuer.clone(),
            status: row.evaluation.status.label(),
            score: row.evaluation.score,
            tier: row.evaluation.tier.map(ScoreTier::label),
            reasons: row.reason_text(),
            underlying_price: instrument.underlying_price,
            strike: instrument.strike,
            bid_price: instrument.bid_price,
            ask_price: instrument.ask_price,
            bid_size: instrument.bid_size,
            ask_size: instrument.ask_size,
            days_to_expiry: instrument.days_to_expiry,
            outstanding_units: instrument.outstanding_units,
            issued_units: instrument.issued_units,
            delta: instrument.delta,
            gamma: instrument.gamma,
            theta: instrument.theta,
            effective_leverage: instrument.effective_leverage,
            volume: instrument.volume,
            spread_pct: metrics.spread_pct,
            circulation_pct: metrics.circulation_pct,
            implied_vol: metrics.implied_vol,
            historical_vol: metrics.historical_vol,
            premium_pct: metrics.premium_pct,
            moneyness: metrics.moneyness,
            sort_weight: row.sort_weight,
        }
    }
}

/// Suggested ceiling for capital committed to warrants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PositionBudget {
    pub total_capital: f64,
    pub allocation_pct: f64,
    pub max_warrant_allocation: f64,
}

impl PositionBudget {
    pub const DEFAULT_ALLOCATION_PCT: f64 = 15.0;

    pub fn from_capital(total_capital: f64, allocation_pct: f64) -> Self {
        let total_capital = total_capital.max(0.0);
        let allocation_pct = allocation_pct.clamp(0.0, 100.0);
        Self {
            total_capital,
            allocation_pct,
            max_warrant_allocation: total_capital * allocation_pct / 100.0,
        }
    }
}
