use super::config::ScreeningConfig;
use super::metrics::DerivedMetrics;
use super::policy::SopEvaluation;
use crate::screening::schema::{CanonicalField, CanonicalTable, InstrumentRow};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One screening rule of the SOP battery; also names the rejection reason it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SopRule {
    TimeDecay,
    DeltaSweetSpot,
    MoneynessSweetSpot,
    FloatSaturation,
    SpreadTooWide,
    NoOffer,
    ThinQuotes,
    VolatilityRichness,
    LiquidityFloor,
    PremiumBand,
    LeverageFloor,
    IssuerAllowList,
}

impl SopRule {
    /// Every rule in battery order, which is also the reason display order.
    pub const fn ordered() -> [Self; 12] {
        [
            Self::TimeDecay,
            Self::DeltaSweetSpot,
            Self::MoneynessSweetSpot,
            Self::FloatSaturation,
            Self::SpreadTooWide,
            Self::NoOffer,
            Self::ThinQuotes,
            Self::VolatilityRichness,
            Self::LiquidityFloor,
            Self::PremiumBand,
            Self::LeverageFloor,
            Self::IssuerAllowList,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::TimeDecay => "too few days to expiry",
            Self::DeltaSweetSpot => "delta outside sweet spot",
            Self::MoneynessSweetSpot => "moneyness outside sweet spot",
            Self::FloatSaturation => "float saturated",
            Self::SpreadTooWide => "spread too wide",
            Self::NoOffer => "no offer",
            Self::ThinQuotes => "thin quotes",
            Self::VolatilityRichness => "implied vol too rich",
            Self::LiquidityFloor => "volume too low",
            Self::PremiumBand => "premium outside band",
            Self::LeverageFloor => "leverage too low",
            Self::IssuerAllowList => "issuer not preferred",
        }
    }

    /// Sensitivity rule for the chain: delta when the source carries it, moneyness otherwise.
    pub(crate) const fn sensitivity(context: ChainContext) -> Self {
        if context.has_delta {
            Self::DeltaSweetSpot
        } else {
            Self::MoneynessSweetSpot
        }
    }

    /// Rules active under `config`, in evaluation order.
    pub(crate) fn battery(config: &ScreeningConfig, context: ChainContext) -> Vec<Self> {
        let mut rules = vec![
            Self::TimeDecay,
            Self::sensitivity(context),
            Self::FloatSaturation,
            Self::SpreadTooWide,
        ];

        if config.reject_missing_offer {
            rules.push(Self::NoOffer);
        }
        if config.min_quote_size.is_some() {
            rules.push(Self::ThinQuotes);
        }
        rules.push(Self::VolatilityRichness);
        if config.min_volume.is_some() {
            rules.push(Self::LiquidityFloor);
        }
        if config.premium_lo.is_some() || config.premium_hi.is_some() {
            rules.push(Self::PremiumBand);
        }
        if config.min_leverage.is_some() {
            rules.push(Self::LeverageFloor);
        }
        if config.enforce_preferred_issuers && !config.preferred_issuers.is_empty() {
            rules.push(Self::IssuerAllowList);
        }

        rules
    }

    /// True when the row fails this rule.
    pub fn violated(
        self,
        row: &InstrumentRow,
        metrics: &DerivedMetrics,
        config: &ScreeningConfig,
    ) -> bool {
        match self {
            Self::TimeDecay => row.days_to_expiry < config.min_days,
            Self::DeltaSweetSpot => {
                let delta = row.delta.abs();
                delta < config.delta_lo || delta > config.delta_hi
            }
            Self::MoneynessSweetSpot => {
                metrics.moneyness < config.money_lo || metrics.moneyness > config.money_hi
            }
            Self::FloatSaturation => metrics.circulation_pct > config.max_circulation,
            Self::SpreadTooWide => metrics.spread_pct > config.max_spread,
            Self::NoOffer => row.ask_price == 0.0,
            Self::ThinQuotes => config
                .min_quote_size
                .is_some_and(|min| row.bid_size < min || row.ask_size < min),
            Self::VolatilityRichness => {
                metrics.implied_vol > 0.0
                    && metrics.historical_vol > 0.0
                    && metrics.implied_vol > metrics.historical_vol + config.vol_premium_cap
            }
            Self::LiquidityFloor => config.min_volume.is_some_and(|min| row.volume < min),
            Self::PremiumBand => {
                config.premium_lo.is_some_and(|lo| metrics.premium_pct < lo)
                    || config.premium_hi.is_some_and(|hi| metrics.premium_pct > hi)
            }
            Self::LeverageFloor => config
                .min_leverage
                .is_some_and(|min| row.effective_leverage < min),
            Self::IssuerAllowList => config.issuer_tier(&row.issuer).is_none(),
        }
    }
}

impl fmt::Display for SopRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Facts about the whole chain that individual rules depend on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ChainContext {
    pub has_delta: bool,
}

impl ChainContext {
    pub(crate) fn from_table(table: &CanonicalTable) -> Self {
        let has_delta = table.is_resolved(CanonicalField::Delta)
            && table.rows.iter().any(|row| row.delta != 0.0);
        Self { has_delta }
    }
}

/// Folds the active battery over a passing evaluation.
pub(crate) fn evaluate_rules(
    row: &InstrumentRow,
    metrics: &DerivedMetrics,
    config: &ScreeningConfig,
    context: ChainContext,
) -> SopEvaluation {
    SopRule::battery(config, context)
        .into_iter()
        .fold(SopEvaluation::pass(), |evaluation, rule| {
            evaluation.apply_rule(rule.violated(row, metrics, config), rule)
        })
}
