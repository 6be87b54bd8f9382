use super::config::ScreeningConfig;
use super::metrics::DerivedMetrics;
use super::policy::{ScoreTier, SopEvaluation, SopStatus};
use super::rules::{ChainContext, SopRule};
use crate::screening::schema::InstrumentRow;
use serde::{Deserialize, Serialize};

/// Metric band that contributed points to a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreFactor {
    DaysToExpiry,
    SweetSpot,
    Spread,
    Volatility,
    Issuer,
    MissingOffer,
    FloatSaturation,
}

/// Discrete contribution to a score, kept for audit output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub factor: ScoreFactor,
    pub points: i32,
    pub notes: String,
    /// Vetoes force the worst rank regardless of other points.
    #[serde(default)]
    pub veto: bool,
}

/// Additive scoring over the same metrics the rule battery uses.
pub(crate) fn score_row(
    row: &InstrumentRow,
    metrics: &DerivedMetrics,
    config: &ScreeningConfig,
    context: ChainContext,
) -> SopEvaluation {
    let weights = &config.scoring;
    let mut components = Vec::new();
    let mut flags = Vec::new();
    let mut total: i32 = 0;

    if row.days_to_expiry >= weights.long_dated_days {
        components.push(ScoreComponent {
            factor: ScoreFactor::DaysToExpiry,
            points: weights.long_dated_points,
            notes: format!(
                "{:.0} days to expiry, at least {:.0}",
                row.days_to_expiry, weights.long_dated_days
            ),
            veto: false,
        });
        total += weights.long_dated_points;
    } else if row.days_to_expiry < weights.short_dated_days {
        components.push(ScoreComponent {
            factor: ScoreFactor::DaysToExpiry,
            points: weights.short_dated_penalty,
            notes: format!(
                "{:.0} days to expiry, under {:.0}",
                row.days_to_expiry, weights.short_dated_days
            ),
            veto: false,
        });
        total += weights.short_dated_penalty;
        flags.push(SopRule::TimeDecay);
    }

    let sensitivity = SopRule::sensitivity(context);
    if !sensitivity.violated(row, metrics, config) {
        let notes = match sensitivity {
            SopRule::DeltaSweetSpot => {
                format!("|delta| {:.2} inside sweet spot", row.delta.abs())
            }
            _ => format!("moneyness {:.3} inside sweet spot", metrics.moneyness),
        };
        components.push(ScoreComponent {
            factor: ScoreFactor::SweetSpot,
            points: weights.sweet_spot_points,
            notes,
            veto: false,
        });
        total += weights.sweet_spot_points;
    } else {
        flags.push(sensitivity);
    }

    if metrics.spread_pct <= config.max_spread {
        components.push(ScoreComponent {
            factor: ScoreFactor::Spread,
            points: weights.tight_spread_points,
            notes: format!(
                "spread {:.2}% within {:.2}%",
                metrics.spread_pct, config.max_spread
            ),
            veto: false,
        });
        total += weights.tight_spread_points;
    } else {
        components.push(ScoreComponent {
            factor: ScoreFactor::Spread,
            points: weights.wide_spread_penalty,
            notes: format!(
                "spread {:.2}% exceeds {:.2}%",
                metrics.spread_pct, config.max_spread
            ),
            veto: false,
        });
        total += weights.wide_spread_penalty;
        flags.push(SopRule::SpreadTooWide);
    }

    if SopRule::VolatilityRichness.violated(row, metrics, config) {
        components.push(ScoreComponent {
            factor: ScoreFactor::Volatility,
            points: weights.rich_vol_penalty,
            notes: format!(
                "implied vol {:.1} above historical {:.1} + {:.1}",
                metrics.implied_vol, metrics.historical_vol, config.vol_premium_cap
            ),
            veto: false,
        });
        total += weights.rich_vol_penalty;
        flags.push(SopRule::VolatilityRichness);
    }

    if let Some(tier) = config.issuer_tier(&row.issuer) {
        components.push(ScoreComponent {
            factor: ScoreFactor::Issuer,
            points: weights.preferred_issuer_points,
            notes: format!("preferred issuer #{}", tier + 1),
            veto: false,
        });
        total += weights.preferred_issuer_points;
    }

    let mut vetoed = false;
    if row.ask_price == 0.0 {
        components.push(ScoreComponent {
            factor: ScoreFactor::MissingOffer,
            points: weights.veto_score,
            notes: "no offer quoted".to_string(),
            veto: true,
        });
        flags.push(SopRule::NoOffer);
        vetoed = true;
    }

    if SopRule::FloatSaturation.violated(row, metrics, config) {
        components.push(ScoreComponent {
            factor: ScoreFactor::FloatSaturation,
            points: weights.veto_score,
            notes: format!(
                "circulation {:.1}% exceeds {:.1}%",
                metrics.circulation_pct, config.max_circulation
            ),
            veto: true,
        });
        flags.push(SopRule::FloatSaturation);
        vetoed = true;
    }

    if vetoed {
        total = total.min(weights.veto_score);
    }

    // Flags become reasons only when the tier rejects; passing rows keep them in components.
    let tier = ScoreTier::from_score(total, weights);
    let mut evaluation = match tier.status() {
        SopStatus::Pass => SopEvaluation::pass(),
        SopStatus::Rejected => {
            let mut rejected = flags
                .into_iter()
                .fold(SopEvaluation::pass(), |evaluation, rule| {
                    evaluation.apply_rule(true, rule)
                });
            rejected.status = SopStatus::Rejected;
            rejected
        }
    };
    evaluation.score = Some(total);
    evaluation.tier = Some(tier);
    evaluation.components = components;
    evaluation
}
