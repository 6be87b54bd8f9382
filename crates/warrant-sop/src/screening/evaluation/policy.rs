use super::config::{ScoringConfig, ScreeningConfig, ScreeningMode};
use super::rules::SopRule;
use super::scoring::ScoreComponent;
use super::ScreenedRow;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Added to the spread of rejected rows in the single-key sort weight.
pub const REJECTED_SORT_PENALTY: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SopStatus {
    Pass,
    Rejected,
}

impl SopStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pass => "Pass",
            Self::Rejected => "Rejected",
        }
    }
}

/// Status band of an additive score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreTier {
    Selected,
    Watch,
    Rejected,
    Danger,
}

impl ScoreTier {
    pub const fn ordered() -> [Self; 4] {
        [Self::Selected, Self::Watch, Self::Rejected, Self::Danger]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Selected => "Selected",
            Self::Watch => "Watch",
            Self::Rejected => "Rejected",
            Self::Danger => "Danger",
        }
    }

    pub fn from_score(score: i32, config: &ScoringConfig) -> Self {
        if score < config.danger_below {
            Self::Danger
        } else if score <= config.rejected_max {
            Self::Rejected
        } else if score >= config.selected_min {
            Self::Selected
        } else {
            Self::Watch
        }
    }

    pub const fn status(self) -> SopStatus {
        match self {
            Self::Selected | Self::Watch => SopStatus::Pass,
            Self::Rejected | Self::Danger => SopStatus::Rejected,
        }
    }
}

/// Immutable verdict for one row, built by folding rules over [`SopEvaluation::pass`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SopEvaluation {
    pub status: SopStatus,
    pub reasons: Vec<SopRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<ScoreTier>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<ScoreComponent>,
}

impl SopEvaluation {
    pub fn pass() -> Self {
        Self {
            status: SopStatus::Pass,
            reasons: Vec::new(),
            score: None,
            tier: None,
            components: Vec::new(),
        }
    }

    /// Records `rule` as a failure when `violated`; a rejected row never passes again.
    pub fn apply_rule(mut self, violated: bool, rule: SopRule) -> Self {
        if violated {
            if !self.reasons.contains(&rule) {
                self.reasons.push(rule);
            }
            self.status = SopStatus::Rejected;
        }
        self
    }

    pub fn is_pass(&self) -> bool {
        self.status == SopStatus::Pass
    }

    /// Comma-joined reason labels in evaluation order.
    pub fn reason_text(&self) -> String {
        self.reasons
            .iter()
            .map(|rule| rule.label())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Sorts rows into their final display order.
///
/// Keys: status (passing first), score descending in score mode, preferred-issuer tier when
/// enabled, spread ascending, then source order.
pub(crate) fn rank(rows: &mut [ScreenedRow], config: &ScreeningConfig) {
    rows.sort_by(|a, b| compare(a, b, config));
}

fn compare(a: &ScreenedRow, b: &ScreenedRow, config: &ScreeningConfig) -> Ordering {
    let status = status_rank(a.evaluation.status).cmp(&status_rank(b.evaluation.status));

    let score = if config.mode == ScreeningMode::Score {
        b.evaluation
            .score
            .unwrap_or(i32::MIN)
            .cmp(&a.evaluation.score.unwrap_or(i32::MIN))
    } else {
        Ordering::Equal
    };

    let issuer = if config.rank_by_issuer {
        let unmatched = config.preferred_issuers.len();
        let tier = |row: &ScreenedRow| {
            config
                .issuer_tier(&row.instrument.issuer)
                .unwrap_or(unmatched)
        };
        tier(a).cmp(&tier(b))
    } else {
        Ordering::Equal
    };

    status
        .then(score)
        .then(issuer)
        .then_with(|| a.metrics.spread_pct.total_cmp(&b.metrics.spread_pct))
        .then_with(|| a.row_index.cmp(&b.row_index))
}

const fn status_rank(status: SopStatus) -> u8 {
    match status {
        SopStatus::Pass => 0,
        SopStatus::Rejected => 1,
    }
}

/// Single-key weight: spread, pushed past every passing row when rejected.
pub(crate) fn sort_weight(spread_pct: f64, status: SopStatus) -> f64 {
    match status {
        SopStatus::Pass => spread_pct,
        SopStatus::Rejected => spread_pct + REJECTED_SORT_PENALTY,
    }
}
