mod config;
mod metrics;
mod policy;
mod rules;
mod scoring;

pub use config::{ScoringConfig, ScreeningConfig, ScreeningMode, SopProfile, UnknownProfile};
pub use metrics::{DerivedMetrics, MONEYNESS_SENTINEL, SPREAD_SENTINEL};
pub use policy::{ScoreTier, SopEvaluation, SopStatus, REJECTED_SORT_PENALTY};
pub use rules::SopRule;
pub use scoring::{ScoreComponent, ScoreFactor};

use super::report::ScreeningReport;
use super::schema::{CanonicalTable, InstrumentRow};
pub(crate) use rules::ChainContext;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Stateless evaluator that applies the SOP configuration to one warrant chain.
#[derive(Debug, Clone, Default)]
pub struct ScreeningEngine {
    config: ScreeningConfig,
}

impl ScreeningEngine {
    pub fn new(config: ScreeningConfig) -> Self {
        Self { config }
    }

    /// Derives metrics, judges every row and returns them in rank order.
    pub fn evaluate(&self, table: &CanonicalTable) -> ScreeningReport {
        let context = ChainContext::from_table(table);
        debug!(
            rows = table.len(),
            has_delta = context.has_delta,
            mode = ?self.config.mode,
            "evaluating warrant chain"
        );

        let mut rows: Vec<ScreenedRow> = table
            .rows
            .iter()
            .enumerate()
            .map(|(row_index, instrument)| self.screen_row(row_index, instrument, context))
            .collect();

        policy::rank(&mut rows, &self.config);

        let report = ScreeningReport {
            mode: self.config.mode,
            sensitivity_rule: SopRule::sensitivity(context),
            rows,
        };

        info!(
            total = report.rows.len(),
            passed = report.passed().count(),
            rejected = report.rejected().count(),
            "warrant chain screened"
        );

        report
    }

    fn screen_row(
        &self,
        row_index: usize,
        instrument: &InstrumentRow,
        context: ChainContext,
    ) -> ScreenedRow {
        let metrics = DerivedMetrics::compute(instrument, &self.config);
        let evaluation = match self.config.mode {
            ScreeningMode::Rules => {
                rules::evaluate_rules(instrument, &metrics, &self.config, context)
            }
            ScreeningMode::Score => scoring::score_row(instrument, &metrics, &self.config, context),
        };
        let sort_weight = policy::sort_weight(metrics.spread_pct, evaluation.status);

        ScreenedRow {
            row_index,
            instrument: instrument.clone(),
            metrics,
            evaluation,
            sort_weight,
        }
    }
}

/// One instrument with its metrics and verdict, as handed to display and export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenedRow {
    /// Position of the row in the canonical table before ranking.
    pub row_index: usize,
    pub instrument: InstrumentRow,
    pub metrics: DerivedMetrics,
    pub evaluation: SopEvaluation,
    pub sort_weight: f64,
}

impl ScreenedRow {
    pub fn is_pass(&self) -> bool {
        self.evaluation.is_pass()
    }

    pub fn reason_text(&self) -> String {
        self.evaluation.reason_text()
    }
}
