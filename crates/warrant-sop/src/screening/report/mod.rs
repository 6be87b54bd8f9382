pub mod views;

pub use views::{
    CandidateView, PositionBudget, RuleRejectionEntry, ScreenedRowRecord, ScreeningSummary,
    TierCountEntry,
};

use super::evaluation::{ScoreTier, ScreenedRow, ScreeningMode, SopRule};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Annotated, ranked output of one screening run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningReport {
    pub mode: ScreeningMode,
    /// Whether sensitivity was judged on delta or on moneyness for this chain.
    pub sensitivity_rule: SopRule,
    pub rows: Vec<ScreenedRow>,
}

impl ScreeningReport {
    pub fn passed(&self) -> impl Iterator<Item = &ScreenedRow> {
        self.rows.iter().filter(|row| row.is_pass())
    }

    pub fn rejected(&self) -> impl Iterator<Item = &ScreenedRow> {
        self.rows.iter().filter(|row| !row.is_pass())
    }

    pub fn summary(&self) -> ScreeningSummary {
        let rule_rejections = SopRule::ordered()
            .into_iter()
            .filter_map(|rule| {
                let count = self
                    .rows
                    .iter()
                    .filter(|row| row.evaluation.reasons.contains(&rule))
                    .count();
                (count > 0).then_some(RuleRejectionEntry {
                    rule,
                    label: rule.label(),
                    count,
                })
            })
            .collect();

        let tier_counts = match self.mode {
            ScreeningMode::Rules => Vec::new(),
            ScreeningMode::Score => ScoreTier::ordered()
                .into_iter()
                .map(|tier| TierCountEntry {
                    tier,
                    label: tier.label(),
                    count: self
                        .rows
                        .iter()
                        .filter(|row| row.evaluation.tier == Some(tier))
                        .count(),
                })
                .collect(),
        };

        let passed = self.passed().count();
        ScreeningSummary {
            mode: self.mode,
            total: self.rows.len(),
            passed,
            rejected: self.rows.len() - passed,
            rule_rejections,
            tier_counts,
            best_candidate: self.passed().next().map(CandidateView::from_row),
        }
    }

    /// Flat records in rank order, numbered from 1.
    pub fn records(&self) -> Vec<ScreenedRowRecord> {
        self.rows
            .iter()
            .enumerate()
            .map(|(index, row)| ScreenedRowRecord::from_row(index + 1, row))
            .collect()
    }

    /// Writes the ranked rows as CSV with a header line.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv_writer = csv::WriterBuilder::new()
            .has_headers(true)
            .from_writer(writer);
        for record in self.records() {
            csv_writer.serialize(record)?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}
