//! Warrant report screening: header resolution, derived metrics and the SOP rule battery.
//!
//! Data flows one way: a [`RawFrame`] from the importer is narrowed to one underlying's
//! chain, resolved into a [`CanonicalTable`], and judged by the [`ScreeningEngine`] into a
//! ranked [`ScreeningReport`]. Every step is a pure function of its inputs.

pub mod chain;
pub mod evaluation;
pub mod import;
pub mod report;
pub mod schema;

#[cfg(test)]
mod tests;

pub use chain::ChainSnapshot;
pub use evaluation::{
    DerivedMetrics, ScoreComponent, ScoreFactor, ScoreTier, ScreenedRow, ScreeningConfig,
    ScreeningEngine, ScreeningMode, ScoringConfig, SopEvaluation, SopProfile, SopRule, SopStatus,
    UnknownProfile, MONEYNESS_SENTINEL, REJECTED_SORT_PENALTY, SPREAD_SENTINEL,
};
pub use import::{ReportImportError, ReportImporter};
pub use report::{PositionBudget, ScreenedRowRecord, ScreeningReport, ScreeningSummary};
pub use schema::{
    CanonicalField, CanonicalTable, ColumnBinding, ColumnMap, FieldMapping, InstrumentRow,
    RawFrame, ResolveOptions, SchemaError, SchemaResolver,
};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum ScreeningError {
    #[error(transparent)]
    Import(#[from] ReportImportError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("report has no underlying name or code column")]
    NoUnderlyingColumn,
    #[error("underlying '{0}' not found in report")]
    UnknownUnderlying(String),
}

/// Engine settings: rule thresholds plus the header keyword table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreeningSettings {
    pub sop: ScreeningConfig,
    pub columns: ColumnMap,
}

impl ScreeningSettings {
    pub fn for_profile(profile: SopProfile) -> Self {
        Self {
            sop: ScreeningConfig::for_profile(profile),
            columns: ColumnMap::standard(),
        }
    }
}

/// Composes chain selection, schema resolution and evaluation.
#[derive(Debug, Clone, Default)]
pub struct WarrantScreener {
    resolver: SchemaResolver,
    engine: ScreeningEngine,
}

impl WarrantScreener {
    pub fn new(settings: ScreeningSettings) -> Self {
        Self {
            resolver: SchemaResolver::new(settings.columns),
            engine: ScreeningEngine::new(settings.sop),
        }
    }

    /// Screens the chain of `underlying` within a full-market frame.
    pub fn screen(
        &self,
        frame: &RawFrame,
        underlying: &str,
        as_of: Option<NaiveDate>,
    ) -> Result<(ChainSnapshot, ScreeningReport), ScreeningError> {
        let chain =
            chain::select_chain(frame, underlying).ok_or(ScreeningError::NoUnderlyingColumn)?;
        if chain.is_empty() {
            return Err(ScreeningError::UnknownUnderlying(underlying.trim().to_string()));
        }

        let snapshot = ChainSnapshot::from_chain(underlying, &chain);
        info!(underlying = %snapshot.underlying, warrants = snapshot.warrants, "chain selected");

        let report = self.screen_all(&chain, as_of)?;
        Ok((snapshot, report))
    }

    /// Screens every row of a frame that already holds a single chain.
    pub fn screen_all(
        &self,
        frame: &RawFrame,
        as_of: Option<NaiveDate>,
    ) -> Result<ScreeningReport, ScreeningError> {
        let table = self.resolver.resolve_with(frame, ResolveOptions { as_of })?;
        Ok(self.engine.evaluate(&table))
    }
}
