use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage kind of a canonical field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Numeric,
}

/// Fixed set of attributes an instrument row may carry after resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    WarrantName,
    WarrantCode,
    UnderlyingName,
    UnderlyingCode,
    Issuer,
    ExpiryDate,
    UnderlyingPrice,
    BidPrice,
    AskPrice,
    BidSize,
    AskSize,
    Strike,
    DaysToExpiry,
    OutstandingUnits,
    IssuedUnits,
    ImpliedVol,
    HistoricalVol,
    Delta,
    Gamma,
    Theta,
    PremiumPct,
    EffectiveLeverage,
    Volume,
}

impl CanonicalField {
    pub const fn ordered() -> [Self; 23] {
        [
            Self::WarrantName,
            Self::WarrantCode,
            Self::UnderlyingName,
            Self::UnderlyingCode,
            Self::Issuer,
            Self::ExpiryDate,
            Self::UnderlyingPrice,
            Self::BidPrice,
            Self::AskPrice,
            Self::BidSize,
            Self::AskSize,
            Self::Strike,
            Self::DaysToExpiry,
            Self::OutstandingUnits,
            Self::IssuedUnits,
            Self::ImpliedVol,
            Self::HistoricalVol,
            Self::Delta,
            Self::Gamma,
            Self::Theta,
            Self::PremiumPct,
            Self::EffectiveLeverage,
            Self::Volume,
        ]
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::WarrantName => "warrant_name",
            Self::WarrantCode => "warrant_code",
            Self::UnderlyingName => "underlying_name",
            Self::UnderlyingCode => "underlying_code",
            Self::Issuer => "issuer",
            Self::ExpiryDate => "expiry_date",
            Self::UnderlyingPrice => "underlying_price",
            Self::BidPrice => "bid_price",
            Self::AskPrice => "ask_price",
            Self::BidSize => "bid_size",
            Self::AskSize => "ask_size",
            Self::Strike => "strike",
            Self::DaysToExpiry => "days_to_expiry",
            Self::OutstandingUnits => "outstanding_units",
            Self::IssuedUnits => "issued_units",
            Self::ImpliedVol => "implied_vol",
            Self::HistoricalVol => "historical_vol",
            Self::Delta => "delta",
            Self::Gamma => "gamma",
            Self::Theta => "theta",
            Self::PremiumPct => "premium_pct",
            Self::EffectiveLeverage => "effective_leverage",
            Self::Volume => "volume",
        }
    }

    pub const fn kind(self) -> FieldKind {
        match self {
            Self::WarrantName
            | Self::WarrantCode
            | Self::UnderlyingName
            | Self::UnderlyingCode
            | Self::Issuer
            | Self::ExpiryDate => FieldKind::Text,
            _ => FieldKind::Numeric,
        }
    }

    pub const fn is_identity(self) -> bool {
        matches!(
            self,
            Self::WarrantName | Self::WarrantCode | Self::UnderlyingName | Self::UnderlyingCode
        )
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One instrument's canonical values. Numeric fields are always finite.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstrumentRow {
    pub warrant_name: String,
    pub warrant_code: String,
    pub underlying_name: String,
    pub underlying_code: String,
    pub issuer: String,
    pub expiry_date: String,
    pub underlying_price: f64,
    pub bid_price: f64,
    pub ask_price: f64,
    pub bid_size: f64,
    pub ask_size: f64,
    pub strike: f64,
    pub days_to_expiry: f64,
    pub outstanding_units: f64,
    pub issued_units: f64,
    pub implied_vol: f64,
    pub historical_vol: f64,
    pub delta: f64,
    pub gamma: f64,
    pub theta: f64,
    pub premium_pct: f64,
    pub effective_leverage: f64,
    pub volume: f64,
}

impl InstrumentRow {
    /// Returns the numeric slot for `field`, or `None` for text fields.
    pub fn numeric_mut(&mut self, field: CanonicalField) -> Option<&mut f64> {
        let slot = match field {
            CanonicalField::UnderlyingPrice => &mut self.underlying_price,
            CanonicalField::BidPrice => &mut self.bid_price,
            CanonicalField::AskPrice => &mut self.ask_price,
            CanonicalField::BidSize => &mut self.bid_size,
            CanonicalField::AskSize => &mut self.ask_size,
            CanonicalField::Strike => &mut self.strike,
            CanonicalField::DaysToExpiry => &mut self.days_to_expiry,
            CanonicalField::OutstandingUnits => &mut self.outstanding_units,
            CanonicalField::IssuedUnits => &mut self.issued_units,
            CanonicalField::ImpliedVol => &mut self.implied_vol,
            CanonicalField::HistoricalVol => &mut self.historical_vol,
            CanonicalField::Delta => &mut self.delta,
            CanonicalField::Gamma => &mut self.gamma,
            CanonicalField::Theta => &mut self.theta,
            CanonicalField::PremiumPct => &mut self.premium_pct,
            CanonicalField::EffectiveLeverage => &mut self.effective_leverage,
            CanonicalField::Volume => &mut self.volume,
            _ => return None,
        };
        Some(slot)
    }

    pub fn text_mut(&mut self, field: CanonicalField) -> Option<&mut String> {
        let slot = match field {
            CanonicalField::WarrantName => &mut self.warrant_name,
            CanonicalField::WarrantCode => &mut self.warrant_code,
            CanonicalField::UnderlyingName => &mut self.underlying_name,
            CanonicalField::UnderlyingCode => &mut self.underlying_code,
            CanonicalField::Issuer => &mut self.issuer,
            CanonicalField::ExpiryDate => &mut self.expiry_date,
            _ => return None,
        };
        Some(slot)
    }

    /// Best human-facing label for the row.
    pub fn display_name(&self) -> &str {
        if !self.warrant_name.is_empty() {
            &self.warrant_name
        } else {
            &self.warrant_code
        }
    }
}
