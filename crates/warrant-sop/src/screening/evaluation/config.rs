use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How rows are judged: binary rule battery or additive points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreeningMode {
    #[default]
    Rules,
    Score,
}

/// Thresholds for the SOP rule battery. Options left `None` disable their rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreeningConfig {
    pub mode: ScreeningMode,
    pub min_days: f64,
    pub delta_lo: f64,
    pub delta_hi: f64,
    pub money_lo: f64,
    pub money_hi: f64,
    pub max_circulation: f64,
    pub max_spread: f64,
    pub reject_missing_offer: bool,
    pub min_quote_size: Option<f64>,
    pub vol_premium_cap: f64,
    pub vol_unit_threshold: f64,
    pub normalize_premium_units: bool,
    pub min_volume: Option<f64>,
    pub premium_lo: Option<f64>,
    pub premium_hi: Option<f64>,
    pub min_leverage: Option<f64>,
    pub preferred_issuers: Vec<String>,
    pub enforce_preferred_issuers: bool,
    pub rank_by_issuer: bool,
    pub scoring: ScoringConfig,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            mode: ScreeningMode::Rules,
            min_days: 60.0,
            delta_lo: 0.35,
            delta_hi: 0.65,
            money_lo: -0.15,
            money_hi: 0.05,
            max_circulation: 80.0,
            max_spread: 2.5,
            reject_missing_offer: false,
            min_quote_size: None,
            vol_premium_cap: 8.0,
            vol_unit_threshold: 2.0,
            normalize_premium_units: false,
            min_volume: None,
            premium_lo: None,
            premium_hi: None,
            min_leverage: None,
            preferred_issuers: Vec::new(),
            enforce_preferred_issuers: false,
            rank_by_issuer: false,
            scoring: ScoringConfig::default(),
        }
    }
}

impl ScreeningConfig {
    pub fn for_profile(profile: SopProfile) -> Self {
        match profile {
            SopProfile::Standard => Self::default(),
            SopProfile::Conservative => Self {
                min_days: 100.0,
                ..Self::default()
            },
            SopProfile::Aggressive => Self {
                min_days: 30.0,
                ..Self::default()
            },
            SopProfile::Extended => Self {
                reject_missing_offer: true,
                normalize_premium_units: true,
                min_volume: Some(10.0),
                premium_lo: Some(0.0),
                premium_hi: Some(20.0),
                min_leverage: Some(3.0),
                preferred_issuers: ["元大", "凱基", "統一", "群益"]
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
                enforce_preferred_issuers: true,
                rank_by_issuer: true,
                ..Self::default()
            },
            SopProfile::Scoring => Self {
                mode: ScreeningMode::Score,
                ..Self::default()
            },
        }
    }

    /// Position of the first preferred issuer contained in `issuer`.
    pub fn issuer_tier(&self, issuer: &str) -> Option<usize> {
        let issuer = issuer.trim();
        if issuer.is_empty() {
            return None;
        }

        self.preferred_issuers
            .iter()
            .position(|name| !name.trim().is_empty() && issuer.contains(name.trim()))
    }
}

/// Point weights and tier boundaries for [`ScreeningMode::Score`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub long_dated_days: f64,
    pub short_dated_days: f64,
    pub long_dated_points: i32,
    pub short_dated_penalty: i32,
    pub sweet_spot_points: i32,
    pub tight_spread_points: i32,
    pub wide_spread_penalty: i32,
    pub rich_vol_penalty: i32,
    pub preferred_issuer_points: i32,
    pub veto_score: i32,
    pub selected_min: i32,
    pub rejected_max: i32,
    pub danger_below: i32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            long_dated_days: 90.0,
            short_dated_days: 30.0,
            long_dated_points: 25,
            short_dated_penalty: -50,
            sweet_spot_points: 35,
            tight_spread_points: 40,
            wide_spread_penalty: -40,
            rich_vol_penalty: -20,
            preferred_issuer_points: 10,
            veto_score: -999,
            selected_min: 85,
            rejected_max: 40,
            danger_below: 0,
        }
    }
}

/// Named threshold presets for the historical rule-set variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SopProfile {
    #[default]
    Standard,
    Conservative,
    Aggressive,
    Extended,
    Scoring,
}

impl SopProfile {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Standard,
            Self::Conservative,
            Self::Aggressive,
            Self::Extended,
            Self::Scoring,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Conservative => "conservative",
            Self::Aggressive => "aggressive",
            Self::Extended => "extended",
            Self::Scoring => "scoring",
        }
    }
}

impl fmt::Display for SopProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown SOP profile '{0}' (expected one of standard, conservative, aggressive, extended, scoring)")]
pub struct UnknownProfile(pub String);

impl FromStr for SopProfile {
    type Err = UnknownProfile;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_ascii_lowercase();
        Self::ordered()
            .into_iter()
            .find(|profile| profile.label() == wanted)
            .ok_or_else(|| UnknownProfile(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_standard_sop() {
        let config = ScreeningConfig::default();
        assert_eq!(config.min_days, 60.0);
        assert_eq!((config.delta_lo, config.delta_hi), (0.35, 0.65));
        assert_eq!((config.money_lo, config.money_hi), (-0.15, 0.05));
        assert_eq!(config.max_circulation, 80.0);
        assert_eq!(config.max_spread, 2.5);
        assert_eq!(config.vol_premium_cap, 8.0);
        assert!(config.min_volume.is_none());
        assert_eq!(config.mode, ScreeningMode::Rules);
    }

    #[test]
    fn profiles_parse_case_insensitively() {
        assert_eq!("Extended".parse::<SopProfile>(), Ok(SopProfile::Extended));
        assert_eq!(" scoring ".parse::<SopProfile>(), Ok(SopProfile::Scoring));
        assert!("yolo".parse::<SopProfile>().is_err());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: ScreeningConfig =
            toml::from_str("min_days = 100\nmode = \"score\"\n").expect("valid toml");
        assert_eq!(config.min_days, 100.0);
        assert_eq!(config.mode, ScreeningMode::Score);
        assert_eq!(config.max_spread, 2.5);
        assert_eq!(config.scoring.selected_min, 85);
    }

    #[test]
    fn issuer_tier_uses_containment_and_order() {
        let config = ScreeningConfig::for_profile(SopProfile::Extended);
        assert_eq!(config.issuer_tier("元大證券"), Some(0));
        assert_eq!(config.issuer_tier("群益金鼎"), Some(3));
        assert_eq!(config.issuer_tier("富邦"), None);
        assert_eq!(config.issuer_tier("  "), None);
    }
}
