use crate::screening::{FieldMapping, ScreeningConfig, ScreeningSettings, SopProfile};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

/// On-disk overrides layered over a named profile.
///
/// ```toml
/// [sop]
/// min_days = 100
/// preferred_issuers = ["元大", "凱基"]
///
/// [[columns]]
/// field = "bid_price"
/// keywords = ["Bid", "買價"]
/// ```
#[derive(Debug, Default, Deserialize)]
struct ProfileFile {
    #[serde(default)]
    sop: Option<toml::Table>,
    #[serde(default)]
    columns: Vec<FieldMapping>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProfileFileError {
    #[error("unable to read profile file: {0}")]
    Io(#[from] std::io::Error),
    #[error("profile file is not valid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("profile [sop] section is invalid: {0}")]
    Invalid(#[from] serde_json::Error),
}

pub(crate) fn load_profile_file(
    profile: SopProfile,
    path: &Path,
) -> Result<ScreeningSettings, ProfileFileError> {
    let raw = std::fs::read_to_string(path)?;
    apply_profile_overrides(ScreeningSettings::for_profile(profile), &raw)
}

pub(crate) fn apply_profile_overrides(
    base: ScreeningSettings,
    raw: &str,
) -> Result<ScreeningSettings, ProfileFileError> {
    let file: ProfileFile = toml::from_str(raw)?;

    let sop = match file.sop {
        Some(table) => {
            let mut merged = serde_json::to_value(&base.sop)?;
            overlay(&mut merged, serde_json::to_value(table)?);
            serde_json::from_value::<ScreeningConfig>(merged)?
        }
        None => base.sop,
    };

    Ok(ScreeningSettings {
        sop,
        columns: base.columns.with_overrides(file.columns),
    })
}

/// Recursively replaces keys of `base` with those present in `patch`.
fn overlay(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                match base.get_mut(&key) {
                    Some(existing) => overlay(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screening::{CanonicalField, ScreeningMode};

    #[test]
    fn overrides_layer_over_named_profile() {
        let raw = r#"
            [sop]
            min_days = 45
            min_volume = 20

            [sop.scoring]
            selected_min = 90

            [[columns]]
            field = "bid_price"
            keywords = ["Bid"]
        "#;

        let settings =
            apply_profile_overrides(ScreeningSettings::for_profile(SopProfile::Scoring), raw)
                .expect("valid overrides");

        assert_eq!(settings.sop.mode, ScreeningMode::Score);
        assert_eq!(settings.sop.min_days, 45.0);
        assert_eq!(settings.sop.min_volume, Some(20.0));
        assert_eq!(settings.sop.scoring.selected_min, 90);
        assert_eq!(settings.sop.scoring.rejected_max, 40);
        assert_eq!(
            settings.columns.keywords(CanonicalField::BidPrice),
            ["Bid".to_string()]
        );
    }

    #[test]
    fn empty_file_keeps_profile() {
        let base = ScreeningSettings::for_profile(SopProfile::Extended);
        let settings = apply_profile_overrides(base.clone(), "").expect("empty is valid");
        assert_eq!(settings, base);
    }

    #[test]
    fn invalid_types_are_rejected() {
        let raw = "[sop]\nmax_spread = \"wide\"\n";
        let err = apply_profile_overrides(ScreeningSettings::default(), raw)
            .expect_err("string spread is invalid");
        assert!(matches!(err, ProfileFileError::Invalid(_)));
    }
}
