use chrono::NaiveDate;

/// Offset between the Minguo (ROC) calendar used by Taiwanese brokers and the Gregorian year.
const ROC_YEAR_OFFSET: i32 = 1911;

/// Parses a spreadsheet cell as a finite number, falling back to `0`.
///
/// Percent signs and thousands separators (ASCII and full-width) are stripped first.
/// Anything still unparseable, including `NaN` and infinities, becomes `0`.
pub(crate) fn coerce_numeric(raw: &str) -> f64 {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|ch| !matches!(ch, '%' | ',' | '％' | '，'))
        .collect();

    match cleaned.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        Ok(_) | Err(_) => {
            if !cleaned.trim().is_empty() {
                tracing::trace!(raw, "non-numeric cell coerced to zero");
            }
            0.0
        }
    }
}

/// Parses an expiry date in the layouts vendor exports use.
///
/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD`, `YYYYMMDD` and ROC dates such as `114/03/18`.
pub(crate) fn parse_expiry_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.len() == 8 && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        let (year, rest) = trimmed.split_at(4);
        let (month, day) = rest.split_at(2);
        return NaiveDate::from_ymd_opt(
            year.parse().ok()?,
            month.parse().ok()?,
            day.parse().ok()?,
        );
    }

    let mut parts = trimmed.split(['/', '-', '.']);
    let year_part = parts.next()?.trim();
    let month: u32 = parts.next()?.trim().parse().ok()?;
    let day: u32 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }

    let year: i32 = year_part.parse().ok()?;
    let year = match year_part.len() {
        1..=3 => year + ROC_YEAR_OFFSET,
        4 => year,
        _ => return None,
    };

    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_percent_and_separators() {
        assert_eq!(coerce_numeric("12.5%"), 12.5);
        assert_eq!(coerce_numeric("1,234,567"), 1_234_567.0);
        assert_eq!(coerce_numeric(" 3，000 "), 3000.0);
        assert_eq!(coerce_numeric("-0.42"), -0.42);
    }

    #[test]
    fn malformed_values_become_zero() {
        assert_eq!(coerce_numeric(""), 0.0);
        assert_eq!(coerce_numeric("--"), 0.0);
        assert_eq!(coerce_numeric("N/A"), 0.0);
        assert_eq!(coerce_numeric("NaN"), 0.0);
        assert_eq!(coerce_numeric("inf"), 0.0);
    }

    #[test]
    fn parses_gregorian_and_roc_dates() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 18).expect("valid date");
        assert_eq!(parse_expiry_date("2025-03-18"), Some(expected));
        assert_eq!(parse_expiry_date("2025/03/18"), Some(expected));
        assert_eq!(parse_expiry_date("20250318"), Some(expected));
        assert_eq!(parse_expiry_date("114/03/18"), Some(expected));
        assert_eq!(parse_expiry_date("114/02/30"), None);
        assert_eq!(parse_expiry_date("soon"), None);
    }
}
