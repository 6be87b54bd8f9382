//! Selection of a single underlying's warrant chain from a full-market report.

use super::schema::{coerce_numeric, RawFrame};
use serde::Serialize;
use std::collections::BTreeSet;

const UNDERLYING_KEYS: [&str; 2] = ["標的名稱", "標的代碼"];
const UNDERLYING_PRICE_KEY: &str = "標的價格";

/// Column used to group rows by underlying: its name when present, else its code.
pub fn underlying_column(frame: &RawFrame) -> Option<usize> {
    UNDERLYING_KEYS
        .iter()
        .find_map(|key| frame.find_column(key))
}

/// Distinct underlyings in the report, sorted.
pub fn underlyings(frame: &RawFrame) -> Vec<String> {
    let Some(column) = underlying_column(frame) else {
        return Vec::new();
    };

    frame
        .rows()
        .iter()
        .filter_map(|row| row.get(column))
        .map(|value| value.trim())
        .filter(|value| !value.is_empty() && !value.eq_ignore_ascii_case("nan"))
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Rows belonging to `target`, or `None` when the report has no underlying column.
pub fn select_chain(frame: &RawFrame, target: &str) -> Option<RawFrame> {
    let column = underlying_column(frame)?;
    let target = target.trim();
    Some(frame.retain_rows(|row| row.get(column).map(|value| value.trim()) == Some(target)))
}

/// Headline facts about a selected chain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainSnapshot {
    pub underlying: String,
    pub warrants: usize,
    /// Underlying price from the first row, when the report carries one.
    pub underlying_price: Option<f64>,
}

impl ChainSnapshot {
    pub fn from_chain(underlying: &str, chain: &RawFrame) -> Self {
        let underlying_price = chain
            .find_column(UNDERLYING_PRICE_KEY)
            .and_then(|column| chain.cell(0, column))
            .map(coerce_numeric);

        Self {
            underlying: underlying.trim().to_string(),
            warrants: chain.len(),
            underlying_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn market() -> RawFrame {
        RawFrame::new(
            ["權證代碼", "標的代碼", "標的名稱", "標的價格"],
            vec![
                vec!["030001", "2330", " 台積電 ", "1,050"],
                vec!["030002", "2317", "鴻海", "180"],
                vec!["030003", "2330", "台積電", "1,050"],
                vec!["030004", "", "nan", "0"],
            ],
        )
    }

    #[test]
    fn prefers_underlying_name_column() {
        assert_eq!(underlying_column(&market()), Some(2));
    }

    #[test]
    fn lists_distinct_sorted_underlyings() {
        let list = underlyings(&market());
        assert_eq!(list, vec!["台積電".to_string(), "鴻海".to_string()]);
    }

    #[test]
    fn selects_rows_for_trimmed_target() {
        let chain = select_chain(&market(), "台積電").expect("has underlying column");
        assert_eq!(chain.len(), 2);

        let snapshot = ChainSnapshot::from_chain("台積電", &chain);
        assert_eq!(snapshot.warrants, 2);
        assert_eq!(snapshot.underlying_price, Some(1050.0));
    }

    #[test]
    fn falls_back_to_underlying_code() {
        let frame = RawFrame::new(["權證代碼", "標的代碼"], vec![vec!["030001", "2330"]]);
        assert_eq!(underlying_column(&frame), Some(1));
        assert_eq!(underlyings(&frame), vec!["2330".to_string()]);
    }
}
