//! Resolution of vendor-specific report headers into the canonical instrument schema.

mod coerce;
mod fields;
mod frame;
mod mapping;

pub use fields::{CanonicalField, FieldKind, InstrumentRow};
pub use frame::RawFrame;
pub use mapping::{ColumnMap, FieldMapping};

pub(crate) use coerce::coerce_numeric;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Which source column fed a canonical field, kept for debugging output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnBinding {
    pub field: CanonicalField,
    pub source_header: String,
    pub source_index: usize,
    pub keyword: String,
}

/// Dense canonical table: one row per input data row, every field populated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalTable {
    pub rows: Vec<InstrumentRow>,
    pub bindings: Vec<ColumnBinding>,
    pub unresolved: Vec<CanonicalField>,
}

impl CanonicalTable {
    pub fn binding(&self, field: CanonicalField) -> Option<&ColumnBinding> {
        self.bindings.iter().find(|binding| binding.field == field)
    }

    pub fn is_resolved(&self, field: CanonicalField) -> bool {
        self.binding(field).is_some()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("report is missing identity columns: none of [{}] could be matched", format_groups(.groups))]
    UnresolvedIdentity { groups: Vec<Vec<CanonicalField>> },
}

fn format_groups(groups: &[Vec<CanonicalField>]) -> String {
    groups
        .iter()
        .map(|group| {
            group
                .iter()
                .map(|field| field.name())
                .collect::<Vec<_>>()
                .join(" or ")
        })
        .collect::<Vec<_>>()
        .join("], [")
}

/// Inputs to resolution that do not come from the report itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Reference date for deriving days to expiry from an expiry date column.
    pub as_of: Option<NaiveDate>,
}

/// Pure mapping from arbitrary headers to the canonical schema.
#[derive(Debug, Clone, Default)]
pub struct SchemaResolver {
    map: ColumnMap,
}

impl SchemaResolver {
    pub fn new(map: ColumnMap) -> Self {
        Self { map }
    }

    pub fn resolve(&self, frame: &RawFrame) -> Result<CanonicalTable, SchemaError> {
        self.resolve_with(frame, ResolveOptions::default())
    }

    pub fn resolve_with(
        &self,
        frame: &RawFrame,
        options: ResolveOptions,
    ) -> Result<CanonicalTable, SchemaError> {
        let bindings: Vec<ColumnBinding> = CanonicalField::ordered()
            .into_iter()
            .filter_map(|field| self.bind(frame, field))
            .collect();

        let missing_groups: Vec<Vec<CanonicalField>> = self
            .map
            .identity_groups
            .iter()
            .filter(|group| {
                !group
                    .iter()
                    .any(|field| bindings.iter().any(|binding| binding.field == *field))
            })
            .cloned()
            .collect();

        if !missing_groups.is_empty() {
            return Err(SchemaError::UnresolvedIdentity {
                groups: missing_groups,
            });
        }

        let unresolved: Vec<CanonicalField> = CanonicalField::ordered()
            .into_iter()
            .filter(|field| !bindings.iter().any(|binding| binding.field == *field))
            .collect();

        for field in &unresolved {
            if !field.is_identity() {
                warn!(field = field.name(), "no source column matched; defaulting");
            }
        }

        let derive_days = unresolved.contains(&CanonicalField::DaysToExpiry);
        let rows = frame
            .rows()
            .iter()
            .map(|cells| {
                let mut row = InstrumentRow::default();
                for binding in &bindings {
                    let raw = cells
                        .get(binding.source_index)
                        .map(String::as_str)
                        .unwrap_or("");
                    assign(&mut row, binding.field, raw);
                }
                if derive_days {
                    row.days_to_expiry = derived_days_to_expiry(&row, options.as_of);
                }
                row
            })
            .collect();

        Ok(CanonicalTable {
            rows,
            bindings,
            unresolved,
        })
    }

    fn bind(&self, frame: &RawFrame, field: CanonicalField) -> Option<ColumnBinding> {
        self.map.keywords(field).iter().find_map(|keyword| {
            frame.find_column(keyword).map(|index| {
                let source_header = frame.headers()[index].clone();
                debug!(
                    field = field.name(),
                    header = %source_header,
                    keyword = %keyword,
                    "bound canonical field"
                );
                ColumnBinding {
                    field,
                    source_header,
                    source_index: index,
                    keyword: keyword.clone(),
                }
            })
        })
    }
}

fn assign(row: &mut InstrumentRow, field: CanonicalField, raw: &str) {
    match field.kind() {
        FieldKind::Numeric => {
            if let Some(slot) = row.numeric_mut(field) {
                *slot = coerce_numeric(raw);
            }
        }
        FieldKind::Text => {
            if let Some(slot) = row.text_mut(field) {
                *slot = raw.trim().to_string();
            }
        }
    }
}

fn derived_days_to_expiry(row: &InstrumentRow, as_of: Option<NaiveDate>) -> f64 {
    let (Some(as_of), Some(expiry)) = (as_of, coerce::parse_expiry_date(&row.expiry_date)) else {
        return 0.0;
    };

    (expiry - as_of).num_days() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(headers: &[&str], rows: &[&[&str]]) -> RawFrame {
        RawFrame::new(
            headers.iter().copied(),
            rows.iter()
                .map(|row| row.iter().map(|cell| cell.to_string()).collect())
                .collect::<Vec<Vec<String>>>(),
        )
    }

    #[test]
    fn first_keyword_in_priority_order_wins() {
        let frame = frame(
            &["標的名稱", "權證代碼", "買價", "權證買價"],
            &[&["台積電", "030001", "1.00", "2.00"]],
        );
        let table = SchemaResolver::default().resolve(&frame).expect("resolves");

        assert_eq!(table.rows[0].bid_price, 2.0);
        let binding = table.binding(CanonicalField::BidPrice).expect("bid bound");
        assert_eq!(binding.source_header, "權證買價");
        assert_eq!(binding.keyword, "權證買價");
    }

    #[test]
    fn first_matching_column_wins_for_the_same_keyword() {
        let frame = frame(
            &["標的代碼", "權證名稱", "剩餘天數", "剩餘天數"],
            &[&["2330", "台積電元大5A購01", "120", "5"]],
        );
        let table = SchemaResolver::default().resolve(&frame).expect("resolves");

        assert_eq!(table.rows[0].days_to_expiry, 120.0);
        let binding = table
            .binding(CanonicalField::DaysToExpiry)
            .expect("days bound");
        assert_eq!(binding.source_index, 2);
    }

    #[test]
    fn missing_metric_fields_default_to_zero() {
        let frame = frame(&["標的名稱", "權證名稱"], &[&["台積電", "台積電購01"]]);
        let table = SchemaResolver::default().resolve(&frame).expect("resolves");

        let row = &table.rows[0];
        assert_eq!(row.delta, 0.0);
        assert_eq!(row.strike, 0.0);
        assert_eq!(row.issuer, "");
        assert!(table.unresolved.contains(&CanonicalField::Delta));
    }

    #[test]
    fn missing_underlying_identity_is_an_error() {
        let frame = frame(&["權證代碼", "買價"], &[&["030001", "1.0"]]);
        let err = SchemaResolver::default()
            .resolve(&frame)
            .expect_err("no underlying column");

        let SchemaError::UnresolvedIdentity { groups } = &err;
        assert_eq!(groups.len(), 1);
        assert!(groups[0].contains(&CanonicalField::UnderlyingName));
        assert!(err.to_string().contains("underlying_name or underlying_code"));
    }

    #[test]
    fn days_are_derived_from_expiry_when_count_missing() {
        let frame = frame(
            &["標的名稱", "權證代碼", "到期日期"],
            &[&["台積電", "030001", "2025/06/30"]],
        );
        let options = ResolveOptions {
            as_of: NaiveDate::from_ymd_opt(2025, 5, 1),
        };
        let table = SchemaResolver::default()
            .resolve_with(&frame, options)
            .expect("resolves");

        assert_eq!(table.rows[0].days_to_expiry, 60.0);

        let without_date = SchemaResolver::default().resolve(&frame).expect("resolves");
        assert_eq!(without_date.rows[0].days_to_expiry, 0.0);
    }

    #[test]
    fn malformed_numbers_coerce_without_failing() {
        let frame = frame(
            &["標的名稱", "權證代碼", "隱含波動率", "發行量"],
            &[&["台積電", "030001", "--", "10,000"]],
        );
        let table = SchemaResolver::default().resolve(&frame).expect("resolves");

        assert_eq!(table.rows[0].implied_vol, 0.0);
        assert_eq!(table.rows[0].issued_units, 10_000.0);
    }
}
