use super::fields::CanonicalField;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

static STANDARD_COLUMN_MAP: OnceLock<ColumnMap> = OnceLock::new();

/// Priority-ordered keyword list for one canonical field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub field: CanonicalField,
    pub keywords: Vec<String>,
}

/// Declarative header-resolution table consumed by the schema resolver.
///
/// Keyword order encodes vendor naming precedence: the most specific header name comes
/// first so that a generic keyword (for example `買價`) only wins when nothing more
/// precise (`權證買價`) is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMap {
    pub fields: Vec<FieldMapping>,
    /// Each group needs at least one resolved member or resolution fails.
    pub identity_groups: Vec<Vec<CanonicalField>>,
}

impl ColumnMap {
    pub fn standard() -> Self {
        standard_column_map().clone()
    }

    pub fn keywords(&self, field: CanonicalField) -> &[String] {
        self.fields
            .iter()
            .find(|mapping| mapping.field == field)
            .map(|mapping| mapping.keywords.as_slice())
            .unwrap_or(&[])
    }

    /// Replaces the keyword lists of the fields named in `overrides`.
    pub fn with_overrides(mut self, overrides: impl IntoIterator<Item = FieldMapping>) -> Self {
        for mapping in overrides {
            match self
                .fields
                .iter_mut()
                .find(|existing| existing.field == mapping.field)
            {
                Some(existing) => existing.keywords = mapping.keywords,
                None => self.fields.push(mapping),
            }
        }
        self
    }
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self::standard()
    }
}

fn standard_column_map() -> &'static ColumnMap {
    STANDARD_COLUMN_MAP.get_or_init(|| {
        const FIELD_KEYWORDS: &[(CanonicalField, &[&str])] = &[
            // Identity
            (CanonicalField::WarrantName, &["權證名稱"]),
            (CanonicalField::WarrantCode, &["權證代碼"]),
            (CanonicalField::UnderlyingName, &["標的名稱", "標的證券"]),
            (CanonicalField::UnderlyingCode, &["標的代碼"]),
            (CanonicalField::Issuer, &["發行券商", "發行商", "券商"]),
            (CanonicalField::ExpiryDate, &["到期日期", "最後交易日", "到期日"]),
            // Quotes
            (
                CanonicalField::UnderlyingPrice,
                &["標的價格", "標的股價", "標的收盤"],
            ),
            (CanonicalField::BidPrice, &["權證買價", "最佳買價", "買價"]),
            (CanonicalField::AskPrice, &["權證賣價", "最佳賣價", "賣價"]),
            (CanonicalField::BidSize, &["買進推計量", "買張", "最佳買量"]),
            (CanonicalField::AskSize, &["賣出推計量", "賣張", "最佳賣量"]),
            // Contract terms
            (CanonicalField::Strike, &["履約價", "執行價"]),
            (CanonicalField::DaysToExpiry, &["剩餘天數", "距到期日", "天數"]),
            (
                CanonicalField::OutstandingUnits,
                &[
                    "流通在外估計張數",
                    "流通在外張數",
                    "最新流通在外張數",
                    "外流張數",
                ],
            ),
            (CanonicalField::IssuedUnits, &["發行量", "發行張數"]),
            // Volatility and Greeks
            (
                CanonicalField::ImpliedVol,
                &["隱含波動率", "BIV", "委買隱含波動率", "買進IV"],
            ),
            (
                CanonicalField::HistoricalVol,
                &["標的20日波動率", "歷史波動率", "SV20", "20日波動率"],
            ),
            (CanonicalField::Delta, &["DELTA", "Delta", "對沖值"]),
            (CanonicalField::Gamma, &["GAMMA", "Gamma"]),
            (CanonicalField::Theta, &["THETA", "Theta"]),
            // Cost of leverage and liquidity
            (CanonicalField::PremiumPct, &["溢價比率", "溢價比", "溢價"]),
            (
                CanonicalField::EffectiveLeverage,
                &["實質槓桿", "有效槓桿", "槓桿倍數"],
            ),
            (CanonicalField::Volume, &["成交量", "成交張數", "總量"]),
        ];

        let fields = FIELD_KEYWORDS
            .iter()
            .map(|(field, keywords)| FieldMapping {
                field: *field,
                keywords: keywords.iter().map(|kw| kw.to_string()).collect(),
            })
            .collect();

        ColumnMap {
            fields,
            identity_groups: vec![
                vec![CanonicalField::UnderlyingName, CanonicalField::UnderlyingCode],
                vec![CanonicalField::WarrantCode, CanonicalField::WarrantName],
            ],
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_map_covers_every_field() {
        let map = ColumnMap::standard();
        for field in CanonicalField::ordered() {
            assert!(!map.keywords(field).is_empty(), "{field} has no keywords");
        }
    }

    #[test]
    fn overrides_replace_only_named_fields() {
        let map = ColumnMap::standard().with_overrides([FieldMapping {
            field: CanonicalField::BidPrice,
            keywords: vec!["Bid".to_string()],
        }]);
        assert_eq!(map.keywords(CanonicalField::BidPrice), ["Bid".to_string()]);
        assert_eq!(map.keywords(CanonicalField::AskPrice)[0], "權證賣價");
    }
}
