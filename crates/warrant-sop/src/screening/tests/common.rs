use crate::screening::{
    CanonicalTable, RawFrame, SchemaResolver, ScreeningConfig, ScreeningEngine, ScreeningReport,
};

pub(super) const HEADERS: [&str; 17] = [
    "權證代碼",
    "權證名稱",
    "標的名稱",
    "發行券商",
    "標的價格",
    "履約價",
    "權證買價",
    "權證賣價",
    "剩餘天數",
    "流通在外估計張數",
    "發行張數",
    "隱含波動率",
    "標的20日波動率",
    "Delta",
    "買張",
    "賣張",
    "成交量",
];

/// One warrant quote as it would appear in a vendor report.
#[derive(Debug, Clone)]
pub(super) struct Quote {
    pub code: &'static str,
    pub issuer: &'static str,
    pub spot: f64,
    pub strike: f64,
    pub bid: f64,
    pub ask: f64,
    pub days: f64,
    pub outstanding: f64,
    pub issued: f64,
    pub implied_vol: f64,
    pub historical_vol: f64,
    pub delta: f64,
    pub bid_size: f64,
    pub ask_size: f64,
    pub volume: f64,
}

impl Quote {
    fn cells(&self) -> Vec<String> {
        vec![
            self.code.to_string(),
            format!("台積電元大購{}", &self.code[self.code.len().saturating_sub(2)..]),
            "台積電".to_string(),
            self.issuer.to_string(),
            self.spot.to_string(),
            self.strike.to_string(),
            self.bid.to_string(),
            self.ask.to_string(),
            self.days.to_string(),
            self.outstanding.to_string(),
            self.issued.to_string(),
            self.implied_vol.to_string(),
            self.historical_vol.to_string(),
            self.delta.to_string(),
            self.bid_size.to_string(),
            self.ask_size.to_string(),
            self.volume.to_string(),
        ]
    }
}

/// Passes every default rule: spread 2.5%, 120 days, delta 0.5, 10% outstanding.
/// Quotes 50 lots a side and trades 100.
pub(super) fn healthy(code: &'static str) -> Quote {
    Quote {
        code,
        issuer: "元大",
        spot: 95.0,
        strike: 100.0,
        bid: 2.00,
        ask: 2.05,
        days: 120.0,
        outstanding: 1_000.0,
        issued: 10_000.0,
        implied_vol: 0.0,
        historical_vol: 0.0,
        delta: 0.5,
        bid_size: 50.0,
        ask_size: 50.0,
        volume: 100.0,
    }
}

pub(super) fn frame(quotes: &[Quote]) -> RawFrame {
    RawFrame::new(HEADERS, quotes.iter().map(Quote::cells).collect())
}

pub(super) fn table(quotes: &[Quote]) -> CanonicalTable {
    SchemaResolver::default()
        .resolve(&frame(quotes))
        .expect("fixture headers resolve")
}

pub(super) fn screen(quotes: &[Quote], config: ScreeningConfig) -> ScreeningReport {
    ScreeningEngine::new(config).evaluate(&table(quotes))
}

pub(super) fn codes(report: &ScreeningReport) -> Vec<&str> {
    report
        .rows
        .iter()
        .map(|row| row.instrument.warrant_code.as_str())
        .collect()
}
