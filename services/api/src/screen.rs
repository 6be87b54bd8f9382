use crate::infra::parse_date;
use chrono::{Local, NaiveDate};
use clap::Args;
use serde::Serialize;
use std::fs::File;
use std::path::PathBuf;
use tracing::info;
use warrant_sop::config::{load_screening_settings, AppConfig};
use warrant_sop::error::AppError;
use warrant_sop::screening::chain;
use warrant_sop::screening::{
    ChainSnapshot, PositionBudget, RawFrame, ReportImporter, ScreenedRow, ScreenedRowRecord,
    ScreeningError, ScreeningMode, ScreeningReport, ScreeningSummary, SopProfile, SopRule,
    WarrantScreener,
};
use warrant_sop::telemetry;

#[derive(Args, Debug)]
pub(crate) struct ScreenArgs {
    /// Vendor warrant report export (CSV)
    #[arg(long)]
    pub(crate) report: PathBuf,
    /// Underlying name or code to screen; omit when the report holds a single chain
    #[arg(long)]
    pub(crate) underlying: Option<String>,
    /// SOP profile: standard, conservative, aggressive, extended or scoring
    #[arg(long)]
    pub(crate) profile: Option<SopProfile>,
    /// TOML overrides layered over the profile
    #[arg(long)]
    pub(crate) profile_path: Option<PathBuf>,
    /// Valuation date used to derive days to expiry (YYYY-MM-DD, defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
    /// Total trading capital; prints the suggested warrant allocation ceiling
    #[arg(long)]
    pub(crate) capital: Option<f64>,
    /// Write the ranked rows to this CSV file
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    /// Print the report as JSON instead of tables
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct UnderlyingsArgs {
    /// Vendor warrant report export (CSV)
    #[arg(long)]
    pub(crate) report: PathBuf,
    /// Print the list as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

/// Result of screening one frame, with the chain facts when a target was selected.
pub(crate) struct ScreenRun {
    pub(crate) chain: Option<ChainSnapshot>,
    pub(crate) report: ScreeningReport,
}

pub(crate) fn screen_frame(
    screener: &WarrantScreener,
    frame: &RawFrame,
    underlying: Option<&str>,
    as_of: NaiveDate,
) -> Result<ScreenRun, ScreeningError> {
    match underlying.map(str::trim).filter(|target| !target.is_empty()) {
        Some(target) => {
            let (chain, report) = screener.screen(frame, target, Some(as_of))?;
            Ok(ScreenRun {
                chain: Some(chain),
                report,
            })
        }
        None => Ok(ScreenRun {
            chain: None,
            report: screener.screen_all(frame, Some(as_of))?,
        }),
    }
}

/// JSON shape shared by `screen --json` and `POST /api/v1/screen`.
#[derive(Debug, Serialize)]
pub(crate) struct ScreenPayload {
    pub(crate) profile: SopProfile,
    pub(crate) as_of: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) chain: Option<ChainSnapshot>,
    pub(crate) sensitivity_rule: SopRule,
    pub(crate) summary: ScreeningSummary,
    pub(crate) rows: Vec<ScreenedRowRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) budget: Option<PositionBudget>,
}

impl ScreenPayload {
    pub(crate) fn new(
        profile: SopProfile,
        as_of: NaiveDate,
        run: ScreenRun,
        budget: Option<PositionBudget>,
    ) -> Self {
        Self {
            profile,
            as_of,
            sensitivity_rule: run.report.sensitivity_rule,
            summary: run.report.summary(),
            rows: run.report.records(),
            chain: run.chain,
            budget,
        }
    }
}

pub(crate) fn budget_for(capital: Option<f64>) -> Option<PositionBudget> {
    capital
        .map(|total| PositionBudget::from_capital(total, PositionBudget::DEFAULT_ALLOCATION_PCT))
}

pub(crate) fn run_screen(args: ScreenArgs) -> Result<(), AppError> {
    let ScreenArgs {
        report,
        underlying,
        profile,
        profile_path,
        as_of,
        capital,
        output,
        json,
    } = args;

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let profile = profile.unwrap_or(config.screening.profile);
    let profile_path = profile_path.or(config.screening.profile_path);
    let settings = load_screening_settings(profile, profile_path.as_deref())?;
    let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());

    let frame = ReportImporter::from_path(&report)?;
    let screener = WarrantScreener::new(settings);
    let run = screen_frame(&screener, &frame, underlying.as_deref(), as_of)?;

    if let Some(path) = output {
        let file = File::create(&path)?;
        run.report.write_csv(file)?;
        info!(path = %path.display(), rows = run.report.rows.len(), "screening export written");
    }

    let budget = budget_for(capital);
    if json {
        let payload = ScreenPayload::new(profile, as_of, run, budget);
        let rendered = serde_json::to_string_pretty(&payload).map_err(std::io::Error::from)?;
        println!("{rendered}");
    } else {
        render_screen(&run, profile, as_of, budget.as_ref());
    }

    Ok(())
}

pub(crate) fn run_underlyings(args: UnderlyingsArgs) -> Result<(), AppError> {
    let frame = ReportImporter::from_path(&args.report)?;
    let names = chain::underlyings(&frame);

    if args.json {
        let rendered = serde_json::to_string_pretty(&names).map_err(std::io::Error::from)?;
        println!("{rendered}");
        return Ok(());
    }

    if names.is_empty() {
        println!("No underlying column found in {}", args.report.display());
        return Ok(());
    }

    println!("{} underlyings in {}", names.len(), args.report.display());
    for name in names {
        println!("  - {name}");
    }
    Ok(())
}

fn render_screen(
    run: &ScreenRun,
    profile: SopProfile,
    as_of: NaiveDate,
    budget: Option<&PositionBudget>,
) {
    let report = &run.report;
    let summary = report.summary();

    match &run.chain {
        Some(chain) => {
            let price = chain
                .underlying_price
                .map(|price| format!("{price:.2}"))
                .unwrap_or_else(|| "n/a".to_string());
            println!(
                "Warrant screen: {} | {} warrants | underlying price {}",
                chain.underlying, chain.warrants, price
            );
        }
        None => println!("Warrant screen: {} warrants", report.rows.len()),
    }
    println!(
        "Profile {} | as of {} | sensitivity judged by {}",
        profile,
        as_of,
        match report.sensitivity_rule {
            SopRule::DeltaSweetSpot => "delta",
            _ => "moneyness",
        }
    );

    let scored = report.mode == ScreeningMode::Score;

    println!("\nPassed ({})", summary.passed);
    if summary.passed == 0 {
        println!("  none");
    }
    for (rank, row) in report.passed().enumerate() {
        println!("  {}", format_row(rank + 1, row, scored));
    }

    println!("\nRejected ({})", summary.rejected);
    if summary.rejected == 0 {
        println!("  none");
    }
    for row in report.rejected() {
        println!(
            "  {:<8} {:<18} spread {:>7.2}% | {}",
            row.instrument.warrant_code,
            row.instrument.display_name(),
            row.metrics.spread_pct,
            row.reason_text()
        );
    }

    if !summary.rule_rejections.is_empty() {
        println!("\nRejections by rule:");
        for entry in &summary.rule_rejections {
            println!("  - {}: {}", entry.label, entry.count);
        }
    }

    if scored {
        println!("\nScore tiers:");
        for entry in &summary.tier_counts {
            println!("  - {}: {}", entry.label, entry.count);
        }
    }

    match &summary.best_candidate {
        Some(best) => println!(
            "\nBest candidate: {} {} (spread {:.2}%)",
            best.warrant_code, best.warrant_name, best.spread_pct
        ),
        None => println!("\nBest candidate: none passed the SOP"),
    }

    if let Some(budget) = budget {
        println!(
            "Position budget: {:.0} capital x {:.0}% -> at most {:.0} in warrants",
            budget.total_capital, budget.allocation_pct, budget.max_warrant_allocation
        );
    }
}

fn format_row(rank: usize, row: &ScreenedRow, scored: bool) -> String {
    let instrument = &row.instrument;
    let metrics = &row.metrics;
    let mut line = format!(
        "{:>2}. {:<8} {:<18} {:<6} spread {:>5.2}% | {:>4.0}d | delta {:>5.2} | float {:>5.1}%",
        rank,
        instrument.warrant_code,
        instrument.display_name(),
        instrument.issuer,
        metrics.spread_pct,
        instrument.days_to_expiry,
        instrument.delta,
        metrics.circulation_pct,
    );
    if scored {
        if let (Some(score), Some(tier)) = (row.evaluation.score, row.evaluation.tier) {
            line.push_str(&format!(" | score {score} ({})", tier.label()));
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use warrant_sop::screening::ScreeningSettings;

    const REPORT: &str = "權證代碼,權證名稱,標的名稱,權證買價,權證賣價,剩餘天數,Delta\n\
030001,台積電購01,台積電,2.00,2.04,120,0.5\n\
030002,台積電購02,台積電,1.00,1.50,120,0.5\n\
030101,鴻海購01,鴻海,0.80,0.81,120,0.5\n";

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 18).expect("valid date")
    }

    #[test]
    fn screen_frame_selects_the_requested_chain() {
        let frame = ReportImporter::from_reader(REPORT.as_bytes()).expect("imports");
        let screener = WarrantScreener::new(ScreeningSettings::default());

        let run = screen_frame(&screener, &frame, Some(" 台積電 "), as_of()).expect("screens");
        let chain = run.chain.as_ref().expect("chain selected");
        assert_eq!(chain.warrants, 2);

        let payload = ScreenPayload::new(SopProfile::Standard, as_of(), run, budget_for(None));
        assert_eq!(payload.summary.passed, 1);
        assert_eq!(payload.rows[0].warrant_code, "030001");
        assert_eq!(payload.rows[1].reasons, "spread too wide");
        assert!(payload.budget.is_none());
    }

    #[test]
    fn blank_underlying_screens_the_whole_frame() {
        let frame = ReportImporter::from_reader(REPORT.as_bytes()).expect("imports");
        let screener = WarrantScreener::default();

        let run = screen_frame(&screener, &frame, Some("  "), as_of()).expect("screens");
        assert!(run.chain.is_none());
        assert_eq!(run.report.rows.len(), 3);
    }

    #[test]
    fn passing_rows_render_with_scores_in_scoring_mode() {
        let frame = ReportImporter::from_reader(REPORT.as_bytes()).expect("imports");
        let screener = WarrantScreener::new(ScreeningSettings::for_profile(SopProfile::Scoring));
        let run = screen_frame(&screener, &frame, Some("鴻海"), as_of()).expect("screens");

        let row = run.report.passed().next().expect("one row passes");
        let line = format_row(1, row, true);
        assert!(line.contains("030101"));
        assert!(line.contains("score 100 (Selected)"));
    }
}
