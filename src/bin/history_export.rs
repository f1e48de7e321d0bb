use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use banca_terminal::dashboard;
use banca_terminal::{config, ledger};

/// Write the whole ledger to a spreadsheet: one sheet per table plus a
/// per-bankroll summary.
///
///   history_export [--out PATH] [--db PATH]
fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let cfg = config::load()?;
    let out_path = parse_path_arg("--out").unwrap_or_else(|| PathBuf::from("banca_report.xlsx"));
    let db_path = parse_path_arg("--db")
        .or(cfg.db_path.clone())
        .or_else(ledger::default_db_path)
        .context("unable to resolve ledger path")?;

    let conn = ledger::open_db(&db_path)?;
    let bankrolls = ledger::load_bankrolls(&conn)?;
    let bets = ledger::load_bets(&conn)?;
    let cash_flows = ledger::load_cash_flows(&conn)?;

    let mut bets_rows = vec![vec![
        "ID".to_string(),
        "Bankroll".to_string(),
        "Date".to_string(),
        "Country".to_string(),
        "League".to_string(),
        "Home".to_string(),
        "Away".to_string(),
        "Market".to_string(),
        "Odds".to_string(),
        "Stake".to_string(),
        "Result".to_string(),
        "Profit".to_string(),
        "Manual".to_string(),
    ]];
    for bet in &bets {
        bets_rows.push(vec![
            bet.id.to_string(),
            bet.bankroll_name.clone(),
            bet.date.to_string(),
            bet.country.clone().unwrap_or_default(),
            bet.league.clone().unwrap_or_default(),
            bet.home.clone(),
            bet.away.clone(),
            bet.market.clone(),
            format!("{:.2}", bet.odds),
            format!("{:.2}", bet.stake),
            bet.settlement.label().to_string(),
            format!("{:.2}", bet.profit),
            if bet.manual { "yes" } else { "no" }.to_string(),
        ]);
    }

    let mut bankroll_rows = vec![vec![
        "ID".to_string(),
        "Name".to_string(),
        "Created".to_string(),
        "Balance".to_string(),
    ]];
    for bankroll in &bankrolls {
        let balance = dashboard::bankroll_balance(&cash_flows, &bets, bankroll.id);
        bankroll_rows.push(vec![
            bankroll.id.to_string(),
            bankroll.name.clone(),
            bankroll.created_at.clone(),
            format!("{balance:.2}"),
        ]);
    }

    let mut flow_rows = vec![vec![
        "ID".to_string(),
        "Bankroll".to_string(),
        "Type".to_string(),
        "Amount".to_string(),
        "Date".to_string(),
    ]];
    for flow in &cash_flows {
        let name = bankrolls
            .iter()
            .find(|b| b.id == flow.bankroll_id)
            .map(|b| b.name.clone())
            .unwrap_or_default();
        flow_rows.push(vec![
            flow.id.to_string(),
            name,
            flow.kind.label().to_string(),
            format!("{:.2}", flow.amount),
            flow.date.to_string(),
        ]);
    }

    let mut summary_rows = vec![vec![
        "Scope".to_string(),
        "Settled".to_string(),
        "Pending".to_string(),
        "Turnover".to_string(),
        "Profit".to_string(),
        "ROI %".to_string(),
    ]];
    summary_rows.push(summary_row("All", dashboard::performance(&bets)));
    for bankroll in &bankrolls {
        summary_rows.push(summary_row(
            &bankroll.name,
            dashboard::performance_for(&bets, Some(bankroll.id)),
        ));
    }

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Bets")?;
        write_rows(sheet, &bets_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Bankrolls")?;
        write_rows(sheet, &bankroll_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("CashFlow")?;
        write_rows(sheet, &flow_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Summary")?;
        write_rows(sheet, &summary_rows)?;
    }

    workbook
        .save(&out_path)
        .with_context(|| format!("failed writing workbook to {}", out_path.display()))?;

    println!("Report written to {}", out_path.display());
    println!(
        "Bets: {}  Bankrolls: {}  Cash flows: {}",
        bets.len(),
        bankrolls.len(),
        cash_flows.len()
    );
    Ok(())
}

fn summary_row(scope: &str, perf: dashboard::Performance) -> Vec<String> {
    vec![
        scope.to_string(),
        perf.settled.to_string(),
        perf.pending.to_string(),
        format!("{:.2}", perf.turnover),
        format!("{:.2}", perf.profit),
        format!("{:.2}", perf.roi_pct()),
    ]
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}

fn parse_path_arg(flag: &str) -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix(&prefix) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == flag {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() && Path::new(next).file_name().is_some() {
                return Some(PathBuf::from(next));
            }
        }
    }
    None
}
