use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use banca_terminal::cloud::{self, RemoteStore};
use banca_terminal::{config, ledger};

/// Bulk sync between the hosted row store and the local ledger.
///
///   store_sync pull [--db PATH]   replace the local ledger with remote rows
///   store_sync push [--db PATH]   upsert every local row into the store
fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let mode = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow!("usage: store_sync <pull|push> [--db PATH]"))?;

    let cfg = config::load()?;
    let store_cfg = cfg
        .store
        .as_ref()
        .ok_or_else(|| anyhow!("no store credentials configured (BANCA_STORE_URL / BANCA_STORE_KEY)"))?;
    let store = RemoteStore::connect(store_cfg)?;

    let db_path = parse_db_path_arg()
        .or(cfg.db_path.clone())
        .or_else(ledger::default_db_path)
        .context("unable to resolve ledger path")?;
    let mut conn = ledger::open_db(&db_path)?;

    match mode.as_str() {
        "pull" => {
            let pull = cloud::pull_all(&store)?;
            ledger::replace_all(&mut conn, &pull.bankrolls, &pull.bets, &pull.cash_flows)?;
            println!("Pull complete");
            println!("DB: {}", db_path.display());
            println!("Bankrolls: {}", pull.bankrolls.len());
            println!("Bets: {}", pull.bets.len());
            println!("Cash flows: {}", pull.cash_flows.len());
            if !pull.unknown_settlements.is_empty() {
                println!("Unknown result labels kept as Pending:");
                for label in pull.unknown_settlements.iter().take(6) {
                    println!(" - {label:?}");
                }
            }
        }
        "push" => {
            let bankrolls = ledger::load_bankrolls(&conn)?;
            let bets = ledger::load_bets(&conn)?;
            let cash_flows = ledger::load_cash_flows(&conn)?;
            let summary = cloud::push_all(&store, &bankrolls, &bets, &cash_flows)?;
            println!("Push complete");
            println!("Bankrolls: {}", summary.bankrolls);
            println!("Bets: {}", summary.bets);
            println!("Cash flows: {}", summary.cash_flows);
        }
        other => return Err(anyhow!("unknown mode {other:?}, expected pull or push")),
    }

    Ok(())
}

fn parse_db_path_arg() -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix("--db=") {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == "--db" {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(PathBuf::from(next));
            }
        }
    }
    None
}
