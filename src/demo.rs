use anyhow::Result;
use chrono::{Duration as ChronoDuration, Utc};
use rand::Rng;
use rusqlite::Connection;

use crate::ledger::{self, CashFlowKind, NewBet};
use crate::match_dataset::{MatchDataset, MatchRecord};
use crate::settlement::Settlement;

const DEMO_TEAMS: [&str; 6] = [
    "Atlas FC",
    "Borba SC",
    "Cruz del Sur",
    "Dínamo Verde",
    "Estrela Azul",
    "Ferro União",
];

/// Synthetic league history so the scout screens render without a CSV.
/// Scores are fixed so the derived tables stay stable between runs.
pub fn demo_dataset() -> MatchDataset {
    let scores: [(usize, usize, i32, i32); 12] = [
        (0, 1, 2, 0),
        (1, 2, 1, 1),
        (2, 3, 0, 2),
        (3, 4, 3, 1),
        (4, 5, 1, 0),
        (5, 0, 0, 0),
        (1, 0, 1, 2),
        (2, 1, 2, 2),
        (3, 2, 1, 0),
        (4, 3, 0, 1),
        (5, 4, 2, 1),
        (0, 5, 3, 0),
    ];

    let today = Utc::now().date_naive();
    let records = scores
        .iter()
        .enumerate()
        .map(|(idx, &(h, a, hg, ag))| MatchRecord {
            date: Some(today - ChronoDuration::days((scores.len() - idx) as i64 * 7)),
            country: "Demo".to_string(),
            division: "Liga Demo".to_string(),
            home: DEMO_TEAMS[h].to_string(),
            away: DEMO_TEAMS[a].to_string(),
            home_goals_ft: hg,
            away_goals_ft: ag,
            home_goals_ht: Some(hg.min(1)),
            away_goals_ht: Some(ag.min(1)),
            home_corners: Some(4.0 + (idx % 4) as f64),
            away_corners: Some(3.0 + (idx % 3) as f64),
            home_shots: Some(9.0 + (idx % 5) as f64),
            away_shots: Some(7.0 + (idx % 4) as f64),
            home_shots_on_target: Some(3.0 + (idx % 3) as f64),
            away_shots_on_target: Some(2.0 + (idx % 3) as f64),
            home_yellow_cards: Some(1.0 + (idx % 2) as f64),
            away_yellow_cards: Some(2.0),
        })
        .collect();

    MatchDataset {
        records,
        skipped_rows: 0,
    }
}

/// Seed a demo bankroll with a handful of graded bets and cash flows.
/// Only runs against an empty ledger; odds and stakes get a little jitter
/// so the dashboard does not look copy-pasted.
pub fn seed_demo_ledger(conn: &Connection) -> Result<usize> {
    if !ledger::load_bankrolls(conn)?.is_empty() {
        return Ok(0);
    }

    let mut rng = rand::thread_rng();
    let today = Utc::now().date_naive();

    let bankroll_id = ledger::insert_bankroll(conn, "Demo Bankroll")?;
    ledger::insert_cash_flow(
        conn,
        bankroll_id,
        CashFlowKind::Deposit,
        500.0,
        today - ChronoDuration::days(30),
    )?;

    let gradings = [
        Settlement::Green,
        Settlement::Red,
        Settlement::Green,
        Settlement::HalfGreen,
        Settlement::Red,
        Settlement::Void,
        Settlement::HalfRed,
        Settlement::Pending,
    ];

    let mut inserted = 0usize;
    for (idx, settlement) in gradings.iter().enumerate() {
        let home = DEMO_TEAMS[idx % DEMO_TEAMS.len()];
        let away = DEMO_TEAMS[(idx + 1) % DEMO_TEAMS.len()];
        let bet = NewBet {
            bankroll_id,
            date: today - ChronoDuration::days((gradings.len() - idx) as i64 * 3),
            country: Some("Demo".to_string()),
            league: Some("Liga Demo".to_string()),
            home: home.to_string(),
            away: away.to_string(),
            market: if idx % 2 == 0 { "Over 2.5" } else { "Home ML" }.to_string(),
            odds: (rng.gen_range(1.40..2.60_f64) * 100.0).round() / 100.0,
            stake: (rng.gen_range(10.0..50.0_f64)).round(),
            settlement: *settlement,
            manual: false,
        };
        ledger::insert_bet(conn, &bet)?;
        inserted += 1;
    }
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_dataset_is_self_consistent() {
        let dataset = demo_dataset();
        assert_eq!(dataset.records.len(), 12);
        assert_eq!(dataset.countries(), vec!["Demo".to_string()]);
        assert_eq!(dataset.teams("Liga Demo").len(), 6);
    }

    #[test]
    fn seed_only_touches_empty_ledgers() {
        let conn = ledger::open_in_memory().unwrap();
        assert!(seed_demo_ledger(&conn).unwrap() > 0);
        // Second run is a no-op.
        assert_eq!(seed_demo_ledger(&conn).unwrap(), 0);
    }
}
