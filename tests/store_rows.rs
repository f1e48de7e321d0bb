use std::fs;
use std::path::PathBuf;

use banca_terminal::cloud::{parse_bankroll_rows, parse_bet_rows, parse_cash_flow_rows};
use banca_terminal::ledger::CashFlowKind;
use banca_terminal::settlement::Settlement;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_bankroll_rows_with_mixed_field_names() {
    let rows = parse_bankroll_rows(&read_fixture("remote_bankrolls.json")).expect("should parse");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].name, "Banca Master");
    assert_eq!(rows[1].name, "Side Book");
    assert_eq!(rows[1].created_at, "2025-01-01T00:00:00Z");
}

#[test]
fn parses_bet_rows_and_recomputes_profit() {
    let parsed = parse_bet_rows(&read_fixture("remote_bets.json")).expect("should parse");
    assert_eq!(parsed.bets.len(), 3);

    // Stored profit of 99.0 is ignored; Green at 1.80 x 10 pays 8.
    let first = &parsed.bets[0];
    assert_eq!(first.settlement, Settlement::Green);
    assert!((first.profit - 8.0).abs() < 1e-9);
    assert_eq!(first.league.as_deref(), Some("Serie A"));

    let second = &parsed.bets[1];
    assert_eq!(second.settlement, Settlement::HalfRed);
    assert!((second.profit - (-12.5)).abs() < 1e-9);
    assert!(second.manual);
}

#[test]
fn unknown_settlement_is_surfaced_not_swallowed() {
    let parsed = parse_bet_rows(&read_fixture("remote_bets.json")).expect("should parse");
    assert_eq!(parsed.unknown_settlements, vec!["Cashout 70%".to_string()]);

    let third = &parsed.bets[2];
    assert_eq!(third.settlement, Settlement::Pending);
    assert_eq!(third.profit, 0.0);
}

#[test]
fn parses_cash_flow_rows_and_skips_unknown_kinds() {
    let rows = parse_cash_flow_rows(&read_fixture("remote_cash_flows.json")).expect("should parse");
    // The "transfer" row has no mapping and is dropped.
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].kind, CashFlowKind::Deposit);
    assert_eq!(rows[0].amount, 500.0);
    assert_eq!(rows[1].kind, CashFlowKind::Withdrawal);
    assert_eq!(rows[1].amount, 120.5);
}

#[test]
fn empty_and_null_bodies_are_empty_tables() {
    assert!(parse_bankroll_rows("null").expect("null is empty").is_empty());
    assert!(parse_bankroll_rows("  ").expect("blank is empty").is_empty());
    assert!(parse_bet_rows("[]").expect("empty array").bets.is_empty());
}

#[test]
fn non_array_body_is_an_error() {
    assert!(parse_bankroll_rows("{\"message\":\"denied\"}").is_err());
}
