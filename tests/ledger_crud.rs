use chrono::NaiveDate;

use banca_terminal::ledger::{
    self, Bankroll, Bet, CashFlow, CashFlowKind, NewBet, open_in_memory,
};
use banca_terminal::settlement::Settlement;

fn sample_bet(bankroll_id: i64) -> NewBet {
    NewBet {
        bankroll_id,
        date: NaiveDate::from_ymd_opt(2025, 8, 12).unwrap(),
        country: Some("Brasil".to_string()),
        league: Some("Serie A".to_string()),
        home: "Flamengo".to_string(),
        away: "Palmeiras".to_string(),
        market: "Over 2.5".to_string(),
        odds: 1.80,
        stake: 10.0,
        settlement: Settlement::Pending,
        manual: false,
    }
}

#[test]
fn insert_and_load_joined_bets() {
    let conn = open_in_memory().unwrap();
    let bankroll_id = ledger::insert_bankroll(&conn, "Main").unwrap();
    let bet_id = ledger::insert_bet(&conn, &sample_bet(bankroll_id)).unwrap();

    let bets = ledger::load_bets(&conn).unwrap();
    assert_eq!(bets.len(), 1);
    assert_eq!(bets[0].id, bet_id);
    assert_eq!(bets[0].bankroll_name, "Main");
    assert_eq!(bets[0].settlement, Settlement::Pending);
    assert_eq!(bets[0].profit, 0.0);
}

#[test]
fn grading_recomputes_profit_from_stored_odds() {
    let conn = open_in_memory().unwrap();
    let bankroll_id = ledger::insert_bankroll(&conn, "Main").unwrap();
    let bet_id = ledger::insert_bet(&conn, &sample_bet(bankroll_id)).unwrap();

    let green = ledger::update_bet_grading(&conn, bet_id, Settlement::Green).unwrap();
    assert!((green - 8.0).abs() < 1e-9);

    // Grading again with the same status yields the same profit.
    let again = ledger::update_bet_grading(&conn, bet_id, Settlement::Green).unwrap();
    assert_eq!(green, again);

    let half_red = ledger::update_bet_grading(&conn, bet_id, Settlement::HalfRed).unwrap();
    assert!((half_red - (-5.0)).abs() < 1e-9);

    let bets = ledger::load_bets(&conn).unwrap();
    assert_eq!(bets[0].settlement, Settlement::HalfRed);
    assert!((bets[0].profit - (-5.0)).abs() < 1e-9);
}

#[test]
fn invalid_odds_or_stake_are_rejected() {
    let conn = open_in_memory().unwrap();
    let bankroll_id = ledger::insert_bankroll(&conn, "Main").unwrap();

    let mut low_odds = sample_bet(bankroll_id);
    low_odds.odds = 1.0;
    assert!(ledger::insert_bet(&conn, &low_odds).is_err());

    let mut no_stake = sample_bet(bankroll_id);
    no_stake.stake = 0.0;
    assert!(ledger::insert_bet(&conn, &no_stake).is_err());

    assert!(ledger::load_bets(&conn).unwrap().is_empty());
}

#[test]
fn bankroll_delete_is_blocked_by_dependents() {
    let conn = open_in_memory().unwrap();
    let bankroll_id = ledger::insert_bankroll(&conn, "Main").unwrap();
    let bet_id = ledger::insert_bet(&conn, &sample_bet(bankroll_id)).unwrap();

    assert!(ledger::delete_bankroll(&conn, bankroll_id).is_err());

    ledger::delete_bet(&conn, bet_id).unwrap();
    ledger::delete_bankroll(&conn, bankroll_id).unwrap();
    assert!(ledger::load_bankrolls(&conn).unwrap().is_empty());
}

#[test]
fn cash_flow_round_trip_and_guard() {
    let conn = open_in_memory().unwrap();
    let bankroll_id = ledger::insert_bankroll(&conn, "Main").unwrap();
    let date = NaiveDate::from_ymd_opt(2025, 8, 1).unwrap();

    assert!(
        ledger::insert_cash_flow(&conn, bankroll_id, CashFlowKind::Deposit, -5.0, date).is_err()
    );
    ledger::insert_cash_flow(&conn, bankroll_id, CashFlowKind::Deposit, 500.0, date).unwrap();
    ledger::insert_cash_flow(&conn, bankroll_id, CashFlowKind::Withdrawal, 120.0, date).unwrap();

    let flows = ledger::load_cash_flows(&conn).unwrap();
    assert_eq!(flows.len(), 2);
    assert_eq!(flows[0].kind, CashFlowKind::Deposit);

    // Cash flows also block bankroll deletion.
    assert!(ledger::delete_bankroll(&conn, bankroll_id).is_err());
}

#[test]
fn duplicate_bankroll_names_are_rejected() {
    let conn = open_in_memory().unwrap();
    ledger::insert_bankroll(&conn, "Main").unwrap();
    assert!(ledger::insert_bankroll(&conn, "Main").is_err());
    assert!(ledger::insert_bankroll(&conn, "  ").is_err());
}

#[test]
fn replace_all_swaps_ledger_contents() {
    let mut conn = open_in_memory().unwrap();
    let old_id = ledger::insert_bankroll(&conn, "Old").unwrap();
    ledger::insert_bet(&conn, &sample_bet(old_id)).unwrap();

    let bankrolls = vec![Bankroll {
        id: 10,
        name: "Pulled".to_string(),
        created_at: "2025-01-01T00:00:00Z".to_string(),
    }];
    let bets = vec![Bet {
        id: 77,
        bankroll_id: 10,
        bankroll_name: String::new(),
        date: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
        country: None,
        league: None,
        home: "Porto".to_string(),
        away: "Benfica".to_string(),
        market: "Home ML".to_string(),
        odds: 2.0,
        stake: 20.0,
        settlement: Settlement::Green,
        profit: 20.0,
        manual: true,
    }];
    let flows = vec![CashFlow {
        id: 5,
        bankroll_id: 10,
        kind: CashFlowKind::Deposit,
        amount: 300.0,
        date: NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
    }];

    ledger::replace_all(&mut conn, &bankrolls, &bets, &flows).unwrap();

    let loaded = ledger::load_bets(&conn).unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].id, 77);
    assert_eq!(loaded[0].bankroll_name, "Pulled");
    assert_eq!(ledger::load_cash_flows(&conn).unwrap().len(), 1);
    assert_eq!(ledger::load_bankrolls(&conn).unwrap()[0].id, 10);
}
