use chrono::NaiveDate;

use crate::ledger::{Bet, CashFlow, CashFlowKind};
use crate::settlement::profit;

/// Aggregate performance over a slice of bets. Pending bets count toward
/// nothing except their own tally; ROI is profit over settled turnover.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Performance {
    pub settled: usize,
    pub pending: usize,
    pub profit: f64,
    pub turnover: f64,
}

impl Performance {
    pub fn roi_pct(&self) -> f64 {
        if self.turnover <= 0.0 {
            0.0
        } else {
            self.profit / self.turnover * 100.0
        }
    }
}

pub fn performance(bets: &[Bet]) -> Performance {
    performance_for(bets, None)
}

pub fn performance_for(bets: &[Bet], bankroll_id: Option<i64>) -> Performance {
    let mut out = Performance::default();
    for bet in bets {
        if bankroll_id.is_some_and(|id| bet.bankroll_id != id) {
            continue;
        }
        if bet.settlement.is_settled() {
            out.settled += 1;
            out.profit += bet.profit;
            out.turnover += bet.stake;
        } else {
            out.pending += 1;
        }
    }
    out
}

#[derive(Debug, Clone, Copy)]
pub struct CurvePoint {
    pub date: NaiveDate,
    pub cumulative: f64,
}

/// Cumulative profit over settled bets in date order; one point per bet so
/// same-day entries stay visible as separate steps.
pub fn profit_curve(bets: &[Bet]) -> Vec<CurvePoint> {
    let mut settled: Vec<&Bet> = bets.iter().filter(|b| b.settlement.is_settled()).collect();
    settled.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));

    let mut running = 0.0;
    settled
        .iter()
        .map(|bet| {
            running += bet.profit;
            CurvePoint {
                date: bet.date,
                cumulative: running,
            }
        })
        .collect()
}

/// Current balance of a bankroll: deposits minus withdrawals plus bet
/// profit. Pending bets contribute zero by construction.
pub fn bankroll_balance(flows: &[CashFlow], bets: &[Bet], bankroll_id: i64) -> f64 {
    let mut balance = 0.0;
    for flow in flows.iter().filter(|f| f.bankroll_id == bankroll_id) {
        match flow.kind {
            CashFlowKind::Deposit => balance += flow.amount,
            CashFlowKind::Withdrawal => balance -= flow.amount,
        }
    }
    for bet in bets.iter().filter(|b| b.bankroll_id == bankroll_id) {
        balance += bet.profit;
    }
    balance
}

/// Recompute every profit from its own (settlement, odds, stake). Returns
/// how many rows actually changed; idempotent by construction.
pub fn recompute_profits(bets: &mut [Bet]) -> usize {
    let mut changed = 0;
    for bet in bets.iter_mut() {
        let value = profit(bet.settlement, bet.odds, bet.stake);
        if (value - bet.profit).abs() > f64::EPSILON {
            bet.profit = value;
            changed += 1;
        }
    }
    changed
}
