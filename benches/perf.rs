use chrono::NaiveDate;
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use banca_terminal::dashboard::{performance, profit_curve, recompute_profits};
use banca_terminal::ledger::Bet;
use banca_terminal::match_dataset::parse_dataset;
use banca_terminal::outcome::{empirical_outcome, poisson_outcome_capped};
use banca_terminal::rankings::{Venue, compute_standings};
use banca_terminal::settlement::{Settlement, profit};

fn sample_bets(count: usize) -> Vec<Bet> {
    (0..count)
        .map(|idx| {
            let settlement = Settlement::ALL[idx % Settlement::ALL.len()];
            let odds = 1.5 + (idx % 7) as f64 * 0.15;
            let stake = 10.0 + (idx % 5) as f64 * 5.0;
            Bet {
                id: idx as i64 + 1,
                bankroll_id: 1 + (idx % 3) as i64,
                bankroll_name: "Main".to_string(),
                date: NaiveDate::from_ymd_opt(2025, 1, 1 + (idx % 28) as u32).unwrap(),
                country: None,
                league: None,
                home: format!("Team {}", idx % 12),
                away: format!("Team {}", (idx + 1) % 12),
                market: "Over 2.5".to_string(),
                odds,
                stake,
                settlement,
                profit: profit(settlement, odds, stake),
                manual: false,
            }
        })
        .collect()
}

fn bench_poisson_grid(c: &mut Criterion) {
    c.bench_function("poisson_grid", |b| {
        b.iter(|| {
            let probs = poisson_outcome_capped(black_box(1.5), black_box(1.0), black_box(5));
            black_box(probs.p_home);
        })
    });
}

fn bench_empirical_outcome(c: &mut Criterion) {
    let dataset = parse_dataset(MATCHES_CSV).expect("valid fixture csv");
    let home = dataset.home_slice("Serie A", "Flamengo");
    let away = dataset.away_slice("Serie A", "Palmeiras");
    c.bench_function("empirical_outcome", |b| {
        b.iter(|| {
            let probs = empirical_outcome(black_box(&home), black_box(&away));
            black_box(probs.p_home);
        })
    });
}

fn bench_profit_recompute(c: &mut Criterion) {
    let bets = sample_bets(1_000);
    c.bench_function("profit_recompute_1k", |b| {
        b.iter(|| {
            let mut rows = bets.clone();
            black_box(recompute_profits(&mut rows));
        })
    });
}

fn bench_performance_summary(c: &mut Criterion) {
    let bets = sample_bets(1_000);
    c.bench_function("performance_summary_1k", |b| {
        b.iter(|| {
            let perf = performance(black_box(&bets));
            black_box(perf.roi_pct());
            black_box(profit_curve(&bets).len());
        })
    });
}

fn bench_standings(c: &mut Criterion) {
    let dataset = parse_dataset(MATCHES_CSV).expect("valid fixture csv");
    let slice = dataset.division_slice("Serie A");
    c.bench_function("standings_compute", |b| {
        b.iter(|| {
            let rows = compute_standings(black_box(&slice), Venue::Overall);
            black_box(rows.len());
        })
    });
}

fn bench_csv_parse(c: &mut Criterion) {
    c.bench_function("matches_csv_parse", |b| {
        b.iter(|| {
            let dataset = parse_dataset(black_box(MATCHES_CSV)).unwrap();
            black_box(dataset.records.len());
        })
    });
}

criterion_group!(
    perf,
    bench_poisson_grid,
    bench_empirical_outcome,
    bench_profit_recompute,
    bench_performance_summary,
    bench_standings,
    bench_csv_parse
);
criterion_main!(perf);

static MATCHES_CSV: &str = include_str!("../tests/fixtures/matches_sample.csv");
