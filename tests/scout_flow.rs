use std::fs;
use std::path::PathBuf;

use banca_terminal::match_dataset::parse_dataset;
use banca_terminal::outcome::{self, poisson_outcome, poisson_outcome_capped};
use banca_terminal::rankings::{Venue, compute_standings};
use banca_terminal::scout::{Side, recent_form, team_averages};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn empirical_estimate_from_fixture_slices() {
    let dataset = parse_dataset(&read_fixture("matches_sample.csv")).expect("fixture should parse");
    let home = dataset.home_slice("Serie A", "Flamengo");
    let away = dataset.away_slice("Serie A", "Palmeiras");

    let probs = outcome::empirical_outcome(&home, &away);
    assert!((probs.sum() - 1.0).abs() < 1e-9);
    // Flamengo is unbeaten at home in the fixture; it should be favored.
    assert!(probs.p_home > probs.p_away);
    assert!((probs.p_home - 4.0 / 7.0).abs() < 1e-9);
}

#[test]
fn empirical_estimate_for_unknown_teams_is_uniform() {
    let dataset = parse_dataset(&read_fixture("matches_sample.csv")).expect("fixture should parse");
    let home = dataset.home_slice("Serie A", "Nonexistent FC");
    let away = dataset.away_slice("Serie A", "Ghost United");
    let probs = outcome::empirical_outcome(&home, &away);
    assert!((probs.p_home - probs.p_away).abs() < 1e-9);
    assert!((probs.sum() - 1.0).abs() < 1e-9);
}

#[test]
fn poisson_from_fixture_goal_means() {
    let dataset = parse_dataset(&read_fixture("matches_sample.csv")).expect("fixture should parse");
    let home = dataset.home_slice("Serie A", "Flamengo");
    let away = dataset.away_slice("Serie A", "Palmeiras");

    let lambda_home = outcome::mean_home_goals(&home).expect("flamengo has home games");
    let lambda_away = outcome::mean_away_goals(&away).expect("palmeiras has away games");
    assert!((lambda_home - 2.0).abs() < 1e-9);
    assert!((lambda_away - 1.0).abs() < 1e-9);

    let probs = poisson_outcome(lambda_home, lambda_away);
    assert!(probs.p_home > probs.p_away);
    assert!(probs.sum() <= 1.0 + 1e-12);

    // The truncated grid converges toward a full distribution as the cap
    // grows.
    let wider = poisson_outcome_capped(lambda_home, lambda_away, 12);
    assert!(wider.sum() > probs.sum());
}

#[test]
fn standings_from_fixture_division() {
    let dataset = parse_dataset(&read_fixture("matches_sample.csv")).expect("fixture should parse");
    let slice = dataset.division_slice("Serie A");

    let overall = compute_standings(&slice, Venue::Overall);
    assert_eq!(overall.len(), 4);
    assert_eq!(overall[0].team, "Flamengo");
    assert_eq!(overall[0].points, 7);
    assert_eq!(overall[1].team, "Santos");
    // Palmeiras and Gremio are level on points; goal difference decides.
    assert_eq!(overall[2].team, "Palmeiras");
    assert_eq!(overall[2].goal_diff(), -1);
    assert_eq!(overall[3].team, "Gremio");
    assert_eq!(overall[3].goal_diff(), -2);

    let home_only = compute_standings(&slice, Venue::HomeOnly);
    assert_eq!(home_only[0].team, "Flamengo");
    assert_eq!(home_only[0].played, 3);
    assert_eq!(home_only[0].points, 7);
    // Palmeiras never plays at home in the fixture and must not appear.
    assert!(home_only.iter().all(|r| r.team != "Palmeiras"));
}

#[test]
fn averages_and_form_from_fixture() {
    let dataset = parse_dataset(&read_fixture("matches_sample.csv")).expect("fixture should parse");
    let home = dataset.home_slice("Serie A", "Flamengo");

    let avg = team_averages(&home, Side::Home);
    assert_eq!(avg.games, 3);
    assert!((avg.goals_ft - 2.0).abs() < 1e-9);
    assert!((avg.corners.unwrap() - 19.0 / 3.0).abs() < 1e-9);

    let form = recent_form(&home, Side::Home, 5);
    assert_eq!(form.len(), 3);
    // Newest first: the 3-0 over Gremio leads the strip.
    assert_eq!(form[0].opponent, "Gremio");
    assert_eq!(form[0].mark(), 'W');
    assert_eq!(form[2].mark(), 'W');
}
