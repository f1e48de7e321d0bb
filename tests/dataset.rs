use std::fs;
use std::path::PathBuf;

use banca_terminal::match_dataset::parse_dataset;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_sample_csv() {
    let dataset = parse_dataset(&read_fixture("matches_sample.csv")).expect("fixture should parse");
    // One row has empty goals columns and is dropped.
    assert_eq!(dataset.records.len(), 7);
    assert_eq!(dataset.skipped_rows, 1);
}

#[test]
fn headers_are_normalized_and_coerced() {
    let dataset = parse_dataset(&read_fixture("matches_sample.csv")).expect("fixture should parse");
    let first = &dataset.records[0];
    assert_eq!(first.country, "Brasil");
    assert_eq!(first.division, "Serie A");
    assert_eq!(first.home, "Flamengo");
    assert_eq!(first.home_goals_ft, 2);
    assert_eq!(first.home_goals_ht, Some(1));
    assert_eq!(first.home_corners, Some(6.0));
    assert_eq!(first.away_shots_on_target, Some(3.0));
    assert!(first.date.is_some());
}

#[test]
fn cascading_selections_from_fixture() {
    let dataset = parse_dataset(&read_fixture("matches_sample.csv")).expect("fixture should parse");
    assert_eq!(dataset.countries(), vec!["Brasil", "Portugal"]);
    assert_eq!(dataset.divisions("Brasil"), vec!["Serie A"]);
    assert_eq!(dataset.divisions("Portugal"), vec!["Primeira"]);

    let teams = dataset.teams("Serie A");
    assert_eq!(teams, vec!["Flamengo", "Gremio", "Santos"]);
}

#[test]
fn venue_slices_pick_the_right_games() {
    let dataset = parse_dataset(&read_fixture("matches_sample.csv")).expect("fixture should parse");
    let flamengo_home = dataset.home_slice("Serie A", "Flamengo");
    assert_eq!(flamengo_home.len(), 3);
    assert!(flamengo_home.iter().all(|m| m.home == "Flamengo"));

    let palmeiras_away = dataset.away_slice("Serie A", "Palmeiras");
    assert_eq!(palmeiras_away.len(), 3);
    assert!(palmeiras_away.iter().all(|m| m.away == "Palmeiras"));
}

#[test]
fn comma_separated_english_headers_also_load() {
    let raw = "Date,Country,Division,HomeTeam,AwayTeam,FTHG,FTAG\n\
               2025-01-05,England,Premier,Arsenal,Chelsea,2,2\n";
    let dataset = parse_dataset(raw).expect("english headers should parse");
    assert_eq!(dataset.records.len(), 1);
    assert!(dataset.records[0].drawn());
    assert_eq!(dataset.records[0].home_corners, None);
}
