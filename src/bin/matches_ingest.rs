use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::{Field, Row};

use banca_terminal::match_dataset;

/// Convert a columnar matches dataset into the CSV the app loads.
///
///   matches_ingest --in matches.parquet [--out matches.csv]
///
/// Column names vary between dataset dumps, so fields are resolved by name
/// with the same alias approach the CSV loader uses.
fn main() -> Result<()> {
    let in_path = parse_path_arg("--in").ok_or_else(|| {
        anyhow!("usage: matches_ingest --in matches.parquet [--out matches.csv]")
    })?;
    let out_path = parse_path_arg("--out").unwrap_or_else(|| PathBuf::from("matches.csv"));

    let file = fs::File::open(&in_path)
        .with_context(|| format!("open {}", in_path.display()))?;
    let reader = SerializedFileReader::new(file).context("open parquet reader")?;
    let iter = reader.get_row_iter(None).context("iterate match rows")?;

    let mut lines = vec![
        "date,country,division,home,away,home_goals_ft,away_goals_ft,\
         home_goals_ht,away_goals_ht,home_corners,away_corners,home_shots,away_shots,\
         home_shots_on_target,away_shots_on_target,home_yellow_cards,away_yellow_cards"
            .to_string(),
    ];
    let mut skipped = 0usize;

    for row in iter {
        let Ok(row) = row else {
            skipped += 1;
            continue;
        };
        let cols = column_map(&row);
        match csv_line(&cols) {
            Some(line) => lines.push(line),
            None => skipped += 1,
        }
    }

    let body = lines.join("\n") + "\n";
    // Round-trip through the loader before writing, so a bad dump fails
    // here instead of at app startup.
    let dataset = match_dataset::parse_dataset(&body)?;
    fs::write(&out_path, body)
        .with_context(|| format!("write {}", out_path.display()))?;

    println!("Matches ingest complete");
    println!("Input: {}", in_path.display());
    println!("Output: {}", out_path.display());
    println!("Rows written: {}", dataset.records.len());
    println!("Rows skipped: {}", skipped + dataset.skipped_rows);
    Ok(())
}

fn column_map(row: &Row) -> HashMap<String, Field> {
    row.get_column_iter()
        .map(|(name, field)| (name.to_lowercase(), field.clone()))
        .collect()
}

fn csv_line(cols: &HashMap<String, Field>) -> Option<String> {
    let country = field_str(cols, &["country", "pais"]).unwrap_or_default();
    let division = field_str(cols, &["division", "competition", "league", "divisao"])?;
    let home = field_str(cols, &["home", "home_team", "home_name", "mandante"])?;
    let away = field_str(cols, &["away", "away_team", "away_name", "visitante"])?;
    let home_goals = field_num(cols, &["home_goals", "home_score", "fthg"])?;
    let away_goals = field_num(cols, &["away_goals", "away_score", "ftag"])?;

    let date = field_str(cols, &["date", "utc_time", "kickoff", "data"]).unwrap_or_default();
    let date = date.split_whitespace().next().unwrap_or("").to_string();
    let date = date.split('T').next().unwrap_or("").to_string();

    let opt = |names: &[&str]| {
        field_num(cols, names)
            .map(|v| format!("{v}"))
            .unwrap_or_default()
    };

    Some(
        [
            date,
            country,
            division,
            home,
            away,
            format!("{}", home_goals.round() as i64),
            format!("{}", away_goals.round() as i64),
            opt(&["home_goals_ht", "ht_home_goals", "hthg"]),
            opt(&["away_goals_ht", "ht_away_goals", "htag"]),
            opt(&["home_corners", "hc"]),
            opt(&["away_corners", "ac"]),
            opt(&["home_shots", "hs"]),
            opt(&["away_shots", "as"]),
            opt(&["home_shots_on_target", "hst"]),
            opt(&["away_shots_on_target", "ast"]),
            opt(&["home_yellow_cards", "hy"]),
            opt(&["away_yellow_cards", "ay"]),
        ]
        .iter()
        .map(|f| quote_csv(f))
        .collect::<Vec<_>>()
        .join(","),
    )
}

fn field_str(cols: &HashMap<String, Field>, names: &[&str]) -> Option<String> {
    for name in names {
        if let Some(Field::Str(s)) = cols.get(*name) {
            let s = s.trim();
            if !s.is_empty() {
                return Some(s.to_string());
            }
        }
    }
    None
}

fn field_num(cols: &HashMap<String, Field>, names: &[&str]) -> Option<f64> {
    for name in names {
        match cols.get(*name) {
            Some(Field::Double(v)) => return Some(*v),
            Some(Field::Float(v)) => return Some(*v as f64),
            Some(Field::Long(v)) => return Some(*v as f64),
            Some(Field::Int(v)) => return Some(*v as f64),
            Some(Field::Str(s)) => {
                if let Ok(v) = s.trim().parse::<f64>() {
                    return Some(v);
                }
            }
            _ => {}
        }
    }
    None
}

fn quote_csv(field: &str) -> String {
    if field.contains(',') || field.contains('"') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
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
