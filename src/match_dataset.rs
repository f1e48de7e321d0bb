use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;

/// One historical fixture from the stats CSV. Reference data only: loaded
/// once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct MatchRecord {
    pub date: Option<NaiveDate>,
    pub country: String,
    pub division: String,
    pub home: String,
    pub away: String,
    pub home_goals_ft: i32,
    pub away_goals_ft: i32,
    pub home_goals_ht: Option<i32>,
    pub away_goals_ht: Option<i32>,
    pub home_corners: Option<f64>,
    pub away_corners: Option<f64>,
    pub home_shots: Option<f64>,
    pub away_shots: Option<f64>,
    pub home_shots_on_target: Option<f64>,
    pub away_shots_on_target: Option<f64>,
    pub home_yellow_cards: Option<f64>,
    pub away_yellow_cards: Option<f64>,
}

impl MatchRecord {
    pub fn home_won(&self) -> bool {
        self.home_goals_ft > self.away_goals_ft
    }

    pub fn away_won(&self) -> bool {
        self.away_goals_ft > self.home_goals_ft
    }

    pub fn drawn(&self) -> bool {
        self.home_goals_ft == self.away_goals_ft
    }
}

#[derive(Debug, Clone, Default)]
pub struct MatchDataset {
    pub records: Vec<MatchRecord>,
    /// Rows dropped because the goals columns were unusable.
    pub skipped_rows: usize,
}

impl MatchDataset {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn countries(&self) -> Vec<String> {
        sorted_unique(self.records.iter().map(|r| r.country.as_str()))
    }

    pub fn divisions(&self, country: &str) -> Vec<String> {
        sorted_unique(
            self.records
                .iter()
                .filter(|r| r.country == country)
                .map(|r| r.division.as_str()),
        )
    }

    /// Teams appearing as the home side of a division. The selection widgets
    /// key off home appearances, matching how entries were filtered upstream.
    pub fn teams(&self, division: &str) -> Vec<String> {
        sorted_unique(
            self.records
                .iter()
                .filter(|r| r.division == division)
                .map(|r| r.home.as_str()),
        )
    }

    pub fn division_slice(&self, division: &str) -> Vec<&MatchRecord> {
        self.records
            .iter()
            .filter(|r| r.division == division)
            .collect()
    }

    /// Fixtures where `team` played at home in `division`.
    pub fn home_slice(&self, division: &str, team: &str) -> Vec<&MatchRecord> {
        self.records
            .iter()
            .filter(|r| r.division == division && r.home == team)
            .collect()
    }

    /// Fixtures where `team` played away in `division`.
    pub fn away_slice(&self, division: &str, team: &str) -> Vec<&MatchRecord> {
        self.records
            .iter()
            .filter(|r| r.division == division && r.away == team)
            .collect()
    }
}

fn sorted_unique<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let set: BTreeSet<&str> = values.filter(|v| !v.is_empty()).collect();
    set.into_iter().map(|v| v.to_string()).collect()
}

/// Load the historical dataset. A missing file is the expected "no data yet"
/// case and yields an empty dataset; a file that exists but cannot be read
/// or lacks the required columns is a real error and is reported as one.
pub fn load_dataset(path: &Path) -> Result<MatchDataset> {
    if !path.exists() {
        return Ok(MatchDataset::default());
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read match csv {}", path.display()))?;
    parse_dataset(&raw)
}

pub fn parse_dataset(raw: &str) -> Result<MatchDataset> {
    let mut lines = raw.lines().filter(|l| !l.trim().is_empty());
    let Some(header_line) = lines.next() else {
        return Ok(MatchDataset::default());
    };
    let header_line = header_line.trim_start_matches('\u{feff}');

    let sep = sniff_separator(header_line);
    let headers: Vec<String> = split_row(header_line, sep)
        .iter()
        .map(|h| normalize_header(h))
        .collect();
    let cols = ColumnIndex::resolve(&headers)?;

    let mut records = Vec::new();
    let mut skipped_rows = 0usize;
    for line in lines {
        let fields = split_row(line, sep);
        match cols.parse_row(&fields) {
            Some(record) => records.push(record),
            None => skipped_rows += 1,
        }
    }

    Ok(MatchDataset {
        records,
        skipped_rows,
    })
}

/// Pick the delimiter with the most hits in the header row.
fn sniff_separator(header: &str) -> char {
    let candidates = [';', ',', '\t'];
    let mut best = (',', 0usize);
    for sep in candidates {
        let count = header.matches(sep).count();
        if count > best.1 {
            best = (sep, count);
        }
    }
    best.0
}

fn normalize_header(raw: &str) -> String {
    raw.trim().to_lowercase().replace(' ', "_")
}

/// Minimal delimited-row splitter with double-quote support. Enough for the
/// exports this tracker ingests; not a general CSV parser.
fn split_row(line: &str, sep: char) -> Vec<String> {
    let mut out = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(ch);
            }
        } else if ch == '"' {
            in_quotes = true;
        } else if ch == sep {
            out.push(std::mem::take(&mut field));
        } else {
            field.push(ch);
        }
    }
    out.push(field);
    out
}

struct ColumnIndex {
    date: Option<usize>,
    country: usize,
    division: usize,
    home: usize,
    away: usize,
    home_goals_ft: usize,
    away_goals_ft: usize,
    home_goals_ht: Option<usize>,
    away_goals_ht: Option<usize>,
    home_corners: Option<usize>,
    away_corners: Option<usize>,
    home_shots: Option<usize>,
    away_shots: Option<usize>,
    home_shots_on_target: Option<usize>,
    away_shots_on_target: Option<usize>,
    home_yellow_cards: Option<usize>,
    away_yellow_cards: Option<usize>,
}

impl ColumnIndex {
    fn resolve(headers: &[String]) -> Result<ColumnIndex> {
        // Header aliases cover both the tracker's own exports (Portuguese)
        // and the football-data style of column naming.
        Ok(ColumnIndex {
            date: find(headers, &["data", "date"]),
            country: require(headers, &["pais", "country"])?,
            division: require(headers, &["divisao", "division", "div", "liga", "league"])?,
            home: require(headers, &["mandante", "home", "home_team", "hometeam"])?,
            away: require(headers, &["visitante", "away", "away_team", "awayteam"])?,
            home_goals_ft: require(headers, &["gols_mandante_ft", "fthg", "home_goals_ft"])?,
            away_goals_ft: require(headers, &["gols_visitante_ft", "ftag", "away_goals_ft"])?,
            home_goals_ht: find(headers, &["gols_mandante_ht", "hthg", "home_goals_ht"]),
            away_goals_ht: find(headers, &["gols_visitante_ht", "htag", "away_goals_ht"]),
            home_corners: find(headers, &["mandante_cantos", "hc", "home_corners"]),
            away_corners: find(headers, &["visitante_cantos", "ac", "away_corners"]),
            home_shots: find(headers, &["mandante_finalizacoes", "hs", "home_shots"]),
            away_shots: find(headers, &["visitante_finalizacoes", "as", "away_shots"]),
            home_shots_on_target: find(
                headers,
                &["mandante_chute_ao_gol", "hst", "home_shots_on_target"],
            ),
            away_shots_on_target: find(
                headers,
                &["visitante_chute_ao_gol", "ast", "away_shots_on_target"],
            ),
            home_yellow_cards: find(
                headers,
                &["mandante_cartao_amarelo", "hy", "home_yellow_cards"],
            ),
            away_yellow_cards: find(
                headers,
                &["visitante_cartao_amarelo", "ay", "away_yellow_cards"],
            ),
        })
    }

    fn parse_row(&self, fields: &[String]) -> Option<MatchRecord> {
        let text = |idx: usize| fields.get(idx).map(|f| f.trim().to_string());
        let home = text(self.home)?;
        let away = text(self.away)?;
        if home.is_empty() || away.is_empty() {
            return None;
        }
        let home_goals_ft = parse_count(fields.get(self.home_goals_ft)?)?;
        let away_goals_ft = parse_count(fields.get(self.away_goals_ft)?)?;

        let opt_count = |idx: Option<usize>| idx.and_then(|i| fields.get(i)).and_then(|f| parse_count(f));
        let opt_stat = |idx: Option<usize>| idx.and_then(|i| fields.get(i)).and_then(|f| parse_stat(f));

        Some(MatchRecord {
            date: self
                .date
                .and_then(|i| fields.get(i))
                .and_then(|f| parse_date(f)),
            country: text(self.country).unwrap_or_default(),
            division: text(self.division).unwrap_or_default(),
            home,
            away,
            home_goals_ft,
            away_goals_ft,
            home_goals_ht: opt_count(self.home_goals_ht),
            away_goals_ht: opt_count(self.away_goals_ht),
            home_corners: opt_stat(self.home_corners),
            away_corners: opt_stat(self.away_corners),
            home_shots: opt_stat(self.home_shots),
            away_shots: opt_stat(self.away_shots),
            home_shots_on_target: opt_stat(self.home_shots_on_target),
            away_shots_on_target: opt_stat(self.away_shots_on_target),
            home_yellow_cards: opt_stat(self.home_yellow_cards),
            away_yellow_cards: opt_stat(self.away_yellow_cards),
        })
    }
}

fn find(headers: &[String], names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.iter().any(|n| h == n))
}

fn require(headers: &[String], names: &[&str]) -> Result<usize> {
    find(headers, names).ok_or_else(|| anyhow!("csv missing required column {:?}", names[0]))
}

fn parse_count(raw: &str) -> Option<i32> {
    let s = raw.trim();
    if s.is_empty() || s == "-" {
        return None;
    }
    // Some exports carry goal counts as "2.0".
    parse_stat(s).map(|v| v.round() as i32)
}

fn parse_stat(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() || s == "-" {
        return None;
    }
    if let Ok(v) = s.parse::<f64>() {
        return Some(v);
    }
    // Decimal-comma exports.
    s.replace(',', ".").parse::<f64>().ok()
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    // Timestamp exports come through as "2025-08-17 16:00:00".
    let s = s.split_whitespace().next().unwrap_or(s);
    for fmt in ["%Y-%m-%d", "%d/%m/%Y", "%d/%m/%y"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_semicolon_over_comma() {
        assert_eq!(sniff_separator("a;b;c"), ';');
        assert_eq!(sniff_separator("a,b,c"), ',');
        assert_eq!(sniff_separator("a\tb\tc"), '\t');
    }

    #[test]
    fn normalizes_headers() {
        assert_eq!(normalize_header("  Gols Mandante FT "), "gols_mandante_ft");
    }

    #[test]
    fn split_row_handles_quoted_separator() {
        let fields = split_row(r#"one,"two, half",three"#, ',');
        assert_eq!(fields, vec!["one", "two, half", "three"]);
    }

    #[test]
    fn parse_stat_accepts_decimal_comma() {
        assert_eq!(parse_stat("1,5"), Some(1.5));
        assert_eq!(parse_stat("1.5"), Some(1.5));
        assert_eq!(parse_stat("-"), None);
    }

    #[test]
    fn parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 8, 17).unwrap();
        assert_eq!(parse_date("2025-08-17"), Some(expected));
        assert_eq!(parse_date("17/08/2025"), Some(expected));
        assert_eq!(parse_date("2025-08-17 16:00:00"), Some(expected));
    }

    #[test]
    fn missing_file_is_empty_dataset() {
        let dataset = load_dataset(Path::new("definitely/not/here.csv")).unwrap();
        assert!(dataset.is_empty());
        assert_eq!(dataset.skipped_rows, 0);
    }

    #[test]
    fn rows_without_goals_are_skipped() {
        let raw = "pais;divisao;mandante;visitante;gols_mandante_ft;gols_visitante_ft\n\
                   Brasil;Serie A;Flamengo;Santos;2;1\n\
                   Brasil;Serie A;Santos;Flamengo;;\n";
        let dataset = parse_dataset(raw).unwrap();
        assert_eq!(dataset.records.len(), 1);
        assert_eq!(dataset.skipped_rows, 1);
        assert!(dataset.records[0].home_won());
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let raw = "pais;divisao;mandante;gols_mandante_ft;gols_visitante_ft\nBrasil;A;X;1;0\n";
        assert!(parse_dataset(raw).is_err());
    }
}
