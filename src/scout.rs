use chrono::NaiveDate;

use crate::match_dataset::MatchRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Home,
    Away,
}

/// Per-side descriptive averages for the comparison table. Optional stats
/// average over the rows that carry them and stay `None` when no row does.
#[derive(Debug, Clone, Default)]
pub struct TeamAverages {
    pub games: usize,
    pub goals_ft: f64,
    pub goals_ht: Option<f64>,
    pub corners: Option<f64>,
    pub shots: Option<f64>,
    pub shots_on_target: Option<f64>,
    pub yellow_cards: Option<f64>,
}

pub fn team_averages(games: &[&MatchRecord], side: Side) -> TeamAverages {
    if games.is_empty() {
        return TeamAverages::default();
    }

    let goals: i32 = games
        .iter()
        .map(|m| match side {
            Side::Home => m.home_goals_ft,
            Side::Away => m.away_goals_ft,
        })
        .sum();

    let mean_count = |pick: fn(&MatchRecord) -> Option<i32>| -> Option<f64> {
        let values: Vec<i32> = games.iter().filter_map(|m| pick(m)).collect();
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<i32>() as f64 / values.len() as f64)
        }
    };
    let mean_stat = |pick: fn(&MatchRecord) -> Option<f64>| -> Option<f64> {
        let values: Vec<f64> = games.iter().filter_map(|m| pick(m)).collect();
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    };

    match side {
        Side::Home => TeamAverages {
            games: games.len(),
            goals_ft: goals as f64 / games.len() as f64,
            goals_ht: mean_count(|m| m.home_goals_ht),
            corners: mean_stat(|m| m.home_corners),
            shots: mean_stat(|m| m.home_shots),
            shots_on_target: mean_stat(|m| m.home_shots_on_target),
            yellow_cards: mean_stat(|m| m.home_yellow_cards),
        },
        Side::Away => TeamAverages {
            games: games.len(),
            goals_ft: goals as f64 / games.len() as f64,
            goals_ht: mean_count(|m| m.away_goals_ht),
            corners: mean_stat(|m| m.away_corners),
            shots: mean_stat(|m| m.away_shots),
            shots_on_target: mean_stat(|m| m.away_shots_on_target),
            yellow_cards: mean_stat(|m| m.away_yellow_cards),
        },
    }
}

#[derive(Debug, Clone)]
pub struct FormEntry {
    pub date: Option<NaiveDate>,
    pub opponent: String,
    pub scored: i32,
    pub conceded: i32,
}

impl FormEntry {
    pub fn mark(&self) -> char {
        if self.scored > self.conceded {
            'W'
        } else if self.scored == self.conceded {
            'D'
        } else {
            'L'
        }
    }
}

/// Most recent qualifying fixtures, newest first. Undated rows sort last so
/// a partially dated CSV still produces a sensible form strip.
pub fn recent_form(games: &[&MatchRecord], side: Side, limit: usize) -> Vec<FormEntry> {
    let mut ordered: Vec<&&MatchRecord> = games.iter().collect();
    ordered.sort_by(|a, b| b.date.cmp(&a.date));

    ordered
        .into_iter()
        .take(limit)
        .map(|m| match side {
            Side::Home => FormEntry {
                date: m.date,
                opponent: m.away.clone(),
                scored: m.home_goals_ft,
                conceded: m.away_goals_ft,
            },
            Side::Away => FormEntry {
                date: m.date,
                opponent: m.home.clone(),
                scored: m.away_goals_ft,
                conceded: m.home_goals_ft,
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(day: Option<u32>, hg: i32, ag: i32, corners: Option<f64>) -> MatchRecord {
        MatchRecord {
            date: day.and_then(|d| NaiveDate::from_ymd_opt(2026, 4, d)),
            country: "Brasil".to_string(),
            division: "Serie A".to_string(),
            home: "Atlas".to_string(),
            away: "Borba".to_string(),
            home_goals_ft: hg,
            away_goals_ft: ag,
            home_goals_ht: None,
            away_goals_ht: None,
            home_corners: corners,
            away_corners: None,
            home_shots: None,
            away_shots: None,
            home_shots_on_target: None,
            away_shots_on_target: None,
            home_yellow_cards: None,
            away_yellow_cards: None,
        }
    }

    #[test]
    fn averages_skip_missing_stat_rows() {
        let games = [
            fixture(Some(1), 2, 0, Some(6.0)),
            fixture(Some(2), 1, 1, None),
        ];
        let refs: Vec<&MatchRecord> = games.iter().collect();
        let avg = team_averages(&refs, Side::Home);
        assert_eq!(avg.games, 2);
        assert!((avg.goals_ft - 1.5).abs() < 1e-9);
        assert_eq!(avg.corners, Some(6.0));
        assert_eq!(avg.shots, None);
    }

    #[test]
    fn empty_slice_yields_default() {
        let avg = team_averages(&[], Side::Away);
        assert_eq!(avg.games, 0);
        assert_eq!(avg.goals_ft, 0.0);
    }

    #[test]
    fn form_is_newest_first_and_capped() {
        let games = [
            fixture(Some(1), 0, 2, None),
            fixture(Some(9), 3, 1, None),
            fixture(None, 1, 1, None),
            fixture(Some(5), 2, 2, None),
        ];
        let refs: Vec<&MatchRecord> = games.iter().collect();
        let form = recent_form(&refs, Side::Home, 3);
        assert_eq!(form.len(), 3);
        assert_eq!(form[0].mark(), 'W');
        assert_eq!(form[1].mark(), 'D');
        assert_eq!(form[2].mark(), 'L');
        assert_eq!(form[0].date, NaiveDate::from_ymd_opt(2026, 4, 9));
    }

    #[test]
    fn away_form_swaps_perspective() {
        let games = [fixture(Some(1), 0, 2, None)];
        let refs: Vec<&MatchRecord> = games.iter().collect();
        let form = recent_form(&refs, Side::Away, 5);
        assert_eq!(form[0].mark(), 'W');
        assert_eq!(form[0].opponent, "Atlas");
    }
}
