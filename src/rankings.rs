use std::collections::HashMap;

use crate::match_dataset::MatchRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Venue {
    Overall,
    HomeOnly,
    AwayOnly,
}

impl Venue {
    pub fn label(self) -> &'static str {
        match self {
            Venue::Overall => "Overall",
            Venue::HomeOnly => "Home",
            Venue::AwayOnly => "Away",
        }
    }

    pub fn cycled(self) -> Venue {
        match self {
            Venue::Overall => Venue::HomeOnly,
            Venue::HomeOnly => Venue::AwayOnly,
            Venue::AwayOnly => Venue::Overall,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StandingRow {
    pub team: String,
    pub played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub goals_for: i32,
    pub goals_against: i32,
    pub points: u32,
}

impl StandingRow {
    fn new(team: &str) -> StandingRow {
        StandingRow {
            team: team.to_string(),
            played: 0,
            wins: 0,
            draws: 0,
            losses: 0,
            goals_for: 0,
            goals_against: 0,
            points: 0,
        }
    }

    pub fn goal_diff(&self) -> i32 {
        self.goals_for - self.goals_against
    }

    fn record(&mut self, scored: i32, conceded: i32) {
        self.played += 1;
        self.goals_for += scored;
        self.goals_against += conceded;
        if scored > conceded {
            self.wins += 1;
            self.points += 3;
        } else if scored == conceded {
            self.draws += 1;
            self.points += 1;
        } else {
            self.losses += 1;
        }
    }
}

/// Accumulate a points table (win 3, draw 1) over one division's fixtures,
/// optionally counting only home or only away participation. Teams with no
/// qualifying games simply do not appear. Ordering is deterministic: points,
/// then goal difference, then name.
pub fn compute_standings(records: &[&MatchRecord], venue: Venue) -> Vec<StandingRow> {
    let mut table: HashMap<String, StandingRow> = HashMap::new();

    for m in records {
        if matches!(venue, Venue::Overall | Venue::HomeOnly) {
            table
                .entry(m.home.clone())
                .or_insert_with(|| StandingRow::new(&m.home))
                .record(m.home_goals_ft, m.away_goals_ft);
        }
        if matches!(venue, Venue::Overall | Venue::AwayOnly) {
            table
                .entry(m.away.clone())
                .or_insert_with(|| StandingRow::new(&m.away))
                .record(m.away_goals_ft, m.home_goals_ft);
        }
    }

    let mut rows: Vec<StandingRow> = table.into_values().collect();
    rows.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then(b.goal_diff().cmp(&a.goal_diff()))
            .then(a.team.cmp(&b.team))
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(home: &str, away: &str, hg: i32, ag: i32) -> MatchRecord {
        MatchRecord {
            date: None,
            country: "Brasil".to_string(),
            division: "Serie A".to_string(),
            home: home.to_string(),
            away: away.to_string(),
            home_goals_ft: hg,
            away_goals_ft: ag,
            home_goals_ht: None,
            away_goals_ht: None,
            home_corners: None,
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
    fn two_home_wins_top_a_small_home_table() {
        let matches = [
            fixture("Atlas", "Borba", 2, 0),
            fixture("Atlas", "Cruz", 1, 0),
            fixture("Borba", "Atlas", 1, 1),
            fixture("Cruz", "Borba", 0, 2),
        ];
        let refs: Vec<&MatchRecord> = matches.iter().collect();
        let rows = compute_standings(&refs, Venue::HomeOnly);
        assert_eq!(rows[0].team, "Atlas");
        assert_eq!(rows[0].points, 6);
        assert_eq!(rows[0].played, 2);
    }

    #[test]
    fn away_only_excludes_home_only_teams() {
        let matches = [fixture("Atlas", "Borba", 0, 3)];
        let refs: Vec<&MatchRecord> = matches.iter().collect();
        let rows = compute_standings(&refs, Venue::AwayOnly);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].team, "Borba");
        assert_eq!(rows[0].points, 3);
    }

    #[test]
    fn ties_break_by_goal_diff_then_name() {
        let matches = [
            fixture("Zeta", "Cruz", 2, 0),
            fixture("Alfa", "Cruz", 2, 0),
        ];
        let refs: Vec<&MatchRecord> = matches.iter().collect();
        let rows = compute_standings(&refs, Venue::HomeOnly);
        // Equal points and goal difference: alphabetical.
        assert_eq!(rows[0].team, "Alfa");
        assert_eq!(rows[1].team, "Zeta");
    }

    #[test]
    fn overall_counts_both_sides() {
        let matches = [fixture("Atlas", "Borba", 1, 1)];
        let refs: Vec<&MatchRecord> = matches.iter().collect();
        let rows = compute_standings(&refs, Venue::Overall);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.points == 1 && r.draws == 1));
    }
}
