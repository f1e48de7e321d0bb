use crate::match_dataset::MatchRecord;

pub const DEFAULT_GOAL_CAP: u32 = 5;

/// Match-outcome probabilities, home perspective.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutcomeProbs {
    pub p_home: f64,
    pub p_draw: f64,
    pub p_away: f64,
}

impl OutcomeProbs {
    pub fn uniform() -> OutcomeProbs {
        OutcomeProbs {
            p_home: 1.0 / 3.0,
            p_draw: 1.0 / 3.0,
            p_away: 1.0 / 3.0,
        }
    }

    pub fn sum(&self) -> f64 {
        self.p_home + self.p_draw + self.p_away
    }
}

/// Empirical estimate from each side's own venue history: home-win rate over
/// the home side's home games, away-win rate over the away side's away games,
/// draw rate averaged across both, renormalized to a proper distribution.
/// With no games on either side there is nothing to rate - fall back to a
/// uniform split rather than divide by zero.
pub fn empirical_outcome(
    home_games: &[&MatchRecord],
    away_games: &[&MatchRecord],
) -> OutcomeProbs {
    if home_games.is_empty() && away_games.is_empty() {
        return OutcomeProbs::uniform();
    }

    let rate = |hits: usize, total: usize| {
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    };

    let home_wins = home_games.iter().filter(|m| m.home_won()).count();
    let home_draws = home_games.iter().filter(|m| m.drawn()).count();
    let away_wins = away_games.iter().filter(|m| m.away_won()).count();
    let away_draws = away_games.iter().filter(|m| m.drawn()).count();

    let raw_home = rate(home_wins, home_games.len());
    let raw_away = rate(away_wins, away_games.len());
    let raw_draw = if home_games.is_empty() {
        rate(away_draws, away_games.len())
    } else if away_games.is_empty() {
        rate(home_draws, home_games.len())
    } else {
        (rate(home_draws, home_games.len()) + rate(away_draws, away_games.len())) / 2.0
    };

    let sum = raw_home + raw_draw + raw_away;
    if sum <= 0.0 {
        return OutcomeProbs::uniform();
    }
    OutcomeProbs {
        p_home: raw_home / sum,
        p_draw: raw_draw / sum,
        p_away: raw_away / sum,
    }
}

/// Average full-time goals for the home side of a slice. Used to feed the
/// Poisson estimator from the scout slices.
pub fn mean_home_goals(games: &[&MatchRecord]) -> Option<f64> {
    if games.is_empty() {
        return None;
    }
    let total: i32 = games.iter().map(|m| m.home_goals_ft).sum();
    Some(total as f64 / games.len() as f64)
}

pub fn mean_away_goals(games: &[&MatchRecord]) -> Option<f64> {
    if games.is_empty() {
        return None;
    }
    let total: i32 = games.iter().map(|m| m.away_goals_ft).sum();
    Some(total as f64 / games.len() as f64)
}

/// Independent-Poisson scoreline model over the 0..=5 grid.
pub fn poisson_outcome(lambda_home: f64, lambda_away: f64) -> OutcomeProbs {
    poisson_outcome_capped(lambda_home, lambda_away, DEFAULT_GOAL_CAP)
}

/// Scoreline grid with an explicit goal cap. The grid is truncated, so the
/// three probabilities sum to slightly under 1; the missing mass is the
/// probability of either side scoring more than `cap` goals, which at
/// football lambdas is small. It is left missing on purpose - the cap is the
/// knob, not a renormalization.
pub fn poisson_outcome_capped(lambda_home: f64, lambda_away: f64, cap: u32) -> OutcomeProbs {
    let pmf_home = poisson_pmf(lambda_home, cap);
    let pmf_away = poisson_pmf(lambda_away, cap);

    let mut p_home = 0.0;
    let mut p_draw = 0.0;
    let mut p_away = 0.0;
    for (i, p_i) in pmf_home.iter().enumerate() {
        for (j, p_j) in pmf_away.iter().enumerate() {
            let p = p_i * p_j;
            if i > j {
                p_home += p;
            } else if j > i {
                p_away += p;
            } else {
                p_draw += p;
            }
        }
    }

    OutcomeProbs {
        p_home,
        p_draw,
        p_away,
    }
}

/// Poisson mass for k = 0..=max_k via the multiplicative recurrence. For
/// lambda = 0 the seed exp(0) = 1 puts all mass at k = 0, so the degenerate
/// case needs no special path.
pub fn poisson_pmf(lambda: f64, max_k: u32) -> Vec<f64> {
    let lambda = lambda.max(0.0);
    let mut out = vec![0.0; max_k as usize + 1];
    out[0] = (-lambda).exp();
    for k in 1..out.len() {
        out[k] = out[k - 1] * lambda / k as f64;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::match_dataset::MatchRecord;

    fn fixture(home_goals: i32, away_goals: i32) -> MatchRecord {
        MatchRecord {
            date: None,
            country: "Brasil".to_string(),
            division: "Serie A".to_string(),
            home: "H".to_string(),
            away: "A".to_string(),
            home_goals_ft: home_goals,
            away_goals_ft: away_goals,
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
    fn empirical_sums_to_one_with_history() {
        let home = [fixture(2, 0), fixture(1, 1), fixture(0, 3)];
        let away = [fixture(0, 1), fixture(2, 2)];
        let home_refs: Vec<&MatchRecord> = home.iter().collect();
        let away_refs: Vec<&MatchRecord> = away.iter().collect();
        let probs = empirical_outcome(&home_refs, &away_refs);
        assert!((probs.sum() - 1.0).abs() < 1e-9);
        assert!(probs.p_home > 0.0 && probs.p_away > 0.0 && probs.p_draw > 0.0);
    }

    #[test]
    fn empirical_empty_both_sides_is_uniform() {
        let probs = empirical_outcome(&[], &[]);
        assert_eq!(probs, OutcomeProbs::uniform());
    }

    #[test]
    fn empirical_one_empty_side_still_sums_to_one() {
        let home = [fixture(3, 1), fixture(2, 2)];
        let home_refs: Vec<&MatchRecord> = home.iter().collect();
        let probs = empirical_outcome(&home_refs, &[]);
        assert!((probs.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn poisson_zero_lambdas_is_certain_draw() {
        let probs = poisson_outcome(0.0, 0.0);
        assert_eq!(probs.p_draw, 1.0);
        assert_eq!(probs.p_home, 0.0);
        assert_eq!(probs.p_away, 0.0);
    }

    #[test]
    fn poisson_grid_mass_grows_with_cap() {
        let low = poisson_outcome_capped(1.5, 1.0, 5).sum();
        let high = poisson_outcome_capped(1.5, 1.0, 10).sum();
        assert!(low <= 1.0 + 1e-12);
        assert!(high <= 1.0 + 1e-12);
        assert!(high > low);
        assert!(1.0 - high < 1e-4);
    }

    #[test]
    fn poisson_higher_lambda_favors_that_side() {
        let probs = poisson_outcome(1.5, 1.0);
        assert!(probs.p_home > probs.p_away);
    }
}
