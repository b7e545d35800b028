//! Prediction scoring
//!
//! Converts a stored prediction plus an official result into a point
//! value. The calculation is pure and deterministic: the re-scoring
//! sweep relies on re-running it for every prediction of a match
//! whenever a result is (re)confirmed.

use crate::validate::parse_score;
use serde::{Deserialize, Serialize};

/// Outcome of a score, seen from the fixture's perspective.
///
/// Computed once per score and used to build the offered winner choices,
/// instead of string-matching button payloads downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WinnerChoice {
    Home,
    Away,
    Draw,
}

impl WinnerChoice {
    pub fn from_goals(home: u32, away: u32) -> Self {
        if home == away {
            WinnerChoice::Draw
        } else if home > away {
            WinnerChoice::Home
        } else {
            WinnerChoice::Away
        }
    }

    /// The label offered to (and stored for) users for this outcome.
    pub fn label<'a>(self, home: &'a str, away: &'a str, draw_label: &'a str) -> &'a str {
        match self {
            WinnerChoice::Home => home,
            WinnerChoice::Away => away,
            WinnerChoice::Draw => draw_label,
        }
    }
}

/// Points awarded per outcome class, plus the label that marks a draw.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringRules {
    pub exact_score: i64,
    pub correct_winner: i64,
    pub partial_score: i64,
    pub draw_label: String,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            exact_score: 5,
            correct_winner: 3,
            partial_score: 1,
            draw_label: "Draw".to_string(),
        }
    }
}

impl ScoringRules {
    /// Score one prediction against the official result.
    ///
    /// First matching rule wins: exact score string, correct winner
    /// label, one goal count right on the same side, nothing. Empty or
    /// unparseable inputs degrade to zero points rather than an error,
    /// so a malformed stored value can never fail a sweep.
    pub fn calculate_points(
        &self,
        predicted_score: &str,
        predicted_winner: &str,
        actual_score: &str,
        home: &str,
        away: &str,
    ) -> i64 {
        if predicted_score.is_empty()
            || predicted_winner.is_empty()
            || actual_score.is_empty()
            || home.is_empty()
            || away.is_empty()
        {
            return 0;
        }
        if predicted_score == actual_score {
            return self.exact_score;
        }
        let (Some((pred_home, pred_away)), Some((actual_home, actual_away))) =
            (parse_score(predicted_score), parse_score(actual_score))
        else {
            return 0;
        };
        let actual_winner =
            WinnerChoice::from_goals(actual_home, actual_away).label(home, away, &self.draw_label);
        if predicted_winner == actual_winner {
            return self.correct_winner;
        }
        if pred_home == actual_home || pred_away == actual_away {
            return self.partial_score;
        }
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> ScoringRules {
        ScoringRules::default()
    }

    #[test]
    fn exact_score_wins_outright() {
        assert_eq!(
            rules().calculate_points("2-1", "TeamA", "2-1", "TeamA", "TeamB"),
            5
        );
    }

    #[test]
    fn exact_score_ignores_the_winner_label() {
        // Whatever label the prediction stored for the winner, an exact
        // score string match scores full points.
        assert_eq!(
            rules().calculate_points("1-1", "مساوی", "1-1", "TeamA", "TeamB"),
            5
        );
    }

    #[test]
    fn correct_winner_beats_partial() {
        assert_eq!(
            rules().calculate_points("2-1", "TeamA", "3-2", "TeamA", "TeamB"),
            3
        );
    }

    #[test]
    fn matching_goal_count_on_one_side_scores_partial() {
        // Home goals match, predicted winner wrong (actual is a draw)
        assert_eq!(
            rules().calculate_points("2-1", "TeamA", "2-2", "TeamA", "TeamB"),
            1
        );
        // Away goals match only
        assert_eq!(
            rules().calculate_points("0-1", "TeamB", "2-1", "TeamA", "TeamB"),
            1
        );
    }

    #[test]
    fn nothing_matching_scores_zero() {
        assert_eq!(
            rules().calculate_points("0-1", "TeamB", "3-0", "TeamA", "TeamB"),
            0
        );
    }

    #[test]
    fn draw_label_matches_a_drawn_result() {
        assert_eq!(
            rules().calculate_points("0-0", "Draw", "1-1", "TeamA", "TeamB"),
            3
        );
    }

    #[test]
    fn empty_inputs_score_zero() {
        assert_eq!(rules().calculate_points("", "TeamA", "2-1", "TeamA", "TeamB"), 0);
        assert_eq!(rules().calculate_points("2-1", "", "2-1", "TeamA", "TeamB"), 0);
        assert_eq!(rules().calculate_points("2-1", "TeamA", "", "TeamA", "TeamB"), 0);
    }

    #[test]
    fn malformed_stored_values_degrade_to_zero() {
        assert_eq!(
            rules().calculate_points("garbage", "TeamA", "2-1", "TeamA", "TeamB"),
            0
        );
        assert_eq!(
            rules().calculate_points("2-1", "TeamA", "garbage", "TeamA", "TeamB"),
            0
        );
    }

    #[test]
    fn reapplication_is_idempotent() {
        let rules = rules();
        let first = rules.calculate_points("2-1", "TeamA", "2-2", "TeamA", "TeamB");
        let second = rules.calculate_points("2-1", "TeamA", "2-2", "TeamA", "TeamB");
        assert_eq!(first, second);
    }

    #[test]
    fn winner_choice_from_goals() {
        assert_eq!(WinnerChoice::from_goals(2, 1), WinnerChoice::Home);
        assert_eq!(WinnerChoice::from_goals(0, 3), WinnerChoice::Away);
        assert_eq!(WinnerChoice::from_goals(1, 1), WinnerChoice::Draw);
    }
}
