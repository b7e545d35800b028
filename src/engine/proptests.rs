//! Property-based tests for the engine's pure pieces
//!
//! These verify invariants across all inputs: the winner choice set
//! always offers both teams and only adds the draw option for level
//! scores, scoring stays within the configured point values and is
//! idempotent, and button payloads survive the wire encoding.

use super::offered_winners;
use crate::scoring::ScoringRules;
use crate::session::MatchRef;
use crate::transport::Payload;
use crate::validate::{parse_score, validate_score};
use proptest::prelude::*;

fn match_ref() -> MatchRef {
    MatchRef {
        id: 1,
        week: 1,
        home: "Reds".to_string(),
        away: "Blues".to_string(),
    }
}

proptest! {
    #[test]
    fn in_range_scores_validate_and_parse(home in 0u32..=20, away in 0u32..=20) {
        let score = format!("{home}-{away}");
        prop_assert!(validate_score(&score, 7));
        prop_assert_eq!(parse_score(&score), Some((home, away)));
    }

    #[test]
    fn trailing_junk_never_validates(
        home in 0u32..=20,
        away in 0u32..=20,
        junk in "[a-z+]{1,3}",
    ) {
        let score = format!("{home}-{away}{junk}");
        prop_assert!(!validate_score(&score, 12));
    }

    #[test]
    fn out_of_range_goals_never_validate(home in 21u32..=99, away in 0u32..=20) {
        let hi_lo = format!("{home}-{away}");
        let lo_hi = format!("{away}-{home}");
        prop_assert!(!validate_score(&hi_lo, 7));
        prop_assert!(!validate_score(&lo_hi, 7));
    }

    #[test]
    fn winner_choices_always_offer_both_teams(home in 0u32..=20, away in 0u32..=20) {
        let m = match_ref();
        let labels = offered_winners(&m, &format!("{home}-{away}"), "Draw");
        prop_assert!(labels.contains(&m.home));
        prop_assert!(labels.contains(&m.away));
        prop_assert_eq!(labels.contains(&"Draw".to_string()), home == away);
        prop_assert_eq!(labels.len(), if home == away { 3 } else { 2 });
    }

    #[test]
    fn scoring_is_idempotent_and_bounded(
        pred_home in 0u32..=20,
        pred_away in 0u32..=20,
        actual_home in 0u32..=20,
        actual_away in 0u32..=20,
        picks_home in any::<bool>(),
    ) {
        let rules = ScoringRules::default();
        let predicted = format!("{pred_home}-{pred_away}");
        let actual = format!("{actual_home}-{actual_away}");
        let winner = if picks_home { "Reds" } else { "Blues" };

        let first = rules.calculate_points(&predicted, winner, &actual, "Reds", "Blues");
        let second = rules.calculate_points(&predicted, winner, &actual, "Reds", "Blues");
        prop_assert_eq!(first, second);
        prop_assert!([0, 1, 3, 5].contains(&first));

        // an exact score string always takes the top value
        if predicted == actual {
            prop_assert_eq!(first, rules.exact_score);
        }
    }

    #[test]
    fn payloads_survive_the_wire_encoding(
        score in "[0-9]{1,2}-[0-9]{1,2}",
        match_id in 0i64..10_000,
    ) {
        let payloads = [
            Payload::Score(score.clone()),
            Payload::ResultScore(score.clone()),
            Payload::Edit(match_id),
            Payload::ResultMatch(match_id),
        ];
        for payload in payloads {
            prop_assert_eq!(Payload::parse(&payload.encode()), Some(payload));
        }
    }
}
