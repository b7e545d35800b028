//! Result-entry flow (admin only):
//! SELECT_MATCH → SELECT_SCORE → SELECT_WINNER → CONFIRM → terminal
//!
//! Confirmation updates the match, then re-scores every prediction tied
//! to it from scratch. The sweep is deliberately a full recomputation:
//! confirming a corrected result converges on the right points.

use super::prediction::invalid_score_message;
use super::{offered_winners, winner_keyboard, Engine, EngineError, Replies};
use crate::session::{FlowState, MatchRef, Session};
use crate::store::Store;
use crate::transport::{ButtonChoice, Keyboard, Outgoing, Payload, UserRef};
use crate::validate::validate_score;

impl<S: Store> Engine<S> {
    /// `/setresult` entry point. Authorization already happened in
    /// dispatch, so no state exists for refused callers.
    pub(super) async fn start_result_entry(&self, user: &UserRef) -> Replies {
        let week = self.week.current(&self.store).await?;
        let pending = self.store.unresolved_matches(week).await?;
        if pending.is_empty() {
            return Ok(vec![Outgoing::text(format!(
                "Every match of week {week} already has a result."
            ))]);
        }

        let rows = pending
            .iter()
            .map(|m| {
                vec![ButtonChoice::new(
                    format!("{} vs {}", m.home_team, m.away_team),
                    &Payload::ResultMatch(m.id),
                )]
            })
            .collect();
        self.sessions
            .set(user.id, Session::new(FlowState::ResultSelectMatch));
        Ok(vec![Outgoing::with_keyboard(
            "Pick the match to record a result for:",
            Keyboard { rows },
        )])
    }

    pub(super) async fn result_pick_match(&self, user_id: i64, match_id: i64) -> Replies {
        let Some(m) = self.store.get_match(match_id).await? else {
            self.sessions.clear(user_id);
            return Ok(vec![Outgoing::text("That match no longer exists.")]);
        };

        let m = MatchRef {
            id: m.id,
            week: m.week,
            home: m.home_team,
            away: m.away_team,
        };
        let choices = self
            .config
            .score_menu
            .iter()
            .map(|score| ButtonChoice::new(score.clone(), &Payload::ResultScore(score.clone())))
            .collect();
        let keyboard = Keyboard::grid(choices, 3).row(vec![ButtonChoice::new(
            "Enter manually",
            &Payload::ResultScoreManual,
        )]);
        let prompt = Outgoing::with_keyboard(
            format!("Selected match:\n{} vs {}\n\nPick the final score:", m.home, m.away),
            keyboard,
        );
        self.sessions
            .set(user_id, Session::new(FlowState::ResultSelectScore { m }));
        Ok(vec![prompt])
    }

    /// Same validation as the prediction flow; an invalid score stays in
    /// SELECT_SCORE.
    pub(super) fn accept_result_score(
        &self,
        user_id: i64,
        m: &MatchRef,
        value: &str,
    ) -> Vec<Outgoing> {
        if !validate_score(value, self.config.max_score_len) {
            return vec![invalid_score_message(self.config.max_score_len)];
        }
        let score = value.trim().to_string();
        let labels = offered_winners(m, &score, &self.config.scoring.draw_label);
        let prompt = Outgoing::with_keyboard(
            format!("Final score: {score}\nPick the winner:"),
            winner_keyboard(&labels, Payload::ResultWinner),
        );
        self.sessions.set(
            user_id,
            Session::new(FlowState::ResultSelectWinner { m: m.clone(), score }),
        );
        vec![prompt]
    }

    pub(super) fn result_pick_winner(
        &self,
        user_id: i64,
        m: &MatchRef,
        score: String,
        winner: String,
    ) -> Vec<Outgoing> {
        let labels = offered_winners(m, &score, &self.config.scoring.draw_label);
        if !labels.contains(&winner) {
            return vec![Outgoing::text("Pick one of the offered winners.")];
        }

        let keyboard = Keyboard::new()
            .row(vec![ButtonChoice::new(
                "Confirm and record",
                &Payload::ResultConfirm(true),
            )])
            .row(vec![ButtonChoice::new("Cancel", &Payload::ResultConfirm(false))]);
        let prompt = Outgoing::with_keyboard(
            format!(
                "Please confirm:\n\nWeek {}\n{} vs {}\nScore: {score}\nWinner: {winner}\n\nRecord this result?",
                m.week, m.home, m.away
            ),
            keyboard,
        );
        self.sessions.set(
            user_id,
            Session::new(FlowState::ResultConfirm { m: m.clone(), score, winner }),
        );
        vec![prompt]
    }

    /// Terminal step: record the result, then sweep.
    pub(super) async fn confirm_result(
        &self,
        user_id: i64,
        m: &MatchRef,
        score: &str,
        winner: &str,
    ) -> Replies {
        // The flow is over whatever happens below; a sweep failure must
        // not leave a live CONFIRM state behind.
        self.sessions.clear(user_id);

        self.store.set_match_result(m.id, score, winner).await?;
        let rescored = self.rescore_match(m, score).await?;
        tracing::info!(match_id = m.id, score, winner, rescored, "Result recorded");

        Ok(vec![Outgoing::text(format!(
            "Result recorded: {} {score} {}.\n{rescored} prediction(s) scored.\nSend /leaderboard for the standings.",
            m.home, m.away
        ))])
    }

    /// Re-apply the scoring engine to every prediction of the match.
    ///
    /// Not transactional: a failure partway leaves the earlier rows
    /// updated. Re-confirming the result re-runs the whole sweep.
    pub(super) async fn rescore_match(
        &self,
        m: &MatchRef,
        actual_score: &str,
    ) -> Result<usize, EngineError> {
        let predictions = self.store.predictions_for_match(m.id).await?;
        let mut rescored = 0;
        for prediction in &predictions {
            let points = self.config.scoring.calculate_points(
                &prediction.score,
                &prediction.winner,
                actual_score,
                &m.home,
                &m.away,
            );
            self.store
                .set_prediction_points(prediction.id, points)
                .await?;
            rescored += 1;
        }
        Ok(rescored)
    }
}
