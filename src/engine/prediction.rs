//! Prediction flow: SELECT_SCORE → SELECT_WINNER → terminal
//!
//! Entry seeds the user's earliest unpredicted match of the current
//! week; completion upserts the prediction with its points left null
//! until the match's result lands.

use super::{offered_winners, winner_keyboard, Engine, Replies};
use crate::db::{NewPrediction, UserProfile};
use crate::session::{FlowState, MatchRef, Session};
use crate::store::Store;
use crate::transport::{ButtonChoice, Keyboard, Outgoing, Payload, UserRef};
use crate::validate::validate_score;

impl<S: Store> Engine<S> {
    /// `/start` entry point.
    pub(super) async fn start_prediction(&self, user: &UserRef) -> Replies {
        self.store.upsert_user(&profile(user)).await?;

        let week = self.week.current(&self.store).await?;
        if self.store.is_week_locked(week).await? {
            return Ok(vec![Outgoing::text(format!(
                "Predictions for week {week} are closed."
            ))]);
        }
        let Some(m) = self.store.next_unpredicted_match(user.id, week).await? else {
            return self.nothing_left_to_predict(week).await;
        };

        let m = MatchRef {
            id: m.id,
            week: m.week,
            home: m.home_team,
            away: m.away_team,
        };
        let prompt = self.score_prompt(&m);
        self.sessions
            .set(user.id, Session::new(FlowState::SelectScore { m }));
        Ok(vec![prompt])
    }

    /// Re-open the flow for one specific match, from the edit button on
    /// the own-predictions listing. Replaces whatever flow was active.
    pub(super) async fn edit_prediction(&self, user: &UserRef, match_id: i64) -> Replies {
        let Some(m) = self.store.get_match(match_id).await? else {
            return Ok(vec![Outgoing::text("That match no longer exists.")]);
        };
        if self.store.is_week_locked(m.week).await? {
            return Ok(vec![Outgoing::text(format!(
                "Predictions for week {} are closed.",
                m.week
            ))]);
        }
        if m.is_resolved() {
            return Ok(vec![Outgoing::text(
                "The result for that match is already in; its prediction can no longer change.",
            )]);
        }

        let m = MatchRef {
            id: m.id,
            week: m.week,
            home: m.home_team,
            away: m.away_team,
        };
        let prompt = self.score_prompt(&m);
        self.sessions
            .set(user.id, Session::new(FlowState::SelectScore { m }));
        Ok(vec![prompt])
    }

    /// Two different terminal messages: the week may be fully predicted,
    /// or there may be nothing to predict at all.
    async fn nothing_left_to_predict(&self, week: u32) -> Replies {
        let total = self.store.match_count_for_week(week).await?;
        let text = if total == 0 {
            format!("No matches are scheduled for week {week} yet.")
        } else {
            format!(
                "You have predicted every match of week {week}. Send /mybets to review your predictions."
            )
        };
        Ok(vec![Outgoing::text(text)])
    }

    /// Score submission, from a quick-pick button or typed manually. An
    /// invalid score re-prompts without leaving SELECT_SCORE and without
    /// consuming the match.
    pub(super) fn accept_prediction_score(
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
            format!("Score picked: {score}\nWho takes the match?"),
            winner_keyboard(&labels, Payload::Winner),
        );
        self.sessions.set(
            user_id,
            Session::new(FlowState::SelectWinner { m: m.clone(), score }),
        );
        vec![prompt]
    }

    /// Terminal step: persist the prediction and drop the session. The
    /// week-lock and resolved-match gates are re-checked here because
    /// either can change while the flow sits waiting for input.
    pub(super) async fn save_prediction(
        &self,
        user: &UserRef,
        m: &MatchRef,
        score: &str,
        winner: String,
    ) -> Replies {
        let labels = offered_winners(m, score, &self.config.scoring.draw_label);
        if !labels.contains(&winner) {
            return Ok(vec![Outgoing::text("Pick one of the offered winners.")]);
        }
        if self.store.is_week_locked(m.week).await? {
            self.sessions.clear(user.id);
            return Ok(vec![Outgoing::text(format!(
                "Predictions for week {} are closed.",
                m.week
            ))]);
        }
        if self
            .store
            .get_match(m.id)
            .await?
            .is_some_and(|row| row.is_resolved())
        {
            self.sessions.clear(user.id);
            return Ok(vec![Outgoing::text(
                "The result for that match is already in; the prediction was not saved.",
            )]);
        }

        self.store
            .upsert_prediction(&NewPrediction {
                user_id: user.id,
                match_id: m.id,
                week: m.week,
                home_team: m.home.clone(),
                away_team: m.away.clone(),
                score: score.to_string(),
                winner: winner.clone(),
            })
            .await?;
        self.sessions.clear(user.id);
        tracing::info!(user_id = user.id, match_id = m.id, score, "Prediction saved");

        Ok(vec![Outgoing::text(format!(
            "Prediction saved:\nWeek {}\n{} vs {}\nScore: {score}\nWinner: {winner}\n\nSend /start to predict the next match.",
            m.week, m.home, m.away
        ))])
    }

    /// The SELECT_SCORE prompt: quick-pick grid plus manual entry.
    pub(super) fn score_prompt(&self, m: &MatchRef) -> Outgoing {
        let choices = self
            .config
            .score_menu
            .iter()
            .map(|score| ButtonChoice::new(score.clone(), &Payload::Score(score.clone())))
            .collect();
        let keyboard = Keyboard::grid(choices, 3)
            .row(vec![ButtonChoice::new("Enter manually", &Payload::ScoreManual)]);
        Outgoing::with_keyboard(
            format!(
                "Week {}\n{} vs {}\n\nPick the score you predict:",
                m.week, m.home, m.away
            ),
            keyboard,
        )
    }
}

pub(super) fn invalid_score_message(max_len: usize) -> Outgoing {
    Outgoing::text(format!(
        "That score is not valid. Use home-away (for example 2-1), each side 0-20, at most {max_len} characters."
    ))
}

fn profile(user: &UserRef) -> UserProfile {
    UserProfile {
        user_id: user.id,
        full_name: user.full_name.clone(),
        username: user.username.clone(),
        language_code: user.language_code.clone(),
    }
}
