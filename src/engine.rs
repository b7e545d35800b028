//! Conversation engine
//!
//! Routes every transport event: a command starts a flow or answers a
//! read query; free text and button choices go to the active session's
//! state handler. Each handler either re-prompts in place, advances the
//! session, or finalizes against the store and clears the session. An
//! error in one user's flow never touches another user's session.

mod prediction;
#[cfg(test)]
mod proptests;
mod queries;
mod results;

use crate::config::Config;
use crate::db::DbError;
use crate::session::{FlowState, MatchRef, SessionStore};
use crate::store::Store;
use crate::transport::{
    ButtonChoice, Command, Incoming, Keyboard, Outgoing, Payload, UserRef,
};
use crate::validate::parse_score;
use crate::week::WeekCache;
use thiserror::Error;

const GENERIC_RETRY: &str = "Something went wrong. Please try again later.";
const ADMIN_ONLY: &str = "This command is restricted to administrators.";
const UNKNOWN_COMMAND: &str = "Unknown command. Send /help for the list.";
const INVALID_CHOICE: &str = "That choice is not available.";
const NO_ACTIVE_FLOW: &str =
    "There is nothing in progress. Send /start to predict this week's matches.";
const SESSION_ERROR: &str = "Your session got out of step. Send /start to begin again.";
const USE_BUTTONS: &str = "Please answer with one of the buttons above.";

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("storage error: {0}")]
    Db(#[from] DbError),
    #[error("session out of step with event")]
    SessionOutOfStep,
}

type Replies = Result<Vec<Outgoing>, EngineError>;

/// The conversation engine. One instance serves every user; per-user
/// state lives in the session store.
pub struct Engine<S> {
    store: S,
    config: Config,
    sessions: SessionStore,
    week: WeekCache,
}

impl<S: Store> Engine<S> {
    pub fn new(store: S, config: Config) -> Self {
        let week = WeekCache::new(config.week_cache_ttl);
        Self {
            store,
            config,
            sessions: SessionStore::new(),
            week,
        }
    }

    /// Handle one transport event, returning the replies to deliver to
    /// that user. Never panics and never leaves an errored flow behind.
    pub async fn handle(&self, incoming: Incoming) -> Vec<Outgoing> {
        let user_id = incoming.user().id;
        match self.dispatch(incoming).await {
            Ok(replies) => replies,
            Err(EngineError::Db(error)) => {
                tracing::error!(user_id, error = %error, "Storage failure, ending flow");
                self.sessions.clear(user_id);
                vec![Outgoing::text(GENERIC_RETRY)]
            }
            Err(EngineError::SessionOutOfStep) => {
                tracing::warn!(user_id, "Session out of step, ending flow");
                self.sessions.clear(user_id);
                vec![Outgoing::text(SESSION_ERROR)]
            }
        }
    }

    async fn dispatch(&self, incoming: Incoming) -> Replies {
        match incoming {
            Incoming::Command { user, name, arg } => {
                let Some(command) = Command::parse(&name) else {
                    tracing::debug!(user_id = user.id, name = %name, "Unknown command");
                    return Ok(vec![Outgoing::text(UNKNOWN_COMMAND)]);
                };
                if command.is_admin() && !self.config.is_admin(user.id) {
                    tracing::warn!(user_id = user.id, ?command, "Refusing admin command");
                    return Ok(vec![Outgoing::text(ADMIN_ONLY)]);
                }
                self.run_command(&user, command, arg.as_deref()).await
            }
            Incoming::Text { user, text } => self.on_text(&user, text.trim()).await,
            Incoming::Choice { user, payload } => match Payload::parse(&payload) {
                Some(payload) => self.on_choice(&user, payload).await,
                None => {
                    tracing::warn!(user_id = user.id, payload = %payload, "Undecodable payload");
                    Ok(vec![Outgoing::text(INVALID_CHOICE)])
                }
            },
        }
    }

    async fn run_command(&self, user: &UserRef, command: Command, arg: Option<&str>) -> Replies {
        match command {
            Command::Start => self.start_prediction(user).await,
            Command::Week => self.show_week().await,
            Command::Matches => self.show_matches().await,
            Command::MyBets => self.show_my_predictions(user, arg).await,
            Command::Leaderboard => self.show_leaderboard(arg).await,
            Command::Help => Ok(vec![self.help_message()]),
            Command::Cancel => Ok(self.cancel(user.id)),
            Command::SetResult => self.start_result_entry(user).await,
            Command::NextWeek => self.advance_week().await,
            Command::PrevWeek => self.rewind_week().await,
            Command::StartWeek => self.announce_week().await,
            Command::CloseBets => self.close_bets().await,
            Command::OpenBets => self.open_bets().await,
        }
    }

    /// Free text is only meaningful while a flow is waiting for a
    /// manually typed score.
    async fn on_text(&self, user: &UserRef, text: &str) -> Replies {
        let Some(session) = self.sessions.get(user.id) else {
            return Ok(vec![Outgoing::text(NO_ACTIVE_FLOW)]);
        };
        match session.state {
            FlowState::SelectScore { m } => Ok(self.accept_prediction_score(user.id, &m, text)),
            FlowState::ResultSelectScore { m } => Ok(self.accept_result_score(user.id, &m, text)),
            _ => Ok(vec![Outgoing::text(USE_BUTTONS)]),
        }
    }

    /// Every handler only accepts the payload kind tagged for its own
    /// state; anything else means the session and the button no longer
    /// agree, which ends the flow.
    async fn on_choice(&self, user: &UserRef, payload: Payload) -> Replies {
        if let Payload::Edit(match_id) = payload {
            return self.edit_prediction(user, match_id).await;
        }
        let Some(session) = self.sessions.get(user.id) else {
            return Ok(vec![Outgoing::text(NO_ACTIVE_FLOW)]);
        };
        match (session.state, payload) {
            (FlowState::SelectScore { .. }, Payload::ScoreManual) => {
                Ok(vec![manual_score_prompt(self.config.max_score_len)])
            }
            (FlowState::SelectScore { m }, Payload::Score(value)) => {
                Ok(self.accept_prediction_score(user.id, &m, &value))
            }
            (FlowState::SelectWinner { m, score }, Payload::Winner(winner)) => {
                self.save_prediction(user, &m, &score, winner).await
            }
            (FlowState::ResultSelectMatch, Payload::ResultMatch(match_id)) => {
                self.result_pick_match(user.id, match_id).await
            }
            (FlowState::ResultSelectScore { .. }, Payload::ResultScoreManual) => {
                Ok(vec![manual_score_prompt(self.config.max_score_len)])
            }
            (FlowState::ResultSelectScore { m }, Payload::ResultScore(value)) => {
                Ok(self.accept_result_score(user.id, &m, &value))
            }
            (FlowState::ResultSelectWinner { m, score }, Payload::ResultWinner(winner)) => {
                Ok(self.result_pick_winner(user.id, &m, score, winner))
            }
            (FlowState::ResultConfirm { m, score, winner }, Payload::ResultConfirm(true)) => {
                self.confirm_result(user.id, &m, &score, &winner).await
            }
            (FlowState::ResultConfirm { .. }, Payload::ResultConfirm(false)) => {
                self.sessions.clear(user.id);
                Ok(vec![Outgoing::text("Result entry cancelled.")])
            }
            _ => Err(EngineError::SessionOutOfStep),
        }
    }
}

/// The winner labels offered for a score: both teams, with the draw
/// label between them when the score is level.
fn offered_winners(m: &MatchRef, score: &str, draw_label: &str) -> Vec<String> {
    let is_draw = parse_score(score).is_some_and(|(home, away)| home == away);
    if is_draw {
        vec![m.home.clone(), draw_label.to_string(), m.away.clone()]
    } else {
        vec![m.home.clone(), m.away.clone()]
    }
}

fn winner_keyboard(labels: &[String], to_payload: impl Fn(String) -> Payload) -> Keyboard {
    let row = labels
        .iter()
        .map(|label| ButtonChoice::new(label.clone(), &to_payload(label.clone())))
        .collect();
    Keyboard::new().row(row)
}

fn manual_score_prompt(max_len: usize) -> Outgoing {
    Outgoing::text(format!(
        "Type the score as home-away, for example 2-1. At most {max_len} characters."
    ))
}
