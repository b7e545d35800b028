//! Transport boundary types
//!
//! The chat transport delivers commands, free-text replies, and button
//! choices, each tagged with the sending user, and accepts messages with
//! an optional keyboard of labeled buttons back. Button payloads cross
//! the wire as opaque `kind|value` strings; they are decoded into the
//! tagged `Payload` enum exactly once, at this boundary.

use serde::{Deserialize, Serialize};

/// Identity attached to every incoming event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: i64,
    pub full_name: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub language_code: Option<String>,
}

/// An event reported by the transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Incoming {
    /// A slash command, with an optional trailing argument.
    Command {
        user: UserRef,
        name: String,
        #[serde(default)]
        arg: Option<String>,
    },
    /// A free-text reply.
    Text { user: UserRef, text: String },
    /// A button press, carrying the button's encoded payload.
    Choice { user: UserRef, payload: String },
}

impl Incoming {
    pub fn user(&self) -> &UserRef {
        match self {
            Incoming::Command { user, .. }
            | Incoming::Text { user, .. }
            | Incoming::Choice { user, .. } => user,
        }
    }
}

/// The user-facing command surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Week,
    Matches,
    MyBets,
    Leaderboard,
    Help,
    Cancel,
    // admin
    SetResult,
    NextWeek,
    PrevWeek,
    StartWeek,
    CloseBets,
    OpenBets,
}

impl Command {
    /// Resolve a command name, with or without the leading slash.
    /// Aliases from earlier releases stay routable.
    pub fn parse(name: &str) -> Option<Self> {
        let command = match name.trim().trim_start_matches('/') {
            "start" => Command::Start,
            "week" => Command::Week,
            "matches" => Command::Matches,
            "mybets" | "myguesses" => Command::MyBets,
            "leaderboard" | "champion" => Command::Leaderboard,
            "help" | "helpme" => Command::Help,
            "cancel" => Command::Cancel,
            "setresult" => Command::SetResult,
            "nextweek" => Command::NextWeek,
            "prevweek" => Command::PrevWeek,
            "startweek" => Command::StartWeek,
            "closebets" => Command::CloseBets,
            "openbets" => Command::OpenBets,
            _ => return None,
        };
        Some(command)
    }

    pub fn is_admin(self) -> bool {
        matches!(
            self,
            Command::SetResult
                | Command::NextWeek
                | Command::PrevWeek
                | Command::StartWeek
                | Command::CloseBets
                | Command::OpenBets
        )
    }
}

/// A decoded button payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// A quick-pick scoreline in the prediction flow.
    Score(String),
    /// Switch the prediction flow to manual score entry.
    ScoreManual,
    /// A winner label in the prediction flow.
    Winner(String),
    /// Re-open the prediction flow for one specific match.
    Edit(i64),
    /// A match picked in the result-entry flow.
    ResultMatch(i64),
    /// A quick-pick scoreline in the result-entry flow.
    ResultScore(String),
    /// Switch the result-entry flow to manual score entry.
    ResultScoreManual,
    /// A winner label in the result-entry flow.
    ResultWinner(String),
    /// Final confirmation (or cancellation) of a result.
    ResultConfirm(bool),
}

impl Payload {
    /// Wire form, `kind|value`.
    pub fn encode(&self) -> String {
        match self {
            Payload::Score(score) => format!("score|{score}"),
            Payload::ScoreManual => "score|manual".to_string(),
            Payload::Winner(winner) => format!("winner|{winner}"),
            Payload::Edit(match_id) => format!("edit|{match_id}"),
            Payload::ResultMatch(match_id) => format!("setresult_match|{match_id}"),
            Payload::ResultScore(score) => format!("setresult_score|{score}"),
            Payload::ResultScoreManual => "setresult_score|manual".to_string(),
            Payload::ResultWinner(winner) => format!("setresult_winner|{winner}"),
            Payload::ResultConfirm(confirmed) => {
                format!("setresult_confirm|{}", u8::from(*confirmed))
            }
        }
    }

    /// Decode a wire payload. Anything unrecognized is `None`; the
    /// engine treats that as an invalid choice, never as a crash.
    pub fn parse(raw: &str) -> Option<Self> {
        let (kind, value) = raw.split_once('|')?;
        let payload = match kind {
            "score" if value == "manual" => Payload::ScoreManual,
            "score" => Payload::Score(value.to_string()),
            "winner" => Payload::Winner(value.to_string()),
            "edit" => Payload::Edit(value.parse().ok()?),
            "setresult_match" => Payload::ResultMatch(value.parse().ok()?),
            "setresult_score" if value == "manual" => Payload::ResultScoreManual,
            "setresult_score" => Payload::ResultScore(value.to_string()),
            "setresult_winner" => Payload::ResultWinner(value.to_string()),
            "setresult_confirm" => Payload::ResultConfirm(value == "1"),
            _ => return None,
        };
        Some(payload)
    }
}

/// A labeled button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonChoice {
    pub label: String,
    pub payload: String,
}

impl ButtonChoice {
    pub fn new(label: impl Into<String>, payload: &Payload) -> Self {
        Self {
            label: label.into(),
            payload: payload.encode(),
        }
    }
}

/// Rows of buttons attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyboard {
    pub rows: Vec<Vec<ButtonChoice>>,
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(mut self, row: Vec<ButtonChoice>) -> Self {
        self.rows.push(row);
        self
    }

    /// Lay choices out left to right, `per_row` to a row.
    pub fn grid(choices: Vec<ButtonChoice>, per_row: usize) -> Self {
        let per_row = per_row.max(1);
        Self {
            rows: choices.chunks(per_row).map(<[ButtonChoice]>::to_vec).collect(),
        }
    }
}

/// A message for the transport to deliver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outgoing {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyboard: Option<Keyboard>,
}

impl Outgoing {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }
}
