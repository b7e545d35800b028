//! Conversation sessions
//!
//! One live session per user. The store is a plain last-writer-wins map
//! guarded by a mutex; every transition decision belongs to the engine.
//! Sessions are never persisted and have no expiry: an abandoned flow
//! sits until a cancel or a new flow for the same user replaces it.

use std::collections::HashMap;
use std::sync::Mutex;

/// Which guided dialogue a session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    Prediction,
    ResultEntry,
}

/// The match a flow is collecting input for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRef {
    pub id: i64,
    pub week: u32,
    pub home: String,
    pub away: String,
}

/// Session state, with the input collected so far embedded in each
/// variant. A handler can only reach fields its state has actually
/// collected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    // Prediction flow
    SelectScore {
        m: MatchRef,
    },
    SelectWinner {
        m: MatchRef,
        score: String,
    },

    // Result-entry flow
    ResultSelectMatch,
    ResultSelectScore {
        m: MatchRef,
    },
    ResultSelectWinner {
        m: MatchRef,
        score: String,
    },
    ResultConfirm {
        m: MatchRef,
        score: String,
        winner: String,
    },
}

/// The live state of one user's active flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub state: FlowState,
}

impl Session {
    pub fn new(state: FlowState) -> Self {
        Self { state }
    }

    pub fn flow(&self) -> FlowKind {
        match self.state {
            FlowState::SelectScore { .. } | FlowState::SelectWinner { .. } => FlowKind::Prediction,
            FlowState::ResultSelectMatch
            | FlowState::ResultSelectScore { .. }
            | FlowState::ResultSelectWinner { .. }
            | FlowState::ResultConfirm { .. } => FlowKind::ResultEntry,
        }
    }
}

/// Per-user session map.
#[derive(Debug, Default)]
pub struct SessionStore {
    inner: Mutex<HashMap<i64, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user_id: i64) -> Option<Session> {
        self.inner.lock().unwrap().get(&user_id).cloned()
    }

    /// Install a session, silently discarding any active one.
    pub fn set(&self, user_id: i64, session: Session) {
        self.inner.lock().unwrap().insert(user_id, session);
    }

    /// Remove the user's session. Returns whether one existed.
    pub fn clear(&self, user_id: i64) -> bool {
        self.inner.lock().unwrap().remove(&user_id).is_some()
    }
}
