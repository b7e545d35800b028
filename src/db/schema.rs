//! Database schema and row types

use chrono::{DateTime, Utc};

/// SQL schema for initialization
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS users (
    user_id INTEGER PRIMARY KEY,
    full_name TEXT NOT NULL,
    username TEXT,
    language_code TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS matches (
    id INTEGER PRIMARY KEY,
    week INTEGER NOT NULL,
    home_team TEXT NOT NULL,
    away_team TEXT NOT NULL,
    result TEXT,
    winner TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_matches_week ON matches(week, id);

CREATE TABLE IF NOT EXISTS predictions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    match_id INTEGER NOT NULL,
    week INTEGER NOT NULL,
    home_team TEXT NOT NULL,
    away_team TEXT NOT NULL,
    score TEXT NOT NULL,
    winner TEXT NOT NULL,
    points INTEGER,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,

    FOREIGN KEY (user_id) REFERENCES users(user_id),
    FOREIGN KEY (match_id) REFERENCES matches(id),
    UNIQUE (user_id, match_id)
);

CREATE INDEX IF NOT EXISTS idx_predictions_match ON predictions(match_id);
CREATE INDEX IF NOT EXISTS idx_predictions_user_week ON predictions(user_id, week);

CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
";

/// Settings key holding the league's current week.
pub const CURRENT_WEEK_KEY: &str = "current_week";

/// Identity payload for the idempotent user upsert.
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub user_id: i64,
    pub full_name: String,
    pub username: Option<String>,
    pub language_code: Option<String>,
}

/// A scheduled match, optionally resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub id: i64,
    pub week: u32,
    pub home_team: String,
    pub away_team: String,
    pub result: Option<String>,
    pub winner: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Match {
    /// A match is resolved once an official result is on record.
    pub fn is_resolved(&self) -> bool {
        self.result.is_some()
    }
}

/// A stored prediction row.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub id: i64,
    pub user_id: i64,
    pub match_id: i64,
    pub week: u32,
    pub home_team: String,
    pub away_team: String,
    pub score: String,
    pub winner: String,
    pub points: Option<i64>,
}

/// Payload for the prediction insert-or-replace.
#[derive(Debug, Clone)]
pub struct NewPrediction {
    pub user_id: i64,
    pub match_id: i64,
    pub week: u32,
    pub home_team: String,
    pub away_team: String,
    pub score: String,
    pub winner: String,
}

/// A prediction joined with its match's current result, for the
/// own-predictions listing.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionView {
    pub match_id: i64,
    pub week: u32,
    pub home_team: String,
    pub away_team: String,
    pub score: String,
    pub winner: String,
    pub points: Option<i64>,
    pub result: Option<String>,
}

/// One leaderboard row: a user and their point total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardRow {
    pub user_id: i64,
    pub full_name: String,
    pub total_points: i64,
}
