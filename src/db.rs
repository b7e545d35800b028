//! SQLite persistence
//!
//! A single connection shared behind a mutex. The engine reaches this
//! through the `Store` boundary (`crate::store`); everything here is
//! synchronous and holds the lock only for the duration of one call.

pub mod import;
mod schema;

pub use schema::*;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("match not found: {0}")]
    MatchNotFound(i64),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create the database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn run_migrations(&self) -> DbResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        conn.execute_batch(SCHEMA)?;
        conn.execute(
            "INSERT OR IGNORE INTO settings (key, value, updated_at) VALUES (?1, '1', ?2)",
            params![CURRENT_WEEK_KEY, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    // ==================== Users ====================

    /// Idempotent user registration: first interaction inserts, later
    /// ones are no-ops.
    pub fn upsert_user(&self, profile: &UserProfile) -> DbResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR IGNORE INTO users (user_id, full_name, username, language_code, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                profile.user_id,
                profile.full_name,
                profile.username,
                profile.language_code,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    // ==================== Matches ====================

    /// Insert a match if its id is not already present. Returns whether
    /// a row was written (the fixtures import counts these).
    pub fn insert_match(
        &self,
        id: i64,
        week: u32,
        home_team: &str,
        away_team: &str,
        result: Option<&str>,
    ) -> DbResult<bool> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO matches (id, week, home_team, away_team, result, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![id, week, home_team, away_team, result, now],
        )?;
        Ok(inserted > 0)
    }

    pub fn get_match(&self, id: i64) -> DbResult<Option<Match>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, week, home_team, away_team, result, winner, created_at, updated_at
             FROM matches WHERE id = ?1",
        )?;
        stmt.query_row(params![id], match_from_row)
            .optional()
            .map_err(DbError::from)
    }

    pub fn matches_for_week(&self, week: u32) -> DbResult<Vec<Match>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, week, home_team, away_team, result, winner, created_at, updated_at
             FROM matches WHERE week = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![week], match_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    pub fn unresolved_matches(&self, week: u32) -> DbResult<Vec<Match>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, week, home_team, away_team, result, winner, created_at, updated_at
             FROM matches WHERE week = ?1 AND result IS NULL ORDER BY id",
        )?;
        let rows = stmt.query_map(params![week], match_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    pub fn match_count_for_week(&self, week: u32) -> DbResult<i64> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT COUNT(*) FROM matches WHERE week = ?1",
            params![week],
            |row| row.get(0),
        )
        .map_err(DbError::from)
    }

    /// The user's earliest match of the week without a prediction yet.
    pub fn next_unpredicted_match(&self, user_id: i64, week: u32) -> DbResult<Option<Match>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT m.id, m.week, m.home_team, m.away_team, m.result, m.winner, m.created_at, m.updated_at
             FROM matches m
             WHERE m.week = ?1
               AND m.id NOT IN (SELECT match_id FROM predictions WHERE user_id = ?2)
             ORDER BY m.id LIMIT 1",
        )?;
        stmt.query_row(params![week, user_id], match_from_row)
            .optional()
            .map_err(DbError::from)
    }

    /// Record (or correct) a match's official result and winner.
    pub fn set_match_result(&self, id: i64, result: &str, winner: &str) -> DbResult<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE matches SET result = ?1, winner = ?2, updated_at = ?3 WHERE id = ?4",
            params![result, winner, Utc::now().to_rfc3339(), id],
        )?;
        if updated == 0 {
            return Err(DbError::MatchNotFound(id));
        }
        Ok(())
    }

    // ==================== Predictions ====================

    /// Insert-or-replace keyed on (user, match): a later submission
    /// overwrites the earlier one and resets its points until the next
    /// scoring sweep.
    pub fn upsert_prediction(&self, prediction: &NewPrediction) -> DbResult<()> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO predictions
                 (user_id, match_id, week, home_team, away_team, score, winner, points, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL, ?8, ?8)
             ON CONFLICT (user_id, match_id) DO UPDATE SET
                 week = excluded.week,
                 home_team = excluded.home_team,
                 away_team = excluded.away_team,
                 score = excluded.score,
                 winner = excluded.winner,
                 points = NULL,
                 updated_at = excluded.updated_at",
            params![
                prediction.user_id,
                prediction.match_id,
                prediction.week,
                prediction.home_team,
                prediction.away_team,
                prediction.score,
                prediction.winner,
                now,
            ],
        )?;
        Ok(())
    }

    pub fn predictions_for_match(&self, match_id: i64) -> DbResult<Vec<Prediction>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, match_id, week, home_team, away_team, score, winner, points
             FROM predictions WHERE match_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![match_id], |row| {
            Ok(Prediction {
                id: row.get(0)?,
                user_id: row.get(1)?,
                match_id: row.get(2)?,
                week: row.get(3)?,
                home_team: row.get(4)?,
                away_team: row.get(5)?,
                score: row.get(6)?,
                winner: row.get(7)?,
                points: row.get(8)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    pub fn predictions_for_user(
        &self,
        user_id: i64,
        week: Option<u32>,
    ) -> DbResult<Vec<PredictionView>> {
        let conn = self.conn.lock().unwrap();
        let base = "SELECT p.match_id, p.week, p.home_team, p.away_team, p.score, p.winner, p.points, m.result
             FROM predictions p
             JOIN matches m ON p.match_id = m.id
             WHERE p.user_id = ?1";
        let view_from_row = |row: &rusqlite::Row<'_>| {
            Ok(PredictionView {
                match_id: row.get(0)?,
                week: row.get(1)?,
                home_team: row.get(2)?,
                away_team: row.get(3)?,
                score: row.get(4)?,
                winner: row.get(5)?,
                points: row.get(6)?,
                result: row.get(7)?,
            })
        };
        let rows = match week {
            Some(week) => {
                let mut stmt =
                    conn.prepare(&format!("{base} AND p.week = ?2 ORDER BY p.week, p.match_id"))?;
                let rows = stmt.query_map(params![user_id, week], view_from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = conn.prepare(&format!("{base} ORDER BY p.week, p.match_id"))?;
                let rows = stmt.query_map(params![user_id], view_from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(rows)
    }

    pub fn set_prediction_points(&self, prediction_id: i64, points: i64) -> DbResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE predictions SET points = ?1, updated_at = ?2 WHERE id = ?3",
            params![points, Utc::now().to_rfc3339(), prediction_id],
        )?;
        Ok(())
    }

    // ==================== Settings and current week ====================

    pub fn get_setting(&self, key: &str) -> DbResult<Option<String>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT value FROM settings WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .map_err(DbError::from)
    }

    pub fn set_setting(&self, key: &str, value: &str) -> DbResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// The persisted current week. Always at least 1, whatever is stored.
    pub fn current_week(&self) -> DbResult<u32> {
        let week = self
            .get_setting(CURRENT_WEEK_KEY)?
            .and_then(|value| value.trim().parse::<u32>().ok())
            .unwrap_or(1);
        Ok(week.max(1))
    }

    pub fn set_current_week(&self, week: u32) -> DbResult<()> {
        self.set_setting(CURRENT_WEEK_KEY, &week.max(1).to_string())
    }

    pub fn lock_week(&self, week: u32) -> DbResult<()> {
        self.set_setting(&format!("lock_week_{week}"), "1")
    }

    pub fn unlock_week(&self, week: u32) -> DbResult<()> {
        self.set_setting(&format!("lock_week_{week}"), "0")
    }

    pub fn is_week_locked(&self, week: u32) -> DbResult<bool> {
        Ok(self
            .get_setting(&format!("lock_week_{week}"))?
            .is_some_and(|value| value == "1"))
    }

    // ==================== Leaderboard ====================

    /// Total points per user, highest first, capped to `limit` rows.
    /// Unscored predictions (points still NULL) don't contribute.
    pub fn leaderboard(&self, week: Option<u32>, limit: usize) -> DbResult<Vec<LeaderboardRow>> {
        let conn = self.conn.lock().unwrap();
        let row_from = |row: &rusqlite::Row<'_>| {
            Ok(LeaderboardRow {
                user_id: row.get(0)?,
                full_name: row.get(1)?,
                total_points: row.get(2)?,
            })
        };
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = match week {
            Some(week) => {
                let mut stmt = conn.prepare(
                    "SELECT u.user_id, u.full_name, SUM(p.points) AS total_points
                     FROM predictions p
                     JOIN users u ON p.user_id = u.user_id
                     WHERE p.week = ?1 AND p.points IS NOT NULL
                     GROUP BY p.user_id
                     ORDER BY total_points DESC, u.user_id
                     LIMIT ?2",
                )?;
                let rows = stmt.query_map(params![week, limit], row_from)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT u.user_id, u.full_name, SUM(p.points) AS total_points
                     FROM predictions p
                     JOIN users u ON p.user_id = u.user_id
                     WHERE p.points IS NOT NULL
                     GROUP BY p.user_id
                     ORDER BY total_points DESC, u.user_id
                     LIMIT ?1",
                )?;
                let rows = stmt.query_map(params![limit], row_from)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(rows)
    }
}

fn match_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Match> {
    Ok(Match {
        id: row.get(0)?,
        week: row.get(1)?,
        home_team: row.get(2)?,
        away_team: row.get(3)?,
        result: row.get(4)?,
        winner: row.get(5)?,
        created_at: parse_datetime(&row.get::<_, String>(6)?),
        updated_at: parse_datetime(&row.get::<_, String>(7)?),
    })
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.insert_match(1, 1, "Reds", "Blues", None).unwrap();
        db.insert_match(2, 1, "Greens", "Whites", None).unwrap();
        db.insert_match(3, 2, "Reds", "Greens", None).unwrap();
        db.upsert_user(&UserProfile {
            user_id: 10,
            full_name: "Alice".to_string(),
            username: Some("alice".to_string()),
            language_code: None,
        })
        .unwrap();
        db
    }

    fn prediction(user_id: i64, match_id: i64, score: &str, winner: &str) -> NewPrediction {
        NewPrediction {
            user_id,
            match_id,
            week: 1,
            home_team: "Reds".to_string(),
            away_team: "Blues".to_string(),
            score: score.to_string(),
            winner: winner.to_string(),
        }
    }

    #[test]
    fn user_upsert_is_idempotent() {
        let db = seeded();
        db.upsert_user(&UserProfile {
            user_id: 10,
            full_name: "Alice Renamed".to_string(),
            username: None,
            language_code: None,
        })
        .unwrap();

        // second insert is ignored, the original row stays
        let rows = db.leaderboard(None, 10).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn next_unpredicted_match_walks_in_id_order() {
        let db = seeded();
        let first = db.next_unpredicted_match(10, 1).unwrap().unwrap();
        assert_eq!(first.id, 1);

        db.upsert_prediction(&prediction(10, 1, "2-1", "Reds")).unwrap();
        let second = db.next_unpredicted_match(10, 1).unwrap().unwrap();
        assert_eq!(second.id, 2);

        db.upsert_prediction(&prediction(10, 2, "0-0", "Draw")).unwrap();
        assert!(db.next_unpredicted_match(10, 1).unwrap().is_none());
        assert_eq!(db.match_count_for_week(1).unwrap(), 2);
    }

    #[test]
    fn prediction_upsert_keeps_one_row_per_user_and_match() {
        let db = seeded();
        db.upsert_prediction(&prediction(10, 1, "2-1", "Reds")).unwrap();
        db.set_prediction_points(
            db.predictions_for_match(1).unwrap()[0].id,
            5,
        )
        .unwrap();
        db.upsert_prediction(&prediction(10, 1, "0-0", "Draw")).unwrap();

        let rows = db.predictions_for_match(1).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].score, "0-0");
        assert_eq!(rows[0].winner, "Draw");
        // resubmission clears any previously awarded points
        assert_eq!(rows[0].points, None);
    }

    #[test]
    fn match_result_update_requires_an_existing_row() {
        let db = seeded();
        db.set_match_result(1, "2-1", "Reds").unwrap();
        let m = db.get_match(1).unwrap().unwrap();
        assert!(m.is_resolved());
        assert_eq!(m.result.as_deref(), Some("2-1"));
        assert_eq!(m.winner.as_deref(), Some("Reds"));

        assert!(matches!(
            db.set_match_result(999, "2-1", "Reds"),
            Err(DbError::MatchNotFound(999))
        ));
    }

    #[test]
    fn unresolved_matches_shrink_as_results_land() {
        let db = seeded();
        assert_eq!(db.unresolved_matches(1).unwrap().len(), 2);
        db.set_match_result(1, "1-0", "Reds").unwrap();
        let pending = db.unresolved_matches(1).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, 2);
    }

    #[test]
    fn current_week_defaults_to_one_and_clamps() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.current_week().unwrap(), 1);

        db.set_current_week(4).unwrap();
        assert_eq!(db.current_week().unwrap(), 4);

        db.set_setting(CURRENT_WEEK_KEY, "0").unwrap();
        assert_eq!(db.current_week().unwrap(), 1);
        db.set_setting(CURRENT_WEEK_KEY, "junk").unwrap();
        assert_eq!(db.current_week().unwrap(), 1);
    }

    #[test]
    fn week_locking_round_trips() {
        let db = Database::open_in_memory().unwrap();
        assert!(!db.is_week_locked(1).unwrap());
        db.lock_week(1).unwrap();
        assert!(db.is_week_locked(1).unwrap());
        db.unlock_week(1).unwrap();
        assert!(!db.is_week_locked(1).unwrap());
    }

    #[test]
    fn leaderboard_orders_scored_points_and_caps_rows() {
        let db = seeded();
        db.upsert_user(&UserProfile {
            user_id: 11,
            full_name: "Bob".to_string(),
            username: None,
            language_code: None,
        })
        .unwrap();
        db.upsert_user(&UserProfile {
            user_id: 12,
            full_name: "Cara".to_string(),
            username: None,
            language_code: None,
        })
        .unwrap();

        db.upsert_prediction(&prediction(10, 1, "2-1", "Reds")).unwrap();
        db.upsert_prediction(&prediction(11, 1, "1-0", "Reds")).unwrap();
        db.upsert_prediction(&prediction(12, 1, "0-2", "Blues")).unwrap();
        for p in db.predictions_for_match(1).unwrap() {
            let points = match p.user_id {
                10 => 5,
                11 => 3,
                _ => 0,
            };
            db.set_prediction_points(p.id, points).unwrap();
        }

        let rows = db.leaderboard(Some(1), 10).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].full_name, "Alice");
        assert_eq!(rows[0].total_points, 5);
        assert_eq!(rows[1].full_name, "Bob");

        let capped = db.leaderboard(None, 2).unwrap();
        assert_eq!(capped.len(), 2);

        // unscored predictions never show up
        assert!(db.leaderboard(Some(2), 10).unwrap().is_empty());
    }

    #[test]
    fn predictions_for_user_join_the_live_result() {
        let db = seeded();
        db.upsert_prediction(&prediction(10, 1, "2-1", "Reds")).unwrap();
        db.set_match_result(1, "2-2", "Draw").unwrap();

        let all = db.predictions_for_user(10, None).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].result.as_deref(), Some("2-2"));

        assert!(db.predictions_for_user(10, Some(2)).unwrap().is_empty());
    }
}
