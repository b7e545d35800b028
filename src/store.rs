//! Persistence boundary
//!
//! The engine talks to storage through this trait so tests can
//! substitute failing or instrumented implementations. The production
//! implementation is `crate::db::Database`.

use crate::db::{
    Database, DbResult, LeaderboardRow, Match, NewPrediction, Prediction, PredictionView,
    UserProfile,
};
use async_trait::async_trait;

#[async_trait]
pub trait Store: Send + Sync {
    /// Idempotent user registration.
    async fn upsert_user(&self, profile: &UserProfile) -> DbResult<()>;

    // ==================== Matches ====================
    async fn get_match(&self, id: i64) -> DbResult<Option<Match>>;
    async fn matches_for_week(&self, week: u32) -> DbResult<Vec<Match>>;
    async fn unresolved_matches(&self, week: u32) -> DbResult<Vec<Match>>;
    async fn match_count_for_week(&self, week: u32) -> DbResult<i64>;
    async fn next_unpredicted_match(&self, user_id: i64, week: u32) -> DbResult<Option<Match>>;
    async fn set_match_result(&self, id: i64, result: &str, winner: &str) -> DbResult<()>;

    // ==================== Predictions ====================
    async fn upsert_prediction(&self, prediction: &NewPrediction) -> DbResult<()>;
    async fn predictions_for_match(&self, match_id: i64) -> DbResult<Vec<Prediction>>;
    async fn predictions_for_user(
        &self,
        user_id: i64,
        week: Option<u32>,
    ) -> DbResult<Vec<PredictionView>>;
    async fn set_prediction_points(&self, prediction_id: i64, points: i64) -> DbResult<()>;

    // ==================== Week and settings ====================
    async fn current_week(&self) -> DbResult<u32>;
    async fn set_current_week(&self, week: u32) -> DbResult<()>;
    async fn lock_week(&self, week: u32) -> DbResult<()>;
    async fn unlock_week(&self, week: u32) -> DbResult<()>;
    async fn is_week_locked(&self, week: u32) -> DbResult<bool>;

    // ==================== Aggregates ====================
    async fn leaderboard(&self, week: Option<u32>, limit: usize) -> DbResult<Vec<LeaderboardRow>>;
}

#[async_trait]
impl Store for Database {
    async fn upsert_user(&self, profile: &UserProfile) -> DbResult<()> {
        Database::upsert_user(self, profile)
    }

    async fn get_match(&self, id: i64) -> DbResult<Option<Match>> {
        Database::get_match(self, id)
    }

    async fn matches_for_week(&self, week: u32) -> DbResult<Vec<Match>> {
        Database::matches_for_week(self, week)
    }

    async fn unresolved_matches(&self, week: u32) -> DbResult<Vec<Match>> {
        Database::unresolved_matches(self, week)
    }

    async fn match_count_for_week(&self, week: u32) -> DbResult<i64> {
        Database::match_count_for_week(self, week)
    }

    async fn next_unpredicted_match(&self, user_id: i64, week: u32) -> DbResult<Option<Match>> {
        Database::next_unpredicted_match(self, user_id, week)
    }

    async fn set_match_result(&self, id: i64, result: &str, winner: &str) -> DbResult<()> {
        Database::set_match_result(self, id, result, winner)
    }

    async fn upsert_prediction(&self, prediction: &NewPrediction) -> DbResult<()> {
        Database::upsert_prediction(self, prediction)
    }

    async fn predictions_for_match(&self, match_id: i64) -> DbResult<Vec<Prediction>> {
        Database::predictions_for_match(self, match_id)
    }

    async fn predictions_for_user(
        &self,
        user_id: i64,
        week: Option<u32>,
    ) -> DbResult<Vec<PredictionView>> {
        Database::predictions_for_user(self, user_id, week)
    }

    async fn set_prediction_points(&self, prediction_id: i64, points: i64) -> DbResult<()> {
        Database::set_prediction_points(self, prediction_id, points)
    }

    async fn current_week(&self) -> DbResult<u32> {
        Database::current_week(self)
    }

    async fn set_current_week(&self, week: u32) -> DbResult<()> {
        Database::set_current_week(self, week)
    }

    async fn lock_week(&self, week: u32) -> DbResult<()> {
        Database::lock_week(self, week)
    }

    async fn unlock_week(&self, week: u32) -> DbResult<()> {
        Database::unlock_week(self, week)
    }

    async fn is_week_locked(&self, week: u32) -> DbResult<bool> {
        Database::is_week_locked(self, week)
    }

    async fn leaderboard(&self, week: Option<u32>, limit: usize) -> DbResult<Vec<LeaderboardRow>> {
        Database::leaderboard(self, week, limit)
    }
}
