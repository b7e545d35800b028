//! Runtime configuration
//!
//! Every knob is read from the environment with a default, under the
//! `MATCHDAY_*` naming scheme. `Config` is built once at startup and
//! handed to the engine; nothing reads the environment after that.

use crate::scoring::ScoringRules;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file.
    pub db_path: String,
    /// HTTP listen port for the transport binding.
    pub port: u16,
    /// Users allowed to run admin commands.
    pub admin_ids: Vec<i64>,
    /// Optional fixtures JSON imported at startup.
    pub fixtures_path: Option<String>,
    pub scoring: ScoringRules,
    /// Scorelines offered on the quick-pick keyboard.
    pub score_menu: Vec<String>,
    /// Longest accepted score submission, in bytes.
    pub max_score_len: usize,
    pub week_cache_ttl: Duration,
    /// Leaderboard row cap.
    pub leaderboard_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            port: 8000,
            admin_ids: Vec::new(),
            fixtures_path: None,
            scoring: ScoringRules::default(),
            score_menu: ["1-0", "2-1", "3-1", "0-0"]
                .into_iter()
                .map(String::from)
                .collect(),
            max_score_len: 7,
            week_cache_ttl: Duration::from_secs(300),
            leaderboard_size: 10,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Config::default();
        if let Ok(path) = std::env::var("MATCHDAY_DB_PATH") {
            config.db_path = path;
        }
        if let Some(port) = env_parse("MATCHDAY_PORT") {
            config.port = port;
        }
        if let Ok(raw) = std::env::var("MATCHDAY_ADMIN_IDS") {
            config.admin_ids = parse_id_list(&raw);
        }
        config.fixtures_path = std::env::var("MATCHDAY_FIXTURES").ok();
        if let Some(points) = env_parse("MATCHDAY_POINTS_EXACT") {
            config.scoring.exact_score = points;
        }
        if let Some(points) = env_parse("MATCHDAY_POINTS_WINNER") {
            config.scoring.correct_winner = points;
        }
        if let Some(points) = env_parse("MATCHDAY_POINTS_PARTIAL") {
            config.scoring.partial_score = points;
        }
        if let Ok(label) = std::env::var("MATCHDAY_DRAW_LABEL") {
            if !label.trim().is_empty() {
                config.scoring.draw_label = label.trim().to_string();
            }
        }
        if let Ok(raw) = std::env::var("MATCHDAY_SCORE_MENU") {
            let menu: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
            if !menu.is_empty() {
                config.score_menu = menu;
            }
        }
        if let Some(len) = env_parse("MATCHDAY_MAX_SCORE_LEN") {
            config.max_score_len = len;
        }
        if let Some(secs) = env_parse::<u64>("MATCHDAY_WEEK_CACHE_TTL") {
            config.week_cache_ttl = Duration::from_secs(secs);
        }
        if let Some(size) = env_parse("MATCHDAY_LEADERBOARD_SIZE") {
            config.leaderboard_size = size;
        }
        config
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admin_ids.contains(&user_id)
    }
}

fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    format!("{home}/.matchday/matchday.db")
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Parse a comma-separated id list, skipping anything non-numeric.
fn parse_id_list(raw: &str) -> Vec<i64> {
    raw.split(',')
        .filter_map(|part| part.trim().parse().ok())
        .collect()
}
