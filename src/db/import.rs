//! Fixtures import
//!
//! Matches are created by import, never by a conversation flow. The
//! fixtures file maps week keys (`"week_1"`) to fixture lists; import is
//! idempotent per match id, so re-running it against a live database
//! only adds what is missing.

use super::{Database, DbError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("cannot read fixtures file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed fixtures file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Db(#[from] DbError),
}

/// One scheduled fixture as it appears in the file.
#[derive(Debug, Clone, Deserialize)]
pub struct Fixture {
    pub id: i64,
    pub home: String,
    pub away: String,
    #[serde(default)]
    pub result: Option<String>,
}

/// Load a fixtures file into the matches table. Returns the number of
/// newly inserted matches; weeks with unparseable keys are skipped with
/// a warning.
pub fn load_fixtures(db: &Database, path: &Path) -> Result<usize, ImportError> {
    let raw = std::fs::read_to_string(path)?;
    let weeks: BTreeMap<String, Vec<Fixture>> = serde_json::from_str(&raw)?;

    let mut imported = 0;
    for (week_key, fixtures) in &weeks {
        let Some(week) = parse_week_key(week_key) else {
            tracing::warn!(week_key = %week_key, "Skipping fixtures under unparseable week key");
            continue;
        };
        for fixture in fixtures {
            let inserted = db.insert_match(
                fixture.id,
                week,
                &fixture.home,
                &fixture.away,
                fixture.result.as_deref(),
            )?;
            if inserted {
                imported += 1;
            }
        }
    }
    Ok(imported)
}

/// `"week_12"` → `12`. The prefix is free-form; only the last `_`
/// segment matters.
fn parse_week_key(key: &str) -> Option<u32> {
    key.rsplit('_').next()?.parse().ok()
}
