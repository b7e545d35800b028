//! Current-week cache
//!
//! Nearly every flow scopes its match lookups to the current week, so
//! the persisted value is memoized for a short TTL. Any explicit week
//! change must call `invalidate` so no reader observes a stale week
//! beyond that path.

use crate::db::DbResult;
use crate::store::Store;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct WeekCache {
    ttl: Duration,
    cached: Mutex<Option<(u32, Instant)>>,
}

impl WeekCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            cached: Mutex::new(None),
        }
    }

    /// The current week, from cache when fresh, otherwise re-read
    /// through the store.
    pub async fn current<S: Store + ?Sized>(&self, store: &S) -> DbResult<u32> {
        if let Some((week, read_at)) = *self.cached.lock().unwrap() {
            if read_at.elapsed() < self.ttl {
                return Ok(week);
            }
        }
        let week = store.current_week().await?;
        *self.cached.lock().unwrap() = Some((week, Instant::now()));
        Ok(week)
    }

    /// Drop the cached value so the next read hits the store.
    pub fn invalidate(&self) {
        *self.cached.lock().unwrap() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[tokio::test]
    async fn caches_within_the_ttl() {
        let db = Database::open_in_memory().unwrap();
        let cache = WeekCache::new(Duration::from_secs(300));

        assert_eq!(cache.current(&db).await.unwrap(), 1);

        // a write without invalidation is not observed inside the TTL
        db.set_current_week(5).unwrap();
        assert_eq!(cache.current(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn zero_ttl_always_re_reads() {
        let db = Database::open_in_memory().unwrap();
        let cache = WeekCache::new(Duration::ZERO);

        assert_eq!(cache.current(&db).await.unwrap(), 1);
        db.set_current_week(3).unwrap();
        assert_eq!(cache.current(&db).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn invalidation_beats_the_ttl() {
        let db = Database::open_in_memory().unwrap();
        let cache = WeekCache::new(Duration::from_secs(300));

        assert_eq!(cache.current(&db).await.unwrap(), 1);
        db.set_current_week(2).unwrap();
        cache.invalidate();
        assert_eq!(cache.current(&db).await.unwrap(), 2);
    }
}
