use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::Database;

#[derive(Deserialize, Serialize)]
struct CacheEntry {
    /// Unix seconds after which the entry reads as a miss.
    expires_at: u64,
    payload: Vec<u8>,
}

fn now() -> Result<u64> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

impl Database {
    pub(crate) fn cache_get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let Some(entry) = Database::select::<CacheEntry>(key.as_bytes(), &self.cache)? else {
            return Ok(None);
        };
        if entry.expires_at <= now()? {
            self.cache.remove(key.as_bytes())?;
            return Ok(None);
        }
        Ok(Some(entry.payload))
    }

    pub(crate) fn cache_set(&self, key: &str, payload: &[u8], ttl: Duration) -> Result<()> {
        let entry = CacheEntry {
            expires_at: now()?.saturating_add(ttl.as_secs()),
            payload: payload.to_vec(),
        };
        Database::insert(key.as_bytes(), &entry, &self.cache)
    }

    pub(crate) fn clear_cache(&self) -> Result<()> {
        self.cache.clear()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::database::Database;

    #[test]
    fn hit_then_clear() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::connect(dir.path()).unwrap();

        assert!(db.cache_get("k").unwrap().is_none());
        db.cache_set("k", b"value", Duration::from_secs(60)).unwrap();
        assert_eq!(db.cache_get("k").unwrap().as_deref(), Some(&b"value"[..]));

        db.clear_cache().unwrap();
        assert!(db.cache_get("k").unwrap().is_none());
    }

    #[test]
    fn expired_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::connect(dir.path()).unwrap();

        db.cache_set("k", b"value", Duration::ZERO).unwrap();
        assert!(db.cache_get("k").unwrap().is_none());
        // The stale entry is gone, not just hidden.
        assert!(db.cache.get("k").unwrap().is_none());
    }
}
