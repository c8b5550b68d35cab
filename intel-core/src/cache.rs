//! Cache gateway: TTL-keyed JSON snapshots over a pluggable store
//!
//! The gateway is constructed and injected - no process-wide singleton. It
//! keeps a per-key last-known-good copy in memory so a failing backing store
//! degrades to stale data instead of an error; only a key that was never
//! cached surfaces a `CacheRead` failure.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use parking_lot::{Mutex, RwLock};
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{PipelineError, PipelineResult};

// Cache key layout
pub const KEY_UNIFIED_THREATS: &str = "unified-threats";
pub const KEY_TOP_THREATS: &str = "top-threats";
pub const KEY_SOURCES_APPROVED: &str = "sources:approved";
pub const KEY_BLOCKED_DOMAINS: &str = "settings:blocked_domains";

/// Hour-bucketed key for batch statistics.
pub fn trends_key(at: DateTime<Utc>) -> String {
    format!("trends:{}", at.format("%Y-%m-%dT%H"))
}

// ============================================================================
// STORE TRAIT
// ============================================================================

/// A TTL-keyed string store. Implementations expire entries on read.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> PipelineResult<Option<String>>;
    fn put(&self, key: &str, value: &str, ttl_seconds: u64) -> PipelineResult<()>;
}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

/// Process-local store, used in tests and single-instance deployments.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, (String, DateTime<Utc>)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> PipelineResult<Option<String>> {
        let entries = self.entries.read();
        Ok(entries.get(key).and_then(|(value, expires_at)| {
            if *expires_at > Utc::now() {
                Some(value.clone())
            } else {
                None
            }
        }))
    }

    fn put(&self, key: &str, value: &str, ttl_seconds: u64) -> PipelineResult<()> {
        let expires_at = Utc::now() + Duration::seconds(ttl_seconds as i64);
        self.entries
            .write()
            .insert(key.to_string(), (value.to_string(), expires_at));
        Ok(())
    }
}

// ============================================================================
// SQLITE STORE
// ============================================================================

/// SQLite-backed store for cache survival across restarts.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> PipelineResult<Self> {
        let conn = Connection::open(path).map_err(|e| PipelineError::CacheRead(e.to_string()))?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS cache (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                expires_at INTEGER NOT NULL
            )",
            [],
        )
        .map_err(|e| PipelineError::CacheWrite(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl CacheStore for SqliteStore {
    fn get(&self, key: &str) -> PipelineResult<Option<String>> {
        let conn = self.conn.lock();
        let now = Utc::now().timestamp();
        let mut stmt = conn
            .prepare("SELECT value FROM cache WHERE key = ?1 AND expires_at > ?2")
            .map_err(|e| PipelineError::CacheRead(e.to_string()))?;
        let mut rows = stmt
            .query(rusqlite::params![key, now])
            .map_err(|e| PipelineError::CacheRead(e.to_string()))?;
        match rows.next().map_err(|e| PipelineError::CacheRead(e.to_string()))? {
            Some(row) => {
                let value: String = row
                    .get(0)
                    .map_err(|e| PipelineError::CacheRead(e.to_string()))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn put(&self, key: &str, value: &str, ttl_seconds: u64) -> PipelineResult<()> {
        let conn = self.conn.lock();
        let expires_at = Utc::now().timestamp() + ttl_seconds as i64;
        conn.execute(
            "INSERT INTO cache (key, value, expires_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at",
            rusqlite::params![key, value, expires_at],
        )
        .map_err(|e| PipelineError::CacheWrite(e.to_string()))?;
        Ok(())
    }
}

// ============================================================================
// GATEWAY
// ============================================================================

/// JSON cache gateway with last-known-good fallback.
pub struct CacheGateway {
    store: Box<dyn CacheStore>,
    ttl_seconds: u64,
    last_good: RwLock<HashMap<String, String>>,
}

impl CacheGateway {
    pub fn new(store: Box<dyn CacheStore>, ttl_seconds: u64) -> Self {
        Self {
            store,
            ttl_seconds,
            last_good: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    /// Write a JSON snapshot under the gateway's TTL.
    pub fn put_json<T: Serialize>(&self, key: &str, value: &T) -> PipelineResult<()> {
        let encoded =
            serde_json::to_string(value).map_err(|e| PipelineError::CacheWrite(e.to_string()))?;
        self.store.put(key, &encoded, self.ttl_seconds)?;
        self.last_good.write().insert(key.to_string(), encoded);
        Ok(())
    }

    /// Read a JSON snapshot.
    ///
    /// `Ok(None)` is a cache miss (expired or never written) - the caller
    /// recomputes and repopulates. A store failure falls back to the last
    /// successfully cached value, even if stale; only when no such value
    /// exists does the failure propagate.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> PipelineResult<Option<T>> {
        match self.store.get(key) {
            Ok(Some(encoded)) => {
                self.last_good
                    .write()
                    .insert(key.to_string(), encoded.clone());
                let value = serde_json::from_str(&encoded)
                    .map_err(|e| PipelineError::CacheRead(e.to_string()))?;
                Ok(Some(value))
            }
            Ok(None) => Ok(None),
            Err(err) => match self.last_good.read().get(key) {
                Some(stale) => {
                    tracing::warn!(key, error = %err, "cache read failed, serving last-known-good");
                    let value = serde_json::from_str(stale)
                        .map_err(|e| PipelineError::CacheRead(e.to_string()))?;
                    Ok(Some(value))
                }
                None => Err(err),
            },
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
