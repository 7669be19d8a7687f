// 🗄️ Durable Storage - Key/value snapshot + audit trail
//
// The store writes two keys after every applied mutation:
//   ROSTER_KEY → JSON array of roster entries
//   BUDGET_KEY → JSON number (ceiling)
// Backends only move strings; the store owns encoding and decoding.

use crate::error::{Result, StoreError};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

pub const ROSTER_KEY: &str = "myTeam";
pub const BUDGET_KEY: &str = "teamBudget";

/// Audit events kept by SqliteStore; older rows are pruned on append
pub const DEFAULT_EVENT_RETENTION: usize = 1_000;

// ============================================================================
// DURABLE STORE TRAIT
// ============================================================================

/// Key/value persistence with exactly one writer (the roster store)
pub trait DurableStore: Send {
    /// Read a value. Ok(None) when the key was never written.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replace a value
    fn write(&mut self, key: &str, value: &str) -> Result<()>;

    /// Append an audit event. Backends without history ignore it.
    fn append_event(&mut self, _event: &LedgerEvent) -> Result<()> {
        Ok(())
    }

    /// Most recent events first
    fn recent_events(&self, _limit: usize) -> Result<Vec<LedgerEvent>> {
        Ok(Vec::new())
    }
}

// ============================================================================
// AUDIT EVENT
// ============================================================================

/// Every applied mutation is an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEvent {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    /// Player name or "budget"
    pub subject: String,
    pub data: serde_json::Value,
}

impl LedgerEvent {
    pub fn new(event_type: &str, subject: &str, data: serde_json::Value) -> Self {
        LedgerEvent {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            subject: subject.to_string(),
            data,
        }
    }
}

// ============================================================================
// SQLITE STORE
// ============================================================================

pub struct SqliteStore {
    conn: Connection,
    event_retention: usize,
}

impl SqliteStore {
    /// Open (or create) a database file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        SqliteStore::with_connection(conn)
    }

    /// Ephemeral store for tests and throwaway sessions
    pub fn open_in_memory() -> Result<Self> {
        SqliteStore::with_connection(Connection::open_in_memory()?)
    }

    pub fn with_connection(conn: Connection) -> Result<Self> {
        setup_database(&conn)?;
        Ok(SqliteStore {
            conn,
            event_retention: DEFAULT_EVENT_RETENTION,
        })
    }

    /// Keep at most `limit` audit events (at least one)
    pub fn with_event_retention(mut self, limit: usize) -> Self {
        self.event_retention = limit.max(1);
        self
    }
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // WAL for crash recovery; in-memory databases report "memory" and that is fine
    conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv_store (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            subject TEXT NOT NULL,
            data TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_timestamp ON events(timestamp)",
        [],
    )?;

    Ok(())
}

impl DurableStore for SqliteStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv_store WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;

        Ok(value)
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;

        Ok(())
    }

    fn append_event(&mut self, event: &LedgerEvent) -> Result<()> {
        let data_json = serde_json::to_string(&event.data)?;

        self.conn.execute(
            "INSERT INTO events (event_id, timestamp, event_type, subject, data)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                event.event_id,
                event.timestamp.to_rfc3339(),
                event.event_type,
                event.subject,
                data_json,
            ],
        )?;

        self.conn.execute(
            "DELETE FROM events WHERE id <= (SELECT MAX(id) FROM events) - ?1",
            [self.event_retention as i64],
        )?;

        Ok(())
    }

    fn recent_events(&self, limit: usize) -> Result<Vec<LedgerEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT event_id, timestamp, event_type, subject, data
             FROM events
             ORDER BY id DESC
             LIMIT ?1",
        )?;

        let rows = stmt
            .query_map([limit as i64], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        // Rows that fail to decode are skipped rather than failing the whole read
        let events = rows
            .into_iter()
            .filter_map(|(event_id, timestamp, event_type, subject, data)| {
                let timestamp = DateTime::parse_from_rfc3339(&timestamp)
                    .ok()?
                    .with_timezone(&Utc);
                let data = serde_json::from_str(&data).ok()?;

                Some(LedgerEvent {
                    event_id,
                    timestamp,
                    event_type,
                    subject,
                    data,
                })
            })
            .collect();

        Ok(events)
    }
}

// ============================================================================
// MEMORY STORE
// ============================================================================

/// In-process store. `fail_writes` simulates a full or read-only backend,
/// `fail_reads` an unreachable one.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
    events: Vec<LedgerEvent>,
    fail_writes: bool,
    fail_reads: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Seed raw values, e.g. to simulate a previous session
    pub fn with_value(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }

    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn set_fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

impl DurableStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        if self.fail_reads {
            return Err(StoreError::ReadRejected {
                key: key.to_string(),
            });
        }
        Ok(self.values.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes {
            return Err(StoreError::WriteRejected {
                key: key.to_string(),
            });
        }
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn append_event(&mut self, event: &LedgerEvent) -> Result<()> {
        if self.fail_writes {
            return Err(StoreError::WriteRejected {
                key: "events".to_string(),
            });
        }
        self.events.push(event.clone());
        Ok(())
    }

    fn recent_events(&self, limit: usize) -> Result<Vec<LedgerEvent>> {
        Ok(self.events.iter().rev().take(limit).cloned().collect())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_read_write() {
        let mut store = SqliteStore::open_in_memory().unwrap();

        assert_eq!(store.read(ROSTER_KEY).unwrap(), None);

        store.write(ROSTER_KEY, "[]").unwrap();
        store.write(BUDGET_KEY, "20000000").unwrap();
        store.write(BUDGET_KEY, "30000000").unwrap();

        assert_eq!(store.read(ROSTER_KEY).unwrap().as_deref(), Some("[]"));
        assert_eq!(store.read(BUDGET_KEY).unwrap().as_deref(), Some("30000000"));
    }

    #[test]
    fn test_sqlite_file_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.db");

        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.write(BUDGET_KEY, "45000000").unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.read(BUDGET_KEY).unwrap().as_deref(), Some("45000000"));
    }

    #[test]
    fn test_sqlite_event_log() {
        let mut store = SqliteStore::open_in_memory().unwrap();

        let first = LedgerEvent::new("player_added", "LeBron James", serde_json::json!({"salary": 47600000.0}));
        let second = LedgerEvent::new("player_removed", "LeBron James", serde_json::json!({}));

        store.append_event(&first).unwrap();
        store.append_event(&second).unwrap();

        let events = store.recent_events(10).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, "player_removed");
        assert_eq!(events[1].event_id, first.event_id);
        assert_eq!(events[1].data, serde_json::json!({"salary": 47600000.0}));

        assert_eq!(store.recent_events(1).unwrap().len(), 1);
    }

    #[test]
    fn test_sqlite_event_log_is_pruned() {
        let mut store = SqliteStore::open_in_memory().unwrap().with_event_retention(3);

        for i in 0..5 {
            let event = LedgerEvent::new("budget_set", "budget", serde_json::json!({"applied": i}));
            store.append_event(&event).unwrap();
        }

        let events = store.recent_events(10).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].data, serde_json::json!({"applied": 4}));
        assert_eq!(events[2].data, serde_json::json!({"applied": 2}));
    }

    #[test]
    fn test_memory_store_rejects_reads_when_failing() {
        let mut store = MemoryStore::new().with_value(BUDGET_KEY, "1");
        store.set_fail_reads(true);

        let err = store.read(BUDGET_KEY).unwrap_err();
        assert!(matches!(err, StoreError::ReadRejected { .. }));
    }

    #[test]
    fn test_memory_store_rejects_writes_when_failing() {
        let mut store = MemoryStore::new().with_value(BUDGET_KEY, "1");
        store.set_fail_writes(true);

        let err = store.write(BUDGET_KEY, "2").unwrap_err();
        assert!(matches!(err, StoreError::WriteRejected { .. }));
        assert_eq!(store.get(BUDGET_KEY), Some("1"));
    }
}
