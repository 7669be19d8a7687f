// 📒 Roster Store - The only writable surface over roster + ceiling
//
// Every mutation follows the same path:
//   1. apply to in-memory state
//   2. write-through snapshot to durable storage (failures logged, never rolled back)
//   3. append audit event
//   4. notify subscribers with a freshly derived snapshot
// Consumers get read access and the Mutation API, nothing else.

use crate::accounting::{self, BudgetSummary};
use crate::config::BudgetConfig;
use crate::roster::{Candidate, Roster, RosterEntry};
use crate::storage::{DurableStore, LedgerEvent, BUDGET_KEY, ROSTER_KEY};
use serde::Serialize;
use tracing::{debug, info, warn};

// ============================================================================
// OUTCOMES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddOutcome {
    Added,
    AlreadyPresent,
}

impl AddOutcome {
    pub fn is_added(&self) -> bool {
        matches!(self, AddOutcome::Added)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoveOutcome {
    Removed,
    NotFound,
}

/// Result of setting the ceiling
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BudgetChange {
    pub requested: f64,
    pub applied: f64,
    pub clamped: bool,
}

// ============================================================================
// SNAPSHOT + SUBSCRIPTIONS
// ============================================================================

/// Consistent view handed to subscribers after each mutation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerSnapshot {
    pub roster: Vec<RosterEntry>,
    pub summary: BudgetSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&LedgerSnapshot) + Send>;

// ============================================================================
// ROSTER STORE
// ============================================================================

pub struct RosterStore {
    roster: Roster,
    ceiling: f64,
    config: BudgetConfig,
    backend: Box<dyn DurableStore>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
    durable: bool,
}

impl RosterStore {
    /// Load roster and ceiling from durable storage.
    ///
    /// Never fails: an unreadable roster yields an empty roster and an
    /// unreadable, non-positive or missing ceiling yields the default.
    /// A previously set ceiling is kept (clamped to the current bounds).
    pub fn load(backend: Box<dyn DurableStore>, config: BudgetConfig) -> Self {
        let roster = load_roster(backend.as_ref());
        let ceiling = load_ceiling(backend.as_ref(), &config);

        info!(
            players = roster.len(),
            ceiling,
            "roster ledger loaded"
        );

        RosterStore {
            roster,
            ceiling,
            config,
            backend,
            subscribers: Vec::new(),
            next_subscription: 0,
            durable: true,
        }
    }

    // ========================================================================
    // READ ACCESS
    // ========================================================================

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn ceiling(&self) -> f64 {
        self.ceiling
    }

    pub fn spent(&self) -> f64 {
        accounting::spent(&self.roster)
    }

    pub fn remaining(&self) -> f64 {
        accounting::remaining(self.ceiling, self.spent())
    }

    pub fn summary(&self) -> BudgetSummary {
        BudgetSummary::derive(self.roster.entries(), self.ceiling)
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            roster: self.roster.entries().to_vec(),
            summary: self.summary(),
        }
    }

    pub fn config(&self) -> &BudgetConfig {
        &self.config
    }

    /// False once a snapshot write has failed and no later write succeeded
    pub fn is_durable(&self) -> bool {
        self.durable
    }

    /// Audit trail, most recent first. Read failures yield an empty list.
    pub fn history(&self, limit: usize) -> Vec<LedgerEvent> {
        self.backend.recent_events(limit).unwrap_or_else(|e| {
            warn!(error = %e, "failed to read ledger history");
            Vec::new()
        })
    }

    // ========================================================================
    // SUBSCRIPTIONS
    // ========================================================================

    /// Register a consumer; it is called after every applied mutation
    pub fn subscribe<F>(&mut self, subscriber: F) -> SubscriptionId
    where
        F: FnMut(&LedgerSnapshot) + Send + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    // ========================================================================
    // MUTATION API
    // ========================================================================

    /// Add a candidate. Same exact name already present → no-op.
    pub fn add_player(&mut self, candidate: Candidate) -> AddOutcome {
        let entry = RosterEntry::from_candidate(&candidate);

        if self.roster.contains(&entry.name) {
            debug!(name = %entry.name, "player already on roster");
            return AddOutcome::AlreadyPresent;
        }

        let event = LedgerEvent::new(
            "player_added",
            &entry.name,
            serde_json::json!({
                "salary": entry.salary,
                "display_salary": entry.display_salary,
                "position": entry.position,
            }),
        );

        debug!(name = %entry.name, salary = entry.salary, "adding player");
        self.roster.insert(entry);
        self.commit(event);

        AddOutcome::Added
    }

    /// Remove at most one entry with this exact name.
    /// Nothing removed → nothing written.
    pub fn remove_player(&mut self, name: &str) -> RemoveOutcome {
        match self.roster.remove(name) {
            Some(entry) => {
                debug!(name, "removed player");
                let event = LedgerEvent::new(
                    "player_removed",
                    name,
                    serde_json::json!({ "salary": entry.salary }),
                );
                self.commit(event);
                RemoveOutcome::Removed
            }
            None => {
                debug!(name, "remove ignored, player not on roster");
                RemoveOutcome::NotFound
            }
        }
    }

    /// Empty the roster; the ceiling is left alone
    pub fn reset_roster(&mut self) {
        let cleared = self.roster.len();
        self.roster.clear();

        debug!(cleared, "roster reset");
        let event = LedgerEvent::new(
            "roster_reset",
            "roster",
            serde_json::json!({ "cleared": cleared }),
        );
        self.commit(event);
    }

    /// Replace the ceiling, clamped to the configured bounds
    pub fn set_budget(&mut self, requested: f64) -> BudgetChange {
        let (applied, clamped) = self.config.clamp(requested);

        if clamped {
            info!(requested, applied, "budget clamped to configured bounds");
        }

        let previous = self.ceiling;
        self.ceiling = applied;

        let event = LedgerEvent::new(
            "budget_set",
            "budget",
            serde_json::json!({
                "previous": previous,
                "requested": requested,
                "applied": applied,
                "clamped": clamped,
            }),
        );
        self.commit(event);

        BudgetChange {
            requested,
            applied,
            clamped,
        }
    }

    /// Reset the ceiling to `value`, or to the configured default
    pub fn reset_budget(&mut self, value: Option<f64>) -> BudgetChange {
        self.set_budget(value.unwrap_or(self.config.default_ceiling))
    }

    // ========================================================================
    // PERSIST + NOTIFY
    // ========================================================================

    fn commit(&mut self, event: LedgerEvent) {
        self.persist();

        if let Err(e) = self.backend.append_event(&event) {
            warn!(event_type = %event.event_type, error = %e, "failed to record ledger event");
        }

        self.notify();
    }

    /// Write-through of the current snapshot. Failures are logged and the
    /// in-memory state stays authoritative for the rest of the session.
    fn persist(&mut self) -> bool {
        let roster_ok = match serde_json::to_string(&self.roster) {
            Ok(json) => self.write_key(ROSTER_KEY, &json),
            Err(e) => {
                warn!(key = ROSTER_KEY, error = %e, "failed to encode roster");
                false
            }
        };

        let budget_ok = match serde_json::to_string(&self.ceiling) {
            Ok(json) => self.write_key(BUDGET_KEY, &json),
            Err(e) => {
                warn!(key = BUDGET_KEY, error = %e, "failed to encode budget");
                false
            }
        };

        self.durable = roster_ok && budget_ok;
        self.durable
    }

    fn write_key(&mut self, key: &str, value: &str) -> bool {
        match self.backend.write(key, value) {
            Ok(()) => true,
            Err(e) => {
                warn!(key, error = %e, "durable write failed, keeping in-memory state");
                false
            }
        }
    }

    fn notify(&mut self) {
        if self.subscribers.is_empty() {
            return;
        }

        let snapshot = self.snapshot();
        for (_, subscriber) in self.subscribers.iter_mut() {
            subscriber(&snapshot);
        }
    }
}

fn load_roster(backend: &dyn DurableStore) -> Roster {
    match backend.read(ROSTER_KEY) {
        Ok(Some(json)) => Roster::decode_lenient(&json).unwrap_or_else(|e| {
            warn!(key = ROSTER_KEY, error = %e, "stored roster unreadable, starting empty");
            Roster::new()
        }),
        Ok(None) => Roster::new(),
        Err(e) => {
            warn!(key = ROSTER_KEY, error = %e, "failed to read roster, starting empty");
            Roster::new()
        }
    }
}

fn load_ceiling(backend: &dyn DurableStore, config: &BudgetConfig) -> f64 {
    let stored = match backend.read(BUDGET_KEY) {
        Ok(Some(raw)) => serde_json::from_str::<f64>(raw.trim())
            .ok()
            .or_else(|| crate::salary::parse_salary_text(&raw)),
        Ok(None) => None,
        Err(e) => {
            warn!(key = BUDGET_KEY, error = %e, "failed to read budget, using default");
            None
        }
    };

    match stored {
        Some(value) if value.is_finite() && value > 0.0 => {
            let (applied, clamped) = config.clamp(value);
            if clamped {
                warn!(stored = value, applied, "stored budget outside bounds, clamped");
            }
            applied
        }
        Some(value) => {
            warn!(stored = value, "stored budget not positive, using default");
            config.default_ceiling
        }
        None => config.default_ceiling,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, SqliteStore};
    use std::sync::{Arc, Mutex};

    fn fresh() -> RosterStore {
        RosterStore::load(Box::new(MemoryStore::new()), BudgetConfig::default())
    }

    #[test]
    fn test_scenario_lebron() {
        let mut store = fresh();
        assert_eq!(store.ceiling(), 20_000_000.0);

        let outcome = store.add_player(Candidate::new("LeBron James", "$47,600,000"));
        assert_eq!(outcome, AddOutcome::Added);
        assert_eq!(store.spent(), 47_600_000.0);
        assert_eq!(store.remaining(), -27_600_000.0);

        let outcome = store.add_player(Candidate::new("LeBron James", 1.0));
        assert_eq!(outcome, AddOutcome::AlreadyPresent);
        assert_eq!(store.roster().len(), 1);

        assert_eq!(store.remove_player("LeBron James"), RemoveOutcome::Removed);
        assert!(store.roster().is_empty());
        assert_eq!(store.spent(), 0.0);
        assert_eq!(store.remaining(), 20_000_000.0);
    }

    #[test]
    fn test_spent_tracks_adds_and_removes() {
        let mut store = fresh();
        let salaries = [("A", 1_000_000.1), ("B", 2_500_000.7), ("C", 0.3), ("D", 999.9)];

        for (name, salary) in salaries {
            store.add_player(Candidate::new(name, salary));
        }
        store.remove_player("B");
        store.add_player(Candidate::new("E", "$12,345"));
        store.remove_player("missing");

        let expected: f64 = store.roster().iter().map(|e| e.salary).sum();
        assert_eq!(store.spent(), expected);
        assert_eq!(store.summary().remaining, store.ceiling() - expected);
    }

    #[test]
    fn test_normalized_salary_reduces_remaining() {
        let mut store = fresh();
        let before = store.remaining();

        store.add_player(Candidate::new("X", "$1,234,567"));

        assert_eq!(store.roster().get("X").unwrap().salary, 1_234_567.0);
        assert_eq!(before - store.remaining(), 1_234_567.0);
    }

    #[test]
    fn test_reset_roster_twice() {
        let mut store = fresh();
        store.add_player(Candidate::new("A", 5.0));
        store.set_budget(30_000_000.0);

        store.reset_roster();
        assert!(store.roster().is_empty());
        store.reset_roster();
        assert!(store.roster().is_empty());
        assert_eq!(store.ceiling(), 30_000_000.0);
    }

    #[test]
    fn test_over_budget_is_allowed() {
        let mut store = fresh();

        assert!(store.add_player(Candidate::new("A", 15_000_000.0)).is_added());
        assert!(store.add_player(Candidate::new("B", 15_000_000.0)).is_added());

        assert!(store.remaining() < 0.0);
        assert!(store.summary().is_over_budget());
    }

    #[test]
    fn test_round_trip_through_storage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.db");

        let expected_roster;
        {
            let backend = SqliteStore::open(&path).unwrap();
            let mut store = RosterStore::load(Box::new(backend), BudgetConfig::default());
            store.add_player(Candidate::new("Stephen Curry", "$55,760,000").with_position("G"));
            store.add_player(Candidate::new("Kevin Durant", 51_200_000.0).with_display("$51.2M"));
            store.add_player(Candidate::new("Nikola Jokic", "$50,200,000"));
            store.set_budget(175_000_000.0);
            expected_roster = store.roster().clone();
        }

        let backend = SqliteStore::open(&path).unwrap();
        let reloaded = RosterStore::load(Box::new(backend), BudgetConfig::default());

        assert_eq!(reloaded.roster(), &expected_roster);
        assert_eq!(reloaded.ceiling(), 175_000_000.0);
        assert_eq!(reloaded.roster().get("Kevin Durant").unwrap().display_salary, "$51.2M");
    }

    #[test]
    fn test_load_defaults_on_corrupt_storage() {
        let backend = MemoryStore::new()
            .with_value(ROSTER_KEY, "{not json")
            .with_value(BUDGET_KEY, "banana");
        let store = RosterStore::load(Box::new(backend), BudgetConfig::default());

        assert!(store.roster().is_empty());
        assert_eq!(store.ceiling(), 20_000_000.0);
    }

    #[test]
    fn test_load_rejects_non_positive_ceiling() {
        let backend = MemoryStore::new().with_value(BUDGET_KEY, "-5");
        let store = RosterStore::load(Box::new(backend), BudgetConfig::default());

        assert_eq!(store.ceiling(), 20_000_000.0);
    }

    #[test]
    fn test_load_keeps_user_ceiling() {
        let backend = MemoryStore::new().with_value(BUDGET_KEY, "42000000");
        let store = RosterStore::load(Box::new(backend), BudgetConfig::default());

        assert_eq!(store.ceiling(), 42_000_000.0);
    }

    #[test]
    fn test_load_clamps_stored_ceiling() {
        let backend = MemoryStore::new().with_value(BUDGET_KEY, "900000000");
        let store = RosterStore::load(Box::new(backend), BudgetConfig::default());

        assert_eq!(store.ceiling(), 500_000_000.0);
    }

    #[test]
    fn test_load_survives_read_failure() {
        let mut backend = MemoryStore::new()
            .with_value(ROSTER_KEY, r#"[{"name":"A","position":"","salary":5,"displaySalary":"$5"}]"#)
            .with_value(BUDGET_KEY, "42000000");
        backend.set_fail_reads(true);

        let mut store = RosterStore::load(Box::new(backend), BudgetConfig::default());

        assert!(store.roster().is_empty());
        assert_eq!(store.ceiling(), 20_000_000.0);
        assert_eq!(store.add_player(Candidate::new("B", 10.0)), AddOutcome::Added);
        assert_eq!(store.remaining(), 19_999_990.0);
    }

    #[test]
    fn test_write_failure_keeps_memory_state() {
        let mut backend = MemoryStore::new();
        backend.set_fail_writes(true);
        let mut store = RosterStore::load(Box::new(backend), BudgetConfig::default());

        let outcome = store.add_player(Candidate::new("A", 100.0));

        assert_eq!(outcome, AddOutcome::Added);
        assert_eq!(store.roster().len(), 1);
        assert_eq!(store.spent(), 100.0);
        assert!(!store.is_durable());
    }

    #[test]
    fn test_set_budget_clamps() {
        let mut store = fresh();

        let change = store.set_budget(50.0);
        assert!(change.clamped);
        assert_eq!(change.applied, 1_000_000.0);
        assert_eq!(store.ceiling(), 1_000_000.0);

        let change = store.set_budget(60_000_000.0);
        assert!(!change.clamped);
        assert_eq!(store.ceiling(), 60_000_000.0);

        let change = store.reset_budget(None);
        assert_eq!(change.applied, 20_000_000.0);

        let change = store.reset_budget(Some(80_000_000.0));
        assert_eq!(change.applied, 80_000_000.0);
    }

    #[test]
    fn test_subscribers_see_consistent_snapshots() {
        let mut store = fresh();
        let seen: Arc<Mutex<Vec<LedgerSnapshot>>> = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        let id = store.subscribe(move |snapshot| sink.lock().unwrap().push(snapshot.clone()));

        store.add_player(Candidate::new("A", 3_000_000.0));
        store.add_player(Candidate::new("A", 1.0));
        store.set_budget(10_000_000.0);
        store.remove_player("nobody");

        {
            let seen = seen.lock().unwrap();
            assert_eq!(seen.len(), 2);
            assert_eq!(seen[0].summary.spent, 3_000_000.0);
            assert_eq!(seen[0].summary.remaining, 17_000_000.0);
            assert_eq!(seen[1].summary.remaining, 7_000_000.0);
            assert_eq!(seen[1].roster.len(), 1);
        }

        assert!(store.unsubscribe(id));
        store.reset_roster();
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_history_records_mutations() {
        let mut store = fresh();
        store.add_player(Candidate::new("A", 1.0));
        store.add_player(Candidate::new("A", 1.0));
        store.remove_player("A");
        store.reset_budget(None);

        let history = store.history(10);
        let types: Vec<&str> = history.iter().map(|e| e.event_type.as_str()).collect();

        assert_eq!(types, vec!["budget_set", "player_removed", "player_added"]);
    }
}
