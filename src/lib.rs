// Roster Ledger - Core Library
// Budget-constrained roster state, shared by the CLI, TUI and API server

pub mod config;
pub mod error;
pub mod salary;
pub mod roster;
pub mod accounting;
pub mod storage;
pub mod store;
pub mod candidates;

// Re-export commonly used types
pub use config::{BudgetConfig, LedgerConfig, DEFAULT_CEILING, MAX_CEILING, MIN_CEILING};
pub use error::StoreError;
pub use salary::{display_salary, format_salary, normalize_salary, SalaryInput};
pub use roster::{Candidate, Roster, RosterEntry};
pub use accounting::BudgetSummary;
pub use storage::{
    DurableStore, LedgerEvent, MemoryStore, SqliteStore, BUDGET_KEY, DEFAULT_EVENT_RETENTION,
    ROSTER_KEY,
};
pub use store::{
    AddOutcome, BudgetChange, LedgerSnapshot, RemoveOutcome, RosterStore, SubscriptionId,
};
pub use candidates::{
    describe_add, AvailableQuery, CandidatePool, PoolPlayer, RecommendationButton,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install the tracing subscriber used by both binaries.
/// RUST_LOG wins; otherwise `fallback` (e.g. "info") applies.
pub fn init_tracing(fallback: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback));

    // A second init (tests, embedding) is not an error worth surfacing
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Open the configured ledger, falling back to an in-memory backend when
/// the database cannot be opened so the session still works.
pub fn open_ledger(config: &LedgerConfig) -> RosterStore {
    let backend: Box<dyn DurableStore> = match SqliteStore::open(config.db_path()) {
        Ok(store) => Box::new(store),
        Err(e) => {
            tracing::warn!(path = ?config.db_path(), error = %e, "cannot open roster database, session will not persist");
            Box::new(MemoryStore::new())
        }
    };

    RosterStore::load(backend, config.budget)
}

/// Candidate pool from the configured CSV, or the built-in fallback players
pub fn open_pool(config: &LedgerConfig) -> CandidatePool {
    match &config.candidates_path {
        Some(path) => CandidatePool::from_csv(path).unwrap_or_else(|e| {
            tracing::warn!(path = ?path, error = %e, "cannot load candidate pool, using fallback players");
            CandidatePool::fallback()
        }),
        None => CandidatePool::fallback(),
    }
}
