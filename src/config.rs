// ⚙️ Configuration - Budget bounds + runtime paths
// The ledger consumes these values, it never owns or rewrites them.

use std::env;
use std::path::{Path, PathBuf};
use tracing::warn;

// ============================================================================
// BUDGET CONSTANTS
// ============================================================================

/// Default ceiling in whole dollars ($20,000,000)
pub const DEFAULT_CEILING: f64 = 20_000_000.0;

/// Minimum allowed ceiling ($1,000,000)
pub const MIN_CEILING: f64 = 1_000_000.0;

/// Maximum allowed ceiling ($500,000,000)
pub const MAX_CEILING: f64 = 500_000_000.0;

pub const DEFAULT_DB_PATH: &str = "roster.db";
pub const DEFAULT_LOG_LEVEL: &str = "info";

// ============================================================================
// BUDGET CONFIG
// ============================================================================

/// Read-only budget bounds injected at startup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetConfig {
    pub default_ceiling: f64,
    pub min_ceiling: f64,
    pub max_ceiling: f64,
}

impl BudgetConfig {
    /// Build a config, swapping inverted bounds and pulling the default inside them
    pub fn new(default_ceiling: f64, min_ceiling: f64, max_ceiling: f64) -> Self {
        let (min_ceiling, max_ceiling) = if min_ceiling <= max_ceiling {
            (min_ceiling, max_ceiling)
        } else {
            (max_ceiling, min_ceiling)
        };

        let default_ceiling = if default_ceiling.is_finite() {
            default_ceiling.clamp(min_ceiling, max_ceiling)
        } else {
            min_ceiling
        };

        BudgetConfig {
            default_ceiling,
            min_ceiling,
            max_ceiling,
        }
    }

    /// Clamp a requested ceiling into bounds.
    /// Returns the applied value and whether clamping happened.
    /// Non-finite requests fall back to the default ceiling.
    pub fn clamp(&self, requested: f64) -> (f64, bool) {
        if !requested.is_finite() {
            return (self.default_ceiling, true);
        }

        let applied = requested.clamp(self.min_ceiling, self.max_ceiling);
        (applied, applied != requested)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min_ceiling && value <= self.max_ceiling
    }
}

impl Default for BudgetConfig {
    fn default() -> Self {
        BudgetConfig {
            default_ceiling: DEFAULT_CEILING,
            min_ceiling: MIN_CEILING,
            max_ceiling: MAX_CEILING,
        }
    }
}

// ============================================================================
// LEDGER CONFIG
// ============================================================================

#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// SQLite file holding the roster/budget snapshot and audit trail
    pub db_path: PathBuf,

    /// Optional CSV of available players (rank,name,salary)
    pub candidates_path: Option<PathBuf>,

    /// Fallback filter when RUST_LOG is unset
    pub log_level: String,

    pub budget: BudgetConfig,
}

impl LedgerConfig {
    pub fn new(db_path: PathBuf) -> Self {
        LedgerConfig {
            db_path,
            candidates_path: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            budget: BudgetConfig::default(),
        }
    }

    /// Read configuration from ROSTER_* environment variables
    pub fn from_env() -> Self {
        let db_path = env::var("ROSTER_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DB_PATH));

        let candidates_path = env::var("ROSTER_CANDIDATES").ok().map(PathBuf::from);

        let log_level = env::var("ROSTER_LOG").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string());

        let budget = BudgetConfig::new(
            env_amount("ROSTER_DEFAULT_BUDGET", DEFAULT_CEILING),
            env_amount("ROSTER_MIN_BUDGET", MIN_CEILING),
            env_amount("ROSTER_MAX_BUDGET", MAX_CEILING),
        );

        LedgerConfig {
            db_path,
            candidates_path,
            log_level,
            budget,
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig::new(PathBuf::from(DEFAULT_DB_PATH))
    }
}

fn env_amount(key: &str, fallback: f64) -> f64 {
    match env::var(key) {
        Ok(raw) => parse_amount(&raw).unwrap_or_else(|| {
            warn!(key, value = %raw, "ignoring unparsable budget setting");
            fallback
        }),
        Err(_) => fallback,
    }
}

fn parse_amount(raw: &str) -> Option<f64> {
    let value = crate::salary::parse_salary_text(raw)?;
    (value > 0.0).then_some(value)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bounds() {
        let config = BudgetConfig::default();

        assert_eq!(config.default_ceiling, 20_000_000.0);
        assert_eq!(config.min_ceiling, 1_000_000.0);
        assert_eq!(config.max_ceiling, 500_000_000.0);
        assert!(config.contains(config.default_ceiling));
    }

    #[test]
    fn test_clamp_reports_adjustment() {
        let config = BudgetConfig::default();

        assert_eq!(config.clamp(30_000_000.0), (30_000_000.0, false));
        assert_eq!(config.clamp(10.0), (1_000_000.0, true));
        assert_eq!(config.clamp(-5.0), (1_000_000.0, true));
        assert_eq!(config.clamp(1e12), (500_000_000.0, true));
        assert_eq!(config.clamp(f64::NAN), (20_000_000.0, true));
    }

    #[test]
    fn test_new_normalizes_inverted_bounds() {
        let config = BudgetConfig::new(5.0, 100.0, 10.0);

        assert_eq!(config.min_ceiling, 10.0);
        assert_eq!(config.max_ceiling, 100.0);
        assert_eq!(config.default_ceiling, 10.0);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("$25,000,000"), Some(25_000_000.0));
        assert_eq!(parse_amount("0"), None);
        assert_eq!(parse_amount("lots"), None);
    }
}
