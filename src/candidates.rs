// 🔎 Candidate Sources - Player pool queries + recommendation buttons
//
// Neither source touches the roster. Both hand back Candidates, and the
// caller sends them through RosterStore::add_player like a manual pick.

use crate::roster::Candidate;
use crate::salary::{format_salary, normalize_salary, SalaryInput};
use crate::store::AddOutcome;
use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// Players returned per query
pub const DEFAULT_PAGE_SIZE: usize = 5;

// ============================================================================
// POOL PLAYER
// ============================================================================

/// One row from the player service: `{name, rank, salary}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolPlayer {
    #[serde(deserialize_with = "deserialize_rank")]
    pub rank: u32,
    pub name: String,
    /// Salary as published, e.g. "$47,600,000"
    pub salary: String,
}

impl PoolPlayer {
    pub fn new(rank: u32, name: &str, salary: &str) -> Self {
        PoolPlayer {
            rank,
            name: name.to_string(),
            salary: salary.to_string(),
        }
    }

    pub fn salary_amount(&self) -> f64 {
        normalize_salary(&SalaryInput::Text(self.salary.clone()))
    }

    /// Map the service shape to `{name, salary}` for add_player
    pub fn to_candidate(&self) -> Candidate {
        Candidate::new(self.name.clone(), self.salary.clone())
    }
}

/// Ranks are published as "1." in the source data
fn deserialize_rank<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.trim()
        .trim_end_matches('.')
        .parse::<u32>()
        .map_err(serde::de::Error::custom)
}

// ============================================================================
// QUERIES
// ============================================================================

/// Rank takes priority over budget when both are given
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AvailableQuery {
    Rank(u32),
    Budget(f64),
}

impl AvailableQuery {
    pub fn from_params(rank: Option<u32>, budget: f64) -> Self {
        match rank {
            Some(rank) if rank > 0 => AvailableQuery::Rank(rank),
            _ => AvailableQuery::Budget(budget),
        }
    }
}

// ============================================================================
// CANDIDATE POOL
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct CandidatePool {
    players: Vec<PoolPlayer>,
}

impl CandidatePool {
    /// Build a pool, ordered by rank
    pub fn new(mut players: Vec<PoolPlayer>) -> Self {
        players.sort_by_key(|p| p.rank);
        CandidatePool { players }
    }

    /// Load from CSV with headers `rank,name,salary`
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut rdr = csv::Reader::from_path(path.as_ref())
            .with_context(|| format!("Failed to open candidate CSV: {:?}", path.as_ref()))?;

        let mut players = Vec::new();
        for result in rdr.deserialize() {
            let player: PoolPlayer = result.context("Failed to deserialize player row")?;
            players.push(player);
        }

        Ok(CandidatePool::new(players))
    }

    /// The five players used when no pool is available
    pub fn fallback() -> Self {
        CandidatePool::new(vec![
            PoolPlayer::new(1, "LeBron James", "$47,600,000"),
            PoolPlayer::new(2, "Stephen Curry", "$55,760,000"),
            PoolPlayer::new(3, "Kevin Durant", "$51,200,000"),
            PoolPlayer::new(4, "Giannis Antetokounmpo", "$48,800,000"),
            PoolPlayer::new(5, "Nikola Jokic", "$50,200,000"),
        ])
    }

    pub fn players(&self) -> &[PoolPlayer] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// First five players ranked within [rank, rank + 5]
    pub fn from_rank(&self, rank: u32) -> Vec<PoolPlayer> {
        let last = rank.saturating_add(DEFAULT_PAGE_SIZE as u32);

        self.players
            .iter()
            .filter(|p| p.rank >= rank && p.rank <= last)
            .take(DEFAULT_PAGE_SIZE)
            .cloned()
            .collect()
    }

    /// First rank ≥ start_rank whose cheapest player fits within budget
    pub fn next_available_rank(&self, budget: f64, start_rank: u32) -> Option<u32> {
        self.players
            .iter()
            .filter(|p| p.rank >= start_rank && p.salary_amount() <= budget)
            .map(|p| p.rank)
            .min()
    }

    /// Up to five affordable players, starting at the next available rank
    pub fn within_budget(&self, budget: f64, start_rank: u32) -> Vec<PoolPlayer> {
        let Some(first) = self.next_available_rank(budget, start_rank) else {
            return Vec::new();
        };

        self.players
            .iter()
            .filter(|p| p.rank >= first && p.salary_amount() <= budget)
            .take(DEFAULT_PAGE_SIZE)
            .cloned()
            .collect()
    }

    pub fn query(&self, query: AvailableQuery) -> Vec<PoolPlayer> {
        match query {
            AvailableQuery::Rank(rank) => self.from_rank(rank),
            AvailableQuery::Budget(budget) => self.within_budget(budget, 1),
        }
    }
}

// ============================================================================
// RECOMMENDATION BUTTONS
// ============================================================================

/// Button attached to a recommendation reply
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationButton {
    #[serde(default)]
    pub action: String,
    /// Player name
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub salary: SalaryInput,
    #[serde(default)]
    pub salary_display: Option<String>,
}

impl RecommendationButton {
    /// Only add/select actions produce a candidate
    pub fn to_candidate(&self) -> Option<Candidate> {
        match self.action.as_str() {
            "add_player" | "select_player" => Some(Candidate {
                name: self.text.clone(),
                position: None,
                salary: self.salary.clone(),
                salary_display: self.salary_display.clone(),
            }),
            _ => None,
        }
    }
}

/// Informational message shown after an add attempt
pub fn describe_add(outcome: AddOutcome, name: &str, remaining: f64) -> String {
    match outcome {
        AddOutcome::Added => format!(
            "Added {} to your team. Remaining budget: {}",
            name,
            format_salary(remaining)
        ),
        AddOutcome::AlreadyPresent => format!(
            "{} is already on your team. Remaining budget: {}",
            name,
            format_salary(remaining)
        ),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BudgetConfig;
    use crate::storage::MemoryStore;
    use crate::store::RosterStore;
    use std::io::Write;

    fn pool() -> CandidatePool {
        CandidatePool::new(vec![
            PoolPlayer::new(3, "Kevin Durant", "$51,200,000"),
            PoolPlayer::new(1, "LeBron James", "$47,600,000"),
            PoolPlayer::new(2, "Stephen Curry", "$55,760,000"),
            PoolPlayer::new(80, "Role Player", "$9,000,000"),
            PoolPlayer::new(81, "Bench Player", "$2,100,000"),
            PoolPlayer::new(82, "Rookie", "$1,100,000"),
            PoolPlayer::new(250, "Two-Way", "$578,577"),
        ])
    }

    #[test]
    fn test_pool_sorted_by_rank() {
        let ranks: Vec<u32> = pool().players().iter().map(|p| p.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 80, 81, 82, 250]);
    }

    #[test]
    fn test_from_rank_window() {
        let players = pool().from_rank(80);
        let names: Vec<&str> = players.iter().map(|p| p.name.as_str()).collect();

        assert_eq!(names, vec!["Role Player", "Bench Player", "Rookie"]);
        assert!(pool().from_rank(100).is_empty());
    }

    #[test]
    fn test_next_available_rank() {
        let pool = pool();

        assert_eq!(pool.next_available_rank(50_000_000.0, 1), Some(1));
        assert_eq!(pool.next_available_rank(10_000_000.0, 1), Some(80));
        assert_eq!(pool.next_available_rank(1_000_000.0, 1), Some(250));
        assert_eq!(pool.next_available_rank(100.0, 1), None);
    }

    #[test]
    fn test_within_budget() {
        let players = pool().within_budget(10_000_000.0, 1);
        let names: Vec<&str> = players.iter().map(|p| p.name.as_str()).collect();

        assert_eq!(names, vec!["Role Player", "Bench Player", "Rookie", "Two-Way"]);
        assert!(pool().within_budget(-27_600_000.0, 1).is_empty());
    }

    #[test]
    fn test_query_prefers_rank() {
        let pool = pool();

        let by_rank = pool.query(AvailableQuery::from_params(Some(2), 1.0));
        assert_eq!(by_rank[0].name, "Stephen Curry");

        let by_budget = pool.query(AvailableQuery::from_params(None, 48_000_000.0));
        assert_eq!(by_budget[0].name, "LeBron James");
        assert_eq!(AvailableQuery::from_params(Some(0), 5.0), AvailableQuery::Budget(5.0));
    }

    #[test]
    fn test_from_csv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "rank,name,salary").unwrap();
        writeln!(file, "2.,Stephen Curry,\"$55,760,000\"").unwrap();
        writeln!(file, "1.,LeBron James,\"$47,600,000\"").unwrap();
        file.flush().unwrap();

        let pool = CandidatePool::from_csv(file.path()).unwrap();

        assert_eq!(pool.len(), 2);
        assert_eq!(pool.players()[0].name, "LeBron James");
        assert_eq!(pool.players()[0].salary_amount(), 47_600_000.0);
    }

    #[test]
    fn test_pool_player_flows_through_add_player() {
        let mut store = RosterStore::load(Box::new(MemoryStore::new()), BudgetConfig::default());
        let player = CandidatePool::fallback().players()[0].clone();

        let outcome = store.add_player(player.to_candidate());

        assert_eq!(outcome, AddOutcome::Added);
        assert_eq!(store.spent(), 47_600_000.0);
        assert_eq!(store.roster().get("LeBron James").unwrap().display_salary, "$47,600,000");
    }

    #[test]
    fn test_recommendation_button_mapping() {
        let button: RecommendationButton = serde_json::from_str(
            r#"{"action": "add_player", "text": "Jalen Brunson", "salary": 24960001, "salary_display": "$24.96M"}"#,
        )
        .unwrap();

        let candidate = button.to_candidate().unwrap();
        assert_eq!(candidate.name, "Jalen Brunson");
        assert_eq!(candidate.salary_display.as_deref(), Some("$24.96M"));

        let other = RecommendationButton {
            action: "show_stats".to_string(),
            ..RecommendationButton::default()
        };
        assert!(other.to_candidate().is_none());
    }

    #[test]
    fn test_describe_add() {
        assert_eq!(
            describe_add(AddOutcome::Added, "LeBron James", -27_600_000.0),
            "Added LeBron James to your team. Remaining budget: -$27,600,000"
        );
        assert_eq!(
            describe_add(AddOutcome::AlreadyPresent, "LeBron James", 0.0),
            "LeBron James is already on your team. Remaining budget: $0"
        );
    }
}
