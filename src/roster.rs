// 🏀 Roster Model - Entries, candidates and the ordered roster
//
// A Candidate is what callers offer (manual pick, recommendation button,
// player service row). A RosterEntry is what the store keeps after the
// candidate has been normalized. Only the store can build a Roster's
// contents; everything else gets read access.

use crate::salary::{display_salary, normalize_salary, SalaryInput};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use tracing::warn;

// ============================================================================
// ROSTER ENTRY
// ============================================================================

/// One player on the team. `name` is the key within a roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub name: String,

    #[serde(default)]
    pub position: String,

    /// Normalized cost in whole dollars
    pub salary: f64,

    /// Presentation string fixed at insertion time
    #[serde(alias = "formattedSalary")]
    pub display_salary: String,
}

impl RosterEntry {
    /// Normalize a candidate into an entry. Missing fields become empty strings.
    pub fn from_candidate(candidate: &Candidate) -> Self {
        let salary = normalize_salary(&candidate.salary);

        RosterEntry {
            name: candidate.name.clone(),
            position: candidate.position.clone().unwrap_or_default(),
            salary,
            display_salary: display_salary(candidate.salary_display.as_deref(), salary),
        }
    }
}

// ============================================================================
// CANDIDATE
// ============================================================================

/// Externally sourced player offered for addition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub position: Option<String>,

    #[serde(default)]
    pub salary: SalaryInput,

    /// Caller-supplied display text, preferred over formatting `salary`
    #[serde(default, alias = "salaryDisplay")]
    pub salary_display: Option<String>,
}

impl Candidate {
    pub fn new(name: impl Into<String>, salary: impl Into<SalaryInput>) -> Self {
        Candidate {
            name: name.into(),
            position: None,
            salary: salary.into(),
            salary_display: None,
        }
    }

    /// Builder pattern: add optional position
    pub fn with_position(mut self, position: impl Into<String>) -> Self {
        self.position = Some(position.into());
        self
    }

    /// Builder pattern: add a pre-formatted salary string
    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.salary_display = Some(display.into());
        self
    }
}

// ============================================================================
// ROSTER
// ============================================================================

/// Ordered roster, insertion order = display order, names unique
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Roster {
    entries: Vec<RosterEntry>,
}

impl Roster {
    pub fn new() -> Self {
        Roster::default()
    }

    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RosterEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact, case-sensitive name lookup
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&RosterEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Append unless the name is taken. Returns false on duplicates.
    pub(crate) fn insert(&mut self, entry: RosterEntry) -> bool {
        if self.contains(&entry.name) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Remove at most one entry with this exact name
    pub(crate) fn remove(&mut self, name: &str) -> Option<RosterEntry> {
        let index = self.entries.iter().position(|e| e.name == name)?;
        Some(self.entries.remove(index))
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// Decode a stored roster document.
    ///
    /// Fails only when the document is not a JSON array. Individual entries
    /// that cannot be read are skipped, salaries are re-normalized, and
    /// later duplicates of a name are dropped so uniqueness holds after load.
    pub fn decode_lenient(json: &str) -> Result<Roster, serde_json::Error> {
        let items: Vec<Value> = serde_json::from_str(json)?;
        let mut roster = Roster::new();
        let mut seen = HashSet::new();

        for (index, item) in items.into_iter().enumerate() {
            let stored: StoredEntry = match serde_json::from_value(item) {
                Ok(stored) => stored,
                Err(e) => {
                    warn!(index, error = %e, "skipping unreadable roster entry");
                    continue;
                }
            };

            if !seen.insert(stored.name.clone()) {
                warn!(name = %stored.name, "skipping duplicate roster entry");
                continue;
            }

            let salary = normalize_salary(&stored.salary);
            roster.entries.push(RosterEntry {
                display_salary: display_salary(stored.display_salary.as_deref(), salary),
                name: stored.name,
                position: stored.position.unwrap_or_default(),
                salary,
            });
        }

        Ok(roster)
    }
}

impl<'a> IntoIterator for &'a Roster {
    type Item = &'a RosterEntry;
    type IntoIter = std::slice::Iter<'a, RosterEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Permissive shape used only when reading storage back
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredEntry {
    name: String,
    #[serde(default)]
    position: Option<String>,
    #[serde(default)]
    salary: SalaryInput,
    #[serde(default, alias = "formattedSalary")]
    display_salary: Option<String>,
}

// ============================================================================
// TESTS
// ============================================================================
