// 🧮 Accounting - Derived budget figures
// Pure functions: nothing here is stored, everything is recomputed from the
// current roster so spent can never drift from the entries.

use crate::roster::RosterEntry;
use crate::salary::format_salary;
use serde::Serialize;

/// Sum of salaries. Non-finite or negative values count as zero.
pub fn spent<'a, I>(entries: I) -> f64
where
    I: IntoIterator<Item = &'a RosterEntry>,
{
    entries
        .into_iter()
        .map(|e| if e.salary.is_finite() && e.salary > 0.0 { e.salary } else { 0.0 })
        .sum()
}

/// Ceiling minus spent. Negative when over budget.
pub fn remaining(ceiling: f64, spent: f64) -> f64 {
    ceiling - spent
}

/// Derived budget figures for one roster/ceiling pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BudgetSummary {
    pub ceiling: f64,
    pub spent: f64,
    pub remaining: f64,
    pub player_count: usize,
}

impl BudgetSummary {
    pub fn derive(entries: &[RosterEntry], ceiling: f64) -> Self {
        let spent = spent(entries);

        BudgetSummary {
            ceiling,
            spent,
            remaining: remaining(ceiling, spent),
            player_count: entries.len(),
        }
    }

    pub fn is_over_budget(&self) -> bool {
        self.remaining < 0.0
    }

    /// Whether one more salary still fits under the ceiling
    pub fn can_afford(&self, salary: f64) -> bool {
        salary <= self.remaining
    }

    /// Share of the ceiling already committed (0.0 - 1.0+)
    pub fn utilization(&self) -> f64 {
        if self.ceiling > 0.0 {
            self.spent / self.ceiling
        } else {
            0.0
        }
    }

    /// One-line text for status bars and CLI output
    pub fn describe(&self) -> String {
        format!(
            "Budget {} | Spent {} | Remaining {} | Players {}",
            format_salary(self.ceiling),
            format_salary(self.spent),
            format_salary(self.remaining),
            self.player_count
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================
