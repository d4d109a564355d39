//! Upsert Summary Schema
//!
//! Counters returned by the writer and combined by the harvester.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

/// Outcome counts for one write batch. `added + updated + skipped == total`
/// once the batch has been fully written.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpsertSummary {
    pub total: usize,
    pub added: usize,
    pub updated: usize,
    pub skipped: usize,
}

impl UpsertSummary {
    pub fn with_total(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn is_complete(&self) -> bool {
        self.added + self.updated + self.skipped == self.total
    }
}

impl Add for UpsertSummary {
    type Output = UpsertSummary;

    fn add(self, rhs: UpsertSummary) -> UpsertSummary {
        UpsertSummary {
            total: self.total + rhs.total,
            added: self.added + rhs.added,
            updated: self.updated + rhs.updated,
            skipped: self.skipped + rhs.skipped,
        }
    }
}

impl AddAssign for UpsertSummary {
    fn add_assign(&mut self, rhs: UpsertSummary) {
        *self = *self + rhs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_addition() {
        let mut total = UpsertSummary::default();
        total += UpsertSummary { total: 5, added: 3, updated: 2, skipped: 0 };
        total += UpsertSummary { total: 2, added: 0, updated: 1, skipped: 1 };

        assert_eq!(total, UpsertSummary { total: 7, added: 3, updated: 3, skipped: 1 });
        assert!(total.is_complete());
        assert!(!UpsertSummary::with_total(4).is_complete());
    }
}
