//! Evidence Statistics Aggregator
//!
//! Success-rate summaries over a user's evidence history. Rates are whole
//! percents, rounded half away from zero; an empty history yields 0 for
//! every rate.

use serde::{Deserialize, Serialize};

use crate::api::{EvidenceRecord, EvidenceStatus, StatsCounts, SuccessRates};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceStatistics {
    pub total_evidences: u64,
    pub ai_validated: u64,
    pub location_valid: u64,
    pub both_valid: u64,
    pub approved: u64,
    pub partial: u64,
    pub rejected: u64,
    pub success_rates: SuccessRates,
}

/// `part / total` as a whole percent; 0 when `total` is 0.
pub fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 * 100.0 / total as f64).round()
}

impl EvidenceStatistics {
    pub fn from_records(records: &[EvidenceRecord]) -> Self {
        let mut stats = Self::empty();

        for record in records {
            stats.total_evidences += 1;
            if record.ai_validated {
                stats.ai_validated += 1;
            }
            if record.location_valid {
                stats.location_valid += 1;
            }
            match record.status() {
                EvidenceStatus::Approved => {
                    stats.both_valid += 1;
                    stats.approved += 1;
                }
                EvidenceStatus::Partial => stats.partial += 1,
                EvidenceStatus::Rejected => stats.rejected += 1,
            }
        }

        stats.success_rates = SuccessRates {
            ai: percent(stats.ai_validated, stats.total_evidences),
            location: percent(stats.location_valid, stats.total_evidences),
            overall: percent(stats.both_valid, stats.total_evidences),
        };
        stats
    }

    fn empty() -> Self {
        Self {
            total_evidences: 0,
            ai_validated: 0,
            location_valid: 0,
            both_valid: 0,
            approved: 0,
            partial: 0,
            rejected: 0,
            success_rates: SuccessRates {
                ai: 0.0,
                location: 0.0,
                overall: 0.0,
            },
        }
    }

    /// Only the records belonging to one challenge.
    pub fn for_challenge(records: &[EvidenceRecord], challenge_id: i64) -> Self {
        let filtered: Vec<EvidenceRecord> = records
            .iter()
            .filter(|r| r.challenge_id == challenge_id)
            .cloned()
            .collect();
        Self::from_records(&filtered)
    }

    /// Whether these counts agree with what the server reported.
    pub fn matches_server(&self, server: &StatsCounts) -> bool {
        self.total_evidences == server.total_evidences
            && self.ai_validated == server.ai_validated
            && self.location_valid == server.location_valid
            && self.both_valid == server.both_valid
    }
}
