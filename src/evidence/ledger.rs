//! Per-session submission ledger
//!
//! Remembers which (challenge, day) pairs this session already got a record
//! for, so a second workflow opened in the same session cannot race the
//! backend into a double submission.

use chrono::{Local, NaiveDate};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

/// Source of "today" for the once-per-day policy.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// The device's local calendar day.
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock pinned to one day.
pub struct FixedClock {
    day: Mutex<NaiveDate>,
}

impl FixedClock {
    pub fn new(day: NaiveDate) -> Self {
        Self { day: Mutex::new(day) }
    }

    pub fn set(&self, day: NaiveDate) {
        *self.day.lock().unwrap_or_else(PoisonError::into_inner) = day;
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.day.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Clone, Default)]
pub struct SubmissionLedger {
    entries: Arc<Mutex<HashSet<(i64, NaiveDate)>>>,
}

impl SubmissionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, challenge_id: i64, day: NaiveDate) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((challenge_id, day));
    }

    pub fn has_submitted(&self, challenge_id: i64, day: NaiveDate) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&(challenge_id, day))
    }

    /// Drop entries for days before `day`; they can no longer close anything.
    pub fn prune_before(&self, day: NaiveDate) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(_, d)| *d >= day);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
