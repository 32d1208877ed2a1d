//! Daily Submission Gate
//!
//! Tracks whether today's submission for one challenge is still possible.
//! The backend owns the truth; the gate only mirrors the last answer, and is
//! re-evaluated every time a challenge's evidence flow is entered.

use serde::{Deserialize, Serialize};

use crate::api::DailySubmissionStatus;
use crate::error::{EvidenceError, EvidenceResult};

const ALREADY_SUBMITTED_MESSAGE: &str =
    "You have already submitted evidence for today. Come back tomorrow!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    NotChecked,
    Open,
    ClosedAlreadySubmitted,
    ClosedWindowExpired,
}

impl GateState {
    /// Closed states hold for the rest of the calendar day.
    pub fn is_closed(&self) -> bool {
        matches!(self, GateState::ClosedAlreadySubmitted | GateState::ClosedWindowExpired)
    }
}

#[derive(Debug, Clone)]
pub struct DailySubmissionGate {
    state: GateState,
    message: String,
    submission_window: String,
}

impl DailySubmissionGate {
    pub fn new() -> Self {
        Self {
            state: GateState::NotChecked,
            message: String::new(),
            submission_window: String::new(),
        }
    }

    /// Apply a fresh backend answer.
    pub fn evaluate(&mut self, status: &DailySubmissionStatus) -> GateState {
        self.submission_window = status.submission_window.clone();
        self.message = status.message.clone();

        self.state = if status.has_submitted_today {
            GateState::ClosedAlreadySubmitted
        } else if !status.can_submit {
            GateState::ClosedWindowExpired
        } else {
            GateState::Open
        };
        self.state
    }

    /// Close the gate after a submission the backend recorded, without asking again.
    pub fn mark_submitted(&mut self) {
        self.state = GateState::ClosedAlreadySubmitted;
        self.message = ALREADY_SUBMITTED_MESSAGE.to_string();
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == GateState::Open
    }

    pub fn submission_window(&self) -> &str {
        &self.submission_window
    }

    /// Text to show for the current state.
    pub fn message(&self) -> String {
        match self.state {
            GateState::ClosedAlreadySubmitted => ALREADY_SUBMITTED_MESSAGE.to_string(),
            GateState::ClosedWindowExpired if !self.message.is_empty() => self.message.clone(),
            GateState::ClosedWindowExpired => "Today's submission window has closed.".to_string(),
            GateState::Open if !self.message.is_empty() => self.message.clone(),
            GateState::Open => "You can submit today's evidence.".to_string(),
            GateState::NotChecked => "Checking today's submission status...".to_string(),
        }
    }

    pub fn check_open(&self) -> EvidenceResult<()> {
        match self.state {
            GateState::Open => Ok(()),
            GateState::NotChecked => Err(EvidenceError::GateNotChecked),
            GateState::ClosedAlreadySubmitted => Err(EvidenceError::AlreadySubmittedToday),
            GateState::ClosedWindowExpired => Err(EvidenceError::SubmissionWindowClosed(self.message())),
        }
    }
}

impl Default for DailySubmissionGate {
    fn default() -> Self {
        Self::new()
    }
}
