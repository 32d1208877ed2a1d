//! Evidence Module
//!
//! The daily submission gate, the session ledger that backs it, the
//! submission workflow, and statistics over past evidence.

mod gate;
mod ledger;
mod stats;
mod workflow;

pub use gate::{DailySubmissionGate, GateState};
pub use ledger::{Clock, FixedClock, SubmissionLedger, SystemClock};
pub use stats::{percent, EvidenceStatistics};
pub use workflow::{
    EvidenceWorkflow, MountHandle, SubmissionReceipt, WorkflowAction, WorkflowDeps, WorkflowState,
};
