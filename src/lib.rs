//! Challenge Evidence Client
//!
//! Client core for location-pegged habit challenges:
//! - Haversine distance and tolerance-radius checks (`geo-core`)
//! - Daily submission gate backed by the server's per-day ledger
//! - Evidence submission workflow (capture, locate, validate, submit)
//! - Success-rate statistics over evidence history

pub mod api;
pub mod config;
pub mod device;
pub mod error;
pub mod evidence;
pub mod session;
pub mod utils;

// Re-exports for convenience
pub use api::{ApiClient, ChallengeDirectory, EvidenceRegistry};
pub use config::ClientConfig;
pub use error::{EvidenceError, EvidenceResult};
pub use evidence::{EvidenceStatistics, EvidenceWorkflow, WorkflowDeps, WorkflowState};
pub use geo_core::{distance_meters, is_within_tolerance, ChallengeLocation, GeoPosition, ProximityCheck};
pub use session::{Session, SessionStore};
