//! Evidence Error Taxonomy
//!
//! Every failure the evidence flow can end in, each with a user-facing
//! message and a retry policy. Local validation failures never reach the
//! network; backend failures carry the server message when one was sent.

use geo_core::{GeoError, ProximityCheck};
use thiserror::Error;

use crate::api::ApiError;
use crate::device::LocationError;

pub type EvidenceResult<T> = std::result::Result<T, EvidenceError>;

#[derive(Debug, Clone, Error)]
pub enum EvidenceError {
    #[error("Could not get your location ({0}). Please enable location services and try again.")]
    LocationUnavailable(#[from] LocationError),

    #[error("{}", .check.rejection_message(.location_name))]
    ProximityRejected {
        check: ProximityCheck,
        location_name: String,
    },

    #[error("You have already submitted evidence for today. Come back tomorrow!")]
    AlreadySubmittedToday,

    #[error("{0}")]
    SubmissionWindowClosed(String),

    #[error("Evidence was rejected: {message}")]
    ValidationFailed {
        message: String,
        ai_validated: bool,
        location_valid: bool,
    },

    #[error(transparent)]
    NetworkOrServer(#[from] ApiError),

    #[error("Could not store the evidence image: {0}")]
    ImageUpload(String),

    #[error("Please {0} before submitting.")]
    MissingInput(&'static str),

    #[error("Select a challenge first.")]
    NoChallenge,

    #[error("Daily submission status has not been checked yet.")]
    GateNotChecked,

    #[error("The challenge location registered on the server is invalid: {0}")]
    InvalidChallengeLocation(#[from] GeoError),

    #[error("The evidence flow was closed before the request finished.")]
    Detached,
}

impl EvidenceError {
    /// Whether the user can fix this by acting again (moving, re-enabling GPS,
    /// retrying the request). Closed gates are terminal for the rest of the day.
    pub fn is_retryable(&self) -> bool {
        match self {
            EvidenceError::LocationUnavailable(_)
            | EvidenceError::ProximityRejected { .. }
            | EvidenceError::ValidationFailed { .. }
            | EvidenceError::ImageUpload(_)
            | EvidenceError::MissingInput(_)
            | EvidenceError::NoChallenge
            | EvidenceError::GateNotChecked => true,
            EvidenceError::NetworkOrServer(api) => api.is_retryable(),
            EvidenceError::AlreadySubmittedToday
            | EvidenceError::SubmissionWindowClosed(_)
            | EvidenceError::InvalidChallengeLocation(_)
            | EvidenceError::Detached => false,
        }
    }

    /// Short stable code for logs and the CLI exit summary.
    pub fn code(&self) -> &'static str {
        match self {
            EvidenceError::LocationUnavailable(_) => "LOCATION_UNAVAILABLE",
            EvidenceError::ProximityRejected { .. } => "PROXIMITY_REJECTED",
            EvidenceError::AlreadySubmittedToday => "ALREADY_SUBMITTED_TODAY",
            EvidenceError::SubmissionWindowClosed(_) => "WINDOW_CLOSED",
            EvidenceError::ValidationFailed { .. } => "VALIDATION_FAILED",
            EvidenceError::NetworkOrServer(api) => api.code(),
            EvidenceError::ImageUpload(_) => "IMAGE_UPLOAD_FAILED",
            EvidenceError::MissingInput(_) => "MISSING_INPUT",
            EvidenceError::NoChallenge => "NO_CHALLENGE",
            EvidenceError::GateNotChecked => "GATE_NOT_CHECKED",
            EvidenceError::InvalidChallengeLocation(_) => "INVALID_CHALLENGE_LOCATION",
            EvidenceError::Detached => "DETACHED",
        }
    }
}
