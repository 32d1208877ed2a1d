//! Evidence Submission Workflow
//!
//! Drives one challenge's evidence flow:
//!
//! ```text
//! SelectChallenge -> CaptureImage -> AcquireLocation -> LocalValidate -> Submitting
//!                                                                          |
//!                                               Submitted | Rejected | Failed
//! ```
//!
//! plus `Closed` when the daily gate is shut on entry. Every action takes
//! `&mut self`, so location acquisition and submission can never race, and
//! each `submit` call sends at most one request. A workflow belongs to one
//! mounted view; once its `MountHandle` is unmounted every pending await
//! resolves to `Detached` and late results are dropped.

use geo_core::{is_within_tolerance, ChallengeLocation, GeoPosition, ProximityCheck, ProximityWarning};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::gate::{DailySubmissionGate, GateState};
use super::ledger::{Clock, SubmissionLedger};
use crate::api::{
    ChallengeDirectory, EvidenceRecord, EvidenceRegistry, EvidenceValidation, SubmissionVerdict,
    SubmitEvidenceRequest,
};
use crate::device::{CapturedImage, GeolocationProvider, ImageStore, LocationError, PositionOptions};
use crate::error::{EvidenceError, EvidenceResult};

const REJECTED_FALLBACK_MESSAGE: &str = "The evidence did not pass validation.";

/// Collaborators a workflow talks to
#[derive(Clone)]
pub struct WorkflowDeps {
    pub registry: Arc<dyn EvidenceRegistry>,
    pub directory: Arc<dyn ChallengeDirectory>,
    pub geolocation: Arc<dyn GeolocationProvider>,
    pub images: Arc<dyn ImageStore>,
    /// Shared by every workflow of one session
    pub ledger: SubmissionLedger,
    pub clock: Arc<dyn Clock>,
}

/// What the backend said about an accepted submission
#[derive(Debug, Clone)]
pub struct SubmissionReceipt {
    pub evidence: Option<EvidenceRecord>,
    pub validation: EvidenceValidation,
    pub message: String,
    pub next_submission: Option<String>,
    /// The client-side proximity check that let the submission through
    pub local_check: ProximityCheck,
}

#[derive(Debug, Clone)]
pub enum WorkflowState {
    SelectChallenge,
    CaptureImage,
    AcquireLocation,
    /// Image and position are present; `submit` validates locally first
    LocalValidate,
    Submitting,
    Submitted(SubmissionReceipt),
    Rejected(EvidenceError),
    Failed(EvidenceError),
    /// The daily gate was closed on entry
    Closed(GateState),
}

impl WorkflowState {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowState::SelectChallenge => "select_challenge",
            WorkflowState::CaptureImage => "capture_image",
            WorkflowState::AcquireLocation => "acquire_location",
            WorkflowState::LocalValidate => "local_validate",
            WorkflowState::Submitting => "submitting",
            WorkflowState::Submitted(_) => "submitted",
            WorkflowState::Rejected(_) => "rejected",
            WorkflowState::Failed(_) => "failed",
            WorkflowState::Closed(_) => "closed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkflowState::Submitted(_)
                | WorkflowState::Rejected(_)
                | WorkflowState::Failed(_)
                | WorkflowState::Closed(_)
        )
    }

    pub fn error(&self) -> Option<&EvidenceError> {
        match self {
            WorkflowState::Rejected(e) | WorkflowState::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Things the user can do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowAction {
    SelectChallenge,
    CaptureImage,
    AcquireLocation,
    Submit,
    NavigateAway,
}

/// Held by the view that owns a workflow; unmounting cancels pending work.
#[derive(Clone)]
pub struct MountHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl MountHandle {
    pub fn unmount(&self) {
        self.tx.send_replace(false);
    }

    pub fn is_mounted(&self) -> bool {
        *self.tx.borrow()
    }
}

pub struct EvidenceWorkflow {
    id: Uuid,
    deps: WorkflowDeps,
    options: PositionOptions,
    mount: Arc<watch::Sender<bool>>,
    state: WorkflowState,
    gate: DailySubmissionGate,
    challenge_id: Option<i64>,
    location: Option<ChallengeLocation>,
    image: Option<CapturedImage>,
    description: Option<String>,
    position: Option<GeoPosition>,
}

impl EvidenceWorkflow {
    pub fn new(deps: WorkflowDeps, options: PositionOptions) -> Self {
        let (tx, _) = watch::channel(true);
        Self {
            id: Uuid::new_v4(),
            deps,
            options,
            mount: Arc::new(tx),
            state: WorkflowState::SelectChallenge,
            gate: DailySubmissionGate::new(),
            challenge_id: None,
            location: None,
            image: None,
            description: None,
            position: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn gate(&self) -> &DailySubmissionGate {
        &self.gate
    }

    pub fn challenge_id(&self) -> Option<i64> {
        self.challenge_id
    }

    pub fn challenge_location(&self) -> Option<&ChallengeLocation> {
        self.location.as_ref()
    }

    pub fn image(&self) -> Option<&CapturedImage> {
        self.image.as_ref()
    }

    pub fn position(&self) -> Option<GeoPosition> {
        self.position
    }

    pub fn mount_handle(&self) -> MountHandle {
        MountHandle { tx: self.mount.clone() }
    }

    pub fn is_mounted(&self) -> bool {
        *self.mount.borrow()
    }

    fn ensure_mounted(&self) -> EvidenceResult<()> {
        if self.is_mounted() {
            Ok(())
        } else {
            Err(EvidenceError::Detached)
        }
    }

    /// Run `fut` unless the view unmounts first; a result that lands after
    /// unmounting is discarded.
    async fn guarded<F: Future>(&self, fut: F) -> EvidenceResult<F::Output> {
        let mut mounted = self.mount.subscribe();
        if !*mounted.borrow_and_update() {
            return Err(EvidenceError::Detached);
        }

        tokio::select! {
            biased;
            _ = mounted.wait_for(|m| !*m) => Err(EvidenceError::Detached),
            output = fut => {
                if self.is_mounted() {
                    Ok(output)
                } else {
                    Err(EvidenceError::Detached)
                }
            }
        }
    }

    fn submitted_today(&self, challenge_id: i64) -> bool {
        self.deps.ledger.has_submitted(challenge_id, self.deps.clock.today())
    }

    fn advance_inputs(&mut self) {
        self.state = match (&self.image, &self.position) {
            (None, _) => WorkflowState::CaptureImage,
            (Some(_), None) => WorkflowState::AcquireLocation,
            (Some(_), Some(_)) => WorkflowState::LocalValidate,
        };
    }

    fn ensure_accepting_input(&mut self) -> EvidenceResult<i64> {
        let challenge_id = self.challenge_id.ok_or(EvidenceError::NoChallenge)?;
        if self.gate.is_open() && self.submitted_today(challenge_id) {
            self.gate.mark_submitted();
        }
        self.gate.check_open()?;
        Ok(challenge_id)
    }

    /// Enter a challenge's evidence flow: load its location and today's
    /// submission status side by side, then open or close the gate.
    pub async fn enter(&mut self, challenge_id: i64) -> EvidenceResult<&WorkflowState> {
        self.ensure_mounted()?;
        info!("Workflow {} entering challenge {}", self.id, challenge_id);

        self.challenge_id = Some(challenge_id);
        self.location = None;
        self.image = None;
        self.description = None;
        self.position = None;
        self.gate.reset();
        self.state = WorkflowState::SelectChallenge;

        let directory = self.deps.directory.clone();
        let registry = self.deps.registry.clone();
        let fetched = self
            .guarded(async move {
                tokio::try_join!(
                    directory.challenge_location(challenge_id),
                    registry.daily_status(challenge_id)
                )
            })
            .await?;

        let (location, status) = match fetched {
            Ok(pair) => pair,
            Err(e) => {
                warn!("Could not load challenge {}: {}", challenge_id, e);
                self.state = WorkflowState::Failed(e.into());
                return Ok(&self.state);
            }
        };

        if let Some(location) = &location {
            if let Err(e) = location.validate() {
                warn!("Challenge {} has an invalid location: {}", challenge_id, e);
                self.state = WorkflowState::Failed(e.into());
                return Ok(&self.state);
            }
        }
        self.location = location;

        let gate_state = self.gate.evaluate(&status);
        if !gate_state.is_closed() && self.submitted_today(challenge_id) {
            debug!("Session already submitted challenge {} today", challenge_id);
            self.gate.mark_submitted();
        }

        self.state = if self.gate.state().is_closed() {
            info!("Daily gate closed for challenge {}: {:?}", challenge_id, self.gate.state());
            WorkflowState::Closed(self.gate.state())
        } else {
            WorkflowState::CaptureImage
        };
        Ok(&self.state)
    }

    /// Use `image` as today's evidence. No local checks are made on it.
    pub fn select_image(&mut self, image: CapturedImage) -> EvidenceResult<&WorkflowState> {
        self.ensure_mounted()?;
        self.ensure_accepting_input()?;
        self.image = Some(image);
        self.advance_inputs();
        Ok(&self.state)
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        let description = description.into();
        let trimmed = description.trim();
        self.description = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
    }

    /// Ask the device for a one-shot fix, bounded by the configured timeout.
    /// A failure leaves the selected image in place.
    pub async fn acquire_location(&mut self) -> EvidenceResult<&WorkflowState> {
        self.ensure_mounted()?;
        self.ensure_accepting_input()?;

        let provider = self.deps.geolocation.clone();
        let options = self.options;
        let outcome = self
            .guarded(async move {
                match tokio::time::timeout(options.timeout, provider.current_position(&options)).await {
                    Ok(result) => result,
                    Err(_) => Err(LocationError::Timeout),
                }
            })
            .await?;

        match outcome {
            Ok(position) => {
                debug!("Position fix {:?}", position);
                self.position = Some(position);
                self.advance_inputs();
            }
            Err(e) => {
                warn!("Location unavailable: {}", e);
                self.position = None;
                self.state = WorkflowState::Failed(EvidenceError::LocationUnavailable(e));
            }
        }
        Ok(&self.state)
    }

    pub fn can_submit(&self) -> bool {
        let Some(challenge_id) = self.challenge_id else {
            return false;
        };
        self.is_mounted()
            && self.gate.is_open()
            && !self.submitted_today(challenge_id)
            && self.image.is_some()
            && self.position.is_some()
            && match &self.state {
                WorkflowState::LocalValidate => true,
                WorkflowState::Rejected(e) | WorkflowState::Failed(e) => e.is_retryable(),
                _ => false,
            }
    }

    /// Validate locally, then send exactly one submission.
    ///
    /// Precondition failures (no challenge, closed gate, missing inputs,
    /// unmounted view) come back as `Err` and leave the state untouched;
    /// outcomes of the attempt itself are recorded as the new state.
    pub async fn submit(&mut self) -> EvidenceResult<&WorkflowState> {
        self.ensure_mounted()?;
        let challenge_id = self.ensure_accepting_input()?;
        let image = self.image.clone().ok_or(EvidenceError::MissingInput("select an image"))?;
        let position = self.position.ok_or(EvidenceError::MissingInput("get your location"))?;

        self.state = WorkflowState::LocalValidate;
        let check = is_within_tolerance(self.location.as_ref(), &position);
        if check.warning == Some(ProximityWarning::MissingLocation) {
            warn!("Challenge {} has no registered location; skipping proximity check", challenge_id);
        }
        if !check.is_valid {
            let location_name = self
                .location
                .as_ref()
                .map(|l| l.location_name.clone())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| "the challenge location".to_string());
            info!(
                "Rejected locally: {:.0}m from challenge {} (tolerance {:.0}m)",
                check.distance_meters, challenge_id, check.tolerance_radius_meters
            );
            // the next attempt needs a fresh fix
            self.position = None;
            self.state = WorkflowState::Rejected(EvidenceError::ProximityRejected { check, location_name });
            return Ok(&self.state);
        }

        self.state = WorkflowState::Submitting;

        let images = self.deps.images.clone();
        let stored = self.guarded(async move { images.store(&image).await }).await;
        let stored = match stored {
            Ok(stored) => stored,
            Err(detached) => {
                self.advance_inputs();
                return Err(detached);
            }
        };
        let image_url = match stored {
            Ok(url) => url,
            Err(e) => {
                warn!("Image upload failed: {}", e);
                self.state = WorkflowState::Failed(e);
                return Ok(&self.state);
            }
        };

        let request = SubmitEvidenceRequest {
            challenge_id,
            image_url,
            description: self.description.clone(),
            latitude: position.latitude,
            longitude: position.longitude,
        };
        let registry = self.deps.registry.clone();
        let sent = self.guarded(async move { registry.submit_evidence(request).await }).await;
        let sent = match sent {
            Ok(sent) => sent,
            Err(detached) => {
                self.advance_inputs();
                return Err(detached);
            }
        };

        let response = match sent {
            Ok(response) => response,
            Err(e) if e.is_conflict() => {
                info!("Backend already holds today's evidence for challenge {}: {}", challenge_id, e);
                self.deps.ledger.record(challenge_id, self.deps.clock.today());
                self.gate.mark_submitted();
                self.state = WorkflowState::Rejected(EvidenceError::AlreadySubmittedToday);
                return Ok(&self.state);
            }
            Err(e) => {
                warn!("Evidence submission failed: {}", e);
                self.state = WorkflowState::Failed(e.into());
                return Ok(&self.state);
            }
        };

        if response.success || response.evidence.is_some() {
            self.deps.ledger.record(challenge_id, self.deps.clock.today());
            self.gate.mark_submitted();
        }

        self.state = if response.success && response.status == SubmissionVerdict::Approved {
            info!("Evidence for challenge {} approved", challenge_id);
            WorkflowState::Submitted(SubmissionReceipt {
                evidence: response.evidence,
                validation: response.validation,
                message: response.message,
                next_submission: response.next_submission,
                local_check: check,
            })
        } else {
            info!("Evidence for challenge {} rejected by server: {}", challenge_id, response.message);
            let message = if response.message.trim().is_empty() {
                REJECTED_FALLBACK_MESSAGE.to_string()
            } else {
                response.message
            };
            WorkflowState::Rejected(EvidenceError::ValidationFailed {
                message,
                ai_validated: response.validation.ai_validated,
                location_valid: response.validation.location_valid,
            })
        };
        Ok(&self.state)
    }

    pub fn actions(&self) -> Vec<WorkflowAction> {
        match &self.state {
            WorkflowState::SelectChallenge => {
                vec![WorkflowAction::SelectChallenge, WorkflowAction::NavigateAway]
            }
            WorkflowState::Closed(_) | WorkflowState::Submitted(_) | WorkflowState::Submitting => {
                vec![WorkflowAction::NavigateAway]
            }
            WorkflowState::Failed(_) if !self.gate.is_open() => {
                // failed before the gate was read: retry means entering again
                vec![WorkflowAction::SelectChallenge, WorkflowAction::NavigateAway]
            }
            _ if !self.gate.is_open() => vec![WorkflowAction::NavigateAway],
            _ => {
                let mut actions = vec![WorkflowAction::CaptureImage, WorkflowAction::AcquireLocation];
                if self.can_submit() {
                    actions.push(WorkflowAction::Submit);
                }
                actions.push(WorkflowAction::NavigateAway);
                actions
            }
        }
    }

    /// Text to render for the current state.
    pub fn message(&self) -> String {
        match &self.state {
            WorkflowState::SelectChallenge => "Select a challenge to submit evidence for.".to_string(),
            WorkflowState::CaptureImage => "Take or choose a photo of today's evidence.".to_string(),
            WorkflowState::AcquireLocation => "Get your current location to continue.".to_string(),
            WorkflowState::LocalValidate => "Ready to submit.".to_string(),
            WorkflowState::Submitting => "Submitting evidence...".to_string(),
            WorkflowState::Submitted(receipt) if receipt.message.is_empty() => {
                "Evidence submitted successfully!".to_string()
            }
            WorkflowState::Submitted(receipt) => {
                format!("Evidence submitted successfully! {}", receipt.message)
            }
            WorkflowState::Rejected(e) | WorkflowState::Failed(e) => e.to_string(),
            WorkflowState::Closed(_) => self.gate.message(),
        }
    }
}
