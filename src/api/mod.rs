//! Backend API Module
//!
//! REST client for the evidence and location endpoints, plus the two seams
//! the evidence workflow depends on: `EvidenceRegistry` and
//! `ChallengeDirectory`.

pub mod endpoints;
mod error;
mod types;

pub use error::ApiError;
pub use types::{
    timestamp, DailySubmissionStatus, EvidenceRecord, EvidenceStatsResponse, EvidenceStatus,
    EvidenceValidation, ProximityVerificationRequest, ProximityVerificationResponse,
    StatsCounts, StatsInterpretation, SubmissionVerdict, SubmitEvidenceRequest,
    SubmitEvidenceResponse, SuccessRates,
};

use async_trait::async_trait;
use geo_core::ChallengeLocation;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::session::Session;
use endpoints::replace_url_params;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// The evidence registry: where submissions go and history comes from.
#[async_trait]
pub trait EvidenceRegistry: Send + Sync {
    /// Send one submission. Implementations must not retry on their own.
    async fn submit_evidence(&self, request: SubmitEvidenceRequest) -> ApiResult<SubmitEvidenceResponse>;

    async fn my_evidences(&self) -> ApiResult<Vec<EvidenceRecord>>;

    async fn evidence_by_id(&self, evidence_id: i64) -> ApiResult<EvidenceRecord>;

    async fn evidences_by_challenge(&self, challenge_id: i64) -> ApiResult<Vec<EvidenceRecord>>;

    async fn daily_status(&self, challenge_id: i64) -> ApiResult<DailySubmissionStatus>;

    async fn my_stats(&self) -> ApiResult<EvidenceStatsResponse>;
}

/// Read-only view of the challenge registry's location data.
#[async_trait]
pub trait ChallengeDirectory: Send + Sync {
    /// `Ok(None)` when the challenge has no registered location.
    async fn challenge_location(&self, challenge_id: i64) -> ApiResult<Option<ChallengeLocation>>;
}

/// Location payload as served by `/location/challenge/:challengeId`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocationPayload {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    location_name: String,
    tolerance_radius: f64,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    token: String,
}

/// HTTP client for the challenge backend
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Option<Arc<Session>>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            session: None,
        })
    }

    /// Attach an authenticated session; every request then carries its token.
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(Arc::new(session));
        self
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_deref()
    }

    /// Underlying HTTP client, shared with the image store.
    pub fn http(&self) -> &Client {
        &self.client
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.session {
            Some(session) => request.bearer_auth(&session.token),
            None => request,
        }
    }

    async fn checked(response: Response) -> ApiResult<String> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            debug!("Backend answered {}: {}", status, body);
            return Err(ApiError::from_status(status.as_u16(), &body));
        }
        Ok(body)
    }

    fn decode<T: DeserializeOwned>(body: &str) -> ApiResult<T> {
        serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        debug!("GET {}", path);
        let response = self.authorize(self.client.get(self.url(path))).send().await?;
        let body = Self::checked(response).await?;
        Self::decode(&body)
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> ApiResult<T> {
        debug!("POST {}", path);
        let response = self.authorize(self.client.post(self.url(path)).json(body)).send().await?;
        let body = Self::checked(response).await?;
        Self::decode(&body)
    }

    /// Authenticate and create a session. The auth service answers with the
    /// token either as plain text or as `{"token": ...}`.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<Session> {
        info!("Logging in as {}", email);
        let response = self
            .client
            .post(self.url(endpoints::LOGIN))
            .json(&LoginRequest { email, password })
            .send()
            .await?;
        let body = Self::checked(response).await?;

        let token = match serde_json::from_str::<TokenBody>(&body) {
            Ok(parsed) => parsed.token,
            Err(_) => body.trim().trim_matches('"').to_string(),
        };
        if token.is_empty() {
            return Err(ApiError::Decode("login response carried no token".to_string()));
        }

        Ok(Session::new(token, email))
    }

    /// Liveness of the evidence service.
    pub async fn health(&self) -> ApiResult<serde_json::Value> {
        self.get_json(endpoints::EVIDENCE_HEALTH).await
    }

    /// Ask the backend to run its own proximity check.
    pub async fn verify_proximity(
        &self,
        request: &ProximityVerificationRequest,
    ) -> ApiResult<ProximityVerificationResponse> {
        self.post_json(endpoints::VERIFY_PROXIMITY, request).await
    }
}

#[async_trait]
impl EvidenceRegistry for ApiClient {
    async fn submit_evidence(&self, request: SubmitEvidenceRequest) -> ApiResult<SubmitEvidenceResponse> {
        info!("Submitting evidence for challenge {}", request.challenge_id);
        self.post_json(endpoints::SUBMIT_EVIDENCE, &request).await
    }

    async fn my_evidences(&self) -> ApiResult<Vec<EvidenceRecord>> {
        self.get_json(endpoints::MY_EVIDENCES).await
    }

    async fn evidence_by_id(&self, evidence_id: i64) -> ApiResult<EvidenceRecord> {
        let id = evidence_id.to_string();
        self.get_json(&replace_url_params(endpoints::EVIDENCE_BY_ID, &[("evidenceId", &id)])).await
    }

    async fn evidences_by_challenge(&self, challenge_id: i64) -> ApiResult<Vec<EvidenceRecord>> {
        let id = challenge_id.to_string();
        self.get_json(&replace_url_params(endpoints::EVIDENCES_BY_CHALLENGE, &[("challengeId", &id)])).await
    }

    async fn daily_status(&self, challenge_id: i64) -> ApiResult<DailySubmissionStatus> {
        let id = challenge_id.to_string();
        self.get_json(&replace_url_params(endpoints::DAILY_STATUS, &[("challengeId", &id)])).await
    }

    async fn my_stats(&self) -> ApiResult<EvidenceStatsResponse> {
        self.get_json(endpoints::EVIDENCE_STATS).await
    }
}

#[async_trait]
impl ChallengeDirectory for ApiClient {
    async fn challenge_location(&self, challenge_id: i64) -> ApiResult<Option<ChallengeLocation>> {
        let id = challenge_id.to_string();
        let path = replace_url_params(endpoints::CHALLENGE_LOCATION, &[("challengeId", &id)]);

        match self.get_json::<Option<LocationPayload>>(&path).await {
            Ok(Some(payload)) => Ok(Some(ChallengeLocation {
                challenge_id,
                latitude: payload.latitude,
                longitude: payload.longitude,
                location_name: payload.location_name,
                tolerance_radius_meters: payload.tolerance_radius,
            })),
            Ok(None) | Err(ApiError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
