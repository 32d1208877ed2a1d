//! Wire types for the evidence backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /evidences`. Consumed by value when sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitEvidenceRequest {
    pub challenge_id: i64,
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

/// An evidence record as stored by the evidence registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceRecord {
    pub id: i64,
    pub challenge_id: i64,
    pub user_id: i64,
    pub image_url: String,
    #[serde(default)]
    pub description: Option<String>,
    pub ai_validated: bool,
    pub location_valid: bool,
    #[serde(with = "timestamp")]
    pub submitted_at: DateTime<Utc>,
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Three-valued display status derived from the two validation flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceStatus {
    Approved,
    Partial,
    Rejected,
}

impl EvidenceStatus {
    pub fn from_flags(ai_validated: bool, location_valid: bool) -> Self {
        match (ai_validated, location_valid) {
            (true, true) => EvidenceStatus::Approved,
            (true, false) | (false, true) => EvidenceStatus::Partial,
            (false, false) => EvidenceStatus::Rejected,
        }
    }
}

impl std::fmt::Display for EvidenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvidenceStatus::Approved => write!(f, "Approved"),
            EvidenceStatus::Partial => write!(f, "Partial"),
            EvidenceStatus::Rejected => write!(f, "Rejected"),
        }
    }
}

impl EvidenceRecord {
    pub fn status(&self) -> EvidenceStatus {
        EvidenceStatus::from_flags(self.ai_validated, self.location_valid)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionVerdict {
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceValidation {
    pub ai_validated: bool,
    pub location_valid: bool,
    pub fully_valid: bool,
}

/// Response of `POST /evidences`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitEvidenceResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub status: SubmissionVerdict,
    pub evidence: Option<EvidenceRecord>,
    pub validation: EvidenceValidation,
    #[serde(default)]
    pub next_submission: Option<String>,
}

/// Response of `GET /evidences/challenge/:challengeId/daily-status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySubmissionStatus {
    pub challenge_id: i64,
    pub has_submitted_today: bool,
    pub can_submit: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub submission_window: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessRates {
    pub ai: f64,
    pub location: f64,
    pub overall: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsCounts {
    pub total_evidences: u64,
    pub ai_validated: u64,
    pub location_valid: u64,
    pub both_valid: u64,
    pub success_rates: SuccessRates,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsInterpretation {
    pub ai: String,
    pub location: String,
    pub overall: String,
}

/// Response of `GET /evidences/my-stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceStatsResponse {
    pub user_id: i64,
    #[serde(default)]
    pub user_name: String,
    pub statistics: StatsCounts,
    pub interpretation: StatsInterpretation,
}

/// Body of `POST /location/verify-proximity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProximityVerificationRequest {
    pub challenge_id: i64,
    pub current_latitude: f64,
    pub current_longitude: f64,
}

/// Server-side proximity verdict; fields the backend omits default to empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProximityVerificationResponse {
    pub is_within_range: bool,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub tolerance_radius: Option<f64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Backend timestamps come either as RFC 3339 or as zone-less ISO-8601,
/// which is read as UTC.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(dt) => serializer.serialize_some(&dt.to_rfc3339()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => parse(&raw)
                    .map(Some)
                    .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw))),
                None => Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_status_from_flags() {
        assert_eq!(EvidenceStatus::from_flags(true, true), EvidenceStatus::Approved);
        assert_eq!(EvidenceStatus::from_flags(true, false), EvidenceStatus::Partial);
        assert_eq!(EvidenceStatus::from_flags(false, true), EvidenceStatus::Partial);
        assert_eq!(EvidenceStatus::from_flags(false, false), EvidenceStatus::Rejected);
    }

    #[test]
    fn test_record_with_naive_timestamp() {
        let json = r#"{
            "id": 11, "challengeId": 4, "userId": 9,
            "imageUrl": "https://cdn.example.com/e/11.jpg",
            "aiValidated": true, "locationValid": false,
            "submittedAt": "2024-05-01T07:30:15.123"
        }"#;
        let record: EvidenceRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.description, None);
        assert_eq!(record.created_at, None);
        assert_eq!(record.status(), EvidenceStatus::Partial);
        assert_eq!(
            record.submitted_at.timestamp(),
            Utc.with_ymd_and_hms(2024, 5, 1, 7, 30, 15).unwrap().timestamp()
        );
    }

    #[test]
    fn test_request_omits_empty_description() {
        let request = SubmitEvidenceRequest {
            challenge_id: 4,
            image_url: "https://cdn.example.com/e.jpg".into(),
            description: None,
            latitude: -12.0464,
            longitude: -77.0428,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["challengeId"], 4);
        assert!(value.get("description").is_none());
    }

    #[test]
    fn test_submit_response_decodes() {
        let json = r#"{
            "success": true, "message": "Evidence recorded", "status": "REJECTED",
            "evidence": {
                "id": 1, "challengeId": 4, "userId": 9, "imageUrl": "u",
                "aiValidated": false, "locationValid": true,
                "submittedAt": "2024-05-01T07:30:15Z"
            },
            "validation": {"aiValidated": false, "locationValid": true, "fullyValid": false},
            "nextSubmission": "2024-05-02T00:00:00"
        }"#;
        let response: SubmitEvidenceResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.status, SubmissionVerdict::Rejected);
        assert!(!response.validation.fully_valid);
        assert_eq!(response.evidence.unwrap().id, 1);
    }
}
