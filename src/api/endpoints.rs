//! Endpoint table, relative to the API base URL.

pub const LOGIN: &str = "/auth/login";

pub const SUBMIT_EVIDENCE: &str = "/evidences";
pub const MY_EVIDENCES: &str = "/evidences/my-evidences";
pub const EVIDENCE_BY_ID: &str = "/evidences/:evidenceId";
pub const EVIDENCES_BY_CHALLENGE: &str = "/evidences/challenge/:challengeId";
pub const DAILY_STATUS: &str = "/evidences/challenge/:challengeId/daily-status";
pub const EVIDENCE_STATS: &str = "/evidences/my-stats";
pub const EVIDENCE_HEALTH: &str = "/evidences/health";

pub const CHALLENGE_LOCATION: &str = "/location/challenge/:challengeId";
pub const VERIFY_PROXIMITY: &str = "/location/verify-proximity";

/// Substitute `:name` segments, e.g. `/evidences/:evidenceId` -> `/evidences/12`.
/// Values are percent-encoded.
pub fn replace_url_params(template: &str, params: &[(&str, &str)]) -> String {
    template
        .split('/')
        .map(|segment| match segment.strip_prefix(':') {
            Some(name) => params
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| urlencoding::encode(value).into_owned())
                .unwrap_or_else(|| segment.to_string()),
            None => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_single_param() {
        assert_eq!(
            replace_url_params(DAILY_STATUS, &[("challengeId", "42")]),
            "/evidences/challenge/42/daily-status"
        );
    }

    #[test]
    fn test_prefix_named_params_do_not_collide() {
        assert_eq!(
            replace_url_params("/a/:id/b/:idx", &[("idx", "2"), ("id", "1")]),
            "/a/1/b/2"
        );
    }

    #[test]
    fn test_missing_param_left_in_place_and_values_encoded() {
        assert_eq!(replace_url_params(EVIDENCE_BY_ID, &[]), "/evidences/:evidenceId");
        assert_eq!(
            replace_url_params(EVIDENCE_BY_ID, &[("evidenceId", "a b/c")]),
            "/evidences/a%20b%2Fc"
        );
    }
}
