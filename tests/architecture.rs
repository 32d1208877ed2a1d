//! Architecture Verification Suite
//!
//! Compile-time checks on the seams: everything the workflow holds must be
//! shareable across tasks, and the HTTP client must plug into both traits.

#[cfg(test)]
mod architecture_tests {
    use challenge_evidence::api::{ApiClient, ChallengeDirectory, EvidenceRegistry};
    use challenge_evidence::device::{GeolocationProvider, ImageStore};
    use challenge_evidence::evidence::Clock;

    // 1. Collaborators must be thread-safe
    #[test]
    fn test_collaborators_are_thread_safe() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}

        assert_send_sync::<ApiClient>();
        assert_send_sync::<challenge_evidence::device::HttpImageStore>();
        assert_send_sync::<challenge_evidence::device::FixedGeolocation>();
        assert_send_sync::<challenge_evidence::device::CachedGeolocation>();
        assert_send_sync::<challenge_evidence::evidence::SubmissionLedger>();
        assert_send_sync::<challenge_evidence::evidence::SystemClock>();
        assert_send_sync::<challenge_evidence::evidence::FixedClock>();

        assert_send_sync::<dyn EvidenceRegistry>();
        assert_send_sync::<dyn ChallengeDirectory>();
        assert_send_sync::<dyn GeolocationProvider>();
        assert_send_sync::<dyn ImageStore>();
        assert_send_sync::<dyn Clock>();
    }

    // 2. A workflow can move into a spawned task
    #[test]
    fn test_workflow_is_send() {
        fn assert_send<T: Send>() {}

        assert_send::<challenge_evidence::evidence::EvidenceWorkflow>();
        assert_send::<challenge_evidence::evidence::MountHandle>();
        assert_send::<challenge_evidence::error::EvidenceError>();
    }

    // 3. The HTTP client serves as both the registry and the directory
    #[test]
    fn test_client_implements_both_seams() {
        fn assert_registry<T: EvidenceRegistry>() {}
        fn assert_directory<T: ChallengeDirectory>() {}

        assert_registry::<ApiClient>();
        assert_directory::<ApiClient>();
    }

    // 4. geo-core stays free of I/O: plain data, cloneable and comparable
    #[test]
    fn test_geo_core_is_plain_data() {
        fn assert_plain<T: Clone + PartialEq + std::fmt::Debug + Send + Sync>() {}

        assert_plain::<geo_core::GeoPosition>();
        assert_plain::<geo_core::ChallengeLocation>();
        assert_plain::<geo_core::ProximityCheck>();
    }
}
