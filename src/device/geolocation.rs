//! Geolocation providers
//!
//! A provider answers a one-shot position request. `CachedGeolocation`
//! wraps any provider and honours `maximum_age` by reusing a recent fix.

use async_trait::async_trait;
use geo_core::GeoPosition;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

/// Options for a one-shot position request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    /// How long the request may take before it counts as failed
    pub timeout: Duration,
    /// Oldest cached fix that is still acceptable
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable: {0}")]
    PositionUnavailable(String),
    #[error("timed out waiting for a position fix")]
    Timeout,
    #[error("geolocation is not supported on this device")]
    Unsupported,
}

#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    async fn current_position(&self, options: &PositionOptions) -> Result<GeoPosition, LocationError>;
}

/// A provider that always reports the same fix, e.g. coordinates typed on the CLI
pub struct FixedGeolocation {
    position: Option<GeoPosition>,
}

impl FixedGeolocation {
    pub fn new(position: GeoPosition) -> Self {
        Self { position: Some(position) }
    }

    /// A device without any position source.
    pub fn unavailable() -> Self {
        Self { position: None }
    }
}

#[async_trait]
impl GeolocationProvider for FixedGeolocation {
    async fn current_position(&self, _options: &PositionOptions) -> Result<GeoPosition, LocationError> {
        self.position.ok_or(LocationError::Unsupported)
    }
}

struct Fix {
    position: GeoPosition,
    acquired_at: Instant,
}

/// Provider that wraps another provider and reuses fixes younger than `maximum_age`
pub struct CachedGeolocation {
    inner: Arc<dyn GeolocationProvider>,
    last_fix: RwLock<Option<Fix>>,
}

impl CachedGeolocation {
    pub fn new(inner: Arc<dyn GeolocationProvider>) -> Self {
        Self {
            inner,
            last_fix: RwLock::new(None),
        }
    }

    pub async fn clear(&self) {
        *self.last_fix.write().await = None;
    }
}

#[async_trait]
impl GeolocationProvider for CachedGeolocation {
    async fn current_position(&self, options: &PositionOptions) -> Result<GeoPosition, LocationError> {
        if let Some(fix) = self.last_fix.read().await.as_ref() {
            if fix.acquired_at.elapsed() <= options.maximum_age {
                debug!("Reusing cached position fix ({:?} old)", fix.acquired_at.elapsed());
                return Ok(fix.position);
            }
        }

        let position = self.inner.current_position(options).await?;
        *self.last_fix.write().await = Some(Fix {
            position,
            acquired_at: Instant::now(),
        });
        Ok(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl GeolocationProvider for CountingProvider {
        async fn current_position(&self, _options: &PositionOptions) -> Result<GeoPosition, LocationError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            GeoPosition::new(-12.0 - n as f64 * 0.001, -77.0)
                .map_err(|e| LocationError::PositionUnavailable(e.to_string()))
        }
    }

    #[tokio::test]
    async fn test_fixed_provider() {
        let position = GeoPosition::new(1.0, 2.0).unwrap();
        let provider = FixedGeolocation::new(position);
        assert_eq!(provider.current_position(&PositionOptions::default()).await, Ok(position));

        let none = FixedGeolocation::unavailable();
        assert_eq!(
            none.current_position(&PositionOptions::default()).await,
            Err(LocationError::Unsupported)
        );
    }

    #[tokio::test]
    async fn test_cache_reuses_recent_fix() {
        let inner = Arc::new(CountingProvider { calls: AtomicUsize::new(0) });
        let cached = CachedGeolocation::new(inner.clone());
        let options = PositionOptions::default();

        let first = cached.current_position(&options).await.unwrap();
        let second = cached.current_position(&options).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_max_age_always_refreshes() {
        let inner = Arc::new(CountingProvider { calls: AtomicUsize::new(0) });
        let cached = CachedGeolocation::new(inner.clone());
        let options = PositionOptions {
            maximum_age: Duration::ZERO,
            ..PositionOptions::default()
        };

        tokio::time::sleep(Duration::from_millis(2)).await;
        cached.current_position(&options).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2)).await;
        cached.current_position(&options).await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let cached = CachedGeolocation::new(Arc::new(FixedGeolocation::unavailable()));
        let options = PositionOptions::default();
        assert!(cached.current_position(&options).await.is_err());
        assert!(cached.current_position(&options).await.is_err());
    }
}
