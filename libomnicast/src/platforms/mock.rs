//! Mock platform adapter for testing
//!
//! A configurable adapter that can simulate successes, typed failures, and
//! network latency. Used by orchestrator tests to verify fan-out and
//! aggregation logic without real credentials or network access.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::error::{Diagnostic, DiagnosticKind};
use crate::platforms::PlatformAdapter;
use crate::types::{Credential, PlatformId, PostOutcome, PostRequest};

/// Configuration for mock adapter behavior
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Platform identity this mock answers for
    pub platform: PlatformId,

    /// Whether posting should succeed
    pub post_succeeds: bool,

    /// Diagnostic to return on failure
    pub failure: Option<Diagnostic>,

    /// Delay before completing (simulates network latency)
    pub delay: Duration,

    /// Number of times post has been called
    pub post_call_count: Arc<Mutex<usize>>,

    /// Text of every post that went through (for verification)
    pub posted_content: Arc<Mutex<Vec<String>>>,
}

impl MockConfig {
    fn new(platform: PlatformId) -> Self {
        Self {
            platform,
            post_succeeds: true,
            failure: None,
            delay: Duration::from_millis(0),
            post_call_count: Arc::new(Mutex::new(0)),
            posted_content: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

/// Mock adapter for testing
pub struct MockAdapter {
    config: MockConfig,
}

impl MockAdapter {
    pub fn new(config: MockConfig) -> Self {
        Self { config }
    }

    /// Create a mock adapter that always succeeds
    pub fn success(platform: PlatformId) -> Self {
        Self::new(MockConfig::new(platform))
    }

    /// Create a mock adapter that fails with the given diagnostic
    pub fn failure(platform: PlatformId, kind: DiagnosticKind, message: &str) -> Self {
        Self::new(MockConfig {
            post_succeeds: false,
            failure: Some(Diagnostic::new(kind, message)),
            ..MockConfig::new(platform)
        })
    }

    /// Create a mock adapter that sleeps before answering
    pub fn with_delay(platform: PlatformId, delay: Duration) -> Self {
        Self::new(MockConfig {
            delay,
            ..MockConfig::new(platform)
        })
    }

    /// Get the number of times post was called
    pub fn post_call_count(&self) -> usize {
        *self.config.post_call_count.lock().unwrap()
    }

    /// Get all content that was posted
    pub fn posted_content(&self) -> Vec<String> {
        self.config.posted_content.lock().unwrap().clone()
    }

    /// Clone the shared counters so they outlive the boxed adapter
    pub fn config(&self) -> MockConfig {
        self.config.clone()
    }
}

#[async_trait]
impl PlatformAdapter for MockAdapter {
    fn platform(&self) -> PlatformId {
        self.config.platform
    }

    async fn post(&self, request: &PostRequest, _credential: &Credential) -> PostOutcome {
        *self.config.post_call_count.lock().unwrap() += 1;

        if !self.config.delay.is_zero() {
            sleep(self.config.delay).await;
        }

        if self.config.post_succeeds {
            self.config
                .posted_content
                .lock()
                .unwrap()
                .push(request.text().to_string());
            let post_id = format!("{}-mock-{}", self.config.platform.as_str(), self.post_call_count());
            PostOutcome::succeeded(self.config.platform, Some(post_id))
        } else {
            let diag = self.config.failure.clone().unwrap_or_else(|| {
                Diagnostic::new(DiagnosticKind::NetworkError, "Mock posting failed")
            });
            PostOutcome::failed(self.config.platform, diag)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> PostRequest {
        PostRequest::new("Test content", None, vec![PlatformId::X])
    }

    #[tokio::test]
    async fn test_mock_success() {
        let adapter = MockAdapter::success(PlatformId::X);

        let outcome = adapter.post(&request(), &Credential::empty()).await;

        assert!(outcome.success);
        assert!(outcome.post_id.unwrap().starts_with("x-mock-"));
        assert_eq!(adapter.post_call_count(), 1);
        assert_eq!(adapter.posted_content(), vec!["Test content"]);
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let adapter = MockAdapter::failure(
            PlatformId::Bluesky,
            DiagnosticKind::NetworkError,
            "simulated outage",
        );

        let outcome = adapter.post(&request(), &Credential::empty()).await;

        assert!(!outcome.success);
        assert_eq!(outcome.kind(), Some(DiagnosticKind::NetworkError));
        assert!(outcome.diagnostic.unwrap().message.contains("simulated outage"));
        assert_eq!(adapter.post_call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_with_delay() {
        let adapter = MockAdapter::with_delay(PlatformId::X, Duration::from_millis(50));

        let start = std::time::Instant::now();
        let outcome = adapter.post(&request(), &Credential::empty()).await;

        assert!(outcome.success);
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_mock_counters_survive_boxing() {
        let adapter = MockAdapter::success(PlatformId::Mastodon);
        let config = adapter.config();
        let boxed: Box<dyn PlatformAdapter> = Box::new(adapter);

        boxed.post(&request(), &Credential::empty()).await;
        boxed.post(&request(), &Credential::empty()).await;

        assert_eq!(*config.post_call_count.lock().unwrap(), 2);
    }
}
