//! Multi-platform posting orchestration
//!
//! The orchestrator ties the pieces together: fail-fast request checks,
//! character-limit validation with an explicit continue-or-abort decision,
//! then concurrent fan-out where each platform resolves its own credential
//! and runs its adapter. Platforms are mutually independent; nothing is
//! shared between the per-platform futures, so processing order never
//! affects outcomes.
//!
//! Every submit produces exactly one outcome per requested platform, no
//! matter which step failed. There are no retries; each platform gets one
//! attempt per submit.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{info, warn};

use crate::config::Config;
use crate::credentials::CredentialResolver;
use crate::error::{Diagnostic, DiagnosticKind, OmnicastError, Result};
use crate::platforms::{create_adapter, PlatformAdapter};
use crate::types::{PlatformId, PostOutcome, PostRequest, PostResultSet};
use crate::validation::{self, LimitCheck};

/// Caller's answer to an over-limit warning
///
/// Interactive front ends collect this from a prompt after calling
/// [`Orchestrator::check_limits`]; non-interactive callers pass it as a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverLimitDecision {
    /// Post anyway; over-limit platforms will likely reject server-side
    Proceed,
    /// Do not post anywhere; every platform gets a `ValidationFailed` outcome
    Abort,
}

/// Per-submit knobs
#[derive(Debug, Clone, Default)]
pub struct SubmitOptions {
    /// Deadline applied to each platform's resolve-and-post sequence. An
    /// elapsed deadline drops the in-flight request and records a
    /// `Cancelled` outcome.
    pub timeout: Option<Duration>,
}

pub struct Orchestrator {
    resolver: CredentialResolver,
    adapters: HashMap<PlatformId, Arc<dyn PlatformAdapter>>,
}

impl Orchestrator {
    /// Build an orchestrator with the production adapters
    pub fn new(config: &Config) -> Self {
        let adapters = PlatformId::all()
            .into_iter()
            .map(|platform| (platform, Arc::from(create_adapter(platform, config))))
            .collect();
        Self {
            resolver: CredentialResolver::new(config),
            adapters,
        }
    }

    /// Build an orchestrator with caller-supplied adapters (used by tests)
    pub fn with_adapters(
        resolver: CredentialResolver,
        adapters: Vec<Arc<dyn PlatformAdapter>>,
    ) -> Self {
        Self {
            resolver,
            adapters: adapters.into_iter().map(|a| (a.platform(), a)).collect(),
        }
    }

    /// Run the character-limit checks for a request
    ///
    /// Public so a front end can show the over-limit warning and collect the
    /// continue-or-abort decision before calling [`submit`](Self::submit).
    pub fn check_limits(&self, request: &PostRequest) -> Vec<LimitCheck> {
        validation::check_all(request.text(), request.platforms())
    }

    /// Post to every requested platform and aggregate the outcomes
    ///
    /// Fails fast (no side effects) only on structurally invalid requests:
    /// empty text or an empty platform set. Everything past that point
    /// resolves into a per-platform outcome; the result set always has
    /// exactly one entry per requested platform.
    pub async fn submit(
        &self,
        request: &PostRequest,
        decision: OverLimitDecision,
        options: &SubmitOptions,
    ) -> Result<PostResultSet> {
        if request.text().is_empty() {
            return Err(OmnicastError::InvalidInput(
                "Post text cannot be empty".to_string(),
            ));
        }
        if request.platforms().is_empty() {
            return Err(OmnicastError::InvalidInput(
                "At least one platform must be selected".to_string(),
            ));
        }

        let checks = self.check_limits(request);
        let violations = validation::violations(&checks);
        if !violations.is_empty() && decision == OverLimitDecision::Abort {
            // Declined over-limit warning fails every platform, including
            // the ones that were within limit, with zero network calls
            let mut results = PostResultSet::new();
            for platform in request.platforms() {
                results.insert(PostOutcome::failed(
                    *platform,
                    Diagnostic::new(
                        DiagnosticKind::ValidationFailed,
                        format!(
                            "Posting aborted: text exceeds the limit on {}",
                            violations
                                .iter()
                                .map(|v| v.platform.to_string())
                                .collect::<Vec<_>>()
                                .join(", ")
                        ),
                    ),
                ));
            }
            return Ok(results);
        }

        let futures: Vec<_> = request
            .platforms()
            .iter()
            .map(|&platform| self.post_to_platform(platform, request, options))
            .collect();

        let mut results = PostResultSet::new();
        for outcome in join_all(futures).await {
            results.insert(outcome);
        }
        Ok(results)
    }

    /// Resolve one platform's credential and invoke its adapter
    async fn post_to_platform(
        &self,
        platform: PlatformId,
        request: &PostRequest,
        options: &SubmitOptions,
    ) -> PostOutcome {
        let adapter = match self.adapters.get(&platform) {
            Some(adapter) => Arc::clone(adapter),
            None => {
                // Unreachable with the production constructor; guards test
                // setups that register a subset of adapters
                return PostOutcome::failed(
                    platform,
                    Diagnostic::new(
                        DiagnosticKind::UnsupportedOperation,
                        format!("No adapter registered for {}", platform),
                    ),
                );
            }
        };

        let attempt = async {
            info!("Posting to {}", platform);
            let resolved = self.resolver.resolve(platform).await;
            if let Some(error) = &resolved.store_error {
                // Diagnostic only; the fallback-filled credential still
                // flows into the adapter's preflight check
                warn!("Credential resolution degraded for {}: {}", platform, error);
            }
            adapter.post(request, &resolved.credential).await
        };

        let outcome = match options.timeout {
            Some(deadline) => match tokio::time::timeout(deadline, attempt).await {
                Ok(outcome) => outcome,
                // Dropping the future aborts the in-flight request
                Err(_) => PostOutcome::failed(
                    platform,
                    Diagnostic::new(
                        DiagnosticKind::Cancelled,
                        format!("Posting to {} exceeded {:?}", platform, deadline),
                    ),
                ),
            },
            None => attempt.await,
        };

        match &outcome {
            o if o.success => info!(
                "Posted to {}{}",
                platform,
                o.post_id
                    .as_deref()
                    .map(|id| format!(": {id}"))
                    .unwrap_or_default()
            ),
            o => warn!(
                "Failed to post to {}: {}",
                platform,
                o.diagnostic
                    .as_ref()
                    .map(|d| d.to_string())
                    .unwrap_or_default()
            ),
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platforms::mock::MockAdapter;

    fn resolver() -> CredentialResolver {
        // Points at a command that does not exist; resolution yields empty
        // credentials, which mock adapters ignore
        CredentialResolver::new(&Config::default())
    }

    fn orchestrator_with(adapters: Vec<Arc<dyn PlatformAdapter>>) -> Orchestrator {
        Orchestrator::with_adapters(resolver(), adapters)
    }

    #[tokio::test]
    async fn test_empty_text_fails_fast() {
        let orchestrator = orchestrator_with(vec![Arc::new(MockAdapter::success(PlatformId::X))]);
        let request = PostRequest::new("", None, vec![PlatformId::X]);

        let result = orchestrator
            .submit(&request, OverLimitDecision::Proceed, &SubmitOptions::default())
            .await;

        match result {
            Err(OmnicastError::InvalidInput(msg)) => assert!(msg.contains("empty")),
            other => panic!("Expected InvalidInput, got {:?}", other.map(|r| r.len())),
        }
    }

    #[tokio::test]
    async fn test_empty_platform_set_fails_fast() {
        let orchestrator = orchestrator_with(vec![]);
        let request = PostRequest::new("hello", None, vec![]);

        let result = orchestrator
            .submit(&request, OverLimitDecision::Proceed, &SubmitOptions::default())
            .await;

        assert!(matches!(result, Err(OmnicastError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_one_outcome_per_platform() {
        let success = Arc::new(MockAdapter::success(PlatformId::X));
        let failure = Arc::new(MockAdapter::failure(
            PlatformId::Bluesky,
            DiagnosticKind::NetworkError,
            "down",
        ));
        let orchestrator = orchestrator_with(vec![success, failure]);

        let request = PostRequest::new("hello", None, vec![PlatformId::X, PlatformId::Bluesky]);
        let results = orchestrator
            .submit(&request, OverLimitDecision::Proceed, &SubmitOptions::default())
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results.get(PlatformId::X).unwrap().success);
        assert!(!results.get(PlatformId::Bluesky).unwrap().success);
        assert!(results.any_failed());
        assert!(!results.all_succeeded());
    }

    #[tokio::test]
    async fn test_abort_on_over_limit_fails_all_without_posting() {
        let x = Arc::new(MockAdapter::success(PlatformId::X));
        let bluesky = Arc::new(MockAdapter::success(PlatformId::Bluesky));
        let x_config = x.config();
        let bluesky_config = bluesky.config();
        let orchestrator = orchestrator_with(vec![x, bluesky]);

        // Over X's 280 limit, within Bluesky's 300
        let text = "a".repeat(290);
        let request = PostRequest::new(&text, None, vec![PlatformId::X, PlatformId::Bluesky]);
        let results = orchestrator
            .submit(&request, OverLimitDecision::Abort, &SubmitOptions::default())
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        for outcome in results.iter() {
            assert_eq!(outcome.kind(), Some(DiagnosticKind::ValidationFailed));
        }
        assert_eq!(*x_config.post_call_count.lock().unwrap(), 0);
        assert_eq!(*bluesky_config.post_call_count.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_proceed_past_over_limit_posts_everywhere() {
        let x = Arc::new(MockAdapter::success(PlatformId::X));
        let x_config = x.config();
        let orchestrator = orchestrator_with(vec![x]);

        let text = "a".repeat(290);
        let request = PostRequest::new(&text, None, vec![PlatformId::X]);
        let results = orchestrator
            .submit(&request, OverLimitDecision::Proceed, &SubmitOptions::default())
            .await
            .unwrap();

        assert!(results.all_succeeded());
        assert_eq!(*x_config.post_call_count.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_within_limit_ignores_abort_decision() {
        let x = Arc::new(MockAdapter::success(PlatformId::X));
        let orchestrator = orchestrator_with(vec![x]);

        let request = PostRequest::new("short", None, vec![PlatformId::X]);
        let results = orchestrator
            .submit(&request, OverLimitDecision::Abort, &SubmitOptions::default())
            .await
            .unwrap();

        assert!(results.all_succeeded());
    }

    #[tokio::test]
    async fn test_timeout_records_cancelled_outcome() {
        let slow = Arc::new(MockAdapter::with_delay(
            PlatformId::Mastodon,
            Duration::from_secs(5),
        ));
        let fast = Arc::new(MockAdapter::success(PlatformId::X));
        let orchestrator = orchestrator_with(vec![slow, fast]);

        let request = PostRequest::new("hello", None, vec![PlatformId::X, PlatformId::Mastodon]);
        let options = SubmitOptions {
            timeout: Some(Duration::from_millis(100)),
        };
        let results = orchestrator
            .submit(&request, OverLimitDecision::Proceed, &options)
            .await
            .unwrap();

        // The result set is complete even when one platform timed out
        assert_eq!(results.len(), 2);
        assert!(results.get(PlatformId::X).unwrap().success);
        assert_eq!(
            results.get(PlatformId::Mastodon).unwrap().kind(),
            Some(DiagnosticKind::Cancelled)
        );
    }

    #[tokio::test]
    async fn test_unregistered_platform_gets_outcome() {
        let orchestrator = orchestrator_with(vec![Arc::new(MockAdapter::success(PlatformId::X))]);

        let request = PostRequest::new("hello", None, vec![PlatformId::X, PlatformId::Linkedin]);
        let results = orchestrator
            .submit(&request, OverLimitDecision::Proceed, &SubmitOptions::default())
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(
            results.get(PlatformId::Linkedin).unwrap().kind(),
            Some(DiagnosticKind::UnsupportedOperation)
        );
    }

    #[test]
    fn test_check_limits_covers_requested_platforms() {
        let orchestrator = orchestrator_with(vec![]);
        let request = PostRequest::new(
            &"a".repeat(300),
            None,
            vec![PlatformId::X, PlatformId::Bluesky],
        );

        let checks = orchestrator.check_limits(&request);
        assert_eq!(checks.len(), 2);

        let x = checks.iter().find(|c| c.platform == PlatformId::X).unwrap();
        assert!(!x.within_limit);
        assert_eq!(x.overage(), 20);

        let bluesky = checks
            .iter()
            .find(|c| c.platform == PlatformId::Bluesky)
            .unwrap();
        assert!(bluesky.within_limit);
        assert_eq!(bluesky.remaining(), 0);
    }
}
