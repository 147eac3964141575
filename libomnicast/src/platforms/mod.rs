//! Platform adapters
//!
//! One adapter per platform, each encapsulating that platform's
//! authentication scheme and request sequence behind a uniform contract.
//! Adapters never let a transport or protocol fault escape: every failure
//! mode is captured as a [`PostOutcome`] with a typed diagnostic. Required
//! credential fields are checked before any network call, and expected HTTP
//! status codes are matched exactly — some platforms return 200 for what is
//! logically a creation, others 201, and the difference is meaningful.

use async_trait::async_trait;

use crate::config::Config;
use crate::error::Diagnostic;
use crate::types::{Credential, PlatformId, PostOutcome, PostRequest};

pub mod bluesky;
pub mod instagram;
pub mod linkedin;
pub mod mastodon;
pub mod x;

// Mock adapter is available for all builds (not just tests) to support
// integration tests in dependent crates
pub mod mock;

/// Uniform adapter contract
///
/// `post` performs the platform's full protocol sequence for a single post
/// and reports the result as an outcome. Adapters hold no state beyond the
/// single invocation; any session token obtained along the way lives only
/// for the duration of the call.
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    /// The platform this adapter speaks for
    fn platform(&self) -> PlatformId;

    /// Post text (and optionally an image) using the given credential
    async fn post(&self, request: &PostRequest, credential: &Credential) -> PostOutcome;
}

/// Preflight credential check shared by all adapters
///
/// Returns a `CredentialMissing` diagnostic naming the absent fields, or
/// `None` when the credential is complete. Runs before any network I/O.
pub(crate) fn missing_credentials(
    platform: PlatformId,
    credential: &Credential,
) -> Option<Diagnostic> {
    let missing = credential.missing_fields(platform.profile().required_fields);
    if missing.is_empty() {
        None
    } else {
        Some(Diagnostic::credential_missing(platform, &missing))
    }
}

/// Create the adapter for a platform, wiring endpoints from configuration
pub fn create_adapter(platform: PlatformId, config: &Config) -> Box<dyn PlatformAdapter> {
    match platform {
        PlatformId::X => {
            let api_base = config
                .api_base(PlatformId::X)
                .unwrap_or_else(|| x::DEFAULT_API_BASE.to_string());
            let upload_base = config
                .endpoints
                .get("x-upload")
                .cloned()
                .unwrap_or_else(|| x::DEFAULT_UPLOAD_BASE.to_string());
            Box::new(x::XAdapter::new(api_base, upload_base))
        }
        PlatformId::Instagram => {
            let api_base = config
                .api_base(PlatformId::Instagram)
                .unwrap_or_else(|| instagram::DEFAULT_API_BASE.to_string());
            Box::new(instagram::InstagramAdapter::new(api_base))
        }
        PlatformId::Bluesky => {
            let api_base = config
                .api_base(PlatformId::Bluesky)
                .unwrap_or_else(|| bluesky::DEFAULT_API_BASE.to_string());
            Box::new(bluesky::BlueskyAdapter::new(api_base))
        }
        PlatformId::Linkedin => {
            let api_base = config
                .api_base(PlatformId::Linkedin)
                .unwrap_or_else(|| linkedin::DEFAULT_API_BASE.to_string());
            Box::new(linkedin::LinkedinAdapter::new(api_base))
        }
        // Mastodon is instance-relative; the base URL comes from the
        // credential's instance_url field at post time
        PlatformId::Mastodon => Box::new(mastodon::MastodonAdapter::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiagnosticKind;

    #[test]
    fn test_missing_credentials_complete() {
        let credential: Credential = [("identifier", "user.bsky.social"), ("password", "app-pass")]
            .into_iter()
            .collect();
        assert!(missing_credentials(PlatformId::Bluesky, &credential).is_none());
    }

    #[test]
    fn test_missing_credentials_reports_fields() {
        let credential: Credential = [("identifier", "user.bsky.social")].into_iter().collect();
        let diag = missing_credentials(PlatformId::Bluesky, &credential).unwrap();
        assert_eq!(diag.kind, DiagnosticKind::CredentialMissing);
        assert!(diag.message.contains("password"));
        assert!(!diag.message.contains("identifier,"));
    }

    #[test]
    fn test_create_adapter_covers_every_platform() {
        let config = Config::default();
        for platform in PlatformId::all() {
            let adapter = create_adapter(platform, &config);
            assert_eq!(adapter.platform(), platform);
        }
    }
}
