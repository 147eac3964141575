//! Mastodon platform adapter
//!
//! Mastodon is federated, so there is no fixed API host: the instance base
//! URL travels with the credential (`instance_url`) and the adapter builds
//! the endpoint from it at post time. A single bearer-authenticated status
//! POST, HTTP 200 on success.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use crate::error::{Diagnostic, DiagnosticKind};
use crate::platforms::{missing_credentials, PlatformAdapter};
use crate::types::{Credential, PlatformId, PostOutcome, PostRequest};

#[derive(Debug, Deserialize)]
struct StatusResponse {
    id: String,
}

pub struct MastodonAdapter {
    http: reqwest::Client,
}

impl MastodonAdapter {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    /// Post the status. Expects exactly HTTP 200.
    async fn create_status(
        &self,
        instance_url: &str,
        access_token: &str,
        text: &str,
    ) -> Result<String, Diagnostic> {
        let url = format!("{}/api/v1/statuses", normalize_instance_url(instance_url));
        let response = self
            .http
            .post(&url)
            .bearer_auth(access_token)
            .json(&serde_json::json!({
                "status": text,
                "visibility": "public",
            }))
            .send()
            .await
            .map_err(|e| Diagnostic::transport("Mastodon status creation", e))?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        if status != 200 {
            return Err(Diagnostic::unexpected_status(
                "Mastodon status creation",
                200,
                status,
                &body,
            ));
        }

        let parsed: StatusResponse = serde_json::from_str(&body).map_err(|e| {
            Diagnostic::new(
                DiagnosticKind::NetworkError,
                format!("Mastodon status creation returned unparseable body: {e}"),
            )
        })?;
        Ok(parsed.id)
    }
}

impl Default for MastodonAdapter {
    fn default() -> Self {
        Self::new()
    }
}

/// Accept instance URLs with or without a scheme, and tolerate a trailing slash
fn normalize_instance_url(instance_url: &str) -> String {
    let trimmed = instance_url.trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

#[async_trait]
impl PlatformAdapter for MastodonAdapter {
    fn platform(&self) -> PlatformId {
        PlatformId::Mastodon
    }

    async fn post(&self, request: &PostRequest, credential: &Credential) -> PostOutcome {
        if let Some(diag) = missing_credentials(self.platform(), credential) {
            return PostOutcome::failed(self.platform(), diag);
        }

        // Preflight guarantees both fields
        let (Some(access_token), Some(instance_url)) = (
            credential.get("access_token"),
            credential.get("instance_url"),
        ) else {
            return PostOutcome::failed(
                self.platform(),
                Diagnostic::credential_missing(self.platform(), &["access_token"]),
            );
        };

        if let Some(image) = request.image() {
            warn!(
                "Mastodon media posting is not implemented; skipping {}",
                image.display()
            );
        }

        match self
            .create_status(instance_url, access_token, request.text())
            .await
        {
            Ok(post_id) => PostOutcome::succeeded(self.platform(), Some(post_id)),
            Err(diag) => PostOutcome::failed(self.platform(), diag),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credential_for(instance_url: &str) -> Credential {
        [
            ("access_token", "masto-token"),
            ("instance_url", instance_url),
        ]
        .into_iter()
        .collect()
    }

    fn text_request(text: &str) -> PostRequest {
        PostRequest::new(text, None, vec![PlatformId::Mastodon])
    }

    #[test]
    fn test_normalize_instance_url() {
        assert_eq!(
            normalize_instance_url("fosstodon.org"),
            "https://fosstodon.org"
        );
        assert_eq!(
            normalize_instance_url("https://fosstodon.org/"),
            "https://fosstodon.org"
        );
        assert_eq!(
            normalize_instance_url("http://localhost:3000"),
            "http://localhost:3000"
        );
    }

    #[tokio::test]
    async fn test_missing_credential_no_network() {
        let mock_server = MockServer::start().await;
        let adapter = MastodonAdapter::new();

        let credential: Credential = [("access_token", "masto-token")].into_iter().collect();
        let outcome = adapter.post(&text_request("hi"), &credential).await;

        assert!(!outcome.success);
        assert_eq!(outcome.kind(), Some(DiagnosticKind::CredentialMissing));
        assert!(mock_server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_status_post_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/statuses"))
            .and(header("Authorization", "Bearer masto-token"))
            .and(body_string_contains("\"visibility\":\"public\""))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "109501" })),
            )
            .mount(&mock_server)
            .await;

        let adapter = MastodonAdapter::new();
        let outcome = adapter
            .post(&text_request("hello fediverse"), &credential_for(&mock_server.uri()))
            .await;

        assert!(outcome.success);
        assert_eq!(outcome.post_id.as_deref(), Some("109501"));
    }

    #[tokio::test]
    async fn test_rate_limited_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/statuses"))
            .respond_with(ResponseTemplate::new(429).set_body_string("Too many requests"))
            .mount(&mock_server)
            .await;

        let adapter = MastodonAdapter::new();
        let outcome = adapter
            .post(&text_request("hello"), &credential_for(&mock_server.uri()))
            .await;

        assert!(!outcome.success);
        let diag = outcome.diagnostic.unwrap();
        assert_eq!(diag.kind, DiagnosticKind::NetworkError);
        assert!(diag.message.contains("expected 200"));
    }

    #[tokio::test]
    async fn test_image_ignored_text_still_posted() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/statuses"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "1" })),
            )
            .mount(&mock_server)
            .await;

        let adapter = MastodonAdapter::new();
        let request = PostRequest::new(
            "with image",
            Some("/tmp/photo.png".into()),
            vec![PlatformId::Mastodon],
        );
        let outcome = adapter
            .post(&request, &credential_for(&mock_server.uri()))
            .await;

        assert!(outcome.success);
        assert_eq!(mock_server.received_requests().await.unwrap().len(), 1);
    }
}
