//! LinkedIn platform adapter
//!
//! Single UGC (user generated content) post call with a bearer token and the
//! Restli protocol version header. The API answers HTTP 201 on creation.
//! Image posting needs a separate asset registration flow this adapter does
//! not implement; an image in the request is accepted but skipped with a
//! warning so the text still goes out.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use crate::error::{Diagnostic, DiagnosticKind};
use crate::platforms::{missing_credentials, PlatformAdapter};
use crate::types::{Credential, PlatformId, PostOutcome, PostRequest};

pub const DEFAULT_API_BASE: &str = "https://api.linkedin.com";

#[derive(Debug, Deserialize)]
struct UgcResponse {
    id: String,
}

pub struct LinkedinAdapter {
    http: reqwest::Client,
    api_base: String,
}

impl LinkedinAdapter {
    pub fn new(api_base: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base,
        }
    }

    /// Create the UGC post. Expects exactly HTTP 201.
    async fn create_ugc_post(
        &self,
        access_token: &str,
        person_id: &str,
        text: &str,
    ) -> Result<String, Diagnostic> {
        let url = format!("{}/v2/ugcPosts", self.api_base);
        let body = serde_json::json!({
            "author": format!("urn:li:person:{person_id}"),
            "lifecycleState": "PUBLISHED",
            "specificContent": {
                "com.linkedin.ugc.ShareContent": {
                    "shareCommentary": { "text": text },
                    "shareMediaCategory": "NONE",
                }
            },
            "visibility": {
                "com.linkedin.ugc.MemberNetworkVisibility": "PUBLIC",
            },
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(access_token)
            .header("X-Restli-Protocol-Version", "2.0.0")
            .json(&body)
            .send()
            .await
            .map_err(|e| Diagnostic::transport("LinkedIn post creation", e))?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        if status != 201 {
            return Err(Diagnostic::unexpected_status(
                "LinkedIn post creation",
                201,
                status,
                &body,
            ));
        }

        let parsed: UgcResponse = serde_json::from_str(&body).map_err(|e| {
            Diagnostic::new(
                DiagnosticKind::NetworkError,
                format!("LinkedIn post creation returned unparseable body: {e}"),
            )
        })?;
        Ok(parsed.id)
    }
}

#[async_trait]
impl PlatformAdapter for LinkedinAdapter {
    fn platform(&self) -> PlatformId {
        PlatformId::Linkedin
    }

    async fn post(&self, request: &PostRequest, credential: &Credential) -> PostOutcome {
        if let Some(diag) = missing_credentials(self.platform(), credential) {
            return PostOutcome::failed(self.platform(), diag);
        }

        // Preflight guarantees both fields
        let (Some(access_token), Some(person_id)) =
            (credential.get("access_token"), credential.get("person_id"))
        else {
            return PostOutcome::failed(
                self.platform(),
                Diagnostic::credential_missing(self.platform(), &["access_token"]),
            );
        };

        if let Some(image) = request.image() {
            warn!(
                "LinkedIn image posting is not implemented; skipping {}",
                image.display()
            );
        }

        match self
            .create_ugc_post(access_token, person_id, request.text())
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

    fn full_credential() -> Credential {
        [("access_token", "li-token"), ("person_id", "abc123")]
            .into_iter()
            .collect()
    }

    fn text_request(text: &str) -> PostRequest {
        PostRequest::new(text, None, vec![PlatformId::Linkedin])
    }

    #[tokio::test]
    async fn test_missing_credential_no_network() {
        let mock_server = MockServer::start().await;
        let adapter = LinkedinAdapter::new(mock_server.uri());

        let credential: Credential = [("access_token", "li-token")].into_iter().collect();
        let outcome = adapter.post(&text_request("hi"), &credential).await;

        assert!(!outcome.success);
        assert_eq!(outcome.kind(), Some(DiagnosticKind::CredentialMissing));
        assert!(mock_server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_post_success_on_201() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v2/ugcPosts"))
            .and(header("Authorization", "Bearer li-token"))
            .and(header("X-Restli-Protocol-Version", "2.0.0"))
            .and(body_string_contains("urn:li:person:abc123"))
            .and(body_string_contains("PUBLISHED"))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(serde_json::json!({ "id": "urn:li:share:999" })),
            )
            .mount(&mock_server)
            .await;

        let adapter = LinkedinAdapter::new(mock_server.uri());
        let outcome = adapter.post(&text_request("hello"), &full_credential()).await;

        assert!(outcome.success);
        assert_eq!(outcome.post_id.as_deref(), Some("urn:li:share:999"));
    }

    #[tokio::test]
    async fn test_200_is_not_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v2/ugcPosts"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "id": "urn:li:share:999" })),
            )
            .mount(&mock_server)
            .await;

        let adapter = LinkedinAdapter::new(mock_server.uri());
        let outcome = adapter.post(&text_request("hello"), &full_credential()).await;

        assert!(!outcome.success);
        let diag = outcome.diagnostic.unwrap();
        assert_eq!(diag.kind, DiagnosticKind::NetworkError);
        assert!(diag.message.contains("expected 201"));
    }

    #[tokio::test]
    async fn test_image_ignored_text_still_posted() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v2/ugcPosts"))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(serde_json::json!({ "id": "urn:li:share:1" })),
            )
            .mount(&mock_server)
            .await;

        let adapter = LinkedinAdapter::new(mock_server.uri());
        let request = PostRequest::new(
            "with image",
            Some("/tmp/photo.jpg".into()),
            vec![PlatformId::Linkedin],
        );
        let outcome = adapter.post(&request, &full_credential()).await;

        // The image is skipped, not fatal
        assert!(outcome.success);
        assert_eq!(mock_server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unauthorized_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v2/ugcPosts"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Expired token"))
            .mount(&mock_server)
            .await;

        let adapter = LinkedinAdapter::new(mock_server.uri());
        let outcome = adapter.post(&text_request("hello"), &full_credential()).await;

        assert!(!outcome.success);
        assert_eq!(outcome.kind(), Some(DiagnosticKind::NetworkError));
    }
}
