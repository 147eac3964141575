//! Instagram platform adapter
//!
//! The Graph API publishes in two phases: create a media container from a
//! publicly accessible image URL plus the caption, then publish the
//! container by its creation id. Both calls authenticate with an app access
//! token sent as a form field and return HTTP 200 on success.
//!
//! Instagram has no text-only posts: a request without an image is rejected
//! before any network activity.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Diagnostic, DiagnosticKind};
use crate::platforms::{missing_credentials, PlatformAdapter};
use crate::types::{Credential, PlatformId, PostOutcome, PostRequest};

pub const DEFAULT_API_BASE: &str = "https://graph.instagram.com/v19.0";

#[derive(Debug, Deserialize)]
struct MediaResponse {
    id: String,
}

pub struct InstagramAdapter {
    http: reqwest::Client,
    api_base: String,
}

impl InstagramAdapter {
    pub fn new(api_base: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base,
        }
    }

    /// Create the media container. Expects exactly HTTP 200.
    async fn create_container(
        &self,
        account_id: &str,
        access_token: &str,
        image_url: &str,
        caption: &str,
    ) -> Result<String, Diagnostic> {
        let url = format!("{}/{}/media", self.api_base, account_id);
        let form = [
            ("image_url", image_url),
            ("caption", caption),
            ("access_token", access_token),
        ];

        let response = self
            .http
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| Diagnostic::transport("Instagram container creation", e))?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        if status != 200 {
            return Err(Diagnostic::unexpected_status(
                "Instagram container creation",
                200,
                status,
                &body,
            ));
        }

        let parsed: MediaResponse = serde_json::from_str(&body).map_err(|e| {
            Diagnostic::new(
                DiagnosticKind::NetworkError,
                format!("Instagram container creation returned unparseable body: {e}"),
            )
        })?;
        debug!("Created Instagram media container: {}", parsed.id);
        Ok(parsed.id)
    }

    /// Publish the container. Expects exactly HTTP 200.
    async fn publish(
        &self,
        account_id: &str,
        access_token: &str,
        creation_id: &str,
    ) -> Result<String, Diagnostic> {
        let url = format!("{}/{}/media_publish", self.api_base, account_id);
        let form = [("creation_id", creation_id), ("access_token", access_token)];

        let response = self
            .http
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| Diagnostic::transport("Instagram publish", e))?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        if status != 200 {
            return Err(Diagnostic::unexpected_status(
                "Instagram publish",
                200,
                status,
                &body,
            ));
        }

        let parsed: MediaResponse = serde_json::from_str(&body).map_err(|e| {
            Diagnostic::new(
                DiagnosticKind::NetworkError,
                format!("Instagram publish returned unparseable body: {e}"),
            )
        })?;
        Ok(parsed.id)
    }
}

#[async_trait]
impl PlatformAdapter for InstagramAdapter {
    fn platform(&self) -> PlatformId {
        PlatformId::Instagram
    }

    async fn post(&self, request: &PostRequest, credential: &Credential) -> PostOutcome {
        if let Some(diag) = missing_credentials(self.platform(), credential) {
            return PostOutcome::failed(self.platform(), diag);
        }

        // The API has no text-only publish; image is mandatory, not preferred
        let Some(image) = request.image() else {
            return PostOutcome::failed(
                self.platform(),
                Diagnostic::new(
                    DiagnosticKind::UnsupportedOperation,
                    "Instagram requires an image; text-only posts are not supported",
                ),
            );
        };

        // Preflight guarantees both fields
        let (Some(access_token), Some(account_id)) = (
            credential.get("access_token"),
            credential.get("instagram_account_id"),
        ) else {
            return PostOutcome::failed(
                self.platform(),
                Diagnostic::credential_missing(self.platform(), &["access_token"]),
            );
        };

        // The Graph API wants a publicly accessible URL; the image reference
        // is forwarded verbatim
        let image_url = image.to_string_lossy();

        let creation_id = match self
            .create_container(account_id, access_token, &image_url, request.text())
            .await
        {
            Ok(id) => id,
            Err(diag) => return PostOutcome::failed(self.platform(), diag),
        };

        match self.publish(account_id, access_token, &creation_id).await {
            Ok(post_id) => PostOutcome::succeeded(self.platform(), Some(post_id)),
            Err(diag) => PostOutcome::failed(self.platform(), diag),
        }
    }
}
