//! Bluesky (AT Protocol) platform adapter
//!
//! Three-phase XRPC sequence: exchange handle and app password for a session
//! (createSession), optionally upload the image as a blob (uploadBlob), then
//! create the feed post record (createRecord). Every step returns HTTP 200
//! on success. The session token obtained in phase one lives only for the
//! duration of this single post; it is never reused across calls.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Diagnostic, DiagnosticKind};
use crate::platforms::{missing_credentials, PlatformAdapter};
use crate::types::{Credential, ImageMimeType, PlatformId, PostOutcome, PostRequest};

pub const DEFAULT_API_BASE: &str = "https://bsky.social/xrpc";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Session {
    access_jwt: String,
    did: String,
}

#[derive(Debug, Deserialize)]
struct BlobResponse {
    blob: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RecordResponse {
    uri: String,
}

pub struct BlueskyAdapter {
    http: reqwest::Client,
    api_base: String,
}

impl BlueskyAdapter {
    pub fn new(api_base: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base,
        }
    }

    /// Authenticate, returning a session scoped to this one post
    async fn create_session(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<Session, Diagnostic> {
        let url = format!("{}/com.atproto.server.createSession", self.api_base);
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({
                "identifier": identifier,
                "password": password,
            }))
            .send()
            .await
            .map_err(|e| Diagnostic::transport("Bluesky session creation", e))?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        if status != 200 {
            return Err(Diagnostic::unexpected_status(
                "Bluesky session creation",
                200,
                status,
                &body,
            ));
        }

        serde_json::from_str(&body).map_err(|e| {
            Diagnostic::new(
                DiagnosticKind::NetworkError,
                format!("Bluesky session creation returned unparseable body: {e}"),
            )
        })
    }

    /// Upload raw image bytes, returning the opaque blob reference to embed
    async fn upload_blob(
        &self,
        session: &Session,
        bytes: Vec<u8>,
        content_type: ImageMimeType,
    ) -> Result<serde_json::Value, Diagnostic> {
        let url = format!("{}/com.atproto.repo.uploadBlob", self.api_base);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&session.access_jwt)
            .header("Content-Type", content_type.as_str())
            .body(bytes)
            .send()
            .await
            .map_err(|e| Diagnostic::transport("Bluesky blob upload", e))?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        if status != 200 {
            return Err(Diagnostic::unexpected_status(
                "Bluesky blob upload",
                200,
                status,
                &body,
            ));
        }

        let parsed: BlobResponse = serde_json::from_str(&body).map_err(|e| {
            Diagnostic::new(
                DiagnosticKind::NetworkError,
                format!("Bluesky blob upload returned unparseable body: {e}"),
            )
        })?;
        debug!("Uploaded blob to Bluesky");
        Ok(parsed.blob)
    }

    /// Create the feed post record, returning its AT URI
    async fn create_record(
        &self,
        session: &Session,
        text: &str,
        embed: Option<serde_json::Value>,
    ) -> Result<String, Diagnostic> {
        let url = format!("{}/com.atproto.repo.createRecord", self.api_base);

        let mut record = serde_json::json!({
            "$type": "app.bsky.feed.post",
            "text": text,
            "createdAt": chrono::Utc::now().to_rfc3339(),
        });
        if let Some(embed) = embed {
            record["embed"] = embed;
        }

        let response = self
            .http
            .post(&url)
            .bearer_auth(&session.access_jwt)
            .json(&serde_json::json!({
                "repo": session.did,
                "collection": "app.bsky.feed.post",
                "record": record,
            }))
            .send()
            .await
            .map_err(|e| Diagnostic::transport("Bluesky record creation", e))?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        if status != 200 {
            return Err(Diagnostic::unexpected_status(
                "Bluesky record creation",
                200,
                status,
                &body,
            ));
        }

        let parsed: RecordResponse = serde_json::from_str(&body).map_err(|e| {
            Diagnostic::new(
                DiagnosticKind::NetworkError,
                format!("Bluesky record creation returned unparseable body: {e}"),
            )
        })?;
        Ok(parsed.uri)
    }
}

#[async_trait]
impl PlatformAdapter for BlueskyAdapter {
    fn platform(&self) -> PlatformId {
        PlatformId::Bluesky
    }

    async fn post(&self, request: &PostRequest, credential: &Credential) -> PostOutcome {
        if let Some(diag) = missing_credentials(self.platform(), credential) {
            return PostOutcome::failed(self.platform(), diag);
        }

        // Preflight guarantees both fields
        let (Some(identifier), Some(password)) =
            (credential.get("identifier"), credential.get("password"))
        else {
            return PostOutcome::failed(
                self.platform(),
                Diagnostic::credential_missing(self.platform(), &["identifier"]),
            );
        };

        let session = match self.create_session(identifier, password).await {
            Ok(session) => session,
            Err(diag) => return PostOutcome::failed(self.platform(), diag),
        };

        let mut embed = None;
        if let Some(image) = request.image() {
            let bytes = match tokio::fs::read(image).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    return PostOutcome::failed(
                        self.platform(),
                        Diagnostic::new(
                            DiagnosticKind::UnsupportedOperation,
                            format!("Cannot read image file {}: {}", image.display(), e),
                        ),
                    );
                }
            };

            let content_type = ImageMimeType::from_path(image);
            match self.upload_blob(&session, bytes, content_type).await {
                Ok(blob) => {
                    embed = Some(serde_json::json!({
                        "$type": "app.bsky.embed.images",
                        "images": [{ "image": blob, "alt": "Image" }],
                    }));
                }
                Err(diag) => return PostOutcome::failed(self.platform(), diag),
            }
        }

        match self.create_record(&session, request.text(), embed).await {
            Ok(uri) => PostOutcome::succeeded(self.platform(), Some(uri)),
            Err(diag) => PostOutcome::failed(self.platform(), diag),
        }
    }
}
