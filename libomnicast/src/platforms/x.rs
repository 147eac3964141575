//! X (Twitter) platform adapter
//!
//! OAuth 1.0a signed requests: an optional media upload followed by a single
//! signed tweet creation. X returns 200 for the legacy media upload but 201
//! for tweet creation, and each step checks its exact expected code.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Deserialize;
use sha1::Sha1;
use tracing::debug;

use crate::error::{Diagnostic, DiagnosticKind};
use crate::platforms::{missing_credentials, PlatformAdapter};
use crate::types::{Credential, PlatformId, PostOutcome, PostRequest};

pub const DEFAULT_API_BASE: &str = "https://api.twitter.com";
pub const DEFAULT_UPLOAD_BASE: &str = "https://upload.twitter.com";

/// Characters that must be percent-encoded in OAuth signatures.
/// RFC 3986 unreserved characters: ALPHA / DIGIT / "-" / "." / "_" / "~"
const OAUTH_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'!')
    .add(b'"')
    .add(b'#')
    .add(b'$')
    .add(b'%')
    .add(b'&')
    .add(b'\'')
    .add(b'(')
    .add(b')')
    .add(b'*')
    .add(b'+')
    .add(b',')
    .add(b'/')
    .add(b':')
    .add(b';')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'?')
    .add(b'@')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// OAuth 1.0a signer scoped to one credential
struct OAuthSigner {
    consumer_key: String,
    consumer_secret: String,
    access_token: String,
    access_token_secret: String,
}

impl OAuthSigner {
    fn from_credential(credential: &Credential) -> Option<Self> {
        Some(Self {
            consumer_key: credential.get("consumer_key")?.to_string(),
            consumer_secret: credential.get("consumer_secret")?.to_string(),
            access_token: credential.get("access_token")?.to_string(),
            access_token_secret: credential.get("access_token_secret")?.to_string(),
        })
    }

    /// Generate the OAuth 1.0a Authorization header value
    ///
    /// `params` carries query/form parameters that participate in the
    /// signature base string; JSON and multipart bodies contribute none.
    fn sign(&self, method: &str, url: &str, params: &[(String, String)]) -> Result<String, String> {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_err(|e| format!("failed to get timestamp: {e}"))?
            .as_secs()
            .to_string();

        let nonce = generate_nonce();

        let mut oauth_params = vec![
            ("oauth_consumer_key".to_string(), self.consumer_key.clone()),
            ("oauth_nonce".to_string(), nonce),
            (
                "oauth_signature_method".to_string(),
                "HMAC-SHA1".to_string(),
            ),
            ("oauth_timestamp".to_string(), timestamp),
            ("oauth_token".to_string(), self.access_token.clone()),
            ("oauth_version".to_string(), "1.0".to_string()),
        ];

        let mut all_params = oauth_params.clone();
        all_params.extend(params.iter().cloned());
        all_params.sort_by(|a, b| if a.0 == b.0 { a.1.cmp(&b.1) } else { a.0.cmp(&b.0) });

        let param_string = all_params
            .iter()
            .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let base_string = format!(
            "{}&{}&{}",
            method.to_uppercase(),
            percent_encode(url),
            percent_encode(&param_string)
        );

        let signing_key = format!(
            "{}&{}",
            percent_encode(&self.consumer_secret),
            percent_encode(&self.access_token_secret)
        );

        let signature = hmac_sha1(&signing_key, &base_string)?;
        oauth_params.push(("oauth_signature".to_string(), signature));

        let header = oauth_params
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(format!("OAuth {header}"))
    }
}

/// Percent-encode a string according to RFC 3986
fn percent_encode(s: &str) -> String {
    utf8_percent_encode(s, OAUTH_ENCODE_SET).to_string()
}

/// Generate a random nonce for OAuth
fn generate_nonce() -> String {
    use rand::RngCore;
    let mut rng = rand::thread_rng();
    let mut bytes = [0u8; 16];
    rng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Compute HMAC-SHA1 and return base64-encoded result
fn hmac_sha1(key: &str, data: &str) -> Result<String, String> {
    type HmacSha1 = Hmac<Sha1>;

    let mut mac = HmacSha1::new_from_slice(key.as_bytes()).map_err(|e| e.to_string())?;
    mac.update(data.as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

#[derive(Debug, Deserialize)]
struct MediaUploadResponse {
    media_id_string: String,
}

#[derive(Debug, Deserialize)]
struct TweetResponse {
    data: TweetData,
}

#[derive(Debug, Deserialize)]
struct TweetData {
    id: String,
}

pub struct XAdapter {
    http: reqwest::Client,
    api_base: String,
    upload_base: String,
}

impl XAdapter {
    pub fn new(api_base: String, upload_base: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base,
            upload_base,
        }
    }

    /// Upload one image via the v1.1 media endpoint, returning its media id.
    /// Expects exactly HTTP 200.
    async fn upload_media(
        &self,
        signer: &OAuthSigner,
        bytes: Vec<u8>,
    ) -> Result<String, Diagnostic> {
        let url = format!("{}/1.1/media/upload.json", self.upload_base);
        let authorization = signer
            .sign("POST", &url, &[])
            .map_err(|e| Diagnostic::new(DiagnosticKind::NetworkError, format!("OAuth signing failed: {e}")))?;

        let form = reqwest::multipart::Form::new()
            .part("media", reqwest::multipart::Part::bytes(bytes));

        let response = self
            .http
            .post(&url)
            .header("Authorization", authorization)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Diagnostic::transport("X media upload", e))?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        if status != 200 {
            return Err(Diagnostic::unexpected_status("X media upload", 200, status, &body));
        }

        let parsed: MediaUploadResponse = serde_json::from_str(&body).map_err(|e| {
            Diagnostic::new(
                DiagnosticKind::NetworkError,
                format!("X media upload returned unparseable body: {e}"),
            )
        })?;
        debug!("Uploaded media to X: {}", parsed.media_id_string);
        Ok(parsed.media_id_string)
    }

    /// Create the tweet. Expects exactly HTTP 201.
    async fn create_tweet(
        &self,
        signer: &OAuthSigner,
        text: &str,
        media_ids: &[String],
    ) -> Result<String, Diagnostic> {
        let url = format!("{}/2/tweets", self.api_base);
        let authorization = signer
            .sign("POST", &url, &[])
            .map_err(|e| Diagnostic::new(DiagnosticKind::NetworkError, format!("OAuth signing failed: {e}")))?;

        let mut body = serde_json::json!({ "text": text });
        if !media_ids.is_empty() {
            body["media"] = serde_json::json!({ "media_ids": media_ids });
        }

        let response = self
            .http
            .post(&url)
            .header("Authorization", authorization)
            .json(&body)
            .send()
            .await
            .map_err(|e| Diagnostic::transport("X tweet creation", e))?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        if status != 201 {
            return Err(Diagnostic::unexpected_status("X tweet creation", 201, status, &body));
        }

        let parsed: TweetResponse = serde_json::from_str(&body).map_err(|e| {
            Diagnostic::new(
                DiagnosticKind::NetworkError,
                format!("X tweet creation returned unparseable body: {e}"),
            )
        })?;
        Ok(parsed.data.id)
    }
}

#[async_trait]
impl PlatformAdapter for XAdapter {
    fn platform(&self) -> PlatformId {
        PlatformId::X
    }

    async fn post(&self, request: &PostRequest, credential: &Credential) -> PostOutcome {
        if let Some(diag) = missing_credentials(self.platform(), credential) {
            return PostOutcome::failed(self.platform(), diag);
        }

        // Preflight guarantees all four fields are present
        let Some(signer) = OAuthSigner::from_credential(credential) else {
            return PostOutcome::failed(
                self.platform(),
                Diagnostic::credential_missing(self.platform(), &["consumer_key"]),
            );
        };

        let mut media_ids = Vec::new();
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

            match self.upload_media(&signer, bytes).await {
                Ok(media_id) => media_ids.push(media_id),
                Err(diag) => return PostOutcome::failed(self.platform(), diag),
            }
        }

        match self.create_tweet(&signer, request.text(), &media_ids).await {
            Ok(tweet_id) => PostOutcome::succeeded(self.platform(), Some(tweet_id)),
            Err(diag) => PostOutcome::failed(self.platform(), diag),
        }
    }
}
