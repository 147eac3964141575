//! Core types for Omnicast

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Diagnostic, DiagnosticKind};

/// Identifier for a supported platform
///
/// A closed set: adding a platform means adding a variant here, which makes
/// every dispatch site a compile-time-visible change.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PlatformId {
    X,
    Instagram,
    Bluesky,
    Linkedin,
    Mastodon,
}

impl PlatformId {
    /// All supported platforms, in display order
    pub fn all() -> [PlatformId; 5] {
        [
            PlatformId::Instagram,
            PlatformId::X,
            PlatformId::Bluesky,
            PlatformId::Linkedin,
            PlatformId::Mastodon,
        ]
    }

    /// Lowercase identifier used on the CLI and in config keys
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformId::X => "x",
            PlatformId::Instagram => "instagram",
            PlatformId::Bluesky => "bluesky",
            PlatformId::Linkedin => "linkedin",
            PlatformId::Mastodon => "mastodon",
        }
    }

    /// Static descriptor for this platform
    pub fn profile(&self) -> &'static PlatformProfile {
        match self {
            PlatformId::X => &X_PROFILE,
            PlatformId::Instagram => &INSTAGRAM_PROFILE,
            PlatformId::Bluesky => &BLUESKY_PROFILE,
            PlatformId::Linkedin => &LINKEDIN_PROFILE,
            PlatformId::Mastodon => &MASTODON_PROFILE,
        }
    }
}

impl std::str::FromStr for PlatformId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "x" | "twitter" => Ok(PlatformId::X),
            "instagram" => Ok(PlatformId::Instagram),
            "bluesky" => Ok(PlatformId::Bluesky),
            "linkedin" => Ok(PlatformId::Linkedin),
            "mastodon" => Ok(PlatformId::Mastodon),
            _ => Err(format!(
                "Unknown platform: '{}'. Valid options: instagram, x, bluesky, linkedin, mastodon",
                s
            )),
        }
    }
}

impl std::fmt::Display for PlatformId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Static per-platform descriptor: character limit, attachment policy,
/// credential shape, production endpoint. One instance per platform,
/// read-only and process-wide.
#[derive(Debug)]
pub struct PlatformProfile {
    /// Human-readable platform name
    pub display_name: &'static str,
    /// Maximum post length in characters (naive code-point count)
    pub character_limit: usize,
    /// Whether the platform rejects posts without an image
    pub image_required: bool,
    /// Credential fields the adapter needs before any network call
    pub required_fields: &'static [&'static str],
    /// Secret-store item the resolver looks the fields up under
    pub secret_item: &'static str,
    /// Production API base URL; `None` for instance-relative platforms
    /// where the base comes from a credential field
    pub api_base: Option<&'static str>,
}

static X_PROFILE: PlatformProfile = PlatformProfile {
    display_name: "X",
    character_limit: 280,
    image_required: false,
    required_fields: &[
        "consumer_key",
        "consumer_secret",
        "access_token",
        "access_token_secret",
    ],
    secret_item: "Social Media - X API",
    api_base: Some("https://api.twitter.com"),
};

static INSTAGRAM_PROFILE: PlatformProfile = PlatformProfile {
    display_name: "Instagram",
    character_limit: 2200,
    image_required: true,
    required_fields: &["access_token", "instagram_account_id"],
    secret_item: "Social Media - Instagram API",
    api_base: Some("https://graph.instagram.com/v19.0"),
};

static BLUESKY_PROFILE: PlatformProfile = PlatformProfile {
    display_name: "Bluesky",
    character_limit: 300,
    image_required: false,
    required_fields: &["identifier", "password"],
    secret_item: "Social Media - Bluesky API",
    api_base: Some("https://bsky.social/xrpc"),
};

static LINKEDIN_PROFILE: PlatformProfile = PlatformProfile {
    display_name: "LinkedIn",
    character_limit: 3000,
    image_required: false,
    required_fields: &["access_token", "person_id"],
    secret_item: "Social Media - LinkedIn API",
    api_base: Some("https://api.linkedin.com"),
};

static MASTODON_PROFILE: PlatformProfile = PlatformProfile {
    display_name: "Mastodon",
    character_limit: 500,
    image_required: false,
    required_fields: &["access_token", "instance_url"],
    secret_item: "Social Media - Mastodon API",
    api_base: None,
};

/// One post action: text, optional image reference, target platforms.
///
/// Created once per post action and never mutated during processing. The
/// platform set is de-duplicated on construction so the result set carries
/// exactly one outcome per platform.
#[derive(Debug, Clone)]
pub struct PostRequest {
    text: String,
    image: Option<PathBuf>,
    platforms: Vec<PlatformId>,
}

impl PostRequest {
    pub fn new(
        text: impl Into<String>,
        image: Option<PathBuf>,
        platforms: impl IntoIterator<Item = PlatformId>,
    ) -> Self {
        let mut seen = Vec::new();
        for p in platforms {
            if !seen.contains(&p) {
                seen.push(p);
            }
        }
        Self {
            text: text.into(),
            image,
            platforms: seen,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn image(&self) -> Option<&Path> {
        self.image.as_deref()
    }

    pub fn platforms(&self) -> &[PlatformId] {
        &self.platforms
    }
}

/// Credential fields for one platform, scoped to a single resolution call.
///
/// Never cached or persisted; the orchestrator discards it as soon as the
/// adapter call completes.
#[derive(Debug, Clone, Default)]
pub struct Credential {
    fields: HashMap<String, String>,
}

impl Credential {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Value for a field, or `None` if absent or empty
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.values().all(|v| v.is_empty())
    }

    /// Required fields that are absent or empty, in the order given
    pub fn missing_fields<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .filter(|f| self.get(f).is_none())
            .copied()
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Credential {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Result of one adapter invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostOutcome {
    pub platform: PlatformId,
    pub success: bool,
    /// Platform-specific post identifier, when the platform returns one
    pub post_id: Option<String>,
    pub diagnostic: Option<Diagnostic>,
}

impl PostOutcome {
    pub fn succeeded(platform: PlatformId, post_id: Option<String>) -> Self {
        Self {
            platform,
            success: true,
            post_id,
            diagnostic: None,
        }
    }

    pub fn failed(platform: PlatformId, diagnostic: Diagnostic) -> Self {
        Self {
            platform,
            success: false,
            post_id: None,
            diagnostic: Some(diagnostic),
        }
    }

    pub fn kind(&self) -> Option<DiagnosticKind> {
        self.diagnostic.as_ref().map(|d| d.kind)
    }
}

/// Aggregated outcomes of one submit call: exactly one entry per requested
/// platform, regardless of intermediate failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostResultSet {
    outcomes: BTreeMap<PlatformId, PostOutcome>,
}

impl PostResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, outcome: PostOutcome) {
        self.outcomes.insert(outcome.platform, outcome);
    }

    pub fn get(&self, platform: PlatformId) -> Option<&PostOutcome> {
        self.outcomes.get(&platform)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PostOutcome> {
        self.outcomes.values()
    }

    pub fn all_succeeded(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.values().all(|o| o.success)
    }

    pub fn any_failed(&self) -> bool {
        self.outcomes.values().any(|o| !o.success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &PostOutcome> {
        self.outcomes.values().filter(|o| !o.success)
    }
}

/// Supported image MIME types for attachments
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ImageMimeType {
    Jpeg,
    Png,
    Gif,
    WebP,
}

impl ImageMimeType {
    /// Detect MIME type from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Detect MIME type from a file path, defaulting to JPEG when the
    /// extension is missing or unknown
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
            .unwrap_or(Self::Jpeg)
    }

    /// Get the MIME type string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::WebP => "image/webp",
        }
    }
}

impl std::fmt::Display for ImageMimeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
