//! Error types for Omnicast

use thiserror::Error;

use crate::types::PlatformId;

pub type Result<T> = std::result::Result<T, OmnicastError>;

#[derive(Error, Debug)]
pub enum OmnicastError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl OmnicastError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            OmnicastError::InvalidInput(_) => 3,
            OmnicastError::Config(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Failure classification attached to a [`crate::types::PostOutcome`].
///
/// Adapters and the credential resolver absorb every lower-level fault into
/// one of these kinds; no transport error ever escapes to the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DiagnosticKind {
    /// A required credential field was absent after resolution
    CredentialMissing,
    /// The secret-store process itself failed (distinct from "field absent")
    CredentialResolutionFailed,
    /// Text exceeded the platform limit and the caller chose not to proceed
    ValidationFailed,
    /// The platform cannot perform the requested post (e.g. no image where
    /// one is mandatory)
    UnsupportedOperation,
    /// Unexpected status code or transport failure
    NetworkError,
    /// The caller's timeout or cancellation signal fired mid-flight
    Cancelled,
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DiagnosticKind::CredentialMissing => "credential missing",
            DiagnosticKind::CredentialResolutionFailed => "credential resolution failed",
            DiagnosticKind::ValidationFailed => "validation failed",
            DiagnosticKind::UnsupportedOperation => "unsupported operation",
            DiagnosticKind::NetworkError => "network error",
            DiagnosticKind::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

/// Typed failure produced by one adapter invocation
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Diagnostic for required credential fields that resolved empty
    pub fn credential_missing(platform: PlatformId, fields: &[&str]) -> Self {
        Self::new(
            DiagnosticKind::CredentialMissing,
            format!(
                "Missing required {} credential field(s): {}",
                platform,
                fields.join(", ")
            ),
        )
    }

    /// Diagnostic for an unexpected HTTP status code
    pub fn unexpected_status(context: &str, expected: u16, got: u16, body: &str) -> Self {
        Self::new(
            DiagnosticKind::NetworkError,
            format!(
                "{} returned HTTP {} (expected {}): {}",
                context,
                got,
                expected,
                truncate(body, 200)
            ),
        )
    }

    /// Diagnostic for a transport-level failure (connect, DNS, timeout)
    pub fn transport(context: &str, error: impl std::fmt::Display) -> Self {
        Self::new(
            DiagnosticKind::NetworkError,
            format!("{} request failed: {}", context, error),
        )
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
