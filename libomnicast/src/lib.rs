//! Omnicast - post once, publish everywhere
//!
//! This library provides core functionality for publishing a single post to
//! multiple social platforms concurrently: credential resolution from an
//! external secret store, character-limit validation, one protocol adapter
//! per platform, and an orchestrator that aggregates per-platform outcomes.

pub mod config;
pub mod credentials;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod platforms;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use credentials::{CredentialResolver, ResolvedCredential};
pub use error::{Diagnostic, DiagnosticKind, OmnicastError, Result};
pub use orchestrator::{Orchestrator, OverLimitDecision, SubmitOptions};
pub use types::{Credential, PlatformId, PostOutcome, PostRequest, PostResultSet};
pub use validation::LimitCheck;
