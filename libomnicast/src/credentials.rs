//! Credential resolution via an external secret store
//!
//! Secrets are fetched one field at a time from an external secret-management
//! process (1Password CLI style): the resolver runs
//! `<command> <item> <field>` and expects the secret value on stdout with
//! exit code zero. Anything else means "field not present". Absence of
//! credentials is modeled as data, not as a propagated fault: a failing
//! store still yields a (possibly empty) `Credential`, and the adapter's
//! preflight check turns missing fields into a `CredentialMissing` outcome.
//!
//! There is no caching: every adapter invocation re-resolves, so secrets are
//! held no longer than a single post.

use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{Diagnostic, DiagnosticKind};
use crate::types::{Credential, PlatformId};

/// Result of one resolution call
#[derive(Debug)]
pub struct ResolvedCredential {
    pub credential: Credential,
    /// Set when the secret-store process itself failed (could not be
    /// spawned). Diagnostic only: processing continues with whatever the
    /// fallbacks provide.
    pub store_error: Option<Diagnostic>,
}

pub struct CredentialResolver {
    config: Config,
}

impl CredentialResolver {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Resolve the credential fields for one platform
    ///
    /// Queries the secret store for every field the platform's profile
    /// names, then fills fields the store returned as empty from the config
    /// fallbacks. Never fails: a broken store produces an empty credential
    /// and a recorded `store_error`.
    pub async fn resolve(&self, platform: PlatformId) -> ResolvedCredential {
        let profile = platform.profile();
        let mut credential = Credential::empty();
        let mut store_error = None;

        for field in profile.required_fields {
            if store_error.is_some() {
                // The store binary is unusable; skip straight to fallbacks
                break;
            }

            match self.read_field(profile.secret_item, field).await {
                Ok(Some(value)) => credential.insert(*field, value),
                Ok(None) => {
                    debug!(
                        "Secret store has no value for {}/{}",
                        profile.secret_item, field
                    );
                }
                Err(e) => {
                    warn!("Secret store invocation failed for {}: {}", platform, e);
                    store_error = Some(Diagnostic::new(
                        DiagnosticKind::CredentialResolutionFailed,
                        e,
                    ));
                }
            }
        }

        // Local defaults fill only the fields the store left empty
        if let Some(defaults) = self.config.fallback_fields(platform) {
            for (field, value) in defaults {
                if credential.get(field).is_none() && !value.is_empty() {
                    debug!("Using fallback value for {} field '{}'", platform, field);
                    credential.insert(field.clone(), value.clone());
                }
            }
        }

        ResolvedCredential {
            credential,
            store_error,
        }
    }

    /// Read a single field from the secret store
    ///
    /// `Ok(None)` means the store ran but the field is not present (non-zero
    /// exit or empty output); `Err` means the store could not be invoked.
    async fn read_field(&self, item: &str, field: &str) -> Result<Option<String>, String> {
        let command = &self.config.secret_store.command;
        let output = Command::new(command)
            .arg(item)
            .arg(field)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| format!("failed to run '{}': {}", command, e))?;

        if !output.status.success() {
            return Ok(None);
        }

        let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if value.is_empty() {
            Ok(None)
        } else {
            Ok(Some(value))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Write an executable stub script and return the temp dir keeping it alive
    #[cfg(unix)]
    fn stub_store(script: &str) -> (tempfile::TempDir, String) {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("stub-store");
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        let command = path.to_str().unwrap().to_string();
        (dir, command)
    }

    fn config_with_command(command: &str) -> Config {
        let mut config = Config::default();
        config.secret_store.command = command.to_string();
        config
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_resolve_reads_fields_from_store() {
        let (_dir, command) = stub_store("#!/bin/sh\necho \"value-$2\"\n");
        let resolver = CredentialResolver::new(&config_with_command(&command));

        let resolved = resolver.resolve(PlatformId::Bluesky).await;
        assert!(resolved.store_error.is_none());
        assert_eq!(
            resolved.credential.get("identifier"),
            Some("value-identifier")
        );
        assert_eq!(resolved.credential.get("password"), Some("value-password"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_store_failure_yields_empty_credential() {
        let (_dir, command) = stub_store("#!/bin/sh\nexit 1\n");
        let resolver = CredentialResolver::new(&config_with_command(&command));

        let resolved = resolver.resolve(PlatformId::Bluesky).await;
        // Non-zero exit is "field not present", not a store error
        assert!(resolved.store_error.is_none());
        assert!(resolved.credential.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_empty_output_treated_as_absent() {
        let (_dir, command) = stub_store("#!/bin/sh\nprintf \"\"\n");
        let resolver = CredentialResolver::new(&config_with_command(&command));

        let resolved = resolver.resolve(PlatformId::Linkedin).await;
        assert!(resolved.credential.is_empty());
    }

    #[tokio::test]
    async fn test_unspawnable_store_records_error() {
        let resolver =
            CredentialResolver::new(&config_with_command("/nonexistent/secret-store-binary"));

        let resolved = resolver.resolve(PlatformId::X).await;
        assert!(resolved.credential.is_empty());

        let diag = resolved.store_error.unwrap();
        assert_eq!(diag.kind, DiagnosticKind::CredentialResolutionFailed);
        assert!(diag.message.contains("failed to run"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_fallback_fills_only_empty_fields() {
        // Store knows the access token but not the person id
        let (_dir, command) = stub_store(
            "#!/bin/sh\nif [ \"$2\" = \"access_token\" ]; then echo store-token; fi\n",
        );
        let mut config = config_with_command(&command);
        config.fallbacks.insert(
            "linkedin".to_string(),
            [
                ("access_token".to_string(), "fallback-token".to_string()),
                ("person_id".to_string(), "fallback-person".to_string()),
            ]
            .into_iter()
            .collect(),
        );

        let resolver = CredentialResolver::new(&config);
        let resolved = resolver.resolve(PlatformId::Linkedin).await;

        // Store value wins; fallback covers the gap
        assert_eq!(resolved.credential.get("access_token"), Some("store-token"));
        assert_eq!(
            resolved.credential.get("person_id"),
            Some("fallback-person")
        );
    }

    #[tokio::test]
    async fn test_fallback_applies_when_store_unspawnable() {
        let mut config = config_with_command("/nonexistent/secret-store-binary");
        config.fallbacks.insert(
            "mastodon".to_string(),
            [
                ("access_token".to_string(), "tok".to_string()),
                ("instance_url".to_string(), "https://mastodon.example".to_string()),
            ]
            .into_iter()
            .collect(),
        );

        let resolver = CredentialResolver::new(&config);
        let resolved = resolver.resolve(PlatformId::Mastodon).await;

        assert_eq!(
            resolved.store_error.as_ref().map(|d| d.kind),
            Some(DiagnosticKind::CredentialResolutionFailed)
        );
        assert_eq!(resolved.credential.get("access_token"), Some("tok"));
        assert_eq!(
            resolved.credential.get("instance_url"),
            Some("https://mastodon.example")
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_trailing_newline_stripped() {
        let (_dir, command) = stub_store("#!/bin/sh\necho \"padded\"\n");
        let resolver = CredentialResolver::new(&config_with_command(&command));

        let resolved = resolver.resolve(PlatformId::Bluesky).await;
        assert_eq!(resolved.credential.get("identifier"), Some("padded"));
    }
}
