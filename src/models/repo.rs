//! Repository identity, credentials, and branch references.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::OpsError;
use crate::validate::{validate_branch_name, validate_clone_url, validate_repo_path};

/// Identifies one repository the orchestrator manages.
///
/// Constructed once at coordinator construction and immutable thereafter;
/// the local path is guaranteed to resolve under the workspace root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoConfig {
    /// Repository owner (user or organization login).
    pub owner: String,
    /// Repository name.
    pub name: String,
    /// Local working directory, resolved under the workspace root.
    pub local_path: PathBuf,
    /// Default branch to base work on.
    pub default_branch: String,
    /// Remote clone URL (https, git, or ssh scheme).
    pub clone_url: String,
    /// Optional primary-language hint for downstream tooling.
    pub language: Option<String>,
}

impl RepoConfig {
    /// Build a validated config. The local path is resolved against
    /// `workspace_root` and must not escape it.
    pub fn new(
        workspace_root: &Path,
        owner: impl Into<String>,
        name: impl Into<String>,
        local_path: impl AsRef<Path>,
        default_branch: impl Into<String>,
        clone_url: &str,
    ) -> Result<Self, OpsError> {
        let owner = owner.into();
        let name = name.into();
        if owner.is_empty() || name.is_empty() {
            return Err(OpsError::Validation(
                "repository owner and name must be non-empty".into(),
            ));
        }
        let default_branch = default_branch.into();
        validate_branch_name(&default_branch)?;
        let local_path = validate_repo_path(workspace_root, local_path.as_ref())?;
        let clone_url = validate_clone_url(clone_url)?;

        Ok(Self {
            owner,
            name,
            local_path,
            default_branch,
            clone_url,
            language: None,
        })
    }

    /// Attach a primary-language hint.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// `owner/name` slug used in API paths and logs.
    #[must_use]
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Issuing scheme for an access credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialScheme {
    /// Token sent as an HTTPS bearer header.
    HttpsToken,
}

/// An opaque access token.
///
/// `Display` and `Debug` render only the masked form so the raw token can
/// never leak into logs or error strings. Lifetime is bound to the operation
/// call; nothing in this crate persists it.
#[derive(Clone)]
pub struct Credential {
    token: String,
    scheme: CredentialScheme,
}

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            scheme: CredentialScheme::HttpsToken,
        }
    }

    /// The raw token, for constructing the Authorization header only.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.token
    }

    #[must_use]
    pub fn scheme(&self) -> CredentialScheme {
        self.scheme
    }

    /// Masked rendering: `first4...last4`, or `***` for short tokens.
    #[must_use]
    pub fn masked(&self) -> String {
        if self.token.len() < 8 {
            "***".to_string()
        } else {
            format!(
                "{}...{}",
                &self.token[..4],
                &self.token[self.token.len() - 4..]
            )
        }
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &self.masked())
            .field("scheme", &self.scheme)
            .finish()
    }
}

/// A branch the orchestrator created or is tracking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchRef {
    /// Branch name, already validated against the allowed character set.
    pub name: String,
    /// Branch this one was created from.
    pub base: String,
    /// Head SHA, updated on each push.
    pub head_sha: Option<String>,
}

impl BranchRef {
    pub fn new(name: &str, base: &str) -> Result<Self, OpsError> {
        validate_branch_name(name)?;
        validate_branch_name(base)?;
        Ok(Self {
            name: name.to_string(),
            base: base.to_string(),
            head_sha: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_config_resolves_under_root() {
        let cfg = RepoConfig::new(
            Path::new("/srv/workspace"),
            "octocat",
            "hello-world",
            "octocat/hello-world",
            "main",
            "https://github.com/octocat/hello-world.git",
        )
        .unwrap();
        assert_eq!(
            cfg.local_path,
            PathBuf::from("/srv/workspace/octocat/hello-world")
        );
        assert_eq!(cfg.slug(), "octocat/hello-world");
    }

    #[test]
    fn test_repo_config_rejects_escape() {
        let err = RepoConfig::new(
            Path::new("/srv/workspace"),
            "octocat",
            "hello-world",
            "../outside",
            "main",
            "https://github.com/octocat/hello-world.git",
        );
        assert!(matches!(err, Err(OpsError::Validation(_))));
    }

    #[test]
    fn test_credential_masking() {
        let cred = Credential::new("ghp_abcdefghijklmnop1234");
        assert_eq!(cred.masked(), "ghp_...1234");
        assert_eq!(format!("{cred}"), "ghp_...1234");
        assert!(!format!("{cred:?}").contains("abcdefghijklmnop"));
    }

    #[test]
    fn test_short_credential_fully_masked() {
        let cred = Credential::new("abc");
        assert_eq!(cred.masked(), "***");
    }

    #[test]
    fn test_branch_ref_validates_names() {
        assert!(BranchRef::new("feature/x", "main").is_ok());
        assert!(BranchRef::new("-bad", "main").is_err());
        assert!(BranchRef::new("ok", "bad.").is_err());
    }
}
