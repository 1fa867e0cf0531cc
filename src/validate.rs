//! Input validation for paths, clone URLs, and branch names.
//!
//! All functions here are pure and side-effect free: they never touch the
//! filesystem or the network, so a rejected input is guaranteed to have
//! caused no I/O at all.

use std::path::{Component, Path, PathBuf};

use url::Url;

use crate::error::OpsError;

/// Schemes accepted for remote clone URLs.
const ALLOWED_SCHEMES: &[&str] = &["https", "git", "ssh"];

/// Validate that `path` resolves under `root` and return the resolved form.
///
/// The check is lexical: `..` and `.` components are normalized without
/// consulting the filesystem, then the result must still be contained in
/// `root`. Relative paths are interpreted relative to `root`.
pub fn validate_repo_path(root: &Path, path: &Path) -> Result<PathBuf, OpsError> {
    let raw = path.as_os_str();
    if raw.is_empty() {
        return Err(OpsError::Validation("repository path is empty".into()));
    }
    if path.to_string_lossy().contains('\0') {
        return Err(OpsError::Validation(
            "repository path contains a null byte".into(),
        ));
    }

    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    };

    let normalized = normalize(&joined);
    let root_normalized = normalize(root);

    if !normalized.starts_with(&root_normalized) {
        return Err(OpsError::Validation(format!(
            "path {} escapes workspace root {}",
            normalized.display(),
            root_normalized.display()
        )));
    }

    Ok(normalized)
}

/// Lexically normalize a path: resolve `.` and `..` without touching disk.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Popping past the root leaves the prefix intact so that
                // `/a/../../etc` normalizes to `/etc`, not an empty path.
                if !out.pop() {
                    out.push(component.as_os_str());
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Validate a remote clone URL and return it in parsed-and-serialized form.
///
/// Only `https`, `git`, and `ssh` schemes with a non-empty host are accepted.
/// scp-style remotes (`git@host:owner/repo.git`) are deliberately rejected;
/// callers can express the same remote as `ssh://git@host/owner/repo.git`.
pub fn validate_clone_url(raw: &str) -> Result<String, OpsError> {
    if raw.is_empty() {
        return Err(OpsError::Validation("clone URL is empty".into()));
    }
    if raw.contains('\0') {
        return Err(OpsError::Validation("clone URL contains a null byte".into()));
    }

    // The url crate normalizes an empty authority in special schemes
    // (`https:///repo.git` parses with host `repo.git`), so the authority
    // has to be checked on the raw text before parsing.
    if let Some((_, rest)) = raw.split_once("://") {
        let authority = rest.split('/').next().unwrap_or("");
        if authority.is_empty() {
            return Err(OpsError::Validation("clone URL has no host".into()));
        }
    }

    let url = Url::parse(raw)
        .map_err(|e| OpsError::Validation(format!("invalid clone URL: {e}")))?;

    if !ALLOWED_SCHEMES.contains(&url.scheme()) {
        return Err(OpsError::Validation(format!(
            "unsupported URL scheme '{}' (allowed: https, git, ssh)",
            url.scheme()
        )));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => {}
        _ => return Err(OpsError::Validation("clone URL has no host".into())),
    }

    Ok(url.to_string())
}

/// Validate a branch name against the allowed character set.
///
/// Names must be non-empty, drawn from `[A-Za-z0-9/_-]`, must not start with
/// `-` (would be parsed as a git flag) and must not end with `.`.
pub fn validate_branch_name(name: &str) -> Result<&str, OpsError> {
    if name.is_empty() {
        return Err(OpsError::Validation("branch name is empty".into()));
    }
    if name.starts_with('-') {
        return Err(OpsError::Validation(format!(
            "branch name '{name}' must not start with '-'"
        )));
    }
    if name.ends_with('.') {
        return Err(OpsError::Validation(format!(
            "branch name '{name}' must not end with '.'"
        )));
    }
    let valid = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '_' | '-'));
    if !valid {
        return Err(OpsError::Validation(format!(
            "branch name '{name}' contains characters outside [A-Za-z0-9/_-]"
        )));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_validation_err<T: std::fmt::Debug>(result: Result<T, OpsError>) {
        match result {
            Err(OpsError::Validation(_)) => {}
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_repo_path_under_root() {
        let resolved =
            validate_repo_path(Path::new("/srv/workspace"), Path::new("owner/repo")).unwrap();
        assert_eq!(resolved, PathBuf::from("/srv/workspace/owner/repo"));
    }

    #[test]
    fn test_repo_path_traversal_rejected() {
        assert_validation_err(validate_repo_path(
            Path::new("/srv/workspace"),
            Path::new("/srv/workspace/../etc"),
        ));
        assert_validation_err(validate_repo_path(
            Path::new("/srv/workspace"),
            Path::new("../../etc/passwd"),
        ));
    }

    #[test]
    fn test_repo_path_internal_dotdot_allowed_if_contained() {
        let resolved = validate_repo_path(
            Path::new("/srv/workspace"),
            Path::new("a/b/../c"),
        )
        .unwrap();
        assert_eq!(resolved, PathBuf::from("/srv/workspace/a/c"));
    }

    #[test]
    fn test_repo_path_empty_rejected() {
        assert_validation_err(validate_repo_path(Path::new("/srv"), Path::new("")));
    }

    #[test]
    fn test_repo_path_null_byte_rejected() {
        assert_validation_err(validate_repo_path(
            Path::new("/srv"),
            Path::new("repo\0name"),
        ));
    }

    #[test]
    fn test_clone_url_https_accepted() {
        let url = validate_clone_url("https://github.com/owner/repo.git").unwrap();
        assert_eq!(url, "https://github.com/owner/repo.git");
    }

    #[test]
    fn test_clone_url_ssh_and_git_accepted() {
        validate_clone_url("ssh://git@github.com/owner/repo.git").unwrap();
        validate_clone_url("git://github.com/owner/repo.git").unwrap();
    }

    #[test]
    fn test_clone_url_ftp_rejected() {
        assert_validation_err(validate_clone_url("ftp://github.com/owner/repo.git"));
    }

    #[test]
    fn test_clone_url_empty_and_null_rejected() {
        assert_validation_err(validate_clone_url(""));
        assert_validation_err(validate_clone_url("https://host/\0repo"));
    }

    #[test]
    fn test_clone_url_missing_host_rejected() {
        // The url crate would normalize these to a host; the raw authority
        // check must catch them first.
        assert_validation_err(validate_clone_url("https:///repo.git"));
        assert_validation_err(validate_clone_url("git:///repo.git"));
        assert_validation_err(validate_clone_url("ssh:///owner/repo.git"));
    }

    #[test]
    fn test_branch_name_valid() {
        for name in ["main", "feature/add-parser", "release-1_2", "a"] {
            assert_eq!(validate_branch_name(name).unwrap(), name);
        }
    }

    #[test]
    fn test_branch_name_invalid() {
        assert_validation_err(validate_branch_name(""));
        assert_validation_err(validate_branch_name("-leading-dash"));
        assert_validation_err(validate_branch_name("trailing."));
        assert_validation_err(validate_branch_name("spaces not allowed"));
        assert_validation_err(validate_branch_name("semi;colon"));
        assert_validation_err(validate_branch_name("dotted.name"));
    }
}
