//! Naming rules for path inputs — checked before any lookup.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ServeError;
use crate::models::repo::Hosting;

static GITHUB_OWNER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?$").unwrap());
static GITHUB_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").unwrap());
static REF_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").unwrap());

const GITHUB_OWNER_MAX: usize = 39;
const GITHUB_NAME_MAX: usize = 100;
const REF_MAX: usize = 255;

/// Parse and validate the (hosting, owner, name) triple of a request path.
pub fn repo_identity(
    hosting: &str,
    owner: &str,
    name: &str,
) -> Result<Hosting, ServeError> {
    let hosting = Hosting::from_str(hosting).map_err(|_| ServeError::Validation {
        field: "hosting",
        value: hosting.to_string(),
    })?;

    match hosting {
        Hosting::Github => {
            if owner.len() > GITHUB_OWNER_MAX
                || owner.contains("--")
                || !GITHUB_OWNER_REGEX.is_match(owner)
            {
                return Err(ServeError::Validation {
                    field: "owner",
                    value: owner.to_string(),
                });
            }
            if name.len() > GITHUB_NAME_MAX
                || name == "."
                || name == ".."
                || !GITHUB_NAME_REGEX.is_match(name)
            {
                return Err(ServeError::Validation {
                    field: "name",
                    value: name.to_string(),
                });
            }
        }
    }

    Ok(hosting)
}

/// Validate a version string (branch/tag/sha candidate) from the request path.
pub fn ref_candidate(reference: &str) -> Result<(), ServeError> {
    if reference.len() > REF_MAX || !REF_REGEX.is_match(reference) {
        return Err(ServeError::Validation {
            field: "sha",
            value: reference.to_string(),
        });
    }
    Ok(())
}

/// Normalize a requested artifact path: strip leading slashes, reject
/// traversal and empty components.
pub fn normalize_artifact_path(path: &str) -> Result<String, ServeError> {
    let trimmed = path.trim_start_matches('/');
    if trimmed.is_empty() {
        return Err(ServeError::Validation {
            field: "file",
            value: path.to_string(),
        });
    }
    for component in trimmed.split('/') {
        if component.is_empty() || component == "." || component == ".." {
            return Err(ServeError::Validation {
                field: "file",
                value: path.to_string(),
            });
        }
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_typical_github_identities() {
        assert!(repo_identity("github", "acme", "widgets").is_ok());
        assert!(repo_identity("github", "acme-labs", "my.repo_v2").is_ok());
        assert!(repo_identity("github", "a", "b").is_ok());
    }

    #[test]
    fn rejects_unknown_hosting() {
        assert!(matches!(
            repo_identity("sourcehut", "acme", "widgets"),
            Err(ServeError::Validation { field: "hosting", .. })
        ));
    }

    #[test]
    fn rejects_malformed_owner() {
        for owner in ["-acme", "acme-", "ac--me", "ac me", "", "a".repeat(40).as_str()] {
            assert!(
                matches!(
                    repo_identity("github", owner, "widgets"),
                    Err(ServeError::Validation { field: "owner", .. })
                ),
                "owner {owner:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_malformed_name() {
        for name in ["", ".", "..", "wid gets", "wid/gets"] {
            assert!(
                matches!(
                    repo_identity("github", "acme", name),
                    Err(ServeError::Validation { field: "name", .. })
                ),
                "name {name:?} should be rejected"
            );
        }
    }

    #[test]
    fn ref_candidates() {
        assert!(ref_candidate("main").is_ok());
        assert!(ref_candidate("v1.0-rc1").is_ok());
        assert!(ref_candidate("abc123def").is_ok());
        assert!(ref_candidate("").is_err());
        assert!(ref_candidate(".hidden").is_err());
        assert!(ref_candidate("has space").is_err());
    }

    #[test]
    fn artifact_paths_normalize() {
        assert_eq!(
            normalize_artifact_path("/index.html").unwrap(),
            "index.html"
        );
        assert_eq!(
            normalize_artifact_path("api/Foo/bar.html").unwrap(),
            "api/Foo/bar.html"
        );
    }

    #[test]
    fn artifact_paths_reject_traversal() {
        assert!(normalize_artifact_path("../etc/passwd").is_err());
        assert!(normalize_artifact_path("api/../../secret").is_err());
        assert!(normalize_artifact_path("api//double").is_err());
        assert!(normalize_artifact_path("").is_err());
        assert!(normalize_artifact_path("/").is_err());
    }
}
