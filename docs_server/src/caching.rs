//! Cache header policy — a pure map from request situation to CDN directives.
//!
//! Only a found artifact of a generated revision is publicly cacheable, and
//! it always carries the revision's surrogate key so a retry can purge
//! everything cached for that revision in one call.

use chrono::{DateTime, TimeZone, Utc};

use crate::models::revision::Revision;

/// Directive for everything intermediaries must not hold on to.
pub const NO_CACHE: &str = "private, no-cache, must-revalidate, max-age=0";

/// The request situation the policy discriminates on.
#[derive(Debug, Clone, Copy)]
pub enum Situation<'a> {
    /// Resolving a package or ref (redirect response).
    Redirect,
    /// Revision is pending; a placeholder page is served.
    Placeholder,
    /// Revision is errored; the error page is served.
    ErrorPage,
    /// Revision generated and the requested file exists.
    ArtifactHit(&'a Revision),
    /// Revision generated but the requested file is absent.
    ArtifactMiss,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub cache_control: String,
    pub surrogate_key: Option<String>,
}

pub fn directive(situation: Situation<'_>, max_age_secs: u64) -> Directive {
    match situation {
        Situation::Redirect | Situation::Placeholder | Situation::ErrorPage | Situation::ArtifactMiss => {
            Directive {
                cache_control: NO_CACHE.to_string(),
                surrogate_key: None,
            }
        }
        Situation::ArtifactHit(revision) => Directive {
            cache_control: format!("public, max-age={max_age_secs}"),
            surrogate_key: Some(revision.surrogate_key()),
        },
    }
}

// ── HTTP date handling for conditional retrieval ──

/// Format a timestamp as an IMF-fixdate for `Last-Modified`.
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Parse an `If-Modified-Since` value; invalid dates are ignored.
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Whether a stored artifact is unchanged relative to the client's
/// `If-Modified-Since` timestamp. HTTP dates carry second precision, so the
/// stored timestamp is truncated before comparing.
pub fn not_modified_since(last_modified: DateTime<Utc>, if_modified_since: &str) -> bool {
    let Some(since) = parse_http_date(if_modified_since) else {
        return false;
    };
    let truncated = Utc
        .timestamp_opt(last_modified.timestamp(), 0)
        .single()
        .unwrap_or(last_modified);
    truncated <= since
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn generated_revision() -> Revision {
        Revision {
            id: 42,
            repo_id: 1,
            sha: "abc123".into(),
            error: None,
            error_description: None,
            generated_at: Some(Utc::now()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn directive_table_is_exhaustive() {
        let revision = generated_revision();
        let non_cacheable = Directive {
            cache_control: NO_CACHE.to_string(),
            surrogate_key: None,
        };

        assert_eq!(directive(Situation::Redirect, 86400), non_cacheable);
        assert_eq!(directive(Situation::Placeholder, 86400), non_cacheable);
        assert_eq!(directive(Situation::ErrorPage, 86400), non_cacheable);
        assert_eq!(directive(Situation::ArtifactMiss, 86400), non_cacheable);

        let hit = directive(Situation::ArtifactHit(&revision), 86400);
        assert_eq!(hit.cache_control, "public, max-age=86400");
        assert_eq!(hit.surrogate_key.as_deref(), Some("docs-rev-42"));
    }

    #[test]
    fn hit_directive_honors_configured_max_age() {
        let revision = generated_revision();
        let hit = directive(Situation::ArtifactHit(&revision), 300);
        assert_eq!(hit.cache_control, "public, max-age=300");
    }

    #[test]
    fn http_date_round_trips() {
        let at = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        let formatted = http_date(at);
        assert_eq!(formatted, "Sat, 14 Mar 2026 09:26:53 GMT");
        assert_eq!(parse_http_date(&formatted), Some(at));
    }

    #[test]
    fn conditional_retrieval_comparisons() {
        let stored = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        // Client has the same (or a newer) copy.
        assert!(not_modified_since(stored, "Sat, 14 Mar 2026 09:26:53 GMT"));
        assert!(not_modified_since(stored, "Sun, 15 Mar 2026 00:00:00 GMT"));
        // Client copy is older, or the header is garbage.
        assert!(!not_modified_since(stored, "Fri, 13 Mar 2026 09:26:53 GMT"));
        assert!(!not_modified_since(stored, "not a date"));
    }

    #[test]
    fn subsecond_precision_does_not_defeat_revalidation() {
        let stored = Utc
            .with_ymd_and_hms(2026, 3, 14, 9, 26, 53)
            .unwrap()
            .checked_add_signed(Duration::milliseconds(400))
            .unwrap();
        assert!(not_modified_since(stored, "Sat, 14 Mar 2026 09:26:53 GMT"));
    }
}
