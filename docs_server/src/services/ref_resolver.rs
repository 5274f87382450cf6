//! Ref resolver — version string to concrete revision record.

use diesel_async::AsyncPgConnection;

use crate::error::ServeError;
use crate::models::repo::Repo;
use crate::models::revision::Revision;
use crate::services::build_queue::BuildQueue;
use crate::services::provider::HostingProvider;
use crate::services::revision_service;

/// What the request asked to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefSpec {
    /// The repository's provider-defined default branch.
    DefaultBranch,
    /// A literal branch/tag/sha candidate.
    Named(String),
}

/// A resolution result: concrete sha plus the (possibly newly created)
/// revision record. Not persisted.
#[derive(Debug)]
pub struct ResolvedRef {
    pub sha: String,
    pub revision: Revision,
}

/// Resolve a version string against the hosting provider, get-or-create the
/// revision record, and enqueue a build when the record is new.
///
/// A named ref matching an existing revision's sha exactly short-circuits
/// the provider round trip — serving a previously redirected concrete sha
/// never depends on provider availability. Unresolvable refs create no
/// record.
pub async fn resolve(
    conn: &mut AsyncPgConnection,
    provider: &dyn HostingProvider,
    queue: &BuildQueue,
    repo: &Repo,
    spec: RefSpec,
) -> Result<ResolvedRef, ServeError> {
    let sha = match &spec {
        RefSpec::Named(reference) => {
            if let Some(revision) = revision_service::find_by_sha(conn, repo.id, reference).await? {
                crate::metrics::ref_resolved("known");
                return Ok(ResolvedRef {
                    sha: revision.sha.clone(),
                    revision,
                });
            }

            provider
                .resolve_ref(&repo.owner, &repo.name, reference)
                .await?
                .ok_or_else(|| {
                    crate::metrics::ref_resolved("not_found");
                    ServeError::RefNotFound {
                        reference: reference.clone(),
                    }
                })?
        }
        RefSpec::DefaultBranch => {
            let branch = provider
                .default_branch(&repo.owner, &repo.name)
                .await?
                .ok_or_else(|| {
                    crate::metrics::ref_resolved("not_found");
                    ServeError::RefNotFound {
                        reference: "HEAD".to_string(),
                    }
                })?;

            provider
                .resolve_ref(&repo.owner, &repo.name, &branch)
                .await?
                .ok_or_else(|| {
                    crate::metrics::ref_resolved("not_found");
                    ServeError::RefNotFound { reference: branch }
                })?
        }
    };

    let (revision, newly_created) =
        revision_service::get_or_create(conn, queue, repo, &sha).await?;
    crate::metrics::ref_resolved(if newly_created { "created" } else { "resolved" });

    Ok(ResolvedRef { sha, revision })
}
