//! Generation orchestrator — owns the pending/generated/errored lifecycle.
//!
//! State mutations are single atomic UPDATEs; workers never touch revision
//! state directly and instead report outcomes over the completion channel
//! consumed by [`run_completion_consumer`].

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::db::DbPool;
use crate::models::repo::Repo;
use crate::models::revision::{NewRevision, Revision};
use crate::schema::docs_revisions;
use crate::services::build_queue::{BuildOutcome, BuildQueue, ReportReceiver};

/// Look up an existing revision by its exact sha.
pub async fn find_by_sha(
    conn: &mut AsyncPgConnection,
    repo_id: i64,
    sha: &str,
) -> anyhow::Result<Option<Revision>> {
    let result = docs_revisions::table
        .filter(docs_revisions::repo_id.eq(repo_id))
        .filter(docs_revisions::sha.eq(sha))
        .first::<Revision>(conn)
        .await
        .optional()?;
    Ok(result)
}

/// Get or create the revision record for (repo, sha). A newly created
/// record is pending and gets exactly one build enqueued here.
pub async fn get_or_create(
    conn: &mut AsyncPgConnection,
    queue: &BuildQueue,
    repo: &Repo,
    sha: &str,
) -> anyhow::Result<(Revision, bool)> {
    let new_revision = NewRevision {
        repo_id: repo.id,
        sha: sha.to_string(),
    };

    let inserted: Option<Revision> = diesel::insert_into(docs_revisions::table)
        .values(&new_revision)
        .on_conflict((docs_revisions::repo_id, docs_revisions::sha))
        .do_nothing()
        .get_result(conn)
        .await
        .optional()?;

    if let Some(revision) = inserted {
        crate::metrics::revision_status_changed("pending");
        tracing::info!(
            revision_id = revision.id,
            repo = %repo.full_name(),
            sha = %revision.sha,
            "Revision created, build enqueued"
        );
        queue.enqueue(revision.id);
        return Ok((revision, true));
    }

    let revision = docs_revisions::table
        .filter(docs_revisions::repo_id.eq(repo.id))
        .filter(docs_revisions::sha.eq(sha))
        .first::<Revision>(conn)
        .await?;
    Ok((revision, false))
}

/// Mark a revision generated. Called only through the completion channel.
pub async fn mark_generated(conn: &mut AsyncPgConnection, revision_id: i64) -> anyhow::Result<()> {
    diesel::update(docs_revisions::table.find(revision_id))
        .set((
            docs_revisions::generated_at.eq(Some(Utc::now())),
            docs_revisions::error.eq(None::<String>),
            docs_revisions::error_description.eq(None::<String>),
            docs_revisions::updated_at.eq(Utc::now()),
        ))
        .execute(conn)
        .await?;

    crate::metrics::revision_status_changed("generated");
    Ok(())
}

/// Mark a revision errored. Called only through the completion channel.
/// Never auto-retried.
pub async fn mark_errored(
    conn: &mut AsyncPgConnection,
    revision_id: i64,
    code: &str,
    description: Option<String>,
) -> anyhow::Result<()> {
    diesel::update(docs_revisions::table.find(revision_id))
        .set((
            docs_revisions::error.eq(Some(code.to_string())),
            docs_revisions::error_description.eq(description),
            docs_revisions::updated_at.eq(Utc::now()),
        ))
        .execute(conn)
        .await?;

    crate::metrics::revision_status_changed("errored");
    Ok(())
}

/// Retry a failed build. Valid only from the errored state: one guarded
/// UPDATE clears all error fields and the generation timestamp together,
/// and only a matched guard re-enqueues. Returns whether the reset applied.
///
/// The reset is durable before the enqueue; a completion report from a
/// superseded in-flight build landing after the reset is an accepted race.
pub async fn retry(
    conn: &mut AsyncPgConnection,
    queue: &BuildQueue,
    revision: &Revision,
) -> anyhow::Result<bool> {
    let reset = diesel::update(
        docs_revisions::table
            .find(revision.id)
            .filter(docs_revisions::error.is_not_null()),
    )
    .set((
        docs_revisions::error.eq(None::<String>),
        docs_revisions::error_description.eq(None::<String>),
        docs_revisions::generated_at.eq(None::<chrono::DateTime<Utc>>),
        docs_revisions::updated_at.eq(Utc::now()),
    ))
    .execute(conn)
    .await?;

    if reset == 0 {
        tracing::debug!(revision_id = revision.id, "Retry requested on non-errored revision");
        return Ok(false);
    }

    crate::metrics::revision_status_changed("pending");
    tracing::info!(revision_id = revision.id, sha = %revision.sha, "Revision reset, build re-enqueued");
    queue.enqueue(revision.id);
    Ok(true)
}

/// Consume completion reports forever. Spawned as a background tokio task.
pub async fn run_completion_consumer(pool: DbPool, mut reports: ReportReceiver) {
    while let Some(report) = reports.recv().await {
        if let Err(e) = apply_report(&pool, report.revision_id, &report.outcome).await {
            tracing::error!(
                revision_id = report.revision_id,
                "Failed to apply build report: {e}"
            );
        }
    }
    tracing::info!("Completion channel closed, consumer stopping");
}

async fn apply_report(
    pool: &DbPool,
    revision_id: i64,
    outcome: &BuildOutcome,
) -> anyhow::Result<()> {
    let mut conn = pool
        .get()
        .await
        .map_err(|e| anyhow::anyhow!("diesel pool: {e}"))?;

    match outcome {
        BuildOutcome::Success => {
            mark_generated(&mut conn, revision_id).await?;
            tracing::info!(revision_id, "Docs generated");
        }
        BuildOutcome::Failure { code, description } => {
            mark_errored(&mut conn, revision_id, code, description.clone()).await?;
            tracing::warn!(revision_id, error = %code, "Docs generation failed");
        }
    }
    Ok(())
}
