//! Artifact store — content lookup for generated revisions.

use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

use crate::models::artifact::{Artifact, NewArtifact};
use crate::schema::docs_artifacts;

/// Look up one output file by (revision, normalized path). Meaningful only
/// for a generated revision; callers check state first. `None` means the
/// path is absent from this build's output, not that the build is missing.
pub async fn get(
    conn: &mut AsyncPgConnection,
    revision_id: i64,
    path: &str,
) -> anyhow::Result<Option<Artifact>> {
    let result = docs_artifacts::table
        .filter(docs_artifacts::revision_id.eq(revision_id))
        .filter(docs_artifacts::path.eq(path))
        .first::<Artifact>(conn)
        .await
        .optional()?;
    Ok(result)
}

/// Replace the whole artifact set of a revision in one transaction.
/// Stored artifacts are immutable; only a full regeneration goes through
/// here, so a flip to generated never exposes a partial set.
pub async fn replace_all(
    conn: &mut AsyncPgConnection,
    revision_id: i64,
    files: Vec<NewArtifact>,
) -> anyhow::Result<usize> {
    let stored = conn
        .transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                diesel::delete(
                    docs_artifacts::table.filter(docs_artifacts::revision_id.eq(revision_id)),
                )
                .execute(conn)
                .await?;

                let mut stored = 0;
                // Bound each INSERT's bind-parameter count.
                for chunk in files.chunks(128) {
                    stored += diesel::insert_into(docs_artifacts::table)
                        .values(chunk)
                        .execute(conn)
                        .await?;
                }
                Ok(stored)
            }
            .scope_boxed()
        })
        .await?;

    tracing::info!(revision_id, files = stored, "Artifact set stored");
    Ok(stored)
}
