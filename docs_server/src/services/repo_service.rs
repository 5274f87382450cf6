//! Repository registry — idempotent identification of a hosted package.

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::models::repo::{Hosting, NewRepo, Repo};
use crate::schema::docs_repos;

/// Get or create the repo row for (hosting, owner, name).
///
/// Insert-with-conflict-fallback-to-read: concurrent first requests race on
/// the unique index, exactly one insert wins, and every caller reads the
/// same row. Inputs are validated before this is called.
pub async fn get_or_create(
    conn: &mut AsyncPgConnection,
    hosting: Hosting,
    owner: &str,
    name: &str,
) -> anyhow::Result<Repo> {
    let new_repo = NewRepo {
        hosting: hosting.as_str().to_string(),
        owner: owner.to_string(),
        name: name.to_string(),
    };

    let inserted: Option<Repo> = diesel::insert_into(docs_repos::table)
        .values(&new_repo)
        .on_conflict((docs_repos::hosting, docs_repos::owner, docs_repos::name))
        .do_nothing()
        .get_result(conn)
        .await
        .optional()?;

    if let Some(repo) = inserted {
        tracing::info!(
            repo_id = repo.id,
            repo = %repo.full_name(),
            hosting = %repo.hosting,
            "Repo registered"
        );
        return Ok(repo);
    }

    let repo = docs_repos::table
        .filter(docs_repos::hosting.eq(hosting.as_str()))
        .filter(docs_repos::owner.eq(owner))
        .filter(docs_repos::name.eq(name))
        .first::<Repo>(conn)
        .await?;
    Ok(repo)
}
