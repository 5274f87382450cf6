//! Database pool and bootstrap migration.

use diesel_async::pooled_connection::deadpool::{Object, Pool};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::{AsyncPgConnection, SimpleAsyncConnection};

pub type DbPool = Pool<AsyncPgConnection>;
pub type DbConn = Object<AsyncPgConnection>;

/// Build the connection pool.
pub fn build_pool(database_url: &str, max_size: usize) -> anyhow::Result<DbPool> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
    let pool = Pool::builder(manager)
        .max_size(max_size)
        .build()
        .map_err(|e| anyhow::anyhow!("pool build: {e}"))?;
    Ok(pool)
}

/// SQL migration for the docs tables.
///
/// Uniqueness constraints are load-bearing: concurrent first requests race
/// on them and insert-or-fetch resolves the race (one insert wins, every
/// caller reads the same row).
pub const MIGRATION_SQL: &str = r#"
-- ================================================================
-- Documentation hosting tables
-- ================================================================

CREATE TABLE IF NOT EXISTS docs_repos (
    id          BIGSERIAL PRIMARY KEY,
    hosting     VARCHAR(20) NOT NULL,
    owner       VARCHAR(64) NOT NULL,
    name        VARCHAR(128) NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_docs_repos_identity
    ON docs_repos (hosting, owner, name);

CREATE TABLE IF NOT EXISTS docs_revisions (
    id                BIGSERIAL PRIMARY KEY,
    repo_id           BIGINT NOT NULL REFERENCES docs_repos(id) ON DELETE CASCADE,
    sha               VARCHAR(255) NOT NULL,
    error             VARCHAR(64),
    error_description TEXT,
    generated_at      TIMESTAMPTZ,
    created_at        TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at        TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_docs_revisions_repo_sha
    ON docs_revisions (repo_id, sha);
CREATE INDEX IF NOT EXISTS idx_docs_revisions_repo
    ON docs_revisions (repo_id);

CREATE TABLE IF NOT EXISTS docs_artifacts (
    id            BIGSERIAL PRIMARY KEY,
    revision_id   BIGINT NOT NULL REFERENCES docs_revisions(id) ON DELETE CASCADE,
    path          VARCHAR(1024) NOT NULL,
    content       BYTEA NOT NULL,
    last_modified TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_docs_artifacts_revision_path
    ON docs_artifacts (revision_id, path);
"#;

/// Run the bootstrap migration.
pub async fn run_migration(conn: &mut AsyncPgConnection) -> anyhow::Result<()> {
    conn.batch_execute(MIGRATION_SQL)
        .await
        .map_err(|e| anyhow::anyhow!("docs migration failed: {e}"))?;
    Ok(())
}
