//! Build workers — clone, generate, store, report.
//!
//! Workers consume the build channel, run the configured documentation
//! command against a checkout of the requested sha, store the output as the
//! revision's artifact set, and report the terminal outcome over the
//! completion channel. They never mutate revision state themselves.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tokio::process::Command;
use tokio::sync::{mpsc, Mutex};

use crate::config::DocsConfig;
use crate::db::DbPool;
use crate::models::artifact::NewArtifact;
use crate::models::repo::Repo;
use crate::models::revision::Revision;
use crate::schema::{docs_repos, docs_revisions};
use crate::services::artifact_service;
use crate::services::build_queue::{BuildJob, BuildOutcome, BuildReport, ReportSender};

/// Stored error descriptions keep at most this many bytes of output.
const OUTPUT_CAP: usize = 65536;

struct BuildFailure {
    code: &'static str,
    description: String,
}

impl BuildFailure {
    fn new(code: &'static str, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
        }
    }
}

/// Spawn the worker pool. Workers share the receiving half of the build
/// channel behind a mutex.
pub fn spawn_workers(
    pool: DbPool,
    config: DocsConfig,
    jobs: mpsc::UnboundedReceiver<BuildJob>,
    reports: ReportSender,
) {
    let jobs = Arc::new(Mutex::new(jobs));
    let workers = config.build_workers.max(1);

    tracing::info!(
        workers,
        workspace = %config.workspace_dir,
        command = %config.build_command,
        "Build workers started"
    );

    for worker in 0..workers {
        let pool = pool.clone();
        let config = config.clone();
        let jobs = jobs.clone();
        let reports = reports.clone();
        tokio::spawn(async move {
            loop {
                let job = { jobs.lock().await.recv().await };
                let Some(job) = job else { break };
                if let Err(e) = process_job(&pool, &config, &reports, &job).await {
                    tracing::error!(
                        worker,
                        revision_id = job.revision_id,
                        "Build job failed to process: {e}"
                    );
                }
            }
            tracing::info!(worker, "Build channel closed, worker stopping");
        });
    }
}

async fn process_job(
    pool: &DbPool,
    config: &DocsConfig,
    reports: &ReportSender,
    job: &BuildJob,
) -> anyhow::Result<()> {
    let (revision, repo) = {
        let mut conn = pool
            .get()
            .await
            .map_err(|e| anyhow::anyhow!("diesel pool: {e}"))?;

        let revision: Option<Revision> = docs_revisions::table
            .find(job.revision_id)
            .first(&mut conn)
            .await
            .optional()?;
        let Some(revision) = revision else {
            tracing::warn!(revision_id = job.revision_id, "Job for unknown revision, skipping");
            return Ok(());
        };

        // Duplicate enqueues are tolerated here: anything not pending has
        // already been handled (or superseded) and is skipped.
        if !revision.is_pending() {
            tracing::debug!(revision_id = revision.id, "Revision not pending, skipping build");
            return Ok(());
        }

        let repo: Repo = docs_repos::table
            .find(revision.repo_id)
            .first(&mut conn)
            .await?;
        (revision, repo)
    };

    tracing::info!(
        revision_id = revision.id,
        repo = %repo.full_name(),
        sha = %revision.sha,
        "Generating docs"
    );

    let started = Instant::now();
    let result = build_revision(pool, config, &repo, &revision).await;
    let duration_ms = started.elapsed().as_millis() as u64;
    crate::metrics::build_duration(duration_ms);

    let outcome = match result {
        Ok(files) => {
            tracing::info!(
                revision_id = revision.id,
                files,
                duration_ms,
                "Docs build succeeded"
            );
            BuildOutcome::Success
        }
        Err(failure) => {
            tracing::warn!(
                revision_id = revision.id,
                error = failure.code,
                duration_ms,
                "Docs build failed"
            );
            BuildOutcome::Failure {
                code: failure.code.to_string(),
                description: Some(truncate_output(&failure.description, OUTPUT_CAP)),
            }
        }
    };

    reports
        .send(BuildReport {
            revision_id: revision.id,
            outcome,
        })
        .map_err(|_| anyhow::anyhow!("completion channel closed"))?;
    Ok(())
}

/// Run one build end to end. Returns the number of stored files.
async fn build_revision(
    pool: &DbPool,
    config: &DocsConfig,
    repo: &Repo,
    revision: &Revision,
) -> Result<usize, BuildFailure> {
    let workspace = PathBuf::from(&config.workspace_dir).join(revision.id.to_string());
    let result = build_in_workspace(pool, config, repo, revision, &workspace).await;

    if let Err(e) = tokio::fs::remove_dir_all(&workspace).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(revision_id = revision.id, "Workspace cleanup failed: {e}");
        }
    }

    result
}

async fn build_in_workspace(
    pool: &DbPool,
    config: &DocsConfig,
    repo: &Repo,
    revision: &Revision,
    workspace: &Path,
) -> Result<usize, BuildFailure> {
    tokio::fs::create_dir_all(workspace)
        .await
        .map_err(|e| BuildFailure::new("clone_failed", format!("workspace: {e}")))?;

    let clone_url = format!("https://github.com/{}/{}.git", repo.owner, repo.name);
    run_git(
        &["clone", "--depth", "50", &clone_url, &workspace.to_string_lossy()],
        None,
        "clone_failed",
    )
    .await?;

    // Shallow clones may not contain the sha; fetch it explicitly before
    // giving up on the checkout.
    if run_git(&["checkout", &revision.sha], Some(workspace), "checkout_failed")
        .await
        .is_err()
    {
        run_git(
            &["fetch", "--depth", "1", "origin", &revision.sha],
            Some(workspace),
            "checkout_failed",
        )
        .await?;
        run_git(&["checkout", &revision.sha], Some(workspace), "checkout_failed").await?;
    }

    run_build_command(config, repo, revision, workspace).await?;

    let output_dir = workspace.join(&config.build_output_dir);
    if !output_dir.is_dir() {
        return Err(BuildFailure::new(
            "output_missing",
            format!(
                "build command produced no {:?} directory",
                config.build_output_dir
            ),
        ));
    }

    let files = collect_output(revision.id, &output_dir)
        .await
        .map_err(|e| BuildFailure::new("store_failed", format!("collect output: {e}")))?;
    if files.is_empty() {
        return Err(BuildFailure::new("output_missing", "build output is empty"));
    }

    let mut conn = pool
        .get()
        .await
        .map_err(|e| BuildFailure::new("store_failed", format!("diesel pool: {e}")))?;
    artifact_service::replace_all(&mut conn, revision.id, files)
        .await
        .map_err(|e| BuildFailure::new("store_failed", format!("{e:#}")))
}

async fn run_git(
    args: &[&str],
    current_dir: Option<&Path>,
    code: &'static str,
) -> Result<(), BuildFailure> {
    let mut command = Command::new("git");
    command.args(args);
    if let Some(dir) = current_dir {
        command.current_dir(dir);
    }

    let output = command
        .output()
        .await
        .map_err(|e| BuildFailure::new(code, format!("git {}: {e}", args[0])))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(BuildFailure::new(
            code,
            format!("git {} failed: {stderr}", args[0]),
        ));
    }
    Ok(())
}

async fn run_build_command(
    config: &DocsConfig,
    repo: &Repo,
    revision: &Revision,
    workspace: &Path,
) -> Result<(), BuildFailure> {
    let timeout = std::time::Duration::from_secs(config.build_timeout_secs);

    let result = tokio::time::timeout(timeout, async {
        Command::new("bash")
            .args(["-c", &config.build_command])
            .current_dir(workspace)
            .env("CI", "true")
            .env("DOCS_REPO", repo.full_name())
            .env("DOCS_SHA", &revision.sha)
            .output()
            .await
    })
    .await;

    match result {
        Ok(Ok(output)) if output.status.success() => Ok(()),
        Ok(Ok(output)) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(BuildFailure::new(
                "build_failed",
                format!(
                    "{:?} exited with {}: {stderr}",
                    config.build_command,
                    output.status.code().unwrap_or(-1)
                ),
            ))
        }
        Ok(Err(e)) => Err(BuildFailure::new(
            "build_failed",
            format!("failed to execute build command: {e}"),
        )),
        Err(_) => Err(BuildFailure::new(
            "timeout",
            format!("build timed out after {}s", timeout.as_secs()),
        )),
    }
}

/// Walk the output directory and read every file into a `NewArtifact`,
/// keyed by its path relative to the output root.
async fn collect_output(revision_id: i64, output_dir: &Path) -> anyhow::Result<Vec<NewArtifact>> {
    let now = Utc::now();
    let mut files = Vec::new();
    let mut pending = vec![output_dir.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file() {
                let relative = path
                    .strip_prefix(output_dir)
                    .map_err(|e| anyhow::anyhow!("strip prefix: {e}"))?
                    .to_string_lossy()
                    .into_owned();
                let content = tokio::fs::read(&path).await?;
                files.push(NewArtifact {
                    revision_id,
                    path: relative,
                    content,
                    last_modified: now,
                });
            }
        }
    }

    Ok(files)
}

/// Keep the tail of oversized output, on a char boundary.
fn truncate_output(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut start = text.len() - max;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    format!("...truncated...\n{}", &text[start..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_output_is_untouched() {
        assert_eq!(truncate_output("all fine", 100), "all fine");
    }

    #[test]
    fn oversized_output_keeps_the_tail() {
        let text = format!("{}END", "x".repeat(200));
        let truncated = truncate_output(&text, 50);
        assert!(truncated.starts_with("...truncated...\n"));
        assert!(truncated.ends_with("END"));
        assert!(truncated.len() <= 50 + "...truncated...\n".len());
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let text = format!("{}é", "é".repeat(100));
        let truncated = truncate_output(&text, 33);
        assert!(truncated.ends_with('é'));
    }

    #[tokio::test]
    async fn collect_output_walks_nested_directories() {
        let root = std::env::temp_dir().join(format!("docs-collect-test-{}", std::process::id()));
        let nested = root.join("api/types");
        tokio::fs::create_dir_all(&nested).await.unwrap();
        tokio::fs::write(root.join("index.html"), b"<html>").await.unwrap();
        tokio::fs::write(nested.join("Widget.html"), b"<html>w").await.unwrap();

        let mut files = collect_output(1, &root).await.unwrap();
        files.sort_by(|a, b| a.path.cmp(&b.path));

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].path, "api/types/Widget.html");
        assert_eq!(files[1].path, "index.html");
        assert_eq!(files[1].content, b"<html>");

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }
}
