//! Documentation request handlers — resolution redirects, file serving, retry.

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, HeaderName, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Response};

use crate::caching::{self, Situation};
use crate::error::ServeError;
use crate::html;
use crate::models::revision::{GenerationState, Revision};
use crate::routes::{pages, DocsRouterState};
use crate::services::build_queue::BuildQueue;
use crate::services::ref_resolver::{self, RefSpec, ResolvedRef};
use crate::services::provider::HostingProvider;
use crate::services::{cdn, repo_service, revision_service};
use crate::validate;

const SURROGATE_KEY: HeaderName = HeaderName::from_static("surrogate-key");
const HTML_UTF8: &str = "text/html; charset=utf-8";

/// `GET /{hosting}/{owner}/{name}` — resolve the default branch and redirect
/// to its index.
pub async fn repository(
    State(state): State<DocsRouterState>,
    Path((hosting, owner, name)): Path<(String, String, String)>,
) -> Result<Response, ServeError> {
    let hosting = validate::repo_identity(&hosting, &owner, &name)?;

    let mut conn = state.conn().await?;
    let repo = repo_service::get_or_create(&mut conn, hosting, &owner, &name).await?;
    let resolved = resolve(&state, &mut conn, &repo, RefSpec::DefaultBranch).await?;

    Ok(redirect_to_index(
        hosting.as_str(),
        &owner,
        &name,
        &resolved.sha,
        StatusCode::FOUND,
    ))
}

/// `GET /{hosting}/{owner}/{name}/{sha}` — resolve the given ref and
/// redirect to its index.
pub async fn show(
    State(state): State<DocsRouterState>,
    Path((hosting, owner, name, sha)): Path<(String, String, String, String)>,
) -> Result<Response, ServeError> {
    let hosting = validate::repo_identity(&hosting, &owner, &name)?;
    validate::ref_candidate(&sha)?;

    let mut conn = state.conn().await?;
    let repo = repo_service::get_or_create(&mut conn, hosting, &owner, &name).await?;
    let resolved = resolve(&state, &mut conn, &repo, RefSpec::Named(sha)).await?;

    Ok(redirect_to_index(
        hosting.as_str(),
        &owner,
        &name,
        &resolved.sha,
        StatusCode::FOUND,
    ))
}

/// `GET /{hosting}/{owner}/{name}/{sha}/{*file}` — serve per generation
/// state: placeholder, error page, or artifact content.
pub async fn file_serve(
    State(state): State<DocsRouterState>,
    Path((hosting, owner, name, sha, file)): Path<(String, String, String, String, String)>,
    headers: HeaderMap,
) -> Result<Response, ServeError> {
    let hosting = validate::repo_identity(&hosting, &owner, &name)?;
    validate::ref_candidate(&sha)?;
    let path = validate::normalize_artifact_path(&file)?;

    let mut conn = state.conn().await?;
    let repo = repo_service::get_or_create(&mut conn, hosting, &owner, &name).await?;
    let resolved = resolve(&state, &mut conn, &repo, RefSpec::Named(sha)).await?;
    let revision = resolved.revision;

    match revision.state() {
        GenerationState::Pending => {
            crate::metrics::file_served("pending");
            let directive = caching::directive(Situation::Placeholder, state.config.cache_max_age_secs);
            Ok((
                StatusCode::OK,
                AppendHeaders(vec![
                    (header::CACHE_CONTROL, directive.cache_control),
                    (header::CONTENT_TYPE, HTML_UTF8.to_string()),
                ]),
                pages::generating(&repo.full_name(), &revision.sha),
            )
                .into_response())
        }
        GenerationState::Errored { code, description } => {
            crate::metrics::file_served("errored");
            let directive = caching::directive(Situation::ErrorPage, state.config.cache_max_age_secs);
            let retry_path = format!(
                "/{}/{}/{}/{}/retry",
                repo.hosting, repo.owner, repo.name, revision.sha
            );
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                AppendHeaders(vec![
                    (header::CACHE_CONTROL, directive.cache_control),
                    (header::CONTENT_TYPE, HTML_UTF8.to_string()),
                ]),
                pages::build_error(
                    &repo.full_name(),
                    &revision.sha,
                    &code,
                    description.as_deref(),
                    &retry_path,
                ),
            )
                .into_response())
        }
        GenerationState::Generated { .. } => {
            serve_artifact(&state, &mut conn, &revision, &path, &headers).await
        }
    }
}

/// `POST /{hosting}/{owner}/{name}/{sha}/retry` — reset an errored revision
/// to pending, purge its cached artifacts, re-enqueue, redirect to index.
pub async fn retry(
    State(state): State<DocsRouterState>,
    Path((hosting, owner, name, sha)): Path<(String, String, String, String)>,
) -> Result<Response, ServeError> {
    let hosting = validate::repo_identity(&hosting, &owner, &name)?;
    validate::ref_candidate(&sha)?;

    let mut conn = state.conn().await?;
    let repo = repo_service::get_or_create(&mut conn, hosting, &owner, &name).await?;
    let resolved = resolve(&state, &mut conn, &repo, RefSpec::Named(sha)).await?;

    let applied = revision_service::retry(&mut conn, &state.queue, &resolved.revision).await?;
    crate::metrics::retry_requested(applied);

    if applied {
        // Regenerated content can change at unchanged paths; everything
        // cached under this revision's key must go.
        if let Err(e) = cdn::purge_surrogate_key(
            &state.config,
            &state.http,
            &resolved.revision.surrogate_key(),
        )
        .await
        {
            tracing::warn!(revision_id = resolved.revision.id, "CDN purge errored: {e:#}");
        }
    }

    Ok(redirect_to_index(
        hosting.as_str(),
        &owner,
        &name,
        &resolved.sha,
        StatusCode::SEE_OTHER,
    ))
}

async fn resolve(
    state: &DocsRouterState,
    conn: &mut diesel_async::AsyncPgConnection,
    repo: &crate::models::repo::Repo,
    spec: RefSpec,
) -> Result<ResolvedRef, ServeError> {
    let provider: &dyn HostingProvider = state.provider.as_ref();
    let queue: &BuildQueue = &state.queue;
    ref_resolver::resolve(conn, provider, queue, repo, spec).await
}

async fn serve_artifact(
    state: &DocsRouterState,
    conn: &mut diesel_async::AsyncPgConnection,
    revision: &Revision,
    path: &str,
    request_headers: &HeaderMap,
) -> Result<Response, ServeError> {
    let artifact = crate::services::artifact_service::get(conn, revision.id, path).await?;
    let Some(artifact) = artifact else {
        crate::metrics::file_served("missing");
        return Err(ServeError::FileNotFound {
            path: path.to_string(),
        });
    };
    crate::metrics::file_served("hit");

    let directive = caching::directive(
        Situation::ArtifactHit(revision),
        state.config.cache_max_age_secs,
    );

    let mut headers = vec![
        (header::CACHE_CONTROL, directive.cache_control),
        (
            header::LAST_MODIFIED,
            caching::http_date(artifact.last_modified),
        ),
    ];
    if let Some(key) = directive.surrogate_key {
        headers.push((SURROGATE_KEY, key));
    }

    if let Some(since) = request_headers
        .get(header::IF_MODIFIED_SINCE)
        .and_then(|v| v.to_str().ok())
    {
        if caching::not_modified_since(artifact.last_modified, since) {
            return Ok((StatusCode::NOT_MODIFIED, AppendHeaders(headers)).into_response());
        }
    }

    let content_type = content_type_for(path);
    headers.push((header::CONTENT_TYPE, content_type.to_string()));

    let body = if content_type == HTML_UTF8
        && !(state.config.brand_head_html.is_empty() && state.config.brand_body_html.is_empty())
    {
        let page = String::from_utf8_lossy(&artifact.content);
        html::inject_branding(
            &page,
            &state.config.brand_head_html,
            &state.config.brand_body_html,
        )
        .into_bytes()
    } else {
        artifact.content
    };

    Ok((StatusCode::OK, AppendHeaders(headers), body).into_response())
}

fn redirect_to_index(
    hosting: &str,
    owner: &str,
    name: &str,
    sha: &str,
    status: StatusCode,
) -> Response {
    let directive = caching::directive(Situation::Redirect, 0);
    (
        status,
        AppendHeaders(vec![
            (
                header::LOCATION,
                format!("/{hosting}/{owner}/{name}/{sha}/index.html"),
            ),
            (header::CACHE_CONTROL, directive.cache_control),
        ]),
    )
        .into_response()
}

/// Content type from the requested path's extension, never from content.
fn content_type_for(path: &str) -> &'static str {
    let extension = std::path::Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match extension.as_str() {
        "html" | "htm" => HTML_UTF8,
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" | "map" => "application/json",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "txt" => "text/plain; charset=utf-8",
        "md" => "text/markdown; charset=utf-8",
        "xml" => "application/xml",
        "pdf" => "application/pdf",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types_come_from_the_extension() {
        assert_eq!(content_type_for("index.html"), HTML_UTF8);
        assert_eq!(content_type_for("api/Widget.HTML"), HTML_UTF8);
        assert_eq!(content_type_for("css/style.css"), "text/css; charset=utf-8");
        assert_eq!(content_type_for("search.js"), "text/javascript; charset=utf-8");
        assert_eq!(content_type_for("index.json"), "application/json");
        assert_eq!(content_type_for("img/logo.svg"), "image/svg+xml");
    }

    #[test]
    fn unknown_or_missing_extension_falls_back() {
        assert_eq!(content_type_for("LICENSE"), "application/octet-stream");
        assert_eq!(content_type_for("archive.tar.zst"), "application/octet-stream");
        assert_eq!(content_type_for("noext."), "application/octet-stream");
    }
}
