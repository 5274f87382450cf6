//! HTTP routes — documentation serving surface.

pub mod docs;
pub mod pages;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;

use crate::config::DocsConfig;
use crate::db::{DbConn, DbPool};
use crate::error::ServeError;
use crate::services::build_queue::BuildQueue;
use crate::services::provider::HostingProvider;

/// Shared state for the docs route handlers.
#[derive(Clone)]
pub struct DocsRouterState {
    pub pool: DbPool,
    pub config: DocsConfig,
    pub queue: BuildQueue,
    pub provider: Arc<dyn HostingProvider>,
    pub http: reqwest::Client,
}

impl DocsRouterState {
    pub async fn conn(&self) -> Result<DbConn, ServeError> {
        self.pool
            .get()
            .await
            .map_err(|e| ServeError::Internal(anyhow::anyhow!("diesel pool: {e}")))
    }
}

/// Build the Axum router.
pub fn docs_router(state: DocsRouterState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/{hosting}/{owner}/{name}", get(docs::repository))
        .route("/{hosting}/{owner}/{name}/{sha}", get(docs::show))
        .route("/{hosting}/{owner}/{name}/{sha}/retry", post(docs::retry))
        .route("/{hosting}/{owner}/{name}/{sha}/{*file}", get(docs::file_serve))
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
