//! Request-facing error taxonomy.
//!
//! Resolution-time failures stop the request immediately; generation
//! failures are *state* on the revision record and are rendered by the file
//! handler, not raised through this type.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::caching;

#[derive(Debug, Error)]
pub enum ServeError {
    /// Hosting/owner/name/path failed naming constraints. Rejected before
    /// any lookup.
    #[error("invalid {field}: {value:?}")]
    Validation { field: &'static str, value: String },

    /// The hosting provider could not resolve the version string.
    #[error("ref not found: {reference}")]
    RefNotFound { reference: String },

    /// The revision is generated but its artifact set lacks the path.
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ServeError {
    fn status(&self) -> StatusCode {
        match self {
            ServeError::Validation { .. } => StatusCode::BAD_REQUEST,
            ServeError::RefNotFound { .. } => StatusCode::NOT_FOUND,
            ServeError::FileNotFound { .. } => StatusCode::NOT_FOUND,
            ServeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        if let ServeError::Internal(err) = &self {
            tracing::error!("Request failed: {err:#}");
        }

        let status = self.status();
        let body = match &self {
            ServeError::Internal(_) => "internal error".to_string(),
            other => other.to_string(),
        };

        (
            status,
            [(header::CACHE_CONTROL, caching::NO_CACHE)],
            body,
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_match_error_kinds() {
        let validation = ServeError::Validation {
            field: "owner",
            value: "-bad-".into(),
        };
        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);

        let not_found = ServeError::RefNotFound {
            reference: "main".into(),
        };
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let missing = ServeError::FileNotFound {
            path: "index.html".into(),
        };
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let internal = ServeError::Internal(anyhow::anyhow!("pool exhausted"));
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
