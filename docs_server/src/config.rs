//! Service configuration — loaded from environment variables.

#[derive(Clone, Debug)]
pub struct DocsConfig {
    /// GitHub personal access token for API calls. Empty = unauthenticated.
    pub github_token: String,
    /// GitHub REST API base URL.
    pub github_api_base: String,
    /// Fastly API token for surrogate-key purges. Empty = purges disabled.
    pub fastly_token: String,
    /// Fastly service id the artifacts are cached under.
    pub fastly_service_id: String,
    /// Fastly API base URL.
    pub fastly_api_base: String,
    /// Public max-age for found artifacts, in seconds.
    pub cache_max_age_secs: u64,
    /// Directory builds are checked out into.
    pub workspace_dir: String,
    /// Shell command that generates the documentation inside a checkout.
    pub build_command: String,
    /// Directory (relative to the checkout) the build writes its output to.
    pub build_output_dir: String,
    /// Per-build timeout in seconds.
    pub build_timeout_secs: u64,
    /// Number of build workers.
    pub build_workers: usize,
    /// Markup inserted before the closing head tag of HTML artifacts.
    pub brand_head_html: String,
    /// Markup inserted before the closing body tag of HTML artifacts.
    pub brand_body_html: String,
}

impl DocsConfig {
    pub fn from_env() -> Self {
        let github_token = std::env::var("DOCS_GITHUB_TOKEN").unwrap_or_default();
        let github_api_base = std::env::var("DOCS_GITHUB_API")
            .unwrap_or_else(|_| "https://api.github.com".to_string());
        let fastly_token = std::env::var("DOCS_FASTLY_TOKEN").unwrap_or_default();
        let fastly_service_id = std::env::var("DOCS_FASTLY_SERVICE").unwrap_or_default();
        let fastly_api_base = std::env::var("DOCS_FASTLY_API")
            .unwrap_or_else(|_| "https://api.fastly.com".to_string());
        let cache_max_age_secs = std::env::var("DOCS_CACHE_MAX_AGE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(86400);
        let workspace_dir =
            std::env::var("DOCS_WORKSPACE").unwrap_or_else(|_| "/tmp/docs-builds".to_string());
        let build_command =
            std::env::var("DOCS_BUILD_COMMAND").unwrap_or_else(|_| "crystal docs".to_string());
        let build_output_dir =
            std::env::var("DOCS_BUILD_OUTPUT").unwrap_or_else(|_| "docs".to_string());
        let build_timeout_secs = std::env::var("DOCS_BUILD_TIMEOUT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(600);
        let build_workers = std::env::var("DOCS_BUILD_WORKERS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1);
        let brand_head_html = std::env::var("DOCS_BRAND_HEAD_HTML").unwrap_or_default();
        let brand_body_html = std::env::var("DOCS_BRAND_BODY_HTML").unwrap_or_default();

        if github_token.is_empty() {
            tracing::warn!("DOCS_GITHUB_TOKEN not set -- provider requests are unauthenticated");
        }
        if fastly_token.is_empty() || fastly_service_id.is_empty() {
            tracing::warn!("DOCS_FASTLY_TOKEN/DOCS_FASTLY_SERVICE not set -- CDN purges disabled");
        }

        Self {
            github_token,
            github_api_base,
            fastly_token,
            fastly_service_id,
            fastly_api_base,
            cache_max_age_secs,
            workspace_dir,
            build_command,
            build_output_dir,
            build_timeout_secs,
            build_workers,
            brand_head_html,
            brand_body_html,
        }
    }
}
