//! Hosting provider integration — branch/tag/sha resolution.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::DocsConfig;

/// What the resolver needs from a hosting provider. Implementations are
/// substitutable; tests use an in-memory one.
#[async_trait]
pub trait HostingProvider: Send + Sync {
    /// Name of the repository's default branch; `None` when the repository
    /// is unknown to the provider.
    async fn default_branch(&self, owner: &str, name: &str) -> anyhow::Result<Option<String>>;

    /// Resolve a branch/tag/sha candidate to a concrete commit sha; `None`
    /// when the provider cannot resolve it.
    async fn resolve_ref(
        &self,
        owner: &str,
        name: &str,
        reference: &str,
    ) -> anyhow::Result<Option<String>>;
}

/// GitHub REST API implementation.
pub struct GithubProvider {
    client: reqwest::Client,
    api_base: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct RepoInfo {
    default_branch: String,
}

#[derive(Debug, Deserialize)]
struct CommitInfo {
    sha: String,
}

impl GithubProvider {
    pub fn new(config: &DocsConfig, client: reqwest::Client) -> Self {
        Self {
            client,
            api_base: config.github_api_base.clone(),
            token: config.github_token.clone(),
        }
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "foundry-docs");
        if !self.token.is_empty() {
            request = request.header("Authorization", format!("Bearer {}", self.token));
        }
        request
    }
}

#[async_trait]
impl HostingProvider for GithubProvider {
    async fn default_branch(&self, owner: &str, name: &str) -> anyhow::Result<Option<String>> {
        let url = format!("{}/repos/{owner}/{name}", self.api_base);
        let response = self.get(&url).send().await?;

        match response.status() {
            status if status.is_success() => {
                let info: RepoInfo = response.json().await?;
                Ok(Some(info.default_branch))
            }
            StatusCode::NOT_FOUND => Ok(None),
            status => {
                anyhow::bail!("GitHub repo lookup failed: {status} for {owner}/{name}")
            }
        }
    }

    async fn resolve_ref(
        &self,
        owner: &str,
        name: &str,
        reference: &str,
    ) -> anyhow::Result<Option<String>> {
        let url = format!("{}/repos/{owner}/{name}/commits/{reference}", self.api_base);
        let response = self.get(&url).send().await?;

        match response.status() {
            status if status.is_success() => {
                let info: CommitInfo = response.json().await?;
                Ok(Some(info.sha))
            }
            // 422 is GitHub's "no commit found for SHA".
            StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY => Ok(None),
            status => {
                anyhow::bail!("GitHub ref resolution failed: {status} for {owner}/{name}@{reference}")
            }
        }
    }
}

#[cfg(test)]
pub mod mock {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// In-memory provider with a fixed ref table.
    pub struct MockProvider {
        pub default_branch: Option<String>,
        pub refs: HashMap<String, String>,
        pub calls: AtomicUsize,
    }

    impl MockProvider {
        pub fn new(default_branch: &str, refs: &[(&str, &str)]) -> Self {
            Self {
                default_branch: Some(default_branch.to_string()),
                refs: refs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl HostingProvider for MockProvider {
        async fn default_branch(&self, _owner: &str, _name: &str) -> anyhow::Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.default_branch.clone())
        }

        async fn resolve_ref(
            &self,
            _owner: &str,
            _name: &str,
            reference: &str,
        ) -> anyhow::Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.refs.get(reference).cloned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_payloads_decode() {
        let repo: RepoInfo =
            serde_json::from_str(r#"{"name": "widgets", "default_branch": "main"}"#).unwrap();
        assert_eq!(repo.default_branch, "main");

        let commit: CommitInfo =
            serde_json::from_str(r#"{"sha": "abc123", "commit": {"message": "x"}}"#).unwrap();
        assert_eq!(commit.sha, "abc123");
    }

    #[tokio::test]
    async fn mock_provider_resolves_from_table() {
        let provider = mock::MockProvider::new("main", &[("main", "abc123"), ("v1.0", "def456")]);
        assert_eq!(
            provider.resolve_ref("acme", "widgets", "main").await.unwrap(),
            Some("abc123".to_string())
        );
        assert_eq!(
            provider.resolve_ref("acme", "widgets", "gone").await.unwrap(),
            None
        );
        assert_eq!(
            provider.default_branch("acme", "widgets").await.unwrap(),
            Some("main".to_string())
        );
    }
}
