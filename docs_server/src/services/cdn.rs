//! CDN invalidation — surrogate-key purge after a retry.

use crate::config::DocsConfig;

/// Purge every cached response tagged with `key`. Skipped (and reported
/// successful) when CDN credentials are not configured; HTTP-level failures
/// are logged without failing the caller — regeneration proceeds either way.
pub async fn purge_surrogate_key(
    config: &DocsConfig,
    client: &reqwest::Client,
    key: &str,
) -> anyhow::Result<()> {
    if config.fastly_token.is_empty() || config.fastly_service_id.is_empty() {
        tracing::debug!(key, "CDN credentials not set, skipping purge");
        return Ok(());
    }

    let url = format!(
        "{}/service/{}/purge/{key}",
        config.fastly_api_base, config.fastly_service_id
    );
    let response = client
        .post(&url)
        .header("Fastly-Key", &config.fastly_token)
        .header("Accept", "application/json")
        .send()
        .await?;

    if response.status().is_success() {
        crate::metrics::cdn_purge("ok");
        tracing::info!(key, "CDN purge issued");
    } else {
        crate::metrics::cdn_purge("failed");
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        tracing::warn!(key, "CDN purge failed: {} {}", status, text);
    }

    Ok(())
}
