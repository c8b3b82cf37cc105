//! Host commands: each one builds the agent from config and drives one of
//! its lifecycle events.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use pumpkin_offline_core::manifest;
use pumpkin_offline_core::{Agent, Caches, DiskStorage, HttpFetcher, Intercepted, Request};
use tracing::{info, warn};

use crate::config::Config;

/// Initial delay before retrying a failed install.
/// Doubles on every further attempt.
const INITIAL_BACKOFF_MS: u64 = 1000;

fn build_agent(config: &Config) -> Result<Agent> {
    let cache_dir = config.cache_dir()?;
    let storage = DiskStorage::new(cache_dir.clone())
        .with_context(|| format!("Failed to open cache at {}", cache_dir.display()))?;
    let fetcher = HttpFetcher::with_timeout(Duration::from_secs(config.request_timeout_secs))
        .context("Failed to build HTTP client")?;
    let agent = Agent::new(
        Caches::new(Arc::new(storage)),
        Arc::new(fetcher),
        config.scope_url()?,
    )?;
    Ok(agent)
}

/// Precache the manifest, retrying with exponential backoff.
pub async fn install(config: &Config) -> Result<()> {
    let agent = build_agent(config)?;
    let mut attempt = 0;
    let mut backoff_ms = INITIAL_BACKOFF_MS;

    loop {
        attempt += 1;
        match agent.on_install().await {
            Ok(count) => {
                info!(scope = %agent.scope(), count, attempt, "Agent installed");
                eprintln!("Installed {} assets from {}", count, agent.scope());
                return Ok(());
            }
            Err(e) if attempt <= config.install_retries => {
                warn!(attempt, backoff_ms, error = %e, "Install failed, retrying");
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                backoff_ms *= 2;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Install failed after {} attempts", attempt));
            }
        }
    }
}

/// Run each path through the interceptor, one line of output per request.
pub async fn fetch(config: &Config, paths: &[String]) -> Result<()> {
    if paths.is_empty() {
        anyhow::bail!("fetch needs at least one path, e.g. `fetch ./index.html`");
    }

    let agent = build_agent(config)?;
    let mut pending_writes = Vec::new();

    for path in paths {
        let url = agent
            .resolve(path)
            .with_context(|| format!("Invalid path: {}", path))?;
        let request = Request::get(url);
        let mut result = agent.on_fetch(&request).await;
        println!("{}", format_result(&request, &result));
        pending_writes.extend(result.store_write.take());
    }

    // The process would otherwise exit before background writes land
    for write in pending_writes {
        if let Err(e) = write.await {
            warn!(error = %e, "Background cache write panicked");
        }
    }
    Ok(())
}

fn format_result(request: &Request, result: &Intercepted) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}",
        result.outcome.as_str(),
        result.response.status.as_u16(),
        result.response.content_type().unwrap_or("-"),
        result.response.body.len(),
        request.url
    )
}

/// List every store and its entries.
pub async fn list(config: &Config) -> Result<()> {
    let agent = build_agent(config)?;
    let caches = agent.caches();
    let names = caches.names().await.context("Failed to read cache index")?;

    if names.is_empty() {
        println!("No caches yet. Run `pumpkin-offline install` first.");
        return Ok(());
    }

    for name in names {
        let cache = caches.open(&name).await?;
        let entries = cache
            .entries()
            .await
            .with_context(|| format!("Failed to read cache {}", name))?;
        println!("{} ({} entries)", name, entries.len());
        for entry in entries {
            println!(
                "  {}\t{}\t{}\t{}",
                entry.response.status.as_u16(),
                entry.response.body.len(),
                entry.age_display(),
                entry.key
            );
        }
    }
    Ok(())
}

/// Print the manifest resolved against the configured scope.
pub fn manifest(config: &Config) -> Result<()> {
    let scope = config.scope_url()?;
    for url in manifest::resolve_all(&scope, manifest::ASSET_MANIFEST.iter().copied())? {
        println!("{}", url);
    }
    println!("fallback: {}", manifest::fallback_url(&scope)?);
    Ok(())
}

/// Print the effective configuration, optionally persisting it.
pub fn show_config(config: &Config, save: bool) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    if save {
        let path = config.save()?;
        eprintln!("Saved to {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pumpkin_offline_core::{Outcome, Response};
    use tempfile::TempDir;

    #[test]
    fn test_format_result_line() {
        let request = Request::get(
            url::Url::parse("http://localhost:8080/play/pumpkin-game/index.html").unwrap(),
        );
        let result = Intercepted {
            outcome: Outcome::Synthesized,
            response: Response::network_error(),
            store_write: None,
        };
        assert_eq!(
            format_result(&request, &result),
            "synthesized\t408\ttext/plain\t22\thttp://localhost:8080/play/pumpkin-game/index.html"
        );
    }

    #[tokio::test]
    async fn test_build_agent_uses_configured_cache_dir() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            cache_dir: Some(dir.path().join("store")),
            ..Config::default()
        };
        let agent = build_agent(&config).unwrap();
        assert!(dir.path().join("store").is_dir());
        assert!(!agent.is_installed());
        assert!(agent.caches().names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_requires_paths() {
        assert!(fetch(&Config::default(), &[]).await.is_err());
    }
}
