//! Build-metadata server pool with load-balanced lookups.
//!
//! The alternate build system resolves "latest build" keys through a pool
//! of metadata servers. Each lookup picks exactly one server; successive
//! picks rotate through the pool so no member is a hard-coded primary.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use cadence_core::BuildServerConfig;

use crate::error::BuildLookupError;

// ── Server contract ─────────────────────────────────────────────────

/// One build-metadata server.
#[async_trait]
pub trait BuildServer: Send + Sync {
    /// Resolve a `"<branch>/<target>/LATEST"` key to a concrete artifact
    /// id. Unreachable or malformed servers fail the lookup; retries
    /// belong to the caller.
    async fn translate(&self, build_key: &str) -> Result<String, BuildLookupError>;

    /// Server name for diagnostics (e.g. its base URL).
    fn name(&self) -> &str;
}

// ── HTTP implementation ─────────────────────────────────────────────

/// `reqwest`-backed build server speaking the devserver HTTP protocol:
/// `GET {base}/latestbuild?build_key=<key>` returns the artifact id as
/// plain text.
pub struct HttpBuildServer {
    /// Base URL without trailing slash.
    base_url: String,
    /// Shared HTTP client (connection pooling).
    client: reqwest::Client,
}

impl HttpBuildServer {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BuildLookupError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(BuildLookupError::Http)?;
        Ok(Self { base_url, client })
    }
}

#[async_trait]
impl BuildServer for HttpBuildServer {
    async fn translate(&self, build_key: &str) -> Result<String, BuildLookupError> {
        let url = format!("{}/latestbuild", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("build_key", build_key)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            tracing::warn!(
                server = %self.base_url,
                %status,
                body = %body,
                "build server returned non-2xx status"
            );
            return Err(BuildLookupError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let artifact = response.text().await?.trim().to_string();
        if artifact.is_empty() {
            return Err(BuildLookupError::MalformedResponse {
                server: self.base_url.clone(),
                build_key: build_key.to_string(),
            });
        }

        tracing::debug!(
            server = %self.base_url,
            build_key,
            artifact = %artifact,
            "resolved latest build"
        );
        Ok(artifact)
    }

    fn name(&self) -> &str {
        &self.base_url
    }
}

// ── Pool ────────────────────────────────────────────────────────────

/// Load-balanced pool of build servers.
///
/// [`pick`](ServerPool::pick) advances an atomic cursor, so repeated
/// lookups spread across the pool and each call selects independently
/// (no cross-call coordination beyond the single atomic increment).
pub struct ServerPool {
    servers: Vec<Arc<dyn BuildServer>>,
    cursor: AtomicUsize,
}

impl ServerPool {
    pub fn new(servers: Vec<Arc<dyn BuildServer>>) -> Self {
        Self {
            servers,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Build an HTTP-backed pool from environment config.
    pub fn from_config(config: &BuildServerConfig) -> Result<Self, BuildLookupError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let servers = config
            .endpoints
            .iter()
            .map(|endpoint| {
                HttpBuildServer::new(endpoint.clone(), timeout)
                    .map(|s| Arc::new(s) as Arc<dyn BuildServer>)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(servers))
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Select one server for a lookup.
    pub fn pick(&self) -> Result<Arc<dyn BuildServer>, BuildLookupError> {
        if self.servers.is_empty() {
            return Err(BuildLookupError::EmptyPool);
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.servers.len();
        Ok(Arc::clone(&self.servers[index]))
    }
}
