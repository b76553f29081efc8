//! HTTP retrieval of source images.

use std::io::Read;
use std::time::Duration;

use crate::appwrite::map_error;
use crate::error::StoreError;
use crate::model::FetchedAsset;
use crate::store::AssetFetcher;

/// Upper bound on a single source image.
pub const MAX_ASSET_BYTES: u64 = 10 * 1024 * 1024;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Fetches assets over plain HTTP(S) GET.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
    max_bytes: u64,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout_connect(Duration::from_secs(10))
                .build(),
            max_bytes: MAX_ASSET_BYTES,
        }
    }
}

impl AssetFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedAsset, StoreError> {
        tracing::debug!("GET {url}");
        let response = self.agent.get(url).call().map_err(map_error)?;
        let content_type = response
            .header("Content-Type")
            .map(media_type)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        let mut bytes = Vec::new();
        response
            .into_reader()
            .take(self.max_bytes + 1)
            .read_to_end(&mut bytes)
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        if bytes.len() as u64 > self.max_bytes {
            return Err(StoreError::Decode(format!(
                "asset at {url} exceeds {} bytes",
                self.max_bytes
            )));
        }
        if bytes.is_empty() {
            return Err(StoreError::EmptyPayload {
                url: url.to_string(),
            });
        }
        Ok(FetchedAsset {
            bytes,
            content_type,
        })
    }
}

/// `image/png; charset=binary` → `image/png`.
fn media_type(header: &str) -> String {
    header
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
