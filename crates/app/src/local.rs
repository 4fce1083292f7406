//! Filesystem-backed discovery and fetching for locally stored sets.

use std::path::PathBuf;

use async_trait::async_trait;
use practice_core::SetId;
use services::{DocumentFetcher, FetchError, HttpFetcher, SetDescriptor, SetDiscovery};
use tracing::{debug, warn};
use url::Url;

/// Discovers problem sets by scanning a directory for `*.json` documents.
/// The file stem becomes the set id.
pub struct DirDiscovery {
    dir: PathBuf,
}

impl DirDiscovery {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl SetDiscovery for DirDiscovery {
    async fn discover(&self) -> Vec<SetDescriptor> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    target: "discovery",
                    dir = %self.dir.display(),
                    error = %e,
                    "Cannot scan data directory"
                );
                return Vec::new();
            }
        };

        let mut sets = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let Ok(id) = SetId::new(stem) else {
                continue;
            };
            // file:// URLs need an absolute path.
            let Ok(resolved) = tokio::fs::canonicalize(&path).await else {
                debug!(target: "discovery", path = %path.display(), "Skipping unresolvable path");
                continue;
            };
            let Ok(source) = Url::from_file_path(&resolved) else {
                continue;
            };
            sets.push(SetDescriptor::new(id, None, source));
        }
        sets.sort_by(|a, b| a.id().cmp(b.id()));
        sets
    }
}

/// Reads `file://` URLs from disk and delegates everything else to HTTP.
pub struct LocalFetcher {
    http: HttpFetcher,
}

impl LocalFetcher {
    pub fn new() -> Self {
        Self {
            http: HttpFetcher::new(),
        }
    }
}

impl Default for LocalFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentFetcher for LocalFetcher {
    async fn fetch(&self, source: &Url) -> Result<String, FetchError> {
        if source.scheme() != "file" {
            return self.http.fetch(source).await;
        }
        let path = source.to_file_path().map_err(|_| FetchError::Transport {
            url: source.to_string(),
            message: "not a local file path".into(),
        })?;
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| FetchError::Transport {
                url: source.to_string(),
                message: e.to_string(),
            })
    }
}
