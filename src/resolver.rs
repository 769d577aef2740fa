//! Executable Resolver
//!
//! TigerStyle: Find the storage tool, or fetch it once if it is nowhere to
//! be found.
//!
//! Search order over `[download_dir, search_path...]`:
//! 1. `<dir>/<vendored_subdir>/<tool>` in every dir (needs `vendored_args`)
//! 2. `<dir>/<tool>` in every dir
//! 3. Bootstrap: download and unpack the tool into `download_dir`
//!
//! The bootstrap step writes to disk and is not guarded against two
//! processes racing through a first run.

use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;

use crate::config::StorageConfig;
use crate::error::{StorageError, StorageResult};

// =============================================================================
// Types
// =============================================================================

/// A usable tool installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Path to the executable
    pub path: PathBuf,
    /// Flags this installation needs before any subcommand
    pub extra_args: Vec<String>,
}

/// Obtains the tool when no installation exists.
pub trait Bootstrap: Send + Sync {
    /// Fetch the archive at `url` and unpack it under `extract_to`.
    fn fetch(&self, url: &str, extract_to: &Path) -> StorageResult<()>;
}

/// Downloads a gzip-compressed tarball over HTTP and unpacks it.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpTarballBootstrap;

impl Bootstrap for HttpTarballBootstrap {
    fn fetch(&self, url: &str, extract_to: &Path) -> StorageResult<()> {
        let bytes = reqwest::blocking::get(url)
            .and_then(reqwest::blocking::Response::error_for_status)
            .and_then(reqwest::blocking::Response::bytes)
            .map_err(|e| StorageError::Bootstrap(format!("failed to download {url}: {e}")))?;

        unpack_tarball(Cursor::new(bytes), extract_to)
    }
}

/// Unpack a gzip-compressed tar stream under `extract_to`.
pub fn unpack_tarball(reader: impl Read, extract_to: &Path) -> StorageResult<()> {
    std::fs::create_dir_all(extract_to)?;

    let decoder = GzDecoder::new(reader);
    let mut archive = tar::Archive::new(decoder);
    archive.unpack(extract_to).map_err(|e| {
        StorageError::Bootstrap(format!(
            "failed to extract archive into {}: {e}",
            extract_to.display()
        ))
    })
}

// =============================================================================
// ExecutableResolver
// =============================================================================

/// Locates the storage tool according to a [`StorageConfig`].
pub struct ExecutableResolver {
    config: StorageConfig,
    bootstrap: Box<dyn Bootstrap>,
}

impl ExecutableResolver {
    /// Resolver that bootstraps over HTTP.
    #[must_use]
    pub fn new(config: StorageConfig) -> Self {
        Self::with_bootstrap(config, HttpTarballBootstrap)
    }

    /// Resolver with a custom bootstrap step.
    #[must_use]
    pub fn with_bootstrap(config: StorageConfig, bootstrap: impl Bootstrap + 'static) -> Self {
        Self {
            config,
            bootstrap: Box::new(bootstrap),
        }
    }

    /// Find the tool, bootstrapping it if no installation exists.
    pub fn resolve(&self) -> StorageResult<Resolution> {
        if let Some(found) = self.find_installed() {
            tracing::debug!(path = %found.path.display(), extra_args = ?found.extra_args, "Resolved storage tool");
            return Ok(found);
        }
        self.download()
    }

    /// Find an existing installation without touching the network.
    #[must_use]
    pub fn find_installed(&self) -> Option<Resolution> {
        let dirs = self.config.search_dirs();
        let tool = &self.config.tool_name;

        let vendored = dirs
            .iter()
            .map(|dir| dir.join(&self.config.vendored_subdir).join(tool))
            .find(|path| path.is_file());
        if let Some(path) = vendored {
            return Some(Resolution {
                path,
                extra_args: self.config.vendored_args.clone(),
            });
        }

        dirs.iter()
            .map(|dir| dir.join(tool))
            .find(|path| path.is_file())
            .map(|path| Resolution {
                path,
                extra_args: Vec::new(),
            })
    }

    fn download(&self) -> StorageResult<Resolution> {
        let download_dir = &self.config.download_dir;
        // The archive carries a top-level directory named like download_dir.
        let extract_to = download_dir.parent().unwrap_or(download_dir);

        tracing::info!(url = %self.config.download_url, "Downloading storage tool");
        self.bootstrap.fetch(&self.config.download_url, extract_to)?;

        let path = download_dir.join(&self.config.tool_name);
        if !path.is_file() {
            return Err(StorageError::Bootstrap(format!(
                "{} missing after extracting {}",
                path.display(),
                self.config.download_url
            )));
        }
        tracing::info!(path = %path.display(), "Downloaded storage tool");

        Ok(Resolution {
            path,
            extra_args: Vec::new(),
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
