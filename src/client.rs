//! CloudStorage - High-Level Operations
//!
//! TigerStyle: Each operation is one blocking tool invocation. Nothing is
//! kept between calls except the resolved tool path.
//!
//! | Operation       | Tool invocation                     |
//! |-----------------|-------------------------------------|
//! | `list`          | `ls gs://<bucket>/`                 |
//! | `exists`        | `ls gs://<bucket>/<path>`           |
//! | `delete`        | `rm gs://<bucket>/<path>`           |
//! | `get`           | `cp gs://<bucket>/<path> <local>`   |
//! | `insert`        | `cp [-a public-read] <local> gs://<bucket>/<path>` |
//!
//! `get_if_changed` fetches content-addressed fixtures: the object key is
//! the SHA-1 recorded in the fixture's `.sha1` sidecar.

use std::path::Path;

use crate::config::StorageConfig;
use crate::constants::ACL_PUBLIC_READ;
use crate::error::StorageResult;
use crate::executor::{CommandExecutor, SystemExecutor};
use crate::hash;
use crate::resolver::{Bootstrap, ExecutableResolver, HttpTarballBootstrap};
use crate::runner::CommandRunner;

/// Client for one storage backend.
pub struct CloudStorage {
    config: StorageConfig,
    runner: CommandRunner,
}

impl CloudStorage {
    /// Client that runs the real tool and bootstraps it over HTTP.
    #[must_use]
    pub fn new(config: StorageConfig) -> Self {
        Self::with_parts(config, SystemExecutor, HttpTarballBootstrap)
    }

    /// Client with a custom executor.
    #[must_use]
    pub fn with_executor(config: StorageConfig, executor: impl CommandExecutor + 'static) -> Self {
        Self::with_parts(config, executor, HttpTarballBootstrap)
    }

    /// Client with a custom executor and bootstrap step.
    #[must_use]
    pub fn with_parts(
        config: StorageConfig,
        executor: impl CommandExecutor + 'static,
        bootstrap: impl Bootstrap + 'static,
    ) -> Self {
        let resolver = ExecutableResolver::with_bootstrap(config.clone(), bootstrap);
        let runner = CommandRunner::new(resolver, executor, config.interpreter.clone());
        Self { config, runner }
    }

    /// The configuration this client was built with.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// `gs://<bucket>/<remote_path>`
    #[must_use]
    pub fn url(&self, bucket: &str, remote_path: &str) -> String {
        // Precondition
        assert!(!bucket.is_empty(), "bucket cannot be empty");

        format!("{}://{bucket}/{remote_path}", self.config.scheme)
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Keys in `bucket`, without the `gs://<bucket>/` prefix.
    pub fn list(&self, bucket: &str) -> StorageResult<Vec<String>> {
        let query = self.url(bucket, "");
        let stdout = self.runner.run(&["ls".to_string(), query.clone()])?;

        Ok(stdout
            .lines()
            .filter(|line| !line.is_empty())
            .map(|line| line.strip_prefix(query.as_str()).unwrap_or(line).to_string())
            .collect())
    }

    /// Whether `remote_path` exists. Only a not-found failure means `false`.
    pub fn exists(&self, bucket: &str, remote_path: &str) -> StorageResult<bool> {
        match self
            .runner
            .run(&["ls".to_string(), self.url(bucket, remote_path)])
        {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Delete `remote_path`.
    pub fn delete(&self, bucket: &str, remote_path: &str) -> StorageResult<()> {
        let url = self.url(bucket, remote_path);
        tracing::info!(%url, "Deleting");
        self.runner.run(&["rm".to_string(), url])?;
        Ok(())
    }

    /// Download `remote_path` into `local_path`.
    pub fn get(&self, bucket: &str, remote_path: &str, local_path: &Path) -> StorageResult<()> {
        let url = self.url(bucket, remote_path);
        tracing::info!(%url, local_path = %local_path.display(), "Downloading");
        self.runner.run(&[
            "cp".to_string(),
            url,
            local_path.to_string_lossy().into_owned(),
        ])?;
        Ok(())
    }

    /// Upload `local_path` to `remote_path`, optionally world-readable.
    pub fn insert(
        &self,
        bucket: &str,
        remote_path: &str,
        local_path: &Path,
        publicly_readable: bool,
    ) -> StorageResult<()> {
        let url = self.url(bucket, remote_path);

        let mut args = vec!["cp".to_string()];
        if publicly_readable {
            args.extend(ACL_PUBLIC_READ.iter().map(|a| (*a).to_string()));
        }
        args.push(local_path.to_string_lossy().into_owned());
        args.push(url.clone());

        tracing::info!(
            local_path = %local_path.display(),
            %url,
            "Uploading{}",
            if publicly_readable { " (publicly readable)" } else { "" }
        );
        self.runner.run(&args)?;
        Ok(())
    }

    /// Fetch `file_path` if its `.sha1` sidecar names different content.
    ///
    /// Tries `bucket` if given, otherwise the public then the internal
    /// bucket. A fixture missing from every bucket is logged, not raised.
    ///
    /// # Returns
    /// `true` if the file was downloaded.
    pub fn get_if_changed(&self, file_path: &Path, bucket: Option<&str>) -> StorageResult<bool> {
        let sidecar = hash::sidecar_path(file_path);
        if !sidecar.exists() {
            return Ok(false);
        }

        let expected_hash = hash::read_sidecar(&sidecar)?;
        if file_path.exists() && self.get_hash(file_path)? == expected_hash {
            return Ok(false);
        }

        let buckets: Vec<&str> = match bucket {
            Some(bucket) => vec![bucket],
            None => self.config.default_buckets().to_vec(),
        };

        for bucket in buckets {
            match self.get(bucket, &expected_hash, file_path) {
                Ok(()) => return Ok(true),
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            }
        }

        tracing::warn!(
            file_path = %file_path.display(),
            hash = %expected_hash,
            "Unable to find file in cloud storage"
        );
        Ok(false)
    }

    /// SHA-1 of `file_path` as lowercase hex.
    pub fn get_hash(&self, file_path: &Path) -> StorageResult<String> {
        hash::get_hash_chunked(file_path, self.config.hash_chunk_bytes)
    }
}
