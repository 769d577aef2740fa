//! Storage Configuration
//!
//! TigerStyle: All tunables live in one explicit struct handed to the client.
//! Defaults match the production values; tests override paths and URLs
//! without touching process-wide state.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    ENV_DOWNLOAD_DIR, ENV_DOWNLOAD_URL, ENV_INTERNAL_BUCKET, ENV_INTERPRETER, ENV_PUBLIC_BUCKET,
    HASH_CHUNK_BYTES, INTERNAL_BUCKET, INTERNAL_BUCKET_ALIAS, PUBLIC_BUCKET, PUBLIC_BUCKET_ALIAS,
    STORAGE_SCHEME, TOOL_DOWNLOAD_DIR, TOOL_DOWNLOAD_URL, TOOL_NAME, TOOL_VENDORED_FLAG,
    TOOL_VENDORED_SUBDIR,
};
use crate::error::{StorageError, StorageResult};

/// Configuration for [`crate::CloudStorage`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// World-readable bucket, tried first by conditional fetches
    pub public_bucket: String,
    /// Restricted bucket, tried second by conditional fetches
    pub internal_bucket: String,
    /// URL scheme of remote addresses
    pub scheme: String,
    /// Executable name to look for
    pub tool_name: String,
    /// Archive downloaded when the tool is not installed
    pub download_url: String,
    /// Directory the downloaded tool ends up in
    pub download_dir: PathBuf,
    /// Subdirectory holding a vendored copy of the tool
    pub vendored_subdir: PathBuf,
    /// Flags prepended when running the vendored copy
    pub vendored_args: Vec<String>,
    /// Directories searched after `download_dir`; `None` means `PATH`
    pub search_path: Option<Vec<PathBuf>>,
    /// Program used to run the tool script, if it is not directly executable
    pub interpreter: Option<PathBuf>,
    /// Read size when hashing files
    pub hash_chunk_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            public_bucket: PUBLIC_BUCKET.to_string(),
            internal_bucket: INTERNAL_BUCKET.to_string(),
            scheme: STORAGE_SCHEME.to_string(),
            tool_name: TOOL_NAME.to_string(),
            download_url: TOOL_DOWNLOAD_URL.to_string(),
            download_dir: expand_path(TOOL_DOWNLOAD_DIR),
            vendored_subdir: PathBuf::from(TOOL_VENDORED_SUBDIR),
            vendored_args: vec![TOOL_VENDORED_FLAG.to_string()],
            search_path: None,
            interpreter: None,
            hash_chunk_bytes: HASH_CHUNK_BYTES,
        }
    }
}

impl StorageConfig {
    /// Load a JSON config file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> StorageResult<Self> {
        let bytes = std::fs::read(path)?;
        let mut config: Self = serde_json::from_slice(&bytes)
            .map_err(|e| StorageError::Config(format!("{}: {e}", path.display())))?;
        config.download_dir = expand_path(&config.download_dir.to_string_lossy());
        config.validate()?;
        Ok(config)
    }

    /// Override fields from environment variables.
    ///
    /// `lookup` is usually `|k| std::env::var(k).ok()`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_PUBLIC_BUCKET) {
            self.public_bucket = v;
        }
        if let Some(v) = lookup(ENV_INTERNAL_BUCKET) {
            self.internal_bucket = v;
        }
        if let Some(v) = lookup(ENV_DOWNLOAD_URL) {
            self.download_url = v;
        }
        if let Some(v) = lookup(ENV_DOWNLOAD_DIR) {
            self.download_dir = expand_path(&v);
        }
        if let Some(v) = lookup(ENV_INTERPRETER) {
            self.interpreter = Some(PathBuf::from(v));
        }
    }

    /// Reject configs the client cannot work with.
    pub fn validate(&self) -> StorageResult<()> {
        if self.public_bucket.is_empty() || self.internal_bucket.is_empty() {
            return Err(StorageError::Config("bucket names cannot be empty".into()));
        }
        if self.tool_name.is_empty() {
            return Err(StorageError::Config("tool_name cannot be empty".into()));
        }
        if self.hash_chunk_bytes == 0 {
            return Err(StorageError::Config("hash_chunk_bytes must be positive".into()));
        }
        Ok(())
    }

    /// Map the `public`/`internal` aliases to configured bucket names.
    #[must_use]
    pub fn resolve_bucket<'a>(&'a self, name: &'a str) -> &'a str {
        match name {
            PUBLIC_BUCKET_ALIAS => &self.public_bucket,
            INTERNAL_BUCKET_ALIAS => &self.internal_bucket,
            other => other,
        }
    }

    /// Buckets a conditional fetch tries when none is given, in order.
    #[must_use]
    pub fn default_buckets(&self) -> [&str; 2] {
        [self.public_bucket.as_str(), self.internal_bucket.as_str()]
    }

    /// Directories searched for the tool: download dir, then search path.
    #[must_use]
    pub fn search_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = vec![self.download_dir.clone()];
        match &self.search_path {
            Some(paths) => dirs.extend(paths.iter().cloned()),
            None => {
                if let Some(path) = std::env::var_os("PATH") {
                    dirs.extend(std::env::split_paths(&path));
                }
            }
        }
        dirs
    }
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = StorageConfig::default();

        assert_eq!(config.public_bucket, PUBLIC_BUCKET);
        assert_eq!(config.internal_bucket, INTERNAL_BUCKET);
        assert_eq!(config.vendored_args, vec![TOOL_VENDORED_FLAG.to_string()]);
        assert!(!config.download_dir.to_string_lossy().starts_with('~'));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_partial() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(
            &path,
            r#"{"public_bucket": "my-public", "search_path": ["/opt/tools"]}"#,
        )
        .unwrap();

        let config = StorageConfig::from_file(&path).unwrap();

        assert_eq!(config.public_bucket, "my-public");
        assert_eq!(config.internal_bucket, INTERNAL_BUCKET);
        assert_eq!(config.search_path, Some(vec![PathBuf::from("/opt/tools")]));
    }

    #[test]
    fn test_from_file_rejects_bad_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(matches!(
            StorageConfig::from_file(&path),
            Err(StorageError::Config(_))
        ));
    }

    #[test]
    fn test_from_file_rejects_zero_chunk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, r#"{"hash_chunk_bytes": 0}"#).unwrap();

        assert!(StorageConfig::from_file(&path).is_err());
    }

    #[test]
    fn test_apply_env() {
        let env: HashMap<&str, &str> = [
            (ENV_PUBLIC_BUCKET, "env-public"),
            (ENV_DOWNLOAD_URL, "http://localhost/tool.tar.gz"),
            (ENV_INTERPRETER, "python3"),
        ]
        .into_iter()
        .collect();

        let mut config = StorageConfig::default();
        config.apply_env(|k| env.get(k).map(|v| (*v).to_string()));

        assert_eq!(config.public_bucket, "env-public");
        assert_eq!(config.internal_bucket, INTERNAL_BUCKET);
        assert_eq!(config.download_url, "http://localhost/tool.tar.gz");
        assert_eq!(config.interpreter, Some(PathBuf::from("python3")));
    }

    #[test]
    fn test_resolve_bucket_aliases() {
        let config = StorageConfig::default();

        assert_eq!(config.resolve_bucket("public"), PUBLIC_BUCKET);
        assert_eq!(config.resolve_bucket("internal"), INTERNAL_BUCKET);
        assert_eq!(config.resolve_bucket("other-bucket"), "other-bucket");
    }

    #[test]
    fn test_search_dirs_starts_with_download_dir() {
        let config = StorageConfig {
            download_dir: PathBuf::from("/dl"),
            search_path: Some(vec![PathBuf::from("/a"), PathBuf::from("/b")]),
            ..StorageConfig::default()
        };

        assert_eq!(
            config.search_dirs(),
            vec![PathBuf::from("/dl"), PathBuf::from("/a"), PathBuf::from("/b")]
        );
    }
}
