//! Errors
//!
//! TigerStyle: One error enum, tagged by kind so callers can match on the
//! failure class without string sniffing.

use std::path::{Path, PathBuf};

/// Failure class of a storage operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No credentials are configured for the tool
    Credentials,
    /// Credentials exist but lack access to the object
    Permission,
    /// The object or URI does not exist
    NotFound,
    /// Anything else
    Generic,
}

/// Storage client errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No credentials are configured
    #[error(
        "attempted to access a file from cloud storage but you have no configured credentials. {remediation}"
    )]
    Credentials {
        /// How to configure them
        remediation: String,
    },

    /// The configured account cannot access the object
    #[error(
        "attempted to access a file from cloud storage but you don't have permission. {remediation}"
    )]
    Permission {
        /// How to reconfigure
        remediation: String,
    },

    /// Object or URI does not exist; carries the tool's stderr
    #[error("not found: {0}")]
    NotFound(String),

    /// Unrecognized tool failure; carries the tool's stderr
    #[error("cloud storage error: {0}")]
    Command(String),

    /// Local filesystem or process spawn failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Tool download or extraction failed
    #[error("failed to bootstrap storage tool: {0}")]
    Bootstrap(String),

    /// Sidecar hash file is unreadable as text
    #[error("invalid hash file {}: {reason}", path.display())]
    InvalidSidecar {
        /// Sidecar path
        path: PathBuf,
        /// What was wrong
        reason: String,
    },

    /// Bad configuration
    #[error("config error: {0}")]
    Config(String),
}

/// Result alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    /// Missing credentials, with instructions pointing at `tool_path`.
    #[must_use]
    pub fn credentials(tool_path: &Path) -> Self {
        Self::Credentials {
            remediation: config_instructions(tool_path),
        }
    }

    /// Access denied, with instructions pointing at `tool_path`.
    #[must_use]
    pub fn permission(tool_path: &Path) -> Self {
        Self::Permission {
            remediation: config_instructions(tool_path),
        }
    }

    /// The failure class.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Credentials { .. } => ErrorKind::Credentials,
            Self::Permission { .. } => ErrorKind::Permission,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Command(_)
            | Self::Io(_)
            | Self::Bootstrap(_)
            | Self::InvalidSidecar { .. }
            | Self::Config(_) => ErrorKind::Generic,
        }
    }

    /// Steps a human can take to fix the failure, if any.
    #[must_use]
    pub fn remediation(&self) -> Option<&str> {
        match self {
            Self::Credentials { remediation } | Self::Permission { remediation } => {
                Some(remediation.as_str())
            }
            _ => None,
        }
    }

    /// True for [`ErrorKind::NotFound`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

fn config_instructions(tool_path: &Path) -> String {
    format!(
        "To configure your credentials:\n  \
         1. Run \"{} config\" and follow its instructions.\n  \
         2. If you have a @google.com account, use that account.\n  \
         3. For the project-id, just enter 0.",
        tool_path.display()
    )
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remediation_names_tool_path() {
        let err = StorageError::credentials(Path::new("/opt/gsutil/gsutil"));

        assert_eq!(err.kind(), ErrorKind::Credentials);
        let remediation = err.remediation().unwrap();
        assert!(remediation.contains("Run \"/opt/gsutil/gsutil config\""));
        assert!(err.to_string().contains("no configured credentials"));
    }

    #[test]
    fn test_kinds() {
        assert_eq!(
            StorageError::permission(Path::new("gsutil")).kind(),
            ErrorKind::Permission
        );
        assert!(StorageError::NotFound("gone".into()).is_not_found());
        assert_eq!(StorageError::Command("boom".into()).kind(), ErrorKind::Generic);
        assert_eq!(
            StorageError::Bootstrap("offline".into()).kind(),
            ErrorKind::Generic
        );
        assert!(StorageError::NotFound("gone".into()).remediation().is_none());
    }
}
