//! Constants
//!
//! TigerStyle: Every fixed value in one place, with units in the name.

// =============================================================================
// Buckets
// =============================================================================

/// Bucket holding fixtures anyone can read
pub const PUBLIC_BUCKET: &str = "chromium-telemetry";

/// Bucket holding fixtures restricted to internal accounts
pub const INTERNAL_BUCKET: &str = "chrome-telemetry";

/// Alias accepted wherever a bucket name is expected
pub const PUBLIC_BUCKET_ALIAS: &str = "public";

/// Alias accepted wherever a bucket name is expected
pub const INTERNAL_BUCKET_ALIAS: &str = "internal";

/// URL scheme for remote object addresses
pub const STORAGE_SCHEME: &str = "gs";

// =============================================================================
// Storage Tool
// =============================================================================

/// Name of the storage management executable
pub const TOOL_NAME: &str = "gsutil";

/// Archive fetched when the tool is not installed anywhere
pub const TOOL_DOWNLOAD_URL: &str = "http://storage.googleapis.com/pub/gsutil.tar.gz";

/// Where the bootstrapped tool lives (tilde-expanded)
pub const TOOL_DOWNLOAD_DIR: &str = "~/.cache/cloud-storage/third_party/gsutil";

/// Subdirectory of a search dir holding a vendored copy of the tool
pub const TOOL_VENDORED_SUBDIR: &str = "third_party/gsutil";

/// Flag the vendored copy needs on every invocation
pub const TOOL_VENDORED_FLAG: &str = "--bypass_prodaccess";

/// ACL argument pair for world-readable uploads
pub const ACL_PUBLIC_READ: [&str; 2] = ["-a", "public-read"];

// =============================================================================
// Error Markers
// =============================================================================

/// Stderr prefix emitted when no credentials are configured
pub const MARKER_NO_CREDENTIALS: &str =
    "You are attempting to access protected data with no configured";

/// Stderr substrings signalling an HTTP 403
pub const MARKERS_PERMISSION: [&str; 2] = ["status=403", "status 403"];

/// Stderr prefix signalling a malformed or missing object URI
pub const MARKER_INVALID_URI: &str = "InvalidUriError";

/// Stderr substring signalling a missing object
pub const MARKER_NO_SUCH_OBJECT: &str = "No such object";

// =============================================================================
// Hashing
// =============================================================================

/// Suffix of the sidecar file recording the expected hash
pub const SIDECAR_SUFFIX: &str = ".sha1";

/// Maximum bytes read from a sidecar file
pub const SIDECAR_BYTES_MAX: usize = 1024;

/// Read size when hashing files
pub const HASH_CHUNK_BYTES: usize = 1024 * 1024;

// =============================================================================
// Environment
// =============================================================================

/// Environment variable overriding the public bucket
pub const ENV_PUBLIC_BUCKET: &str = "CLOUD_STORAGE_PUBLIC_BUCKET";

/// Environment variable overriding the internal bucket
pub const ENV_INTERNAL_BUCKET: &str = "CLOUD_STORAGE_INTERNAL_BUCKET";

/// Environment variable overriding the bootstrap URL
pub const ENV_DOWNLOAD_URL: &str = "CLOUD_STORAGE_DOWNLOAD_URL";

/// Environment variable overriding the bootstrap directory
pub const ENV_DOWNLOAD_DIR: &str = "CLOUD_STORAGE_DOWNLOAD_DIR";

/// Environment variable setting the interpreter used to run the tool
pub const ENV_INTERPRETER: &str = "CLOUD_STORAGE_INTERPRETER";
