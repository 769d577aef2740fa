//! SimExecutor - Simulated Storage Tool
//!
//! TigerStyle: Simulation-first testing. The simulator answers `ls`, `cp`
//! and `rm` the way the real tool does, over in-memory buckets, and can be
//! told to fail the next invocations with canned stderr.
//!
//! Clones share state, so a test can hand one clone to the client and
//! inspect the other.
//!
//! # Usage
//!
//! ```rust
//! use cloud_storage::sim::SimExecutor;
//!
//! let sim = SimExecutor::new().with_bucket("fixtures");
//! sim.put_object("fixtures", "a/b", b"data");
//! assert!(sim.object("fixtures", "a/b").is_some());
//! ```

use std::collections::{BTreeMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::constants::{ACL_PUBLIC_READ, STORAGE_SCHEME};
use crate::executor::{CommandExecutor, CommandOutput};

/// A stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimObject {
    /// Object bytes
    pub data: Vec<u8>,
    /// Uploaded with a public-read ACL
    pub public_read: bool,
}

#[derive(Debug, Default)]
struct SimState {
    buckets: BTreeMap<String, BTreeMap<String, SimObject>>,
    faults: VecDeque<CommandOutput>,
    calls: Vec<Vec<String>>,
}

/// In-memory stand-in for the storage tool.
#[derive(Debug, Clone, Default)]
pub struct SimExecutor {
    state: Arc<Mutex<SimState>>,
}

impl SimExecutor {
    /// Simulator with no buckets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty bucket.
    #[must_use]
    pub fn with_bucket(self, bucket: &str) -> Self {
        self.lock().buckets.entry(bucket.to_string()).or_default();
        self
    }

    /// Store an object directly, creating the bucket if needed.
    pub fn put_object(&self, bucket: &str, key: &str, data: &[u8]) {
        self.lock().buckets.entry(bucket.to_string()).or_default().insert(
            key.to_string(),
            SimObject {
                data: data.to_vec(),
                public_read: false,
            },
        );
    }

    /// Look up an object.
    #[must_use]
    pub fn object(&self, bucket: &str, key: &str) -> Option<SimObject> {
        self.lock().buckets.get(bucket)?.get(key).cloned()
    }

    /// Make the next invocation return `output` instead of running.
    ///
    /// Faults queue up and are consumed one per invocation.
    pub fn inject_failure(&self, output: CommandOutput) {
        self.lock().faults.push_back(output);
    }

    /// Every invocation so far, as the argument list the tool received.
    #[must_use]
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        // A panicking test thread must not hide the state from the others.
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl CommandExecutor for SimExecutor {
    fn execute(&self, _program: &Path, args: &[String]) -> std::io::Result<CommandOutput> {
        let mut state = self.lock();
        state.calls.push(args.to_vec());

        if let Some(fault) = state.faults.pop_front() {
            return Ok(fault);
        }

        // Skip the script path (interpreter mode) and installation flags.
        let args: Vec<&str> = args
            .iter()
            .map(String::as_str)
            .skip_while(|a| a.starts_with("--") || Path::new(a).is_absolute())
            .collect();

        let output = match args.as_slice() {
            ["ls", url] => state.ls(url),
            ["rm", url] => state.rm(url),
            ["cp", acl_flag, acl, src, dst] if [*acl_flag, *acl] == ACL_PUBLIC_READ => {
                state.cp(src, dst, true)?
            }
            ["cp", src, dst] => state.cp(src, dst, false)?,
            _ => CommandOutput::failure(
                1,
                format!("CommandException: Invalid command: {}\n", args.join(" ")),
            ),
        };
        Ok(output)
    }
}

impl SimState {
    fn ls(&self, url: &str) -> CommandOutput {
        let Some((bucket, key)) = parse_url(url) else {
            return invalid_uri(url);
        };
        let Some(objects) = self.buckets.get(bucket) else {
            return bucket_not_found(bucket);
        };

        if key.is_empty() {
            let listing: String = objects
                .keys()
                .map(|k| format!("{STORAGE_SCHEME}://{bucket}/{k}\n"))
                .collect();
            return CommandOutput::success(listing);
        }

        if objects.contains_key(key) {
            CommandOutput::success(format!("{url}\n"))
        } else {
            no_such_object(bucket, key)
        }
    }

    fn rm(&mut self, url: &str) -> CommandOutput {
        let Some((bucket, key)) = parse_url(url) else {
            return invalid_uri(url);
        };
        let Some(objects) = self.buckets.get_mut(bucket) else {
            return bucket_not_found(bucket);
        };

        if objects.remove(key).is_some() {
            CommandOutput::success(String::new())
        } else {
            no_such_object(bucket, key)
        }
    }

    fn cp(&mut self, src: &str, dst: &str, public_read: bool) -> std::io::Result<CommandOutput> {
        match (parse_url(src), parse_url(dst)) {
            (Some((bucket, key)), None) => {
                let Some(object) = self.buckets.get(bucket).and_then(|b| b.get(key)) else {
                    return Ok(no_such_object(bucket, key));
                };
                std::fs::write(dst, &object.data)?;
                Ok(CommandOutput::success(String::new()))
            }
            (None, Some((bucket, key))) => {
                let data = match std::fs::read(src) {
                    Ok(data) => data,
                    Err(_) => {
                        return Ok(CommandOutput::failure(
                            1,
                            format!("CommandException: No URLs matched: {src}\n"),
                        ))
                    }
                };
                let Some(objects) = self.buckets.get_mut(bucket) else {
                    return Ok(bucket_not_found(bucket));
                };
                objects.insert(key.to_string(), SimObject { data, public_read });
                Ok(CommandOutput::success(String::new()))
            }
            _ => Ok(CommandOutput::failure(
                1,
                "CommandException: copying between two local or two cloud URLs is not supported\n",
            )),
        }
    }
}

/// Split `gs://bucket/key` into `(bucket, key)`; `key` may be empty.
fn parse_url(url: &str) -> Option<(&str, &str)> {
    let rest = url.strip_prefix(STORAGE_SCHEME)?.strip_prefix("://")?;
    match rest.split_once('/') {
        Some((bucket, key)) if !bucket.is_empty() => Some((bucket, key)),
        None if !rest.is_empty() => Some((rest, "")),
        _ => None,
    }
}

fn invalid_uri(url: &str) -> CommandOutput {
    CommandOutput::failure(1, format!("InvalidUriError: {url}\n"))
}

fn no_such_object(bucket: &str, key: &str) -> CommandOutput {
    CommandOutput::failure(1, format!("NotFoundException: 404 No such object: {bucket}/{key}\n"))
}

fn bucket_not_found(bucket: &str) -> CommandOutput {
    CommandOutput::failure(
        1,
        format!("BucketNotFoundException: 404 {STORAGE_SCHEME}://{bucket} bucket does not exist.\n"),
    )
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn run(sim: &SimExecutor, args: &[&str]) -> CommandOutput {
        let args: Vec<String> = args.iter().map(|a| (*a).to_string()).collect();
        sim.execute(Path::new("gsutil"), &args).unwrap()
    }

    #[test]
    fn test_parse_url() {
        assert_eq!(parse_url("gs://b/a/c"), Some(("b", "a/c")));
        assert_eq!(parse_url("gs://b/"), Some(("b", "")));
        assert_eq!(parse_url("gs://b"), Some(("b", "")));
        assert_eq!(parse_url("/tmp/file"), None);
        assert_eq!(parse_url("gs:///k"), None);
    }

    #[test]
    fn test_ls_lists_full_urls() {
        let sim = SimExecutor::new();
        sim.put_object("b", "x", b"1");
        sim.put_object("b", "y/z", b"2");

        let out = run(&sim, &["ls", "gs://b/"]);

        assert!(out.is_success());
        assert_eq!(out.stdout, b"gs://b/x\ngs://b/y/z\n");
    }

    #[test]
    fn test_missing_object_and_bucket() {
        let sim = SimExecutor::new().with_bucket("b");

        let out = run(&sim, &["ls", "gs://b/nope"]);
        assert!(String::from_utf8_lossy(&out.stderr).contains("No such object"));

        let out = run(&sim, &["rm", "gs://other/nope"]);
        assert!(String::from_utf8_lossy(&out.stderr).starts_with("BucketNotFoundException"));
    }

    #[test]
    fn test_skips_installation_flags() {
        let sim = SimExecutor::new().with_bucket("b");
        let out = run(&sim, &["--bypass_prodaccess", "ls", "gs://b/"]);
        assert!(out.is_success());
    }

    #[test]
    fn test_faults_consumed_in_order() {
        let sim = SimExecutor::new().with_bucket("b");
        sim.inject_failure(CommandOutput::failure(1, "status=403"));

        assert_eq!(run(&sim, &["ls", "gs://b/"]).stderr, b"status=403");
        assert!(run(&sim, &["ls", "gs://b/"]).is_success());
        assert_eq!(sim.calls().len(), 2);
    }

    #[test]
    fn test_unknown_command() {
        let sim = SimExecutor::new();
        assert!(!run(&sim, &["mb", "gs://b"]).is_success());
    }
}
