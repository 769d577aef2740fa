//! Command Runner
//!
//! TigerStyle: Resolve the tool, run one subcommand, and turn its exit
//! status and stderr into a typed result.
//!
//! Classification of a nonzero exit, first match wins:
//!
//! | stderr                                          | error        |
//! |-------------------------------------------------|--------------|
//! | starts with the "no configured credentials" text | Credentials  |
//! | contains `status=403` or `status 403`            | Permission   |
//! | starts with `InvalidUriError`, or `No such object` | NotFound   |
//! | anything else                                    | Command      |

use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;

use crate::constants::{
    MARKERS_PERMISSION, MARKER_INVALID_URI, MARKER_NO_CREDENTIALS, MARKER_NO_SUCH_OBJECT,
};
use crate::error::{StorageError, StorageResult};
use crate::executor::{CommandExecutor, CommandOutput};
use crate::resolver::{ExecutableResolver, Resolution};

/// Runs storage tool subcommands.
pub struct CommandRunner {
    resolver: ExecutableResolver,
    executor: Box<dyn CommandExecutor>,
    interpreter: Option<PathBuf>,
    resolved: OnceCell<Resolution>,
}

impl CommandRunner {
    /// Create a runner. `interpreter`, if set, is the program that runs the tool.
    #[must_use]
    pub fn new(
        resolver: ExecutableResolver,
        executor: impl CommandExecutor + 'static,
        interpreter: Option<PathBuf>,
    ) -> Self {
        Self {
            resolver,
            executor: Box::new(executor),
            interpreter,
            resolved: OnceCell::new(),
        }
    }

    /// The resolved tool, resolving it on first use.
    pub fn resolution(&self) -> StorageResult<&Resolution> {
        self.resolved.get_or_try_init(|| self.resolver.resolve())
    }

    /// Run the tool with `args` and return its stdout.
    pub fn run(&self, args: &[String]) -> StorageResult<String> {
        let resolution = self.resolution()?;

        let mut argv = Vec::with_capacity(args.len() + resolution.extra_args.len() + 1);
        let program = match &self.interpreter {
            Some(interpreter) => {
                argv.push(resolution.path.to_string_lossy().into_owned());
                interpreter.as_path()
            }
            None => resolution.path.as_path(),
        };
        argv.extend(resolution.extra_args.iter().cloned());
        argv.extend(args.iter().cloned());

        tracing::debug!(program = %program.display(), args = ?argv, "Running storage tool");
        let output = self.executor.execute(program, &argv)?;

        check_output(&resolution.path, output)
    }
}

/// Stdout on success, or the classified failure.
pub fn check_output(tool_path: &Path, output: CommandOutput) -> StorageResult<String> {
    if output.is_success() {
        return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
    }
    Err(classify(tool_path, &String::from_utf8_lossy(&output.stderr)))
}

/// Map the stderr of a failed run onto an error.
#[must_use]
pub fn classify(tool_path: &Path, stderr: &str) -> StorageError {
    if stderr.starts_with(MARKER_NO_CREDENTIALS) {
        return StorageError::credentials(tool_path);
    }
    if MARKERS_PERMISSION.iter().any(|m| stderr.contains(m)) {
        return StorageError::permission(tool_path);
    }
    if stderr.starts_with(MARKER_INVALID_URI) || stderr.contains(MARKER_NO_SUCH_OBJECT) {
        return StorageError::NotFound(stderr.to_string());
    }
    StorageError::Command(stderr.to_string())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::error::ErrorKind;
    use std::sync::{Arc, Mutex};
    use tempfile::{tempdir, TempDir};

    /// Returns one canned output and records what it was asked to run.
    #[derive(Clone)]
    struct CannedExecutor {
        output: CommandOutput,
        seen: Arc<Mutex<Vec<(PathBuf, Vec<String>)>>>,
    }

    impl CannedExecutor {
        fn new(output: CommandOutput) -> Self {
            Self {
                output,
                seen: Arc::default(),
            }
        }
    }

    impl CommandExecutor for CannedExecutor {
        fn execute(&self, program: &Path, args: &[String]) -> std::io::Result<CommandOutput> {
            self.seen
                .lock()
                .unwrap()
                .push((program.to_path_buf(), args.to_vec()));
            Ok(self.output.clone())
        }
    }

    fn installed_tool(vendored: bool) -> (TempDir, StorageConfig) {
        let root = tempdir().unwrap();
        let bin = root.path().join("bin");
        let tool = if vendored {
            bin.join("third_party/gsutil/gsutil")
        } else {
            bin.join("gsutil")
        };
        std::fs::create_dir_all(tool.parent().unwrap()).unwrap();
        std::fs::write(&tool, b"").unwrap();

        let config = StorageConfig {
            download_dir: root.path().join("dl/gsutil"),
            search_path: Some(vec![bin]),
            ..StorageConfig::default()
        };
        (root, config)
    }

    fn kind_of(stderr: &str) -> ErrorKind {
        classify(Path::new("gsutil"), stderr).kind()
    }

    #[test]
    fn test_classify_credentials() {
        let stderr = "You are attempting to access protected data with no configured \
                      credentials. Please visit https://cloud.google.com/console";
        assert_eq!(kind_of(stderr), ErrorKind::Credentials);
        // Must be a prefix.
        assert_eq!(kind_of(&format!("warning\n{stderr}")), ErrorKind::Generic);
    }

    #[test]
    fn test_classify_permission() {
        assert_eq!(
            kind_of("Failure: GSResponseError: status=403, code=AccessDenied"),
            ErrorKind::Permission
        );
        assert_eq!(
            kind_of("AccessDeniedException: response status 403"),
            ErrorKind::Permission
        );
    }

    #[test]
    fn test_classify_not_found() {
        assert_eq!(
            kind_of("InvalidUriError: Attempt to get key for \"gs://b/k\" failed."),
            ErrorKind::NotFound
        );
        assert_eq!(
            kind_of("NotFoundException: 404 No such object: b/k"),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_classify_priority() {
        // Credentials beats permission; permission beats not-found.
        let creds = format!("{MARKER_NO_CREDENTIALS} creds, status=403");
        assert_eq!(kind_of(&creds), ErrorKind::Credentials);
        assert_eq!(
            kind_of("InvalidUriError: status 403 No such object"),
            ErrorKind::Permission
        );
    }

    #[test]
    fn test_classify_generic_keeps_text() {
        let err = classify(Path::new("gsutil"), "ServiceException: 503 backend error");
        assert_eq!(err.kind(), ErrorKind::Generic);
        assert!(err.to_string().contains("503 backend error"));
    }

    #[test]
    fn test_permission_regardless_of_exit_code() {
        for code in [1, 2, 127, -1] {
            let out = CommandOutput::failure(code, "status=403");
            let err = check_output(Path::new("gsutil"), out).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Permission, "code={code}");
        }
    }

    #[test]
    fn test_signal_exit_is_failure() {
        let out = CommandOutput {
            status: None,
            stdout: b"partial".to_vec(),
            stderr: b"killed".to_vec(),
        };
        assert!(check_output(Path::new("gsutil"), out).is_err());
    }

    #[test]
    fn test_run_returns_stdout() {
        let (_root, config) = installed_tool(false);
        let executor = CannedExecutor::new(CommandOutput::success("gs://b/a\n"));
        let runner = CommandRunner::new(ExecutableResolver::new(config), executor.clone(), None);

        let stdout = runner.run(&["ls".into(), "gs://b/".into()]).unwrap();

        assert_eq!(stdout, "gs://b/a\n");
        let seen = executor.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].0.ends_with("bin/gsutil"));
        assert_eq!(seen[0].1, vec!["ls".to_string(), "gs://b/".to_string()]);
    }

    #[test]
    fn test_run_prepends_vendored_flag_and_interpreter() {
        let (_root, config) = installed_tool(true);
        let executor = CannedExecutor::new(CommandOutput::success(""));
        let runner = CommandRunner::new(
            ExecutableResolver::new(config),
            executor.clone(),
            Some(PathBuf::from("python")),
        );

        runner.run(&["rm".into(), "gs://b/k".into()]).unwrap();

        let seen = executor.seen.lock().unwrap();
        assert_eq!(seen[0].0, PathBuf::from("python"));
        assert!(seen[0].1[0].ends_with("third_party/gsutil/gsutil"));
        assert_eq!(&seen[0].1[1..], ["--bypass_prodaccess", "rm", "gs://b/k"]);
    }

    #[test]
    fn test_credentials_error_names_resolved_path() {
        let (_root, config) = installed_tool(false);
        let executor = CannedExecutor::new(CommandOutput::failure(
            1,
            format!("{MARKER_NO_CREDENTIALS} credentials."),
        ));
        let runner = CommandRunner::new(ExecutableResolver::new(config), executor, None);

        let err = runner.run(&["ls".into(), "gs://b/".into()]).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Credentials);
        let tool = runner.resolution().unwrap().path.display().to_string();
        assert!(err.remediation().unwrap().contains(&tool));
    }
}
