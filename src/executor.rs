//! Command Executor
//!
//! TigerStyle: Process spawning sits behind a narrow trait so the rest of
//! the client can be tested with canned outputs.
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │        CommandExecutor Trait         │
//! └──────────────────────────────────────┘
//!          ↑                    ↑
//! ┌────────┴───────┐   ┌────────┴───────┐
//! │ SystemExecutor │   │  SimExecutor   │
//! │  (production)  │   │   (testing)    │
//! └────────────────┘   └────────────────┘
//! ```

use std::path::Path;
use std::process::Command;

/// Captured result of one finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` if the process was killed by a signal
    pub status: Option<i32>,
    /// Everything written to stdout
    pub stdout: Vec<u8>,
    /// Everything written to stderr
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    /// A zero exit with the given stdout.
    #[must_use]
    pub fn success(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: Vec::new(),
        }
    }

    /// A nonzero exit with the given stderr.
    #[must_use]
    pub fn failure(code: i32, stderr: impl Into<Vec<u8>>) -> Self {
        // Precondition
        assert!(code != 0, "failure exit code must be nonzero");

        Self {
            status: Some(code),
            stdout: Vec::new(),
            stderr: stderr.into(),
        }
    }

    /// True only for exit code zero.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Runs a program to completion and captures its output.
pub trait CommandExecutor: Send + Sync {
    /// Run `program` with `args`, blocking until it exits.
    fn execute(&self, program: &Path, args: &[String]) -> std::io::Result<CommandOutput>;
}

/// Executor that spawns real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

impl CommandExecutor for SystemExecutor {
    fn execute(&self, program: &Path, args: &[String]) -> std::io::Result<CommandOutput> {
        let output = Command::new(program).args(args).output()?;
        Ok(CommandOutput {
            status: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
