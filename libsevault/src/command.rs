//! External command collaborator.
//!
//! The driver never calls `mount(2)` itself: it asks a [`CommandRunner`] to
//! execute `mount`/`umount` and inspects the structured result.  Tests swap
//! in a recording fake so that no real mount is ever attempted.

use std::io;

use async_trait::async_trait;
use tracing::{debug, instrument};

/// Result of a finished external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Whether the command exited successfully.
    pub success: bool,
    /// Exit code, `None` when the process was killed by a signal.
    pub code: Option<i32>,
    /// Standard output followed by standard error.
    pub output: String,
}

impl CommandOutput {
    /// A successful run with no output.
    pub fn ok() -> Self {
        Self {
            success: true,
            code: Some(0),
            output: String::new(),
        }
    }

    /// A failed run with the given exit code and diagnostic output.
    pub fn failed(code: i32, output: impl Into<String>) -> Self {
        Self {
            success: false,
            code: Some(code),
            output: output.into(),
        }
    }

    /// One-line description of a failure, used in error messages.
    pub fn describe_failure(&self) -> String {
        let status = match self.code {
            Some(code) => format!("exit status {code}"),
            None => "terminated by signal".to_owned(),
        };
        let output = self.output.trim();
        if output.is_empty() {
            status
        } else {
            format!("{status}: {output}")
        }
    }
}

/// Runs an external program to completion.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Execute `program` with `args` and wait for it to exit.
    ///
    /// An `Err` means the process could not be started at all; a non-zero
    /// exit is reported through [`CommandOutput::success`].
    async fn run(&self, program: &str, args: &[String]) -> io::Result<CommandOutput>;
}

/// [`CommandRunner`] that spawns real processes via `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    // Arguments are not recorded: mount options may carry credentials.
    #[instrument(skip(self, args))]
    async fn run(&self, program: &str, args: &[String]) -> io::Result<CommandOutput> {
        let out = tokio::process::Command::new(program)
            .args(args)
            .stdin(std::process::Stdio::null())
            .output()
            .await?;

        let mut output = String::from_utf8_lossy(&out.stdout).into_owned();
        output.push_str(&String::from_utf8_lossy(&out.stderr));

        debug!(code = ?out.status.code(), "command finished");
        Ok(CommandOutput {
            success: out.status.success(),
            code: out.status.code(),
            output,
        })
    }
}
