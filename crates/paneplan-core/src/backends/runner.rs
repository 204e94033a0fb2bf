//! Process execution seam between backend drivers and the operating system.

use std::path::PathBuf;
use std::process::Command;

use tracing::debug;

use crate::escape::render_command_line;
use crate::executor::errors::ExecutionError;

/// Captured result of one subprocess.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(exit_code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Last non-empty line of stdout, trimmed.
    pub fn last_line(&self) -> Option<&str> {
        self.stdout
            .lines()
            .map(str::trim)
            .rfind(|line| !line.is_empty())
    }
}

/// Runs external programs and inspects the host environment.
pub trait CommandRunner {
    /// Run `program` with `args` to completion. Only a failure to start the process is an
    /// error here; a non-zero exit is reported through [`CommandOutput::exit_code`].
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, ExecutionError>;

    /// Full path of `program` if it is on `PATH`.
    fn locate(&self, program: &str) -> Option<PathBuf>;

    fn env_var(&self, key: &str) -> Option<String>;
}

impl<T: CommandRunner + ?Sized> CommandRunner for &T {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, ExecutionError> {
        (**self).run(program, args)
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        (**self).locate(program)
    }

    fn env_var(&self, key: &str) -> Option<String> {
        (**self).env_var(key)
    }
}

/// Runs real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, ExecutionError> {
        debug!(
            event = "core.backend.process_started",
            program = program,
            args = ?args
        );

        let output = Command::new(program).args(args).output().map_err(|e| {
            ExecutionError::ProcessSpawnFailed {
                path: String::new(),
                command: program.to_string(),
                message: e.to_string(),
            }
        })?;

        let result = CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        };

        debug!(
            event = "core.backend.process_completed",
            program = program,
            exit_code = ?result.exit_code
        );

        Ok(result)
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }

    fn env_var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    }
}

/// Run a command and turn a non-zero exit into [`ExecutionError::TerminalCommandFailed`].
pub(crate) fn run_checked<R: CommandRunner + ?Sized>(
    runner: &R,
    program: &str,
    args: &[String],
) -> Result<CommandOutput, ExecutionError> {
    let output = runner.run(program, args)?;
    if output.is_success() {
        return Ok(output);
    }

    let mut argv = Vec::with_capacity(args.len() + 1);
    argv.push(program.to_string());
    argv.extend(args.iter().cloned());

    Err(ExecutionError::TerminalCommandFailed {
        path: String::new(),
        command: render_command_line(&argv),
        stderr: output.stderr,
        exit_code: output.exit_code,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_line_skips_trailing_blanks() {
        let output = CommandOutput::success("%1\n%7\n\n  \n");
        assert_eq!(output.last_line(), Some("%7"));
        assert_eq!(CommandOutput::success("\n").last_line(), None);
    }

    #[test]
    fn test_system_runner_reports_spawn_failure() {
        let error = SystemRunner
            .run("paneplan-definitely-not-a-binary", &[])
            .unwrap_err();
        assert!(matches!(error, ExecutionError::ProcessSpawnFailed { .. }));
    }

    #[test]
    fn test_env_var_ignores_empty_values() {
        temp_env::with_vars(
            [("PANEPLAN_TEST_EMPTY", Some("")), ("PANEPLAN_TEST_SET", Some("x"))],
            || {
                assert_eq!(SystemRunner.env_var("PANEPLAN_TEST_EMPTY"), None);
                assert_eq!(SystemRunner.env_var("PANEPLAN_TEST_SET").as_deref(), Some("x"));
            },
        );
    }
}
