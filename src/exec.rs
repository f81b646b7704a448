//! External process execution.
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Output, Stdio};

/// Result of a command execution.
#[derive(Debug)]
pub struct ExecResult {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Whether the process exited with status zero.
    pub success: bool,
    /// Exit code, `None` when killed by a signal.
    pub code: Option<i32>,
}

impl ExecResult {
    /// The most useful diagnostic text: trimmed stderr, or stdout when
    /// stderr is empty.
    #[must_use]
    pub fn message(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim().to_string()
        } else {
            stderr.to_string()
        }
    }
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

/// Run a command in `dir`, capturing its output.  A non-zero exit is
/// reported through [`ExecResult::success`], not as an error.
///
/// # Errors
///
/// Returns an error if the process cannot be spawned.
pub fn run_in<P, A>(dir: &Path, program: P, args: &[A]) -> io::Result<ExecResult>
where
    P: AsRef<OsStr>,
    A: AsRef<OsStr>,
{
    tracing::debug!(
        "exec in {}: {} {}",
        dir.display(),
        program.as_ref().to_string_lossy(),
        args.iter()
            .map(|a| a.as_ref().to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    );
    Command::new(program)
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .output()
        .map(ExecResult::from)
}

/// Run a command in `dir` with the terminal attached, so it can prompt
/// and print progress directly.
///
/// # Errors
///
/// Returns an error if the process cannot be spawned.
pub fn run_interactive<P, A>(dir: &Path, program: P, args: &[A]) -> io::Result<ExitStatus>
where
    P: AsRef<OsStr>,
    A: AsRef<OsStr>,
{
    Command::new(program)
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
}

/// Locate a program on `PATH`.
#[must_use]
pub fn which(program: &str) -> Option<PathBuf> {
    which::which(program).ok()
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn run_in_captures_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let result = run_in(dir.path(), "echo", &["hello"]).unwrap();
        assert!(result.success, "echo command should succeed");
        assert_eq!(result.stdout.trim(), "hello");
    }

    #[test]
    fn run_in_uses_directory() {
        let dir = tempfile::tempdir().unwrap();
        let result = run_in(dir.path(), "pwd", &[] as &[&str]).unwrap();
        let expected = dunce::canonicalize(dir.path()).unwrap();
        assert_eq!(PathBuf::from(result.stdout.trim()), expected);
    }

    #[test]
    fn run_in_failure_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = run_in(dir.path(), "sh", &["-c", "echo oops >&2; exit 3"]).unwrap();
        assert!(!result.success, "non-zero exit should set success=false");
        assert_eq!(result.code, Some(3));
        assert_eq!(result.message(), "oops");
    }

    #[test]
    fn run_in_missing_program_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run_in(dir.path(), "this-program-does-not-exist-12345", &["x"]).is_err());
    }

    #[test]
    fn run_interactive_reports_status() {
        let dir = tempfile::tempdir().unwrap();
        let status = run_interactive(dir.path(), "sh", &["-c", "exit 2"]).unwrap();
        assert_eq!(status.code(), Some(2));
    }

    #[test]
    fn which_finds_known_program() {
        assert!(which("sh").is_some(), "sh should be found on Unix");
    }

    #[test]
    fn which_missing_program() {
        assert!(
            which("this-program-does-not-exist-12345").is_none(),
            "non-existent program should not be found"
        );
    }
}
