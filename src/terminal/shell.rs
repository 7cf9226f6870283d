//! Shell execution utilities

use std::path::Path;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::process::Command;

/// Captured result of a shell command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, `None` when killed by a signal
    pub code: Option<i32>,
}

impl ShellOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Output lines for the terminal pane
    pub fn lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self.stdout.lines().map(str::to_string).collect();
        lines.extend(self.stderr.lines().map(|line| format!("[stderr] {}", line)));
        if !self.success() {
            lines.push(self.exit_line());
        }
        lines
    }

    /// Stdout followed by stderr, as one block of text
    pub fn combined(&self) -> String {
        let mut text = format!("{}{}", self.stdout, self.stderr);
        if !self.success() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&self.exit_line());
        }
        text
    }

    fn exit_line(&self) -> String {
        match self.code {
            Some(code) => format!("[exit code: {}]", code),
            None => "[terminated by signal]".to_string(),
        }
    }
}

fn shell_command(command: &str) -> Command {
    #[cfg(windows)]
    {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command]);
        cmd
    }

    #[cfg(not(windows))]
    {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command]);
        cmd
    }
}

/// Run `command` through the platform shell in `cwd` and capture its output
pub async fn run_shell(command: &str, cwd: &Path) -> Result<ShellOutput> {
    tracing::debug!("Running shell command in {}: {}", cwd.display(), command);

    let output = shell_command(command)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .with_context(|| format!("Failed to execute: {}", command))?;

    Ok(ShellOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        code: output.status.code(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(future)
    }

    #[test]
    fn test_shell_execute() {
        let output = block_on(run_shell("echo hello", Path::new("."))).unwrap();
        assert!(output.success());
        assert_eq!(output.stdout.trim(), "hello");
        assert_eq!(output.lines(), vec!["hello".to_string()]);
    }

    #[cfg(not(windows))]
    #[test]
    fn test_shell_failure_reports_exit_code() {
        let output = block_on(run_shell("echo oops >&2; exit 3", Path::new("."))).unwrap();
        assert_eq!(output.code, Some(3));
        assert_eq!(
            output.lines(),
            vec!["[stderr] oops".to_string(), "[exit code: 3]".to_string()]
        );
        assert_eq!(output.combined(), "oops\n[exit code: 3]");
    }

    #[test]
    fn test_runs_in_cwd() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "").unwrap();

        #[cfg(windows)]
        let command = "dir /b";
        #[cfg(not(windows))]
        let command = "ls";

        let output = block_on(run_shell(command, dir.path())).unwrap();
        assert!(output.stdout.contains("marker.txt"));
    }

    #[test]
    fn test_missing_cwd_is_an_error() {
        let result = block_on(run_shell("echo hi", Path::new("/no/such/dir/anywhere")));
        assert!(result.is_err());
    }
}
