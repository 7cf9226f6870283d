//! Terminal pane state: command line, history and captured output

pub mod shell;

use std::path::{Path, PathBuf};

use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

pub use shell::{run_shell, ShellOutput};

/// A shell session shown in the terminal pane
#[derive(Debug)]
pub struct TerminalSession {
    /// Current input
    pub input: String,
    output: Vec<String>,
    history: Vec<String>,
    /// History index for navigation
    history_index: Option<usize>,
    cwd: PathBuf,
    running: usize,
    tx: UnboundedSender<Vec<String>>,
    rx: UnboundedReceiver<Vec<String>>,
}

impl Default for TerminalSession {
    fn default() -> Self {
        Self::new(std::env::current_dir().unwrap_or_default())
    }
}

impl TerminalSession {
    /// Create a session rooted at `cwd`
    pub fn new(cwd: PathBuf) -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            input: String::new(),
            output: Vec::new(),
            history: Vec::new(),
            history_index: None,
            cwd,
            running: 0,
            tx,
            rx,
        }
    }

    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Whether a command is still running
    pub fn is_busy(&self) -> bool {
        self.running > 0
    }

    /// Execute the current input; external commands run on `runtime` and
    /// `on_done` fires when their output is ready
    pub fn execute(&mut self, runtime: &Handle, on_done: impl Fn() + Send + 'static) {
        let command = self.input.trim().to_string();
        self.input.clear();
        self.history_index = None;
        if command.is_empty() {
            return;
        }

        self.history.push(command.clone());
        self.output.push(format!("$ {}", command));

        if command == "cd" || command.starts_with("cd ") {
            self.handle_cd(command[2..].trim());
            return;
        }
        if command == "clear" || command == "cls" {
            self.clear_output();
            return;
        }

        self.running += 1;
        let cwd = self.cwd.clone();
        let tx = self.tx.clone();
        runtime.spawn(async move {
            let lines = match run_shell(&command, &cwd).await {
                Ok(output) => output.lines(),
                Err(e) => vec![format!("{:#}", e)],
            };
            let _ = tx.send(lines);
            on_done();
        });
    }

    /// Collect finished command output; returns whether anything arrived
    pub fn poll(&mut self) -> bool {
        let mut received = false;
        while let Ok(lines) = self.rx.try_recv() {
            self.running = self.running.saturating_sub(1);
            self.output.extend(lines);
            received = true;
        }
        received
    }

    fn handle_cd(&mut self, path: &str) {
        let target = if path.is_empty() || path == "~" {
            match directories::UserDirs::new() {
                Some(dirs) => dirs.home_dir().to_path_buf(),
                None => {
                    self.output.push("Home directory not found".to_string());
                    return;
                }
            }
        } else if Path::new(path).is_absolute() {
            PathBuf::from(path)
        } else {
            self.cwd.join(path)
        };

        if target.is_dir() {
            self.cwd = target.canonicalize().unwrap_or(target);
            self.output.push(format!("Changed to: {}", self.cwd.display()));
        } else {
            self.output.push(format!("Directory not found: {}", path));
        }
    }

    /// Clear output
    pub fn clear_output(&mut self) {
        self.output.clear();
    }

    /// Navigate history up
    pub fn history_up(&mut self) {
        if self.history.is_empty() {
            return;
        }

        let new_index = match self.history_index {
            Some(i) if i > 0 => i - 1,
            Some(i) => i,
            None => self.history.len() - 1,
        };

        self.history_index = Some(new_index);
        self.input = self.history[new_index].clone();
    }

    /// Navigate history down
    pub fn history_down(&mut self) {
        let Some(i) = self.history_index else {
            return;
        };

        if i + 1 < self.history.len() {
            self.history_index = Some(i + 1);
            self.input = self.history[i + 1].clone();
        } else {
            self.history_index = None;
            self.input.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::{Duration, Instant};

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap()
    }

    fn submit(session: &mut TerminalSession, runtime: &tokio::runtime::Runtime, command: &str) {
        session.input = command.to_string();
        session.execute(runtime.handle(), || {});
    }

    fn wait_idle(session: &mut TerminalSession) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while session.is_busy() && Instant::now() < deadline {
            session.poll();
            std::thread::sleep(Duration::from_millis(10));
        }
        session.poll();
    }

    #[test]
    fn test_external_command_output() {
        let rt = runtime();
        let mut session = TerminalSession::new(std::env::temp_dir());

        submit(&mut session, &rt, "echo hello");
        assert!(session.is_busy());
        assert!(session.input.is_empty());
        wait_idle(&mut session);

        assert!(!session.is_busy());
        assert_eq!(session.output(), &["$ echo hello".to_string(), "hello".to_string()]);
    }

    #[test]
    fn test_cd_and_clear_builtins() {
        let rt = runtime();
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let mut session = TerminalSession::new(dir.path().to_path_buf());

        submit(&mut session, &rt, "cd sub");
        assert_eq!(
            session.cwd(),
            dir.path().join("sub").canonicalize().unwrap().as_path()
        );
        assert!(!session.is_busy());

        submit(&mut session, &rt, "cd missing");
        assert_eq!(
            session.output().last().map(String::as_str),
            Some("Directory not found: missing")
        );

        submit(&mut session, &rt, "clear");
        assert!(session.output().is_empty());
        assert_eq!(session.history.len(), 3);
    }

    #[test]
    fn test_blank_input_is_ignored() {
        let rt = runtime();
        let mut session = TerminalSession::new(std::env::temp_dir());
        submit(&mut session, &rt, "   ");
        assert!(session.output().is_empty());
        assert!(session.history.is_empty());
    }

    #[test]
    fn test_history_navigation() {
        let rt = runtime();
        let mut session = TerminalSession::new(std::env::temp_dir());
        submit(&mut session, &rt, "clear");
        submit(&mut session, &rt, "cd .");

        session.history_up();
        assert_eq!(session.input, "cd .");
        session.history_up();
        assert_eq!(session.input, "clear");
        session.history_up();
        assert_eq!(session.input, "clear");
        session.history_down();
        assert_eq!(session.input, "cd .");
        session.history_down();
        assert!(session.input.is_empty());
    }
}
