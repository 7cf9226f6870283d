//! Argument handling and execution for the `codesmith` command

use std::path::{Path, PathBuf};

use crate::agent::chat::ChatBackend;
use crate::agent::search::SearchBackend;
use crate::agent::{Agent, AgentError, Mode, AGENT_NAME};

pub const USAGE: &str = "\
Usage: codesmith [OPTIONS] PROMPT...

Ask the CodeSmith assistant a question or let it edit a file.

Options:
  -m, --mode <MODE>  coding (default) or qa; qa includes the source files
                     of the current directory
      --edit <FILE>  rewrite FILE according to PROMPT
  -v, --verbose      log requests to stderr
  -h, --help         print this help";

/// Bad command line
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UsageError {
    #[error("missing value for {0}")]
    MissingValue(String),
    #[error("unknown option '{0}'")]
    UnknownOption(String),
    #[error("{0}")]
    InvalidMode(String),
    #[error("a prompt is required")]
    MissingPrompt,
}

/// Parsed `codesmith` arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub mode: Mode,
    pub edit: Option<PathBuf>,
    pub verbose: bool,
    pub prompt: String,
}

/// What the command line asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Help,
    Run(CliArgs),
}

impl CliArgs {
    /// Parse arguments, excluding the program name
    pub fn parse<I, S>(args: I) -> Result<Invocation, UsageError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut mode = Mode::default();
        let mut edit = None;
        let mut verbose = false;
        let mut words: Vec<String> = Vec::new();

        // Options may appear anywhere; everything after `--` is prompt text
        let mut args = args.into_iter().map(Into::into);
        while let Some(arg) = args.next() {
            if !arg.starts_with('-') || arg == "-" {
                words.push(arg);
                continue;
            }

            let (flag, inline) = match arg.split_once('=') {
                Some((flag, value)) if flag.starts_with("--") => (flag.to_string(), Some(value.to_string())),
                _ => (arg.clone(), None),
            };

            match flag.as_str() {
                "-h" | "--help" => return Ok(Invocation::Help),
                "-v" | "--verbose" => verbose = true,
                "-m" | "--mode" => {
                    let value = inline
                        .or_else(|| args.next())
                        .ok_or_else(|| UsageError::MissingValue(flag.clone()))?;
                    mode = value.parse().map_err(UsageError::InvalidMode)?;
                }
                "--edit" => {
                    let value = inline
                        .or_else(|| args.next())
                        .ok_or_else(|| UsageError::MissingValue(flag.clone()))?;
                    edit = Some(PathBuf::from(value));
                }
                "--" => words.extend(args.by_ref()),
                _ => return Err(UsageError::UnknownOption(arg)),
            }
        }

        if words.is_empty() {
            return Err(UsageError::MissingPrompt);
        }

        Ok(Invocation::Run(CliArgs {
            mode,
            edit,
            verbose,
            prompt: words.join(" "),
        }))
    }
}

/// Carry out a parsed invocation and return the line to print
pub async fn execute<C: ChatBackend, S: SearchBackend>(
    agent: &Agent<C, S>,
    args: &CliArgs,
    root: &Path,
) -> Result<String, AgentError> {
    match &args.edit {
        Some(path) => {
            agent.edit_file(path, &args.prompt).await?;
            Ok(format!("{}: Updated {}", AGENT_NAME, path.display()))
        }
        None => {
            let answer = agent.ask(&args.prompt, args.mode, root).await?;
            Ok(format!("{}: {}", AGENT_NAME, answer))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::chat::ChatRequest;
    use crate::agent::search::SearchHit;
    use crate::core::config::AgentConfig;
    use std::future::Future;

    struct FixedChat(&'static str);

    impl ChatBackend for FixedChat {
        fn is_configured(&self) -> bool {
            true
        }

        fn complete(
            &self,
            _request: &ChatRequest,
        ) -> impl Future<Output = Result<String, AgentError>> + Send {
            std::future::ready(Ok(self.0.to_string()))
        }
    }

    struct NoSearch;

    impl SearchBackend for NoSearch {
        fn search(
            &self,
            _query: &str,
            _max_results: usize,
        ) -> impl Future<Output = Result<Vec<SearchHit>, AgentError>> + Send {
            std::future::ready(Ok(Vec::new()))
        }
    }

    fn run_args(args: &[&str]) -> CliArgs {
        match CliArgs::parse(args.iter().copied()).unwrap() {
            Invocation::Run(args) => args,
            Invocation::Help => panic!("expected a run invocation"),
        }
    }

    fn block_on<F: Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(future)
    }

    #[test]
    fn test_parse_joins_prompt_words() {
        let args = run_args(&["how", "do", "I", "sort", "a", "vec"]);
        assert_eq!(args.prompt, "how do I sort a vec");
        assert_eq!(args.mode, Mode::Coding);
        assert_eq!(args.edit, None);
        assert!(!args.verbose);
    }

    #[test]
    fn test_parse_options() {
        let args = run_args(&["-m", "qa", "-v", "--edit", "main.py", "add", "logging"]);
        assert_eq!(args.mode, Mode::Qa);
        assert_eq!(args.edit, Some(PathBuf::from("main.py")));
        assert!(args.verbose);
        assert_eq!(args.prompt, "add logging");

        let args = run_args(&["--mode=qa", "what", "does", "this", "do"]);
        assert_eq!(args.mode, Mode::Qa);
    }

    #[test]
    fn test_trailing_edit_option() {
        let args = run_args(&["fix", "the", "bug", "--edit", "main.py"]);
        assert_eq!(args.edit, Some(PathBuf::from("main.py")));
        assert_eq!(args.prompt, "fix the bug");
    }

    #[test]
    fn test_trailing_mode_option() {
        let args = run_args(&["what", "is", "here", "-m", "qa"]);
        assert_eq!(args.mode, Mode::Qa);
        assert_eq!(args.prompt, "what is here");

        let args = run_args(&["explain", "-v", "this"]);
        assert!(args.verbose);
        assert_eq!(args.prompt, "explain this");
    }

    #[test]
    fn test_double_dash_ends_options() {
        let args = run_args(&["-m", "qa", "--", "what", "does", "-v", "mean"]);
        assert_eq!(args.mode, Mode::Qa);
        assert!(!args.verbose);
        assert_eq!(args.prompt, "what does -v mean");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(CliArgs::parse(Vec::<String>::new()), Err(UsageError::MissingPrompt));
        assert_eq!(CliArgs::parse(["-v"]), Err(UsageError::MissingPrompt));
        assert_eq!(
            CliArgs::parse(["--mode"]),
            Err(UsageError::MissingValue("--mode".to_string()))
        );
        assert!(matches!(
            CliArgs::parse(["-m", "chat", "hi"]),
            Err(UsageError::InvalidMode(_))
        ));
        assert_eq!(
            CliArgs::parse(["--fast", "hi"]),
            Err(UsageError::UnknownOption("--fast".to_string()))
        );
        assert_eq!(CliArgs::parse(["hi", "--help"]), Ok(Invocation::Help));
        assert_eq!(CliArgs::parse(["--help"]), Ok(Invocation::Help));
    }

    #[test]
    fn test_execute_prints_answer() {
        let agent = Agent::new(FixedChat("Use sort()."), NoSearch, &AgentConfig::default());
        let args = run_args(&["sort", "a", "vec"]);
        let line = block_on(execute(&agent, &args, Path::new("."))).unwrap();
        assert_eq!(line, "CodeSmith: Use sort().");
    }

    #[test]
    fn test_execute_edits_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.py");
        std::fs::write(&path, "print('hi')\n").unwrap();

        let agent = Agent::new(FixedChat("print('hello')\n"), NoSearch, &AgentConfig::default());
        let args = run_args(&["--edit", path.to_str().unwrap(), "say", "hello"]);
        let line = block_on(execute(&agent, &args, dir.path())).unwrap();

        assert_eq!(line, format!("CodeSmith: Updated {}", path.display()));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "print('hello')\n");
    }

    #[test]
    fn test_execute_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.py");
        let agent = Agent::new(FixedChat("x"), NoSearch, &AgentConfig::default());
        let args = run_args(&["--edit", path.to_str().unwrap(), "fix"]);
        let err = block_on(execute(&agent, &args, dir.path())).unwrap_err();
        assert!(matches!(err, AgentError::Io { action: "read", .. }));
    }
}
