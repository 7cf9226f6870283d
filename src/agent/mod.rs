//! CodeSmith, the AI coding assistant shared by the editor and the CLI
//!
//! Every request goes through the same pipeline: the model first condenses
//! the user's text into a web search query, the query is run against the
//! search backend, and the results are attached to the final request.

pub mod chat;
pub mod prompt;
pub mod search;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chat::{ChatBackend, OpenAiClient};
use search::{SearchBackend, YacyClient};

use crate::core::config::AgentConfig;

/// Display name of the assistant
pub const AGENT_NAME: &str = "CodeSmith";

/// Errors surfaced by the assistant
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("OpenAI API key not configured. Set it through the CodeSmith settings in the editor.")]
    MissingApiKey,
    #[error("API request failed ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Unexpected response: {0}")]
    MalformedResponse(String),
    #[error("Failed to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What kind of answer the assistant should give
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// General coding help
    #[default]
    Coding,
    /// Questions about the repository in the working directory
    Qa,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "coding" => Ok(Mode::Coding),
            "qa" => Ok(Mode::Qa),
            other => Err(format!("invalid mode '{}' (choose 'coding' or 'qa')", other)),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Coding => write!(f, "coding"),
            Mode::Qa => write!(f, "qa"),
        }
    }
}

/// The assistant, generic over its two remote services
#[derive(Debug, Clone)]
pub struct Agent<C, S> {
    chat: C,
    search: S,
    model: String,
    max_search_results: usize,
    source_extensions: Vec<String>,
}

/// The assistant wired to the OpenAI and YaCy HTTP clients
pub type CodeSmith = Agent<OpenAiClient, YacyClient>;

impl CodeSmith {
    /// Build the HTTP-backed assistant from settings
    pub fn from_config(
        http: reqwest::Client,
        config: &AgentConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let chat = OpenAiClient::from_config(http.clone(), config, &env);
        let search = YacyClient::new(http, config.resolve_search_url(&env));
        Agent::new(chat, search, config)
    }
}

impl<C: ChatBackend, S: SearchBackend> Agent<C, S> {
    pub fn new(chat: C, search: S, config: &AgentConfig) -> Self {
        Self {
            chat,
            search,
            model: config.model.clone(),
            max_search_results: config.max_search_results,
            source_extensions: config.source_extensions.clone(),
        }
    }

    /// Whether an API key is available
    pub fn is_configured(&self) -> bool {
        self.chat.is_configured()
    }

    fn ensure_configured(&self) -> Result<(), AgentError> {
        if self.is_configured() {
            Ok(())
        } else {
            Err(AgentError::MissingApiKey)
        }
    }

    /// Let the model phrase a search query; falls back to the prompt itself
    pub async fn create_search_query(&self, prompt: &str) -> String {
        if !self.is_configured() {
            return prompt.to_string();
        }

        let request = prompt::search_query_request(&self.model, prompt);
        match self.chat.complete(&request).await {
            Ok(query) if !query.trim().is_empty() => query.trim().to_string(),
            Ok(_) => prompt.to_string(),
            Err(e) => {
                tracing::debug!("Search query generation failed: {}", e);
                prompt.to_string()
            }
        }
    }

    /// Run a web search and render the hits; failures are rendered too
    pub async fn web_search(&self, query: &str) -> String {
        match self.search.search(query, self.max_search_results).await {
            Ok(hits) => search::format_hits(&hits, self.max_search_results),
            Err(e) => {
                tracing::warn!("Web search failed: {}", e);
                format!("Web search failed: {}", e)
            }
        }
    }

    async fn research(&self, text: &str) -> (String, String) {
        let query = self.create_search_query(text).await;
        let results = self.web_search(&query).await;
        (query, results)
    }

    /// Answer a prompt; `Qa` mode includes the source files under `root`
    pub async fn ask(&self, prompt: &str, mode: Mode, root: &Path) -> Result<String, AgentError> {
        self.ensure_configured()?;

        let (query, results) = self.research(prompt).await;
        let codebase = match mode {
            Mode::Qa => Some(prompt::gather_codebase(root, &self.source_extensions)),
            Mode::Coding => None,
        };

        let request =
            prompt::ask_request(&self.model, prompt, mode, &query, &results, codebase.as_deref());
        let answer = self.chat.complete(&request).await?;
        Ok(answer.trim().to_string())
    }

    /// Rewrite `content` according to `instructions`
    pub async fn edit_text(&self, content: &str, instructions: &str) -> Result<String, AgentError> {
        self.ensure_configured()?;

        let (query, results) = self.research(instructions).await;
        let request = prompt::edit_request(&self.model, content, instructions, &query, &results);
        self.chat.complete(&request).await
    }

    /// Rewrite a file in place
    pub async fn edit_file(&self, path: &Path, instructions: &str) -> Result<(), AgentError> {
        self.ensure_configured()?;

        let original = std::fs::read_to_string(path).map_err(|source| AgentError::Io {
            action: "read",
            path: path.to_path_buf(),
            source,
        })?;

        let updated = self.edit_text(&original, instructions).await?;

        std::fs::write(path, updated).map_err(|source| AgentError::Io {
            action: "write",
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!("{} updated {}", AGENT_NAME, path.display());
        Ok(())
    }

    /// Completion candidates for `prefix`; empty when anything goes wrong
    pub async fn suggest_completions(&self, context: &str, prefix: &str) -> Vec<String> {
        if !self.is_configured() {
            return Vec::new();
        }

        let request = prompt::completion_request(&self.model, context, prefix);
        match self.chat.complete(&request).await {
            Ok(text) => text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && line.starts_with(prefix))
                .map(str::to_string)
                .collect(),
            Err(e) => {
                tracing::debug!("Completion request failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Ask for a shell command that accomplishes `task`
    pub async fn suggest_command(&self, task: &str, root: &Path) -> Result<String, AgentError> {
        let answer = self
            .ask(&prompt::command_prompt(task), Mode::Coding, root)
            .await?;
        Ok(prompt::strip_code_fence(&answer))
    }
}

#[cfg(test)]
mod tests {
    use super::chat::ChatRequest;
    use super::search::SearchHit;
    use super::*;

    use std::collections::VecDeque;
    use std::future::Future;
    use std::sync::Mutex;

    struct ScriptedChat {
        configured: bool,
        replies: Mutex<VecDeque<Result<String, AgentError>>>,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedChat {
        fn new(replies: Vec<Result<String, AgentError>>) -> Self {
            Self {
                configured: true,
                replies: Mutex::new(replies.into()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn unconfigured() -> Self {
            Self {
                configured: false,
                ..Self::new(Vec::new())
            }
        }

        fn user_message(&self, index: usize) -> String {
            self.seen.lock().unwrap()[index].messages[1].content.clone()
        }

        fn request_count(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    impl ChatBackend for ScriptedChat {
        fn is_configured(&self) -> bool {
            self.configured
        }

        fn complete(
            &self,
            request: &ChatRequest,
        ) -> impl Future<Output = Result<String, AgentError>> + Send {
            self.seen.lock().unwrap().push(request.clone());
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AgentError::MalformedResponse("no scripted reply".into())));
            std::future::ready(reply)
        }
    }

    struct StaticSearch(Result<Vec<SearchHit>, String>);

    impl SearchBackend for StaticSearch {
        fn search(
            &self,
            _query: &str,
            max_results: usize,
        ) -> impl Future<Output = Result<Vec<SearchHit>, AgentError>> + Send {
            let result = match &self.0 {
                Ok(hits) => Ok(hits.iter().take(max_results).cloned().collect()),
                Err(msg) => Err(AgentError::MalformedResponse(msg.clone())),
            };
            std::future::ready(result)
        }
    }

    fn hits() -> StaticSearch {
        StaticSearch(Ok(vec![SearchHit {
            title: "Vec::sort".to_string(),
            link: "https://doc.rust-lang.org/std/vec/struct.Vec.html".to_string(),
            snippet: "Sorts the slice.".to_string(),
        }]))
    }

    fn agent<S: SearchBackend>(chat: ScriptedChat, search: S) -> Agent<ScriptedChat, S> {
        Agent::new(chat, search, &AgentConfig::default())
    }

    fn block_on<F: Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(future)
    }

    fn api_error() -> AgentError {
        AgentError::Api {
            status: 500,
            body: "boom".to_string(),
        }
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("coding".parse::<Mode>(), Ok(Mode::Coding));
        assert_eq!("qa".parse::<Mode>(), Ok(Mode::Qa));
        assert!("chat".parse::<Mode>().is_err());
        assert_eq!(Mode::Qa.to_string(), "qa");
    }

    #[test]
    fn test_ask_uses_generated_query_and_results() {
        let chat = ScriptedChat::new(vec![
            Ok("  rust sort vec  ".to_string()),
            Ok("  Use `v.sort()`.\n".to_string()),
        ]);
        let agent = agent(chat, hits());

        let answer = block_on(agent.ask("how to sort", Mode::Coding, Path::new("."))).unwrap();
        assert_eq!(answer, "Use `v.sort()`.");

        let user = agent.chat.user_message(1);
        assert!(user.starts_with("Search query: rust sort vec\n"));
        assert!(user.contains("Vec::sort - https://doc.rust-lang.org"));
        assert!(user.ends_with("Prompt: how to sort"));
    }

    #[test]
    fn test_query_failure_falls_back_to_prompt() {
        let chat = ScriptedChat::new(vec![Err(api_error()), Ok("answer".to_string())]);
        let agent = agent(chat, hits());

        let answer = block_on(agent.ask("original prompt", Mode::Coding, Path::new("."))).unwrap();
        assert_eq!(answer, "answer");
        assert!(agent
            .chat
            .user_message(1)
            .starts_with("Search query: original prompt\n"));
    }

    #[test]
    fn test_search_failure_is_rendered() {
        let chat = ScriptedChat::new(vec![Ok("q".to_string()), Ok("a".to_string())]);
        let agent = agent(chat, StaticSearch(Err("connection refused".to_string())));

        block_on(agent.ask("p", Mode::Coding, Path::new("."))).unwrap();
        assert!(agent
            .chat
            .user_message(1)
            .contains("Web search failed: Unexpected response: connection refused"));
    }

    #[test]
    fn test_missing_key_stops_before_requests() {
        let agent = agent(ScriptedChat::unconfigured(), hits());

        let err = block_on(agent.ask("p", Mode::Coding, Path::new("."))).unwrap_err();
        assert!(matches!(err, AgentError::MissingApiKey));
        assert!(err.to_string().contains("API key not configured"));
        assert_eq!(agent.chat.request_count(), 0);
    }

    #[test]
    fn test_api_error_is_visible() {
        let chat = ScriptedChat::new(vec![Ok("q".to_string()), Err(api_error())]);
        let agent = agent(chat, hits());

        let err = block_on(agent.ask("p", Mode::Coding, Path::new("."))).unwrap_err();
        assert_eq!(err.to_string(), "API request failed (500): boom");
    }

    #[test]
    fn test_qa_mode_sends_repository() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app.py"), "def run(): pass").unwrap();

        let chat = ScriptedChat::new(vec![Ok("q".to_string()), Ok("It defines run.".to_string())]);
        let agent = agent(chat, hits());

        let answer = block_on(agent.ask("what is here?", Mode::Qa, dir.path())).unwrap();
        assert_eq!(answer, "It defines run.");
        let user = agent.chat.user_message(1);
        assert!(user.starts_with("Repository contents:\nFile: "));
        assert!(user.contains("def run(): pass"));
    }

    #[test]
    fn test_edit_file_overwrites_with_response() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.py");
        std::fs::write(&path, "x = 1\n").unwrap();

        let chat = ScriptedChat::new(vec![Ok("q".to_string()), Ok("y = 1\n".to_string())]);
        let agent = agent(chat, hits());

        block_on(agent.edit_file(&path, "rename x to y")).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "y = 1\n");
        assert!(agent.chat.user_message(1).contains("Current file contents:\nx = 1\n"));
    }

    #[test]
    fn test_edit_file_keeps_file_on_api_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.py");
        std::fs::write(&path, "x = 1\n").unwrap();

        let chat = ScriptedChat::new(vec![Ok("q".to_string()), Err(api_error())]);
        let agent = agent(chat, hits());

        assert!(block_on(agent.edit_file(&path, "anything")).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "x = 1\n");
    }

    #[test]
    fn test_edit_missing_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.py");
        let agent = agent(ScriptedChat::new(Vec::new()), hits());

        let err = block_on(agent.edit_file(&path, "anything")).unwrap_err();
        assert!(err.to_string().starts_with("Failed to read "));
        assert!(err.to_string().contains("absent.py"));
        assert_eq!(agent.chat.request_count(), 0);
    }

    #[test]
    fn test_suggest_completions_filters_by_prefix() {
        let chat = ScriptedChat::new(vec![Ok("process_items\n  processed \nother\n\n".to_string())]);
        let agent = agent(chat, hits());

        let found = block_on(agent.suggest_completions("items = []\nproc", "proc"));
        assert_eq!(found, vec!["process_items".to_string(), "processed".to_string()]);
    }

    #[test]
    fn test_suggest_completions_swallows_errors() {
        let agent = agent(ScriptedChat::new(vec![Err(api_error())]), hits());
        assert!(block_on(agent.suggest_completions("ctx", "pre")).is_empty());

        let agent = agent_unconfigured();
        assert!(block_on(agent.suggest_completions("ctx", "pre")).is_empty());
        assert_eq!(agent.chat.request_count(), 0);
    }

    fn agent_unconfigured() -> Agent<ScriptedChat, StaticSearch> {
        agent(ScriptedChat::unconfigured(), hits())
    }

    #[test]
    fn test_suggest_command_strips_fence() {
        let chat = ScriptedChat::new(vec![
            Ok("list files".to_string()),
            Ok("```bash\nls -la\n```".to_string()),
        ]);
        let agent = agent(chat, hits());

        let command = block_on(agent.suggest_command("list all files", Path::new("."))).unwrap();
        assert_eq!(command, "ls -la");
        assert!(agent
            .chat
            .user_message(1)
            .ends_with("Prompt: Return only the shell command to accomplish: list all files"));
    }
}
