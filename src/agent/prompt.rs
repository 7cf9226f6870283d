//! Requests sent to the model

use std::path::Path;
use std::time::Duration;

use walkdir::WalkDir;

use super::chat::{ChatMessage, ChatRequest};
use super::{Mode, AGENT_NAME};

/// Characters of buffer context sent with a completion request
const COMPLETION_CONTEXT_CHARS: usize = 400;

/// Ask the model for a web search query
pub fn search_query_request(model: &str, prompt: &str) -> ChatRequest {
    ChatRequest::new(
        model,
        vec![
            ChatMessage::system(
                "Craft a concise, well-structured web search query for the following text.",
            ),
            ChatMessage::user(prompt),
        ],
    )
    .with_max_tokens(32)
    .with_timeout(Duration::from_secs(15))
}

/// Ask a coding question, or a question about the repository in `Qa` mode
pub fn ask_request(
    model: &str,
    prompt: &str,
    mode: Mode,
    search_query: &str,
    search_results: &str,
    codebase: Option<&str>,
) -> ChatRequest {
    let (system, user) = match mode {
        Mode::Qa => (
            format!(
                "You are {}, an AI assistant answering questions about the NovaAtom codebase.",
                AGENT_NAME
            ),
            format!(
                "Repository contents:\n{}\n\nSearch query: {}\nWeb search results:\n{}\n\nQuestion: {}",
                codebase.unwrap_or_default(),
                search_query,
                search_results,
                prompt
            ),
        ),
        Mode::Coding => (
            format!("You are {}, an AI coding assistant.", AGENT_NAME),
            format!(
                "Search query: {}\nWeb search results:\n{}\n\nPrompt: {}",
                search_query, search_results, prompt
            ),
        ),
    };

    ChatRequest::new(model, vec![ChatMessage::system(system), ChatMessage::user(user)])
}

/// Ask the model to rewrite a file
pub fn edit_request(
    model: &str,
    file_content: &str,
    instructions: &str,
    search_query: &str,
    search_results: &str,
) -> ChatRequest {
    let system = format!(
        "You are {}, an AI coding assistant that edits files. \
         Return only the updated file contents without additional commentary.",
        AGENT_NAME
    );
    let user = format!(
        "Search query: {}\nWeb search results:\n{}\n\nCurrent file contents:\n{}\n\nEdit instructions: {}",
        search_query, search_results, file_content, instructions
    );

    ChatRequest::new(model, vec![ChatMessage::system(system), ChatMessage::user(user)])
}

/// Ask for completions of `prefix` given the text before the cursor
pub fn completion_request(model: &str, context: &str, prefix: &str) -> ChatRequest {
    let skip = context
        .chars()
        .count()
        .saturating_sub(COMPLETION_CONTEXT_CHARS);
    let tail: String = context.chars().skip(skip).collect();

    let user = format!(
        "Code context:\n{}\n\nProvide up to 5 code completion suggestions that continue the prefix '{}'.\n\
         Return each suggestion on its own line without additional text.",
        tail, prefix
    );

    ChatRequest::new(
        model,
        vec![
            ChatMessage::system(format!(
                "You are {}, an AI coding assistant providing code completions.",
                AGENT_NAME
            )),
            ChatMessage::user(user),
        ],
    )
    .with_max_tokens(64)
    .with_timeout(Duration::from_secs(10))
}

/// Prompt asking for nothing but a shell command
pub fn command_prompt(task: &str) -> String {
    format!("Return only the shell command to accomplish: {}", task)
}

/// Remove a surrounding markdown code fence and its shell language tag
pub fn strip_code_fence(text: &str) -> String {
    let text = text.trim();
    if !text.starts_with("```") {
        return text.to_string();
    }

    let inner = text.trim_matches(|c: char| c == '`' || c.is_whitespace());
    let mut lines: Vec<&str> = inner.lines().collect();
    if lines
        .first()
        .is_some_and(|first| matches!(first.trim(), "bash" | "sh" | "shell" | "zsh"))
    {
        lines.remove(0);
    }
    lines.join("\n").trim().to_string()
}

/// Collect source files under `root` as `File: {path}` blocks
pub fn gather_codebase(root: &Path, extensions: &[String]) -> String {
    let mut parts = Vec::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            entry.depth() == 0 || !(name.starts_with('.') || name == "target")
        });

    for entry in walker.filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let is_readme = entry
            .file_name()
            .to_string_lossy()
            .eq_ignore_ascii_case("readme.md");
        let wanted = path
            .extension()
            .map(|ext| extensions.iter().any(|e| ext == e.as_str()))
            .unwrap_or(false);

        if !(is_readme || wanted) {
            continue;
        }

        match std::fs::read_to_string(path) {
            Ok(content) => parts.push(format!("File: {}\n{}", path.display(), content)),
            Err(e) => tracing::debug!("Skipping {}: {}", path.display(), e),
        }
    }

    parts.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coding_request() {
        let request = ask_request("gpt-4o-mini", "sort a vec", Mode::Coding, "rust sort vec", "No web results found.", None);
        assert_eq!(request.messages[0].content, "You are CodeSmith, an AI coding assistant.");
        assert_eq!(
            request.messages[1].content,
            "Search query: rust sort vec\nWeb search results:\nNo web results found.\n\nPrompt: sort a vec"
        );
        assert_eq!(request.max_tokens, None);
        assert_eq!(request.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_qa_request_includes_repository() {
        let request = ask_request("m", "where is main?", Mode::Qa, "q", "r", Some("File: ./main.py\nprint()"));
        assert!(request.messages[0].content.contains("NovaAtom codebase"));
        assert!(request.messages[1]
            .content
            .starts_with("Repository contents:\nFile: ./main.py\nprint()"));
        assert!(request.messages[1].content.ends_with("Question: where is main?"));
    }

    #[test]
    fn test_edit_request() {
        let request = edit_request("m", "x = 1\n", "rename x to y", "q", "r");
        assert!(request.messages[0]
            .content
            .contains("Return only the updated file contents"));
        assert!(request.messages[1]
            .content
            .contains("Current file contents:\nx = 1\n\n\nEdit instructions: rename x to y"));
    }

    #[test]
    fn test_completion_request_limits_context() {
        let context = format!("{}tail", "a".repeat(1000));
        let request = completion_request("m", &context, "ta");
        let user = &request.messages[1].content;
        assert!(user.contains(&format!("{}tail", "a".repeat(396))));
        assert!(!user.contains(&"a".repeat(397)));
        assert_eq!(request.max_tokens, Some(64));
    }

    #[test]
    fn test_search_query_request() {
        let request = search_query_request("m", "how do I parse json");
        assert_eq!(request.max_tokens, Some(32));
        assert_eq!(request.timeout, Duration::from_secs(15));
        assert_eq!(request.messages[1].content, "how do I parse json");
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("ls -la"), "ls -la");
        assert_eq!(strip_code_fence("```bash\nls -la\n```"), "ls -la");
        assert_eq!(strip_code_fence("```\nfind . -name '*.rs'\n```\n"), "find . -name '*.rs'");
        assert_eq!(strip_code_fence("```sh\necho a\necho b\n```"), "echo a\necho b");
    }

    #[test]
    fn test_gather_codebase() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("pkg")).unwrap();
        std::fs::create_dir_all(root.join("target")).unwrap();
        std::fs::create_dir_all(root.join(".git")).unwrap();
        std::fs::write(root.join("README.md"), "# Project").unwrap();
        std::fs::write(root.join("pkg").join("mod.py"), "x = 1").unwrap();
        std::fs::write(root.join("pkg").join("notes.txt"), "skip").unwrap();
        std::fs::write(root.join("target").join("gen.rs"), "skip").unwrap();
        std::fs::write(root.join(".git").join("hook.py"), "skip").unwrap();

        let text = gather_codebase(root, &["py".to_string(), "rs".to_string()]);
        assert!(text.contains("# Project"));
        assert!(text.contains("x = 1"));
        assert!(!text.contains("skip"));
        assert_eq!(text.matches("File: ").count(), 2);
    }
}
