//! Extensions compiled into the editor

use anyhow::Result;

use super::api::{Extension, ExtensionCommand, ExtensionOutput};
use crate::core::text;

/// Counts the words in the buffer
#[derive(Debug, Default)]
pub struct WordCount;

impl WordCount {
    const COMMAND: &'static str = "Word Count";
}

impl Extension for WordCount {
    fn id(&self) -> &str {
        "word_count"
    }

    fn name(&self) -> &str {
        "Word Count"
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn commands(&self) -> Vec<ExtensionCommand> {
        vec![ExtensionCommand::new(Self::COMMAND).with_description("Count the words in the buffer")]
    }

    fn run(&mut self, command: &str, buffer: &str) -> Result<ExtensionOutput> {
        if command != Self::COMMAND {
            anyhow::bail!("Unknown command: {}", command);
        }
        Ok(ExtensionOutput::Message(format!(
            "{} words",
            text::word_count(buffer)
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_count() {
        let mut ext = WordCount;
        assert_eq!(
            ext.run("Word Count", "def main():\n    return 42\n").unwrap(),
            ExtensionOutput::Message("4 words".to_string())
        );
        assert!(ext.run("Line Count", "").is_err());
    }
}
