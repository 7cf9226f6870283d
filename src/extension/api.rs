//! Extension API definitions

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Trait that all extensions implement
pub trait Extension: Send {
    /// Stable identifier
    fn id(&self) -> &str;

    /// Display name
    fn name(&self) -> &str;

    /// Get the extension version
    fn version(&self) -> &str {
        "0.0.0"
    }

    /// Commands added to the Extensions menu
    fn commands(&self) -> Vec<ExtensionCommand>;

    /// Run one of this extension's commands against the current buffer
    fn run(&mut self, command: &str, buffer: &str) -> Result<ExtensionOutput>;
}

/// A menu command provided by an extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionCommand {
    /// Menu label, also used to invoke the command
    pub label: String,
    /// Command description
    pub description: String,
}

impl ExtensionCommand {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// What the editor should do with a command's result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionOutput {
    /// Show a message to the user
    Message(String),
    /// Replace the whole buffer
    ReplaceBuffer(String),
}

/// How a WASM command's output is applied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputAction {
    #[default]
    Message,
    ReplaceBuffer,
}

impl OutputAction {
    pub fn apply(self, text: String) -> ExtensionOutput {
        match self {
            OutputAction::Message => ExtensionOutput::Message(text),
            OutputAction::ReplaceBuffer => ExtensionOutput::ReplaceBuffer(text),
        }
    }
}

/// A command declared in an extension manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestCommand {
    /// Menu label
    pub label: String,
    /// Exported WASM function implementing the command
    pub export: String,
    /// What to do with the output
    #[serde(default)]
    pub action: OutputAction,
    #[serde(default)]
    pub description: String,
}

/// Extension metadata, read from `manifest.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionManifest {
    /// Extension ID
    pub id: String,
    /// Extension name
    pub name: String,
    /// Extension version
    #[serde(default)]
    pub version: String,
    /// Extension description
    #[serde(default)]
    pub description: String,
    /// Extension author
    #[serde(default)]
    pub author: String,
    /// Entry point (WASM or WAT file)
    pub entry_point: String,
    /// Commands exposed to the editor
    #[serde(default)]
    pub commands: Vec<ManifestCommand>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_defaults() {
        let manifest: ExtensionManifest = serde_json::from_str(
            r#"{
                "id": "upper",
                "name": "Uppercase",
                "entry_point": "upper.wasm",
                "commands": [
                    {"label": "Uppercase Buffer", "export": "upper", "action": "replace_buffer"},
                    {"label": "About", "export": "about"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(manifest.commands[0].action, OutputAction::ReplaceBuffer);
        assert_eq!(manifest.commands[1].action, OutputAction::Message);
        assert!(manifest.version.is_empty());
    }
}
