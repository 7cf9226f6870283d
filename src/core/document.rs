//! The text buffer being edited

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// A text document, possibly not yet backed by a file
#[derive(Debug, Clone, Default)]
pub struct Document {
    /// File path, `None` until the document is first saved
    pub path: Option<PathBuf>,
    /// Document content
    pub content: String,
    /// Whether the document has unsaved changes
    pub modified: bool,
}

impl Document {
    /// Create a new untitled document
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a document from a file
    pub fn open(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not open file: {}", path.display()))?;

        Ok(Self {
            path: Some(path.to_path_buf()),
            content,
            modified: false,
        })
    }

    /// Save the document to its current path
    pub fn save(&mut self) -> Result<()> {
        let path = self
            .path
            .clone()
            .ok_or_else(|| anyhow::anyhow!("Document has no file path"))?;
        self.write_to(&path)
    }

    /// Save the document under a new path and adopt it
    pub fn save_as(&mut self, path: &Path) -> Result<()> {
        self.write_to(path)?;
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    fn write_to(&mut self, path: &Path) -> Result<()> {
        fs::write(path, &self.content)
            .with_context(|| format!("Could not save file: {}", path.display()))?;
        self.modified = false;
        tracing::info!("Saved document: {}", path.display());
        Ok(())
    }

    /// File name, or `Untitled`
    pub fn title(&self) -> String {
        self.path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "Untitled".to_string())
    }

    /// Language tag used for highlighting and keyword completion
    pub fn language(&self) -> String {
        self.path
            .as_ref()
            .and_then(|p| p.extension())
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_else(|| "txt".to_string())
    }

    /// Update content and mark as modified
    pub fn set_content(&mut self, content: String) {
        if self.content != content {
            self.content = content;
            self.modified = true;
        }
    }

    /// Remember which file and text a background edit started from
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            path: self.path.clone(),
            content: self.content.clone(),
        }
    }
}

/// Path and content of a document at some earlier point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub path: Option<PathBuf>,
    pub content: String,
}

impl Snapshot {
    /// Whether `document` is still the same file with the same text
    pub fn is_current(&self, document: &Document) -> bool {
        self.path == document.path && self.content == document.content
    }
}
