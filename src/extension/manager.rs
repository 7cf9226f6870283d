//! Extension manager for loading extensions and dispatching their commands

use std::path::Path;

use anyhow::Result;

use super::api::{Extension, ExtensionCommand, ExtensionOutput};
use super::builtin::WordCount;
use super::loader::ExtensionLoader;

/// A menu entry: which extension provides which command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub extension_id: String,
    pub command: ExtensionCommand,
}

/// Extension manager
pub struct ExtensionManager {
    loader: ExtensionLoader,
    extensions: Vec<Box<dyn Extension>>,
}

impl ExtensionManager {
    /// Create a manager holding only the built-in extensions
    pub fn new() -> Result<Self> {
        let mut manager = Self {
            loader: ExtensionLoader::new()?,
            extensions: Vec::new(),
        };
        manager.register(Box::new(WordCount));
        Ok(manager)
    }

    /// Register an extension; a later extension with the same id replaces it
    pub fn register(&mut self, extension: Box<dyn Extension>) {
        self.extensions.retain(|e| e.id() != extension.id());
        tracing::info!("Registered extension: {} v{}", extension.name(), extension.version());
        self.extensions.push(extension);
    }

    /// Load every extension found in `dir`, skipping disabled ids and failures
    pub fn load_dir(&mut self, dir: &Path, disabled: &[String]) -> usize {
        let mut loaded = 0;
        for ext_dir in self.loader.discover(dir) {
            let manifest = match self.loader.load_manifest(&ext_dir) {
                Ok(manifest) => manifest,
                Err(e) => {
                    tracing::error!("Failed to load extension {}: {:#}", ext_dir.display(), e);
                    continue;
                }
            };
            if disabled.contains(&manifest.id) {
                tracing::info!("Skipping disabled extension: {}", manifest.id);
                continue;
            }

            match self.loader.load_extension(&ext_dir) {
                Ok(extension) => {
                    self.register(Box::new(extension));
                    loaded += 1;
                }
                Err(e) => {
                    tracing::error!("Error initializing extension {}: {:#}", manifest.id, e);
                }
            }
        }
        tracing::info!("Loaded {} extensions from {}", loaded, dir.display());
        loaded
    }

    /// All commands, in registration order
    pub fn menu_entries(&self) -> Vec<MenuEntry> {
        self.extensions
            .iter()
            .flat_map(|ext| {
                ext.commands().into_iter().map(move |command| MenuEntry {
                    extension_id: ext.id().to_string(),
                    command,
                })
            })
            .collect()
    }

    /// Run a command of a registered extension
    pub fn run(&mut self, extension_id: &str, command: &str, buffer: &str) -> Result<ExtensionOutput> {
        let extension = self
            .extensions
            .iter_mut()
            .find(|e| e.id() == extension_id)
            .ok_or_else(|| anyhow::anyhow!("Extension not loaded: {}", extension_id))?;

        tracing::debug!("Running {} from extension {}", command, extension_id);
        extension.run(command, buffer)
    }

    /// Get extension count
    pub fn extension_count(&self) -> usize {
        self.extensions.len()
    }
}
