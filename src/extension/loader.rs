//! Loader for WASM extensions
//!
//! Calling convention: the module exports `memory` and `alloc(len) -> ptr`.
//! The host copies the buffer into memory obtained from `alloc` and calls the
//! command export as `(ptr, len) -> i64`; the result packs the output
//! location as `(out_ptr << 32) | out_len`, pointing at UTF-8 text.

use std::path::Path;

use anyhow::{Context, Result};
use wasmtime::{Config, Engine, Instance, Memory, Module, Store, TypedFunc};

use super::api::{Extension, ExtensionCommand, ExtensionManifest, ExtensionOutput};

/// Instructions an extension may spend on a single command
const CALL_FUEL: u64 = 100_000_000;

/// Extension loader for WASM extensions
pub struct ExtensionLoader {
    engine: Engine,
}

impl ExtensionLoader {
    pub fn new() -> Result<Self> {
        let mut config = Config::new();
        config.consume_fuel(true);
        let engine = Engine::new(&config).context("Failed to create WASM engine")?;
        Ok(Self { engine })
    }

    /// Load an extension manifest from a directory
    pub fn load_manifest(&self, extension_dir: &Path) -> Result<ExtensionManifest> {
        let manifest_path = extension_dir.join("manifest.json");
        let content = std::fs::read_to_string(&manifest_path)
            .with_context(|| format!("Failed to read {}", manifest_path.display()))?;
        let manifest: ExtensionManifest = serde_json::from_str(&content)
            .with_context(|| format!("Invalid manifest {}", manifest_path.display()))?;
        Ok(manifest)
    }

    /// Load and instantiate a WASM extension
    pub fn load_extension(&self, extension_dir: &Path) -> Result<WasmExtension> {
        let manifest = self.load_manifest(extension_dir)?;
        let wasm_path = extension_dir.join(&manifest.entry_point);

        let module = Module::from_file(&self.engine, &wasm_path)
            .with_context(|| format!("Failed to compile {}", wasm_path.display()))?;

        let mut store = Store::new(&self.engine, ());
        let instance = Instance::new(&mut store, &module, &[])?;

        let memory = instance
            .get_memory(&mut store, "memory")
            .ok_or_else(|| anyhow::anyhow!("{} does not export `memory`", manifest.id))?;
        let alloc = instance
            .get_typed_func::<i32, i32>(&mut store, "alloc")
            .with_context(|| format!("{} does not export `alloc`", manifest.id))?;

        for command in &manifest.commands {
            instance
                .get_typed_func::<(i32, i32), i64>(&mut store, &command.export)
                .with_context(|| {
                    format!("{} does not export `{}`", manifest.id, command.export)
                })?;
        }

        Ok(WasmExtension {
            manifest,
            store,
            instance,
            memory,
            alloc,
        })
    }

    /// Subdirectories of `extensions_dir` that may hold an extension
    pub fn discover(&self, extensions_dir: &Path) -> Vec<std::path::PathBuf> {
        let mut dirs: Vec<_> = std::fs::read_dir(extensions_dir)
            .map(|entries| {
                entries
                    .flatten()
                    .map(|entry| entry.path())
                    .filter(|path| path.is_dir())
                    .filter(|path| {
                        path.file_name()
                            .map(|name| !name.to_string_lossy().starts_with('_'))
                            .unwrap_or(false)
                    })
                    .filter(|path| path.join("manifest.json").is_file())
                    .collect()
            })
            .unwrap_or_default();
        dirs.sort();
        dirs
    }
}

/// A loaded WASM extension
pub struct WasmExtension {
    manifest: ExtensionManifest,
    store: Store<()>,
    instance: Instance,
    memory: Memory,
    alloc: TypedFunc<i32, i32>,
}

impl WasmExtension {
    fn call(&mut self, export: &str, input: &str) -> Result<String> {
        self.store.set_fuel(CALL_FUEL)?;

        let len = i32::try_from(input.len()).context("Buffer too large for extension")?;
        let ptr = self.alloc.call(&mut self.store, len)?;
        self.memory
            .write(&mut self.store, ptr as u32 as usize, input.as_bytes())
            .context("Extension returned an invalid allocation")?;

        let func = self
            .instance
            .get_typed_func::<(i32, i32), i64>(&mut self.store, export)?;
        let packed = func.call(&mut self.store, (ptr, len))? as u64;

        let out_ptr = (packed >> 32) as usize;
        let out_len = (packed & 0xffff_ffff) as usize;
        let in_bounds = out_ptr
            .checked_add(out_len)
            .is_some_and(|end| end <= self.memory.data_size(&self.store));
        if !in_bounds {
            anyhow::bail!("Extension returned output outside its memory");
        }

        let mut out = vec![0u8; out_len];
        self.memory
            .read(&self.store, out_ptr, &mut out)
            .context("Extension returned output outside its memory")?;

        String::from_utf8(out).context("Extension returned invalid UTF-8")
    }
}

impl Extension for WasmExtension {
    fn id(&self) -> &str {
        &self.manifest.id
    }

    fn name(&self) -> &str {
        &self.manifest.name
    }

    fn version(&self) -> &str {
        &self.manifest.version
    }

    fn commands(&self) -> Vec<ExtensionCommand> {
        self.manifest
            .commands
            .iter()
            .map(|c| ExtensionCommand::new(&c.label).with_description(&c.description))
            .collect()
    }

    fn run(&mut self, command: &str, buffer: &str) -> Result<ExtensionOutput> {
        let (export, action) = self
            .manifest
            .commands
            .iter()
            .find(|c| c.label == command)
            .map(|c| (c.export.clone(), c.action))
            .ok_or_else(|| anyhow::anyhow!("Unknown command: {}", command))?;

        let text = self.call(&export, buffer)?;
        Ok(action.apply(text))
    }
}
