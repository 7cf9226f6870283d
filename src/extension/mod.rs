//! Editor extensions: built-in commands and WASM modules from the extension directory

pub mod api;
pub mod builtin;
pub mod loader;
pub mod manager;

pub use api::{Extension, ExtensionCommand, ExtensionOutput};
pub use manager::{ExtensionManager, MenuEntry};
