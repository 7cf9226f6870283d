//! NovaAtom - a lightweight code editor with a built-in coding assistant
//!
//! The library holds everything the `novaatom` editor, the `codesmith`
//! command-line assistant and the `novaatom-web` browser editor share.

pub mod agent;
pub mod app;
pub mod cli;
pub mod core;
pub mod extension;
pub mod terminal;
pub mod ui;
pub mod web;
