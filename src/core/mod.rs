//! Core functionality for documents, text operations, and configuration

pub mod config;
pub mod document;
pub mod text;
