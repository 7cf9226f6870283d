//! UI components for NovaAtom

pub mod autocomplete;
pub mod dialogs;
pub mod editor;
pub mod terminal;
