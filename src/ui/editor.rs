//! Code editor panel

use std::ops::Range;
use std::sync::Arc;

use eframe::egui::{self, text::CCursor, text::CCursorRange};
use egui_extras::syntax_highlighting::{self, CodeTheme};

use crate::app::NovaAtomApp;

/// Cursor and selection state that outlives a frame
#[derive(Debug, Default)]
pub struct EditorState {
    /// Caret position as a character index
    pub cursor: Option<usize>,
    /// Selection to apply on the next frame, in character indices
    pub pending_selection: Option<Range<usize>>,
    /// Caret rectangle in screen coordinates
    pub caret_rect: Option<egui::Rect>,
    /// Last Find query, reused by Find Next
    pub last_query: Option<String>,
}

impl EditorState {
    /// Select a character range and scroll it into view on the next frame
    pub fn select(&mut self, range: Range<usize>) {
        self.pending_selection = Some(range);
    }

    /// Move the caret on the next frame
    pub fn move_caret(&mut self, index: usize) {
        self.pending_selection = Some(index..index);
    }
}

/// Code editor panel
pub struct EditorPanel;

impl EditorPanel {
    fn id() -> egui::Id {
        egui::Id::new("novaatom_editor")
    }

    /// Show the editor panel
    pub fn show(ui: &mut egui::Ui, app: &mut NovaAtomApp) {
        let id = Self::id();
        let ctx = ui.ctx().clone();

        let scroll_to = app.editor.pending_selection.take().map(|range| {
            let mut state = egui::TextEdit::load_state(&ctx, id).unwrap_or_default();
            state.cursor.set_char_range(Some(CCursorRange::two(
                CCursor::new(range.start),
                CCursor::new(range.end),
            )));
            state.store(&ctx, id);
            ctx.memory_mut(|m| m.request_focus(id));
            range.start
        });

        let language = app.document.language();
        let word_wrap = app.config.editor.word_wrap;
        let mut layouter = |ui: &egui::Ui, buf: &dyn egui::TextBuffer, wrap_width: f32| -> Arc<egui::Galley> {
            let theme = CodeTheme::from_memory(ui.ctx(), ui.style());
            let mut job = syntax_highlighting::highlight(ui.ctx(), ui.style(), &theme, buf.as_str(), &language);
            job.wrap.max_width = if word_wrap { wrap_width } else { f32::INFINITY };
            ui.fonts(|fonts| fonts.layout_job(job))
        };

        egui::ScrollArea::both()
            .id_salt("editor_scroll")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                let output = egui::TextEdit::multiline(&mut app.document.content)
                    .id(id)
                    .font(egui::TextStyle::Monospace)
                    .code_editor()
                    .lock_focus(true)
                    .desired_width(f32::INFINITY)
                    .desired_rows(30)
                    .layouter(&mut layouter)
                    .show(ui);

                if output.response.changed() {
                    app.document.modified = true;
                    app.autocomplete = None;
                }

                let origin = output.galley_pos.to_vec2();
                if let Some(range) = output.cursor_range {
                    app.editor.cursor = Some(range.primary.index);
                    let caret = output.galley.pos_from_cursor(range.primary).translate(origin);
                    app.editor.caret_rect = Some(caret);
                }

                if let Some(index) = scroll_to {
                    let target = output.galley.pos_from_cursor(CCursor::new(index)).translate(origin);
                    ui.scroll_to_rect(target, Some(egui::Align::Center));
                }
            });
    }

    /// Line and column (1-based) of a character index
    pub fn line_col(content: &str, char_index: usize) -> (usize, usize) {
        let mut line = 1;
        let mut col = 1;
        for c in content.chars().take(char_index) {
            if c == '\n' {
                line += 1;
                col = 1;
            } else {
                col += 1;
            }
        }
        (line, col)
    }
}
