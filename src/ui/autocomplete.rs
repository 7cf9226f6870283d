//! Completion popup shown below the caret

use eframe::egui::{self, Key, Modifiers};

/// What the user did with the popup this frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupAction {
    None,
    Accept(String),
    Close,
}

/// An open completion list
#[derive(Debug, Clone)]
pub struct Autocomplete {
    /// Text before the caret that every item extends
    pub prefix: String,
    /// Byte offset of the caret when the list was requested
    pub offset: usize,
    pub items: Vec<String>,
    pub selected: usize,
    pub anchor: egui::Pos2,
}

impl Autocomplete {
    const MAX_VISIBLE: usize = 6;

    pub fn new(prefix: String, offset: usize, items: Vec<String>, anchor: egui::Pos2) -> Self {
        Self {
            prefix,
            offset,
            items,
            selected: 0,
            anchor,
        }
    }

    fn select_next(&mut self) {
        if !self.items.is_empty() {
            self.selected = (self.selected + 1) % self.items.len();
        }
    }

    fn select_prev(&mut self) {
        if !self.items.is_empty() {
            self.selected = (self.selected + self.items.len() - 1) % self.items.len();
        }
    }

    fn accept_selected(&self) -> PopupAction {
        self.items
            .get(self.selected)
            .map(|item| PopupAction::Accept(item.clone()))
            .unwrap_or(PopupAction::Close)
    }

    /// Take navigation keys before the editor sees them
    pub fn handle_keys(&mut self, ctx: &egui::Context) -> PopupAction {
        let (down, up, accept, close) = ctx.input_mut(|i| {
            (
                i.consume_key(Modifiers::NONE, Key::ArrowDown),
                i.consume_key(Modifiers::NONE, Key::ArrowUp),
                i.consume_key(Modifiers::NONE, Key::Enter) || i.consume_key(Modifiers::NONE, Key::Tab),
                i.consume_key(Modifiers::NONE, Key::Escape),
            )
        });

        if close {
            return PopupAction::Close;
        }
        if down {
            self.select_next();
        }
        if up {
            self.select_prev();
        }
        if accept {
            return self.accept_selected();
        }
        PopupAction::None
    }

    /// Show the list; clicking an item accepts it
    pub fn show(&mut self, ctx: &egui::Context) -> PopupAction {
        let mut action = PopupAction::None;

        egui::Area::new(egui::Id::new("autocomplete_popup"))
            .order(egui::Order::Foreground)
            .fixed_pos(self.anchor)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    let row_height = ui.text_style_height(&egui::TextStyle::Monospace) + 4.0;
                    egui::ScrollArea::vertical()
                        .max_height(row_height * Self::MAX_VISIBLE as f32)
                        .show(ui, |ui| {
                            for (idx, item) in self.items.iter().enumerate() {
                                let selected = idx == self.selected;
                                let label = ui.selectable_label(
                                    selected,
                                    egui::RichText::new(item.as_str()).monospace(),
                                );
                                if selected {
                                    label.scroll_to_me(None);
                                }
                                if label.clicked() {
                                    action = PopupAction::Accept(item.clone());
                                }
                            }
                        });
                });
            });

        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_wraps() {
        let mut popup = Autocomplete::new(
            "pr".to_string(),
            2,
            vec!["print".to_string(), "property".to_string()],
            egui::Pos2::ZERO,
        );
        popup.select_prev();
        assert_eq!(popup.selected, 1);
        popup.select_next();
        assert_eq!(popup.selected, 0);
        assert_eq!(popup.accept_selected(), PopupAction::Accept("print".to_string()));
    }
}
