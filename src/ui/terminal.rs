//! Terminal UI panel

use eframe::egui;
use egui::Color32;
use tokio::runtime::Handle;

use crate::terminal::TerminalSession;

/// Terminal panel
pub struct TerminalPanel;

fn line_color(line: &str) -> Option<Color32> {
    if line.starts_with("[stderr]") {
        Some(Color32::from_rgb(230, 110, 110))
    } else if line.starts_with("[exit code:") {
        Some(Color32::from_rgb(220, 180, 90))
    } else if line.starts_with("$ ") {
        Some(Color32::from_rgb(120, 180, 240))
    } else {
        None
    }
}

impl TerminalPanel {
    /// Show the terminal panel
    pub fn show(ui: &mut egui::Ui, terminal: &mut TerminalSession, runtime: &Handle) {
        ui.vertical(|ui| {
            // Header
            ui.horizontal(|ui| {
                ui.heading("Terminal");
                ui.label(
                    egui::RichText::new(terminal.cwd().display().to_string())
                        .small()
                        .weak(),
                );

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Clear").clicked() {
                        terminal.clear_output();
                    }
                    if terminal.is_busy() {
                        ui.spinner();
                    }
                });
            });

            ui.separator();

            // Output area
            egui::ScrollArea::vertical()
                .id_salt("terminal_output")
                .stick_to_bottom(true)
                .auto_shrink([false, false])
                .max_height(ui.available_height() - 30.0)
                .show(ui, |ui| {
                    for line in terminal.output() {
                        let text = egui::RichText::new(line).monospace();
                        match line_color(line) {
                            Some(color) => ui.label(text.color(color)),
                            None => ui.label(text),
                        };
                    }
                });

            // Input area
            ui.separator();
            ui.horizontal(|ui| {
                ui.label("$");
                let response = ui.add(
                    egui::TextEdit::singleline(&mut terminal.input)
                        .id(egui::Id::new("terminal_input"))
                        .font(egui::TextStyle::Monospace)
                        .desired_width(ui.available_width() - 60.0),
                );

                if response.has_focus() {
                    let (up, down) = ui.input(|i| {
                        (
                            i.key_pressed(egui::Key::ArrowUp),
                            i.key_pressed(egui::Key::ArrowDown),
                        )
                    });
                    if up {
                        terminal.history_up();
                    }
                    if down {
                        terminal.history_down();
                    }
                }

                let ctx = ui.ctx().clone();
                let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if submitted || ui.button("Run").clicked() {
                    terminal.execute(runtime, move || ctx.request_repaint());
                    response.request_focus();
                }
            });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_color() {
        assert!(line_color("[stderr] boom").is_some());
        assert!(line_color("[exit code: 1]").is_some());
        assert_eq!(line_color("plain output"), None);
    }
}
