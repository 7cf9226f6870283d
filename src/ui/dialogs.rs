//! Modal dialogs: text prompts, find/replace, confirmations and messages

use std::path::PathBuf;

use eframe::egui::{self, Align2, Color32, Key};

use crate::agent::AGENT_NAME;

/// What a single-line prompt is asking for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    Find,
    AskAgent,
    EditWithAgent,
    DescribeCommand,
    ApiKey,
}

impl Prompt {
    fn title(self) -> &'static str {
        match self {
            Prompt::Find => "Find",
            Prompt::AskAgent => "Ask CodeSmith",
            Prompt::EditWithAgent => "Edit with CodeSmith",
            Prompt::DescribeCommand => "CodeSmith Command",
            Prompt::ApiKey => "OpenAI API Key",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Prompt::Find => "Enter text to find:",
            Prompt::AskAgent => "Enter your prompt:",
            Prompt::EditWithAgent => "Describe changes to apply to the current file:",
            Prompt::DescribeCommand => "Describe the command to run:",
            Prompt::ApiKey => "Enter your OpenAI API key:",
        }
    }

    fn is_secret(self) -> bool {
        self == Prompt::ApiKey
    }
}

/// An action waiting for a yes/no answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    /// Discard changes and start a new document
    DiscardForNew,
    /// Discard changes and open a file (`None` asks for the path first)
    DiscardForOpen(Option<PathBuf>),
    /// Run a shell command suggested by the agent
    RunCommand(String),
}

impl Confirmation {
    /// Whether Enter may answer "Yes"; shell commands need a click
    pub fn accepts_enter(&self) -> bool {
        !matches!(self, Confirmation::RunCommand(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Warning,
    Error,
}

/// A modal dialog
#[derive(Debug, Clone)]
pub enum Dialog {
    Input {
        prompt: Prompt,
        value: String,
        focus: bool,
    },
    Replace {
        find: String,
        replacement: String,
        focus: bool,
    },
    Confirm {
        confirmation: Confirmation,
        message: String,
    },
    Message {
        kind: MessageKind,
        title: String,
        body: String,
    },
}

/// Result of showing a dialog for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogResponse {
    Open,
    Submitted,
    Cancelled,
}

impl Dialog {
    pub fn input(prompt: Prompt) -> Self {
        Dialog::Input {
            prompt,
            value: String::new(),
            focus: true,
        }
    }

    pub fn replace() -> Self {
        Dialog::Replace {
            find: String::new(),
            replacement: String::new(),
            focus: true,
        }
    }

    pub fn confirm(confirmation: Confirmation, message: impl Into<String>) -> Self {
        Dialog::Confirm {
            confirmation,
            message: message.into(),
        }
    }

    pub fn info(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::message(MessageKind::Info, title, body)
    }

    pub fn warning(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::message(MessageKind::Warning, title, body)
    }

    pub fn error(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::message(MessageKind::Error, title, body)
    }

    fn message(kind: MessageKind, title: impl Into<String>, body: impl Into<String>) -> Self {
        Dialog::Message {
            kind,
            title: title.into(),
            body: body.into(),
        }
    }

    fn title(&self) -> String {
        match self {
            Dialog::Input { prompt, .. } => prompt.title().to_string(),
            Dialog::Replace { .. } => "Replace".to_string(),
            Dialog::Confirm { .. } => AGENT_NAME.to_string(),
            Dialog::Message { title, .. } => title.clone(),
        }
    }

    /// Show the dialog for one frame
    pub fn show(&mut self, ctx: &egui::Context) -> DialogResponse {
        let (enter, escape) = ctx.input(|i| (i.key_pressed(Key::Enter), i.key_pressed(Key::Escape)));
        if escape {
            return DialogResponse::Cancelled;
        }

        let mut response = DialogResponse::Open;
        let title = self.title();

        egui::Window::new(title)
            .id(egui::Id::new("novaatom_dialog"))
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                match self {
                    Dialog::Input {
                        prompt,
                        value,
                        focus,
                    } => {
                        ui.label(prompt.label());
                        let edit = ui.add(
                            egui::TextEdit::singleline(value)
                                .password(prompt.is_secret())
                                .desired_width(360.0),
                        );
                        if std::mem::take(focus) {
                            edit.request_focus();
                        }
                        if enter {
                            response = DialogResponse::Submitted;
                        }
                        ok_cancel(ui, &mut response);
                    }
                    Dialog::Replace {
                        find,
                        replacement,
                        focus,
                    } => {
                        egui::Grid::new("replace_grid").num_columns(2).show(ui, |ui| {
                            ui.label("Enter text to find:");
                            let edit = ui.add(egui::TextEdit::singleline(find).desired_width(280.0));
                            if std::mem::take(focus) {
                                edit.request_focus();
                            }
                            ui.end_row();

                            ui.label("Enter replacement text:");
                            ui.add(egui::TextEdit::singleline(replacement).desired_width(280.0));
                            ui.end_row();
                        });
                        if enter {
                            response = DialogResponse::Submitted;
                        }
                        ok_cancel(ui, &mut response);
                    }
                    Dialog::Confirm {
                        confirmation,
                        message,
                    } => {
                        ui.label(message.as_str());
                        ui.add_space(8.0);
                        if enter && confirmation.accepts_enter() {
                            response = DialogResponse::Submitted;
                        }
                        ui.horizontal(|ui| {
                            if ui.button("Yes").clicked() {
                                response = DialogResponse::Submitted;
                            }
                            if ui.button("No").clicked() {
                                response = DialogResponse::Cancelled;
                            }
                        });
                    }
                    Dialog::Message { kind, body, .. } => {
                        let color = match kind {
                            MessageKind::Info => None,
                            MessageKind::Warning => Some(Color32::from_rgb(229, 192, 123)),
                            MessageKind::Error => Some(Color32::from_rgb(224, 108, 117)),
                        };
                        egui::ScrollArea::vertical()
                            .max_height(400.0)
                            .show(ui, |ui| {
                                ui.set_max_width(560.0);
                                let text = egui::RichText::new(body.as_str());
                                let text = match color {
                                    Some(color) => text.color(color),
                                    None => text,
                                };
                                ui.add(egui::Label::new(text).selectable(true));
                            });
                        ui.add_space(8.0);
                        if ui.button("OK").clicked() || enter {
                            response = DialogResponse::Submitted;
                        }
                    }
                }
            });

        response
    }
}

fn ok_cancel(ui: &mut egui::Ui, response: &mut DialogResponse) {
    ui.add_space(8.0);
    ui.horizontal(|ui| {
        if ui.button("OK").clicked() {
            *response = DialogResponse::Submitted;
        }
        if ui.button("Cancel").clicked() {
            *response = DialogResponse::Cancelled;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_never_confirms_shell_commands() {
        assert!(Confirmation::DiscardForNew.accepts_enter());
        assert!(Confirmation::DiscardForOpen(None).accepts_enter());
        assert!(!Confirmation::RunCommand("rm -rf build".to_string()).accepts_enter());
    }
}
