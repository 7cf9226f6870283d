//! Main application state and UI coordination

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context as _, Result};
use eframe::egui::{self, Key, Modifiers};
use tokio::runtime::Runtime;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::agent::{CodeSmith, Mode, AGENT_NAME};
use crate::core::config::{process_env, AppConfig};
use crate::core::document::{Document, Snapshot};
use crate::core::text;
use crate::extension::{ExtensionManager, ExtensionOutput, MenuEntry};
use crate::terminal::{run_shell, TerminalSession};
use crate::ui::autocomplete::{Autocomplete, PopupAction};
use crate::ui::dialogs::{Confirmation, Dialog, DialogResponse, Prompt};
use crate::ui::editor::{EditorPanel, EditorState};
use crate::ui::terminal::TerminalPanel;

pub const APP_NAME: &str = "NovaAtom";

/// Something the user asked for through a menu or a shortcut
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    NewFile,
    OpenFile,
    OpenRecent(PathBuf),
    Save,
    SaveAs,
    Exit,
    Find,
    FindNext,
    Replace,
    GotoDefinition,
    Autocomplete,
    ToggleTerminal,
    SetWordWrap(bool),
    AskAgent,
    EditWithAgent,
    RunAgentCommand,
    SetAllowTerminal(bool),
    SetApiKey,
    RunExtension(MenuEntry),
}

/// Result of work done off the UI thread
#[derive(Debug)]
enum TaskOutcome {
    Answer(Result<String, String>),
    Edited {
        source: Snapshot,
        result: Result<String, String>,
    },
    CommandSuggested(Result<String, String>),
    CommandFinished(String),
    Completions {
        prefix: String,
        offset: usize,
        suggestions: Vec<String>,
    },
}

/// Main application state
pub struct NovaAtomApp {
    /// The buffer being edited
    pub document: Document,
    /// Application configuration
    pub config: AppConfig,
    /// Caret and selection bookkeeping for the editor widget
    pub editor: EditorState,
    /// Open completion popup
    pub autocomplete: Option<Autocomplete>,
    /// Terminal pane session
    pub terminal: TerminalSession,
    /// Whether terminal panel is visible
    pub terminal_visible: bool,
    /// Loaded extensions
    pub extensions: ExtensionManager,
    /// Modal dialogs, topmost last
    dialogs: Vec<Dialog>,
    /// Status bar text
    status: String,
    runtime: Runtime,
    http: reqwest::Client,
    tasks_tx: UnboundedSender<TaskOutcome>,
    tasks_rx: UnboundedReceiver<TaskOutcome>,
    pending_tasks: usize,
    shown_title: String,
}

impl NovaAtomApp {
    /// Create a new application instance
    pub fn new(cc: &eframe::CreationContext<'_>, initial_file: Option<PathBuf>) -> Result<Self> {
        let config = AppConfig::load().unwrap_or_else(|e| {
            tracing::warn!("Using default config: {:#}", e);
            AppConfig::default()
        });
        Self::configure_style(&cc.egui_ctx, &config);

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("novaatom-worker")
            .enable_all()
            .build()
            .context("Failed to start async runtime")?;
        let http = reqwest::Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        let mut extensions = ExtensionManager::new()?;
        extensions.load_dir(&config.extension_dir(), &config.extensions.disabled);

        let needs_api_key = config.agent.resolve_api_key(process_env).is_none();
        let (tasks_tx, tasks_rx) = unbounded_channel();

        let mut app = Self {
            document: Document::new(),
            config,
            editor: EditorState::default(),
            autocomplete: None,
            terminal: TerminalSession::default(),
            terminal_visible: false,
            extensions,
            dialogs: Vec::new(),
            status: String::new(),
            runtime,
            http,
            tasks_tx,
            tasks_rx,
            pending_tasks: 0,
            shown_title: String::new(),
        };

        if let Some(path) = initial_file {
            app.open_path(path);
        }
        if needs_api_key {
            app.dialogs.push(Dialog::input(Prompt::ApiKey));
        }

        Ok(app)
    }

    fn configure_style(ctx: &egui::Context, config: &AppConfig) {
        let size = config.editor.font_size;
        ctx.style_mut(|style| {
            style
                .text_styles
                .insert(egui::TextStyle::Monospace, egui::FontId::monospace(size));
        });
    }

    fn agent(&self) -> CodeSmith {
        CodeSmith::from_config(self.http.clone(), &self.config.agent, process_env)
    }

    /// Directory used for repository questions and file dialogs
    fn workspace_root(&self) -> PathBuf {
        self.document
            .path
            .as_ref()
            .and_then(|p| p.parent())
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| self.terminal.cwd().to_path_buf())
    }

    fn save_config(&self) {
        if let Err(e) = self.config.save() {
            tracing::error!("Failed to save config: {:#}", e);
        }
    }

    fn window_title(&self) -> String {
        let marker = if self.document.modified { "*" } else { "" };
        match &self.document.path {
            Some(path) => format!("{} - {}{}", APP_NAME, path.display(), marker),
            None => format!("{}{}", APP_NAME, marker),
        }
    }

    // ----- background work -----

    fn spawn<F>(&mut self, ctx: &egui::Context, task: F)
    where
        F: Future<Output = TaskOutcome> + Send + 'static,
    {
        self.pending_tasks += 1;
        let tx = self.tasks_tx.clone();
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            let _ = tx.send(task.await);
            ctx.request_repaint();
        });
    }

    fn poll_tasks(&mut self) {
        while let Ok(outcome) = self.tasks_rx.try_recv() {
            self.pending_tasks = self.pending_tasks.saturating_sub(1);
            self.handle_outcome(outcome);
        }
    }

    fn handle_outcome(&mut self, outcome: TaskOutcome) {
        self.status.clear();
        match outcome {
            TaskOutcome::Answer(Ok(answer)) => self.dialogs.push(Dialog::info(AGENT_NAME, answer)),
            TaskOutcome::Edited {
                source,
                result: Ok(content),
            } => {
                if source.is_current(&self.document) {
                    self.document.set_content(content);
                    self.autocomplete = None;
                    self.status = format!("{} updated the buffer", AGENT_NAME);
                } else {
                    tracing::warn!("Discarding {} edit of a buffer that has changed", AGENT_NAME);
                    self.dialogs.push(Dialog::warning(
                        AGENT_NAME,
                        "The buffer changed while CodeSmith was editing it. The edit was discarded.",
                    ));
                }
            }
            TaskOutcome::CommandSuggested(Ok(command)) => {
                if command.is_empty() {
                    self.dialogs
                        .push(Dialog::warning(AGENT_NAME, "No command was suggested."));
                } else {
                    let message = format!("Run this command?\n\n{}", command);
                    self.dialogs
                        .push(Dialog::confirm(Confirmation::RunCommand(command), message));
                }
            }
            TaskOutcome::Answer(Err(e))
            | TaskOutcome::Edited { result: Err(e), .. }
            | TaskOutcome::CommandSuggested(Err(e)) => {
                tracing::error!("{} request failed: {}", AGENT_NAME, e);
                self.dialogs.push(Dialog::error(AGENT_NAME, e));
            }
            TaskOutcome::CommandFinished(output) => {
                self.dialogs.push(Dialog::info("Command Output", output));
            }
            TaskOutcome::Completions {
                prefix,
                offset,
                suggestions,
            } => self.show_completions(prefix, offset, suggestions),
        }
    }

    // ----- file operations -----

    fn new_document(&mut self) {
        self.document = Document::new();
        self.reset_editor();
    }

    fn reset_editor(&mut self) {
        self.editor = EditorState {
            last_query: self.editor.last_query.take(),
            ..EditorState::default()
        };
        self.editor.move_caret(0);
        self.autocomplete = None;
    }

    fn choose_and_open(&mut self) {
        let root = self.workspace_root();
        if let Some(path) = rfd::FileDialog::new().set_directory(root).pick_file() {
            self.open_path(path);
        }
    }

    /// Open a file, replacing the current buffer
    pub fn open_path(&mut self, path: PathBuf) {
        match Document::open(&path) {
            Ok(doc) => {
                tracing::info!("Opened {}", path.display());
                self.document = doc;
                self.reset_editor();
                self.config.add_recent_file(path);
                self.save_config();
            }
            Err(e) => {
                tracing::error!("Failed to open document: {:#}", e);
                self.dialogs.push(Dialog::error("Error", format!("{:#}", e)));
            }
        }
    }

    fn save(&mut self) {
        if self.document.path.is_none() {
            self.save_as();
            return;
        }

        match self.document.save() {
            Ok(()) => self.status = format!("Saved {}", self.document.title()),
            Err(e) => {
                tracing::error!("Failed to save document: {:#}", e);
                self.dialogs.push(Dialog::error("Error", format!("{:#}", e)));
            }
        }
    }

    fn save_as(&mut self) {
        let dialog = rfd::FileDialog::new()
            .set_directory(self.workspace_root())
            .set_file_name(self.document.title());
        let Some(path) = dialog.save_file() else {
            return;
        };

        match self.document.save_as(&path) {
            Ok(()) => {
                self.status = format!("Saved {}", self.document.title());
                self.config.add_recent_file(path);
                self.save_config();
            }
            Err(e) => {
                tracing::error!("Failed to save document: {:#}", e);
                self.dialogs.push(Dialog::error("Error", format!("{:#}", e)));
            }
        }
    }

    // ----- editing -----

    fn cursor_offset(&self) -> usize {
        self.editor
            .cursor
            .map(|c| text::char_to_byte(&self.document.content, c))
            .unwrap_or(0)
    }

    fn find(&mut self, query: String) {
        if query.is_empty() {
            return;
        }
        self.editor.last_query = Some(query);
        self.find_next();
    }

    fn find_next(&mut self) {
        let Some(query) = self.editor.last_query.clone() else {
            self.dialogs.push(Dialog::input(Prompt::Find));
            return;
        };

        let from = self.cursor_offset();
        let content = &self.document.content;
        match text::find(content, &query, from) {
            Some(range) => {
                let start = text::byte_to_char(content, range.start);
                let end = text::byte_to_char(content, range.end);
                self.editor.select(start..end);
            }
            None => self.dialogs.push(Dialog::info("Find", "Text not found")),
        }
    }

    fn replace(&mut self, find: &str, replacement: &str) {
        match text::replace_all(&self.document.content, find, replacement) {
            Some((content, count)) => {
                self.document.set_content(content);
                self.autocomplete = None;
                self.status = format!("Replaced {} occurrence(s)", count);
            }
            None => self.dialogs.push(Dialog::info("Replace", "Text not found")),
        }
    }

    fn goto_definition(&mut self) {
        let offset = self.cursor_offset();
        let content = &self.document.content;
        let Some(range) = text::word_at(content, offset) else {
            self.dialogs
                .push(Dialog::info("Go to Definition", "No symbol selected"));
            return;
        };

        let word = &content[range];
        match text::find_definition(content, word) {
            Some(definition) => {
                let start = text::byte_to_char(content, definition.range.start);
                let end = text::byte_to_char(content, definition.range.end);
                self.editor.select(start..end);
                self.status = format!("{} defined on line {}", word, definition.line + 1);
            }
            None => {
                let message = format!("Definition for '{}' not found", word);
                self.dialogs.push(Dialog::info("Go to Definition", message));
            }
        }
    }

    fn trigger_autocomplete(&mut self, ctx: &egui::Context) {
        let offset = self.cursor_offset();
        let prefix = text::prefix_at(&self.document.content, offset).to_string();
        if prefix.trim().is_empty() {
            return;
        }

        let agent = self.agent();
        if agent.is_configured() {
            let context = self.document.content[..offset].to_string();
            self.status = format!("{} is suggesting completions...", AGENT_NAME);
            self.spawn(ctx, async move {
                let suggestions = agent.suggest_completions(&context, &prefix).await;
                TaskOutcome::Completions {
                    prefix,
                    offset,
                    suggestions,
                }
            });
        } else {
            self.show_completions(prefix, offset, Vec::new());
        }
    }

    fn show_completions(&mut self, prefix: String, offset: usize, suggestions: Vec<String>) {
        // The buffer may have moved on while the agent was thinking
        if offset > self.document.content.len()
            || !self.document.content.is_char_boundary(offset)
            || text::prefix_at(&self.document.content, offset) != prefix
        {
            return;
        }

        let mut items: Vec<String> = suggestions.into_iter().filter(|s| *s != prefix).collect();
        if items.is_empty() {
            items = text::local_completions(
                &self.document.content,
                &prefix,
                &self.document.language(),
            );
        }

        match items.len() {
            0 => self.status = format!("No completions for '{}'", prefix),
            1 => self.insert_completion(&prefix, offset, &items[0]),
            _ => {
                let anchor = self
                    .editor
                    .caret_rect
                    .map(|rect| rect.left_bottom())
                    .unwrap_or(egui::pos2(100.0, 100.0));
                self.autocomplete = Some(Autocomplete::new(prefix, offset, items, anchor));
            }
        }
    }

    fn insert_completion(&mut self, prefix: &str, offset: usize, item: &str) {
        let Some(suffix) = item.strip_prefix(prefix) else {
            return;
        };
        if offset > self.document.content.len() || !self.document.content.is_char_boundary(offset) {
            return;
        }

        self.document.content.insert_str(offset, suffix);
        self.document.modified = true;
        let caret = text::byte_to_char(&self.document.content, offset + suffix.len());
        self.editor.move_caret(caret);
    }

    fn apply_popup_action(&mut self, action: PopupAction) {
        match action {
            PopupAction::None => {}
            PopupAction::Close => self.autocomplete = None,
            PopupAction::Accept(item) => {
                if let Some(popup) = self.autocomplete.take() {
                    self.insert_completion(&popup.prefix, popup.offset, &item);
                }
            }
        }
    }

    // ----- agent -----

    fn ask_agent(&mut self, ctx: &egui::Context, prompt: String) {
        let agent = self.agent();
        let root = self.workspace_root();
        self.status = format!("{} is thinking...", AGENT_NAME);
        self.spawn(ctx, async move {
            let answer = agent.ask(&prompt, Mode::Coding, &root).await;
            TaskOutcome::Answer(answer.map_err(|e| e.to_string()))
        });
    }

    fn edit_with_agent(&mut self, ctx: &egui::Context, instructions: String) {
        let agent = self.agent();
        let source = self.document.snapshot();
        self.status = format!("{} is editing...", AGENT_NAME);
        self.spawn(ctx, async move {
            let edited = agent.edit_text(&source.content, &instructions).await;
            TaskOutcome::Edited {
                source,
                result: edited.map_err(|e| e.to_string()),
            }
        });
    }

    fn suggest_command(&mut self, ctx: &egui::Context, task: String) {
        let agent = self.agent();
        let root = self.workspace_root();
        self.status = format!("{} is thinking...", AGENT_NAME);
        self.spawn(ctx, async move {
            let command = agent.suggest_command(&task, &root).await;
            TaskOutcome::CommandSuggested(command.map_err(|e| e.to_string()))
        });
    }

    fn run_command(&mut self, ctx: &egui::Context, command: String) {
        let cwd = self.terminal.cwd().to_path_buf();
        self.status = format!("Running: {}", command);
        tracing::info!("Running agent command: {}", command);
        self.spawn(ctx, async move {
            let output = match run_shell(&command, &cwd).await {
                Ok(output) => {
                    let text = output.combined();
                    if text.trim().is_empty() {
                        "(no output)".to_string()
                    } else {
                        text
                    }
                }
                Err(e) => format!("{:#}", e),
            };
            TaskOutcome::CommandFinished(output)
        });
    }

    fn run_extension(&mut self, entry: MenuEntry) {
        let label = entry.command.label.as_str();
        match self
            .extensions
            .run(&entry.extension_id, label, &self.document.content)
        {
            Ok(ExtensionOutput::Message(message)) => {
                self.dialogs.push(Dialog::info(label, message));
            }
            Ok(ExtensionOutput::ReplaceBuffer(content)) => {
                self.document.set_content(content);
                self.autocomplete = None;
            }
            Err(e) => {
                tracing::error!("Extension {} failed: {:#}", entry.extension_id, e);
                self.dialogs.push(Dialog::error(label, format!("{:#}", e)));
            }
        }
    }

    // ----- dispatch -----

    fn perform(&mut self, action: Action, ctx: &egui::Context) {
        match action {
            Action::NewFile => {
                if self.document.modified {
                    self.dialogs.push(Dialog::confirm(
                        Confirmation::DiscardForNew,
                        "Discard current changes?",
                    ));
                } else {
                    self.new_document();
                }
            }
            Action::OpenFile => {
                if self.document.modified {
                    self.dialogs.push(Dialog::confirm(
                        Confirmation::DiscardForOpen(None),
                        "Discard current changes?",
                    ));
                } else {
                    self.choose_and_open();
                }
            }
            Action::OpenRecent(path) => {
                if self.document.modified {
                    self.dialogs.push(Dialog::confirm(
                        Confirmation::DiscardForOpen(Some(path)),
                        "Discard current changes?",
                    ));
                } else {
                    self.open_path(path);
                }
            }
            Action::Save => self.save(),
            Action::SaveAs => self.save_as(),
            Action::Exit => ctx.send_viewport_cmd(egui::ViewportCommand::Close),
            Action::Find => self.dialogs.push(Dialog::input(Prompt::Find)),
            Action::FindNext => self.find_next(),
            Action::Replace => self.dialogs.push(Dialog::replace()),
            Action::GotoDefinition => self.goto_definition(),
            Action::Autocomplete => self.trigger_autocomplete(ctx),
            Action::ToggleTerminal => {
                self.terminal_visible = !self.terminal_visible;
                if self.terminal_visible {
                    ctx.memory_mut(|m| m.request_focus(egui::Id::new("terminal_input")));
                }
            }
            Action::SetWordWrap(wrap) => {
                self.config.editor.word_wrap = wrap;
                self.save_config();
            }
            Action::AskAgent => self.dialogs.push(Dialog::input(Prompt::AskAgent)),
            Action::EditWithAgent => self.dialogs.push(Dialog::input(Prompt::EditWithAgent)),
            Action::RunAgentCommand => {
                if self.config.agent.allow_terminal_commands {
                    self.dialogs.push(Dialog::input(Prompt::DescribeCommand));
                } else {
                    self.dialogs.push(Dialog::warning(
                        AGENT_NAME,
                        "Enable terminal commands in CodeSmith settings to use this feature.",
                    ));
                }
            }
            Action::SetAllowTerminal(allow) => {
                self.config.agent.allow_terminal_commands = allow;
                self.save_config();
            }
            Action::SetApiKey => self.dialogs.push(Dialog::input(Prompt::ApiKey)),
            Action::RunExtension(entry) => self.run_extension(entry),
        }
    }

    fn submit_dialog(&mut self, dialog: Dialog, ctx: &egui::Context) {
        match dialog {
            Dialog::Input { prompt, value, .. } => {
                let value = value.trim().to_string();
                if value.is_empty() {
                    return;
                }
                match prompt {
                    Prompt::Find => self.find(value),
                    Prompt::AskAgent => self.ask_agent(ctx, value),
                    Prompt::EditWithAgent => self.edit_with_agent(ctx, value),
                    Prompt::DescribeCommand => self.suggest_command(ctx, value),
                    Prompt::ApiKey => {
                        self.config.agent.set_api_key(&value);
                        self.save_config();
                        self.status = "API key saved".to_string();
                    }
                }
            }
            Dialog::Replace {
                find, replacement, ..
            } => self.replace(&find, &replacement),
            Dialog::Confirm { confirmation, .. } => match confirmation {
                Confirmation::DiscardForNew => self.new_document(),
                Confirmation::DiscardForOpen(Some(path)) => self.open_path(path),
                Confirmation::DiscardForOpen(None) => self.choose_and_open(),
                Confirmation::RunCommand(command) => self.run_command(ctx, command),
            },
            Dialog::Message { .. } => {}
        }
    }

    fn show_dialogs(&mut self, ctx: &egui::Context) {
        let Some(mut dialog) = self.dialogs.pop() else {
            return;
        };

        match dialog.show(ctx) {
            DialogResponse::Open => self.dialogs.push(dialog),
            DialogResponse::Cancelled => {}
            DialogResponse::Submitted => self.submit_dialog(dialog, ctx),
        }
    }

    // ----- rendering -----

    fn shortcut_actions(ctx: &egui::Context) -> Vec<Action> {
        let shortcuts = [
            (Modifiers::COMMAND, Key::N, Action::NewFile),
            (Modifiers::COMMAND, Key::O, Action::OpenFile),
            (Modifiers::COMMAND, Key::S, Action::Save),
            (Modifiers::COMMAND, Key::F, Action::Find),
            (Modifiers::NONE, Key::F3, Action::FindNext),
            (Modifiers::COMMAND, Key::H, Action::Replace),
            (Modifiers::NONE, Key::F12, Action::GotoDefinition),
            (Modifiers::COMMAND, Key::T, Action::ToggleTerminal),
            (Modifiers::COMMAND, Key::Space, Action::Autocomplete),
        ];

        ctx.input_mut(|i| {
            shortcuts
                .into_iter()
                .filter(|(modifiers, key, _)| i.consume_key(*modifiers, *key))
                .map(|(_, _, action)| action)
                .collect()
        })
    }

    /// Render the top menu bar
    fn render_menu_bar(&self, ctx: &egui::Context) -> Option<Action> {
        let mut action = None;

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    menu_item(ui, "New", Some("Ctrl+N"), Action::NewFile, &mut action);
                    menu_item(ui, "Open", Some("Ctrl+O"), Action::OpenFile, &mut action);
                    ui.menu_button("Open Recent", |ui| {
                        if self.config.recent_files.is_empty() {
                            ui.label("No recent files");
                        }
                        for path in &self.config.recent_files {
                            let label = path.display().to_string();
                            menu_item(ui, &label, None, Action::OpenRecent(path.clone()), &mut action);
                        }
                    });
                    menu_item(ui, "Save", Some("Ctrl+S"), Action::Save, &mut action);
                    menu_item(ui, "Save As", None, Action::SaveAs, &mut action);
                    ui.separator();
                    menu_item(ui, "Exit", None, Action::Exit, &mut action);
                });

                ui.menu_button("Edit", |ui| {
                    menu_item(ui, "Find", Some("Ctrl+F"), Action::Find, &mut action);
                    menu_item(ui, "Find Next", Some("F3"), Action::FindNext, &mut action);
                    menu_item(ui, "Replace", Some("Ctrl+H"), Action::Replace, &mut action);
                    menu_item(ui, "Go to Definition", Some("F12"), Action::GotoDefinition, &mut action);
                    menu_item(ui, "Autocomplete", Some("Ctrl+Space"), Action::Autocomplete, &mut action);
                });

                ui.menu_button("View", |ui| {
                    let mut wrap = self.config.editor.word_wrap;
                    if ui.checkbox(&mut wrap, "Word Wrap").changed() {
                        action = Some(Action::SetWordWrap(wrap));
                    }
                });

                ui.menu_button("Terminal", |ui| {
                    let label = if self.terminal_visible {
                        "Hide Terminal"
                    } else {
                        "Open Terminal"
                    };
                    menu_item(ui, label, Some("Ctrl+T"), Action::ToggleTerminal, &mut action);
                });

                ui.menu_button(AGENT_NAME, |ui| {
                    menu_item(ui, "Ask CodeSmith", None, Action::AskAgent, &mut action);
                    menu_item(ui, "Edit with CodeSmith", None, Action::EditWithAgent, &mut action);
                    menu_item(ui, "Run Command", None, Action::RunAgentCommand, &mut action);
                    ui.separator();
                    ui.menu_button("Settings", |ui| {
                        let mut allow = self.config.agent.allow_terminal_commands;
                        if ui.checkbox(&mut allow, "Allow terminal commands").changed() {
                            action = Some(Action::SetAllowTerminal(allow));
                        }
                    });
                    ui.separator();
                    menu_item(ui, "Set OpenAI API Key", None, Action::SetApiKey, &mut action);
                });

                ui.menu_button("Extensions", |ui| {
                    let entries = self.extensions.menu_entries();
                    if entries.is_empty() {
                        ui.label("No extensions loaded");
                    }
                    for entry in entries {
                        let label = entry.command.label.clone();
                        let description = entry.command.description.clone();
                        let response = ui.button(label);
                        let response = if description.is_empty() {
                            response
                        } else {
                            response.on_hover_text(description)
                        };
                        if response.clicked() {
                            action = Some(Action::RunExtension(entry));
                            ui.close();
                        }
                    }
                });
            });
        });

        action
    }

    fn render_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if self.pending_tasks > 0 {
                    ui.spinner();
                }
                ui.label(&self.status);

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(self.document.language());
                    if let Some(cursor) = self.editor.cursor {
                        let (line, col) = EditorPanel::line_col(&self.document.content, cursor);
                        ui.label(format!("Ln {}, Col {}", line, col));
                    }
                });
            });
        });
    }

    fn update_title(&mut self, ctx: &egui::Context) {
        let title = self.window_title();
        if title != self.shown_title {
            ctx.send_viewport_cmd(egui::ViewportCommand::Title(title.clone()));
            self.shown_title = title;
        }
    }
}

fn menu_item(
    ui: &mut egui::Ui,
    label: &str,
    shortcut: Option<&str>,
    item: Action,
    action: &mut Option<Action>,
) {
    let mut button = egui::Button::new(label);
    if let Some(shortcut) = shortcut {
        button = button.shortcut_text(shortcut);
    }
    if ui.add(button).clicked() {
        *action = Some(item);
        ui.close();
    }
}

impl eframe::App for NovaAtomApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_tasks();
        self.terminal.poll();

        let mut actions = Vec::new();
        if self.dialogs.is_empty() {
            if let Some(popup) = self.autocomplete.as_mut() {
                let popup_action = popup.handle_keys(ctx);
                self.apply_popup_action(popup_action);
            }
            actions.extend(Self::shortcut_actions(ctx));
        }

        if let Some(action) = self.render_menu_bar(ctx) {
            actions.push(action);
        }

        self.render_status_bar(ctx);

        if self.terminal_visible {
            egui::TopBottomPanel::bottom("terminal_panel")
                .resizable(true)
                .default_height(200.0)
                .min_height(100.0)
                .show(ctx, |ui| {
                    TerminalPanel::show(ui, &mut self.terminal, self.runtime.handle());
                });
        }

        let editing = self.dialogs.is_empty();
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_enabled_ui(editing, |ui| EditorPanel::show(ui, self));
        });

        if let Some(popup) = self.autocomplete.as_mut() {
            let popup_action = popup.show(ctx);
            self.apply_popup_action(popup_action);
        }

        self.show_dialogs(ctx);

        for action in actions {
            self.perform(action, ctx);
        }

        self.update_title(ctx);

        if self.pending_tasks > 0 || self.terminal.is_busy() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}
