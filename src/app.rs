use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Padding, Paragraph};

use crate::model::buffer::TextBuffer;
use crate::model::note::{MAX_BODY_CHARS, NoteRecord};
use crate::model::spinner::Spinner;
use crate::model::state::{Field, NoteState};
use crate::msg::{Cmd, Direction as MoveDir, Msg};
use crate::store::StoreError;

const NAME_PROMPT: &str = "Note name: ";
const NAME_PLACEHOLDER: &str = "My awesome note";
const BODY_PLACEHOLDER: &str = "# Note";
const BODY_WIDTH: u16 = 80;
/// Body columns left after the border and its padding.
const BODY_TEXT_WIDTH: u16 = BODY_WIDTH - 2;
const SAVE_LABEL: &str = " Save Note ";
pub const SAVED_BANNER: &str = "Note saved. yawn ᶻ 𝗓 𐰁";

/// One editor session: the two text fields, the interaction state and the
/// filename the note was loaded from (empty for a new note).
pub struct App {
    pub state: NoteState,
    pub name: TextBuffer,
    pub body: TextBuffer,
    original_file_name: String,
    spinner: Spinner,
    last_error: Option<String>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    /// Start an empty session.
    pub fn new() -> Self {
        Self {
            state: NoteState::EditingName,
            name: TextBuffer::single_line().with_width(BODY_WIDTH - NAME_PROMPT.len() as u16),
            body: TextBuffer::multi_line(MAX_BODY_CHARS).with_width(BODY_TEXT_WIDTH),
            original_file_name: String::new(),
            spinner: Spinner::default(),
            last_error: None,
        }
    }

    /// Start a session on a note loaded from `file_name`.
    pub fn from_record(record: &NoteRecord, file_name: impl Into<String>) -> Self {
        let mut app = Self::new();
        app.name.set_text(&record.name);
        app.body.set_text(&record.body);
        app.original_file_name = file_name.into();
        app.name.cursor_to_end();
        app
    }

    pub fn original_file_name(&self) -> &str {
        &self.original_file_name
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Snapshot of the buffers as a note record.
    pub fn record(&self) -> NoteRecord {
        NoteRecord::new(self.name.text(), self.body.text())
    }

    // ── MVU: Update ──────────────────────────────────────────────

    /// Apply one message and return the side effects to run.
    pub fn update(&mut self, msg: Msg) -> Vec<Cmd> {
        if self.state.is_terminal() {
            return Vec::new();
        }

        if msg.is_cancel() {
            tracing::info!(from = self.state.label(), "session cancelled");
            self.state = NoteState::Cancelled;
            return Vec::new();
        }

        match msg {
            Msg::Key(key) => return self.handle_key(key),
            Msg::SaveCompleted(result) => self.handle_save_completed(result),
            Msg::Tick => {
                if self.state == NoteState::CommittingSave {
                    self.spinner.tick();
                }
            }
            Msg::Resize(w, h) => tracing::debug!(w, h, "terminal resized"),
        }
        Vec::new()
    }

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Cmd> {
        if key.kind == KeyEventKind::Release {
            return Vec::new();
        }

        match key.code {
            KeyCode::Tab => {
                if let Some(next) = self.state.next_focus() {
                    self.set_state(next);
                }
            }
            KeyCode::Enter if matches!(self.state, NoteState::OnSave | NoteState::SaveFailed) => {
                return vec![self.begin_save()];
            }
            _ => {
                if let Some(field) = self.state.focused_field() {
                    self.handle_key_edit(field, key);
                }
            }
        }
        Vec::new()
    }

    /// Editing keys for the focused field. Never changes `state`.
    fn handle_key_edit(&mut self, field: Field, key: KeyEvent) {
        let buffer = match field {
            Field::Name => &mut self.name,
            Field::Body => &mut self.body,
        };

        match key.code {
            KeyCode::Enter => buffer.insert_newline(),
            KeyCode::Backspace => buffer.delete_char_before(),
            KeyCode::Delete => buffer.delete_char_at(),
            // AltGr arrives as CONTROL | ALT on Windows.
            KeyCode::Char(ch)
                if !key.modifiers.contains(KeyModifiers::CONTROL)
                    || key.modifiers.contains(KeyModifiers::ALT) =>
            {
                buffer.insert_char(ch);
            }
            KeyCode::Left => buffer.move_cursor(MoveDir::Left),
            KeyCode::Right => buffer.move_cursor(MoveDir::Right),
            KeyCode::Up => buffer.move_cursor(MoveDir::Up),
            KeyCode::Down => buffer.move_cursor(MoveDir::Down),
            KeyCode::Home => buffer.move_cursor(MoveDir::LineStart),
            KeyCode::End => buffer.move_cursor(MoveDir::LineEnd),
            _ => {}
        }
    }

    fn set_state(&mut self, next: NoteState) {
        if self.state == NoteState::SaveFailed {
            self.last_error = None;
        }
        self.state = next;
        match next.focused_field() {
            Some(Field::Name) => self.name.cursor_to_end(),
            Some(Field::Body) => self.body.cursor_to_end(),
            None => {}
        }
    }

    fn begin_save(&mut self) -> Cmd {
        self.set_state(NoteState::CommittingSave);
        self.spinner.reset();

        let record = self.record();
        tracing::info!(
            file = %record.file_name(),
            previous = %self.original_file_name,
            "saving note"
        );
        Cmd::Save {
            record,
            previous_file_name: self.original_file_name.clone(),
        }
    }

    fn handle_save_completed(&mut self, result: Result<String, StoreError>) {
        if self.state != NoteState::CommittingSave {
            tracing::warn!(state = self.state.label(), "ignoring stray save completion");
            return;
        }

        match result {
            Ok(file_name) => {
                self.original_file_name = file_name;
                self.set_state(NoteState::SaveSuccess);
            }
            Err(e) => {
                tracing::error!("save failed: {e}");
                self.last_error = Some(e.to_string());
                self.state = NoteState::SaveFailed;
            }
        }
    }

    // ── MVU: View ────────────────────────────────────────────────

    pub fn view(&self, frame: &mut Frame) {
        let area = Block::default().padding(Padding::uniform(1)).inner(frame.area());

        match self.state {
            NoteState::CommittingSave => {
                let line = Line::from(vec![
                    Span::styled(self.spinner.view(), active_label_style()),
                    Span::raw("Saving Note"),
                ]);
                frame.render_widget(Paragraph::new(line), area);
            }
            NoteState::SaveSuccess => {
                let banner = Paragraph::new(SAVED_BANNER).style(
                    Style::default()
                        .fg(Color::Magenta)
                        .add_modifier(Modifier::BOLD),
                );
                frame.render_widget(banner, area);
            }
            _ => self.render_editor(frame, area),
        }
    }

    fn render_editor(&self, frame: &mut Frame, area: Rect) {
        let body_height = self.body.viewport.height;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),           // name
                Constraint::Length(1),           // gap
                Constraint::Length(body_height), // body
                Constraint::Length(1),           // gap
                Constraint::Length(1),           // save button
                Constraint::Length(1),           // gap
                Constraint::Length(1),           // error
                Constraint::Length(1),           // help
                Constraint::Min(0),
            ])
            .split(area);

        self.render_name(frame, chunks[0]);

        let body_area = Rect {
            width: chunks[2].width.min(BODY_WIDTH),
            ..chunks[2]
        };
        self.render_body(frame, body_area);

        let button_style = if self.state.save_button_active() {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Magenta)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray).bg(Color::DarkGray)
        };
        frame.render_widget(
            Paragraph::new(Span::styled(SAVE_LABEL, button_style)),
            chunks[4],
        );

        if let Some(error) = self.last_error() {
            let error = Paragraph::new(format!("save failed: {error}"))
                .style(Style::default().fg(Color::Red));
            frame.render_widget(error, chunks[6]);
        }

        let help = match self.state {
            NoteState::OnSave => "enter: save • tab: focus next • ctrl+c: exit",
            NoteState::SaveFailed => "enter: retry • tab: edit • ctrl+c: exit",
            _ => "tab: focus next • ctrl+c: exit",
        };
        frame.render_widget(
            Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
            chunks[7],
        );
    }

    fn render_name(&self, frame: &mut Frame, area: Rect) {
        let focused = self.state == NoteState::EditingName;
        let (label, text) = if focused {
            (active_label_style(), active_text_style())
        } else {
            (label_style(), text_style())
        };

        let value = if self.name.is_empty() {
            Span::styled(NAME_PLACEHOLDER, placeholder_style())
        } else {
            Span::styled(self.name.visible_line(0).unwrap_or_default(), text)
        };
        frame.render_widget(
            Paragraph::new(Line::from(vec![Span::styled(NAME_PROMPT, label), value])),
            area,
        );

        if focused {
            let x = area.x + (NAME_PROMPT.len() + self.name.cursor_display_x()) as u16;
            frame.set_cursor_position((x.min(area.right().saturating_sub(1)), area.y));
        }
    }

    fn render_body(&self, frame: &mut Frame, area: Rect) {
        let focused = self.state == NoteState::EditingBody;
        let (border, text) = if focused {
            (active_label_style(), active_text_style())
        } else {
            (label_style(), text_style())
        };

        let block = Block::default()
            .borders(Borders::LEFT)
            .border_style(border)
            .padding(Padding::left(1));
        let inner = block.inner(area);

        let lines: Vec<Line> = if self.body.is_empty() {
            vec![Line::from(Span::styled(BODY_PLACEHOLDER, placeholder_style()))]
        } else {
            let top = self.body.viewport.top_line;
            let bottom = (top + inner.height as usize).min(self.body.line_count());
            (top..bottom)
                .filter_map(|idx| self.body.visible_line(idx))
                .map(|l| Line::from(Span::styled(l, text)))
                .collect()
        };
        frame.render_widget(Paragraph::new(lines).block(block), area);

        if focused {
            let row = self.body.cursor.row.saturating_sub(self.body.viewport.top_line);
            let x = inner.x + self.body.cursor_display_x() as u16;
            let y = inner.y + row as u16;
            if y < inner.bottom() {
                frame.set_cursor_position((x.min(inner.right().saturating_sub(1)), y));
            }
        }
    }
}

fn label_style() -> Style {
    Style::default().fg(Color::Gray)
}

fn active_label_style() -> Style {
    Style::default()
        .fg(Color::Magenta)
        .add_modifier(Modifier::BOLD)
}

fn text_style() -> Style {
    Style::default().fg(Color::Gray)
}

fn active_text_style() -> Style {
    Style::default().fg(Color::White)
}

fn placeholder_style() -> Style {
    Style::default().fg(Color::DarkGray)
}
