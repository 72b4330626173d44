use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::model::note::NoteRecord;
use crate::store::{NoteStore, StoreError};

/// Direction for cursor movement.
#[derive(Debug, Clone, Copy)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    LineStart,
    LineEnd,
}

/// All possible messages that drive state transitions.
#[derive(Debug)]
pub enum Msg {
    // -- Input events (raw)
    Key(KeyEvent),
    Resize(u16, u16),

    // -- Save worker
    SaveCompleted(Result<String, StoreError>),

    // -- System
    Tick,
}

/// Side effects requested by `App::update`, executed by the event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cmd {
    /// Persist `record`, then answer with `Msg::SaveCompleted`.
    Save {
        record: NoteRecord,
        previous_file_name: String,
    },
}

impl Cmd {
    /// Execute the effect, blocking, and return the message reporting it.
    pub fn run(self, store: &NoteStore) -> Msg {
        match self {
            Cmd::Save {
                record,
                previous_file_name,
            } => Msg::SaveCompleted(store.save(&record, &previous_file_name)),
        }
    }
}

impl Msg {
    /// ctrl+c, which ends the session from any state.
    pub fn is_cancel(&self) -> bool {
        matches!(
            self,
            Msg::Key(KeyEvent {
                code: KeyCode::Char('c'),
                modifiers,
                kind: KeyEventKind::Press | KeyEventKind::Repeat,
                ..
            }) if modifiers.contains(KeyModifiers::CONTROL)
        )
    }
}

/// Order a drained batch of messages for dispatch. A pending cancel wins
/// over everything else in the batch, including a save completion.
pub fn prioritize(batch: Vec<Msg>) -> Vec<Msg> {
    match batch.iter().position(Msg::is_cancel) {
        Some(idx) => {
            let mut batch = batch;
            vec![batch.swap_remove(idx)]
        }
        None => batch,
    }
}
