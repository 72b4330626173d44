/// Interaction states of the note editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoteState {
    /// Typing the note name.
    #[default]
    EditingName,
    /// Typing the note body.
    EditingBody,
    /// Save button focused.
    OnSave,
    /// Save request in flight.
    CommittingSave,
    /// Note written; the session is over.
    SaveSuccess,
    /// Last save attempt failed; buffers are intact.
    SaveFailed,
    /// ctrl+c pressed; the session is over.
    Cancelled,
}

/// The text field that receives editing keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Body,
}

impl NoteState {
    pub fn label(&self) -> &'static str {
        match self {
            NoteState::EditingName => "NAME",
            NoteState::EditingBody => "BODY",
            NoteState::OnSave => "SAVE",
            NoteState::CommittingSave => "SAVING",
            NoteState::SaveSuccess => "SAVED",
            NoteState::SaveFailed => "FAILED",
            NoteState::Cancelled => "CANCELLED",
        }
    }

    /// Whether the session has ended and the event loop should stop.
    pub fn is_terminal(&self) -> bool {
        matches!(self, NoteState::SaveSuccess | NoteState::Cancelled)
    }

    /// Where `tab` moves focus, or `None` when `tab` is inert.
    pub fn next_focus(&self) -> Option<NoteState> {
        match self {
            NoteState::EditingName => Some(NoteState::EditingBody),
            NoteState::EditingBody => Some(NoteState::OnSave),
            NoteState::OnSave | NoteState::SaveFailed => Some(NoteState::EditingName),
            NoteState::CommittingSave | NoteState::SaveSuccess | NoteState::Cancelled => None,
        }
    }

    /// The focused text field. Only the two editing states focus one.
    pub fn focused_field(&self) -> Option<Field> {
        match self {
            NoteState::EditingName => Some(Field::Name),
            NoteState::EditingBody => Some(Field::Body),
            _ => None,
        }
    }

    /// Whether the save button is drawn emphasized.
    pub fn save_button_active(&self) -> bool {
        matches!(self, NoteState::OnSave | NoteState::CommittingSave)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [NoteState; 7] = [
        NoteState::EditingName,
        NoteState::EditingBody,
        NoteState::OnSave,
        NoteState::CommittingSave,
        NoteState::SaveSuccess,
        NoteState::SaveFailed,
        NoteState::Cancelled,
    ];

    #[test]
    fn tab_cycles_through_editing_states() {
        let mut state = NoteState::EditingName;
        let mut seen = Vec::new();
        for _ in 0..3 {
            state = state.next_focus().unwrap();
            seen.push(state);
        }
        assert_eq!(
            seen,
            [NoteState::EditingBody, NoteState::OnSave, NoteState::EditingName]
        );
    }

    #[test]
    fn at_most_one_field_is_focused() {
        for state in ALL {
            let expected = match state {
                NoteState::EditingName => Some(Field::Name),
                NoteState::EditingBody => Some(Field::Body),
                _ => None,
            };
            assert_eq!(state.focused_field(), expected, "{state:?}");
        }
    }

    #[test]
    fn terminal_states_ignore_tab() {
        for state in ALL.into_iter().filter(NoteState::is_terminal) {
            assert_eq!(state.next_focus(), None);
        }
        assert_eq!(NoteState::CommittingSave.next_focus(), None);
    }
}
