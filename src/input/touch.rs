// src/input/touch.rs
use super::active_notes::ActiveNotes;
use super::NoteSink;
use std::collections::HashMap;

/// Multi-touch adapter: every contact point is tracked by its own id, can
/// sit on its own note and glide independently. Lifting a contact stops
/// only the note that contact was bound to.
#[derive(Default)]
pub struct TouchAdapter {
    /// contact id -> (file_name, note_name)
    contacts: HashMap<u64, (String, String)>,
}

impl TouchAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(
        &mut self,
        id: u64,
        file_name: &str,
        note_name: &str,
        sink: &mut dyn NoteSink,
        active: &mut ActiveNotes,
    ) {
        if file_name.is_empty() || note_name.is_empty() {
            return;
        }
        // A contact already bound to a note keeps it; duplicates of the
        // same start event must not retrigger.
        if self.contacts.contains_key(&id) {
            return;
        }
        self.contacts
            .insert(id, (file_name.to_string(), note_name.to_string()));
        sink.play_note(file_name, note_name, false);
        active.activate(note_name);
    }

    /// Contact moved; `note_name` is whatever key is now under it.
    pub fn moved(
        &mut self,
        id: u64,
        file_name: &str,
        note_name: &str,
        sink: &mut dyn NoteSink,
        active: &mut ActiveNotes,
    ) {
        let Some((_, current)) = self.contacts.get(&id) else {
            return;
        };
        if current == note_name {
            return;
        }

        if let Some((_, old_note)) = self
            .contacts
            .insert(id, (file_name.to_string(), note_name.to_string()))
        {
            sink.stop_note(&old_note, false);
            active.deactivate(&old_note);
        }
        sink.play_note(file_name, note_name, false);
        active.activate(note_name);
    }

    pub fn end(&mut self, id: u64, sink: &mut dyn NoteSink, active: &mut ActiveNotes) {
        if let Some((_, note_name)) = self.contacts.remove(&id) {
            sink.stop_note(&note_name, false);
            active.deactivate(&note_name);
        }
    }

    pub fn active_contacts(&self) -> usize {
        self.contacts.len()
    }
}
