// src/input/keyboard.rs
use super::active_notes::ActiveNotes;
use super::NoteSink;
use crate::notes::NoteDescriptor;
use std::collections::HashSet;

/// Physical-keyboard adapter. Tracks which bound characters are currently
/// down so OS auto-repeat and redundant key-ups never reach the engine.
/// The sustain-toggle key is reserved by the app and never routed here.
#[derive(Default)]
pub struct KeyboardAdapter {
    pressed: HashSet<char>,
}

impl KeyboardAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(
        &mut self,
        notes: &[NoteDescriptor],
        ch: char,
        repeat: bool,
        sink: &mut dyn NoteSink,
        active: &mut ActiveNotes,
    ) {
        if repeat {
            return;
        }
        let Some(note) = notes.iter().find(|n| n.key == Some(ch)) else {
            return;
        };
        if !self.pressed.insert(ch) {
            return;
        }

        sink.play_note(&note.file_name, &note.name, true);
        // A key has an explicit release, so the highlight is held, not a
        // timed flash.
        active.activate(&note.name);
    }

    pub fn key_up(
        &mut self,
        notes: &[NoteDescriptor],
        ch: char,
        sink: &mut dyn NoteSink,
        active: &mut ActiveNotes,
    ) {
        let Some(note) = notes.iter().find(|n| n.key == Some(ch)) else {
            return;
        };
        if !self.pressed.remove(&ch) {
            return;
        }

        sink.stop_note(&note.name, true);
        active.deactivate(&note.name);
    }

    /// Drops all tracked keys, e.g. when the window loses focus.
    pub fn release_all(
        &mut self,
        notes: &[NoteDescriptor],
        sink: &mut dyn NoteSink,
        active: &mut ActiveNotes,
    ) {
        for ch in std::mem::take(&mut self.pressed) {
            if let Some(note) = notes.iter().find(|n| n.key == Some(ch)) {
                sink.stop_note(&note.name, true);
                active.deactivate(&note.name);
            }
        }
    }
}
