// src/input/mouse.rs
use super::active_notes::ActiveNotes;
use super::NoteSink;
use crate::config;
use std::time::{Duration, Instant};

/// Mouse adapter: one pointer, one note at a time. A drag across the
/// keyboard glides, stopping the previous note before the next starts,
/// so a continuous gesture never leaves two notes sounding.
#[derive(Default)]
pub struct MouseAdapter {
    button_down: bool,
    /// Note currently sounding from this pointer.
    current: Option<String>,
    last_trigger: Option<(String, Instant)>,
}

impl MouseAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Primary button pressed over a key.
    pub fn press(
        &mut self,
        file_name: &str,
        note_name: &str,
        sink: &mut dyn NoteSink,
        active: &mut ActiveNotes,
        now: Instant,
    ) {
        self.button_down = true;
        self.trigger(file_name, note_name, sink, active, now);
    }

    /// Pointer moved over a key. Only glides while the button is down.
    pub fn hover(
        &mut self,
        file_name: &str,
        note_name: &str,
        sink: &mut dyn NoteSink,
        active: &mut ActiveNotes,
        now: Instant,
    ) {
        if !self.button_down {
            return;
        }
        if matches!(&self.current, Some(cur) if cur == note_name) {
            return;
        }
        self.trigger(file_name, note_name, sink, active, now);
    }

    /// Button released, anywhere on screen. Mirrors the global listener the
    /// UI installs so a release outside the keys still stops the note.
    pub fn release(&mut self, sink: &mut dyn NoteSink, active: &mut ActiveNotes) {
        if let Some(note_name) = self.current.take() {
            sink.stop_note(&note_name, false);
        }
        self.button_down = false;
        active.clear();
    }

    fn trigger(
        &mut self,
        file_name: &str,
        note_name: &str,
        sink: &mut dyn NoteSink,
        active: &mut ActiveNotes,
        now: Instant,
    ) {
        // Debounce click spam on a single key.
        if let Some((last, at)) = &self.last_trigger {
            if last == note_name
                && now.saturating_duration_since(*at)
                    < Duration::from_millis(config::NOTE_RETRIGGER_COOLDOWN_MS)
            {
                return;
            }
        }

        if let Some(cur) = &self.current {
            if cur != note_name {
                sink.stop_note(cur, false);
            }
        }

        self.current = Some(note_name.to_string());
        self.last_trigger = Some((note_name.to_string(), now));
        sink.play_note(file_name, note_name, false);
        active.flash(
            note_name,
            Duration::from_millis(config::KEY_HIGHLIGHT_DURATION_MS),
            now,
        );
    }
}
