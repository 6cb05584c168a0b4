// src/input/active_notes.rs
use std::collections::HashSet;
use std::time::{Duration, Instant};

/// Shared "visually lit keys" set, fed by all three input adapters. A note
/// stays lit while some input source claims it; momentary triggers with no
/// explicit release use a timed flash instead.
#[derive(Default)]
pub struct ActiveNotes {
    active: HashSet<String>,
    flashes: Vec<(String, Instant)>,
}

impl ActiveNotes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activate(&mut self, note: &str) {
        self.active.insert(note.to_string());
    }

    pub fn deactivate(&mut self, note: &str) {
        self.active.remove(note);
        self.flashes.retain(|(n, _)| n != note);
    }

    /// Lights a note and schedules it to go dark after `duration`.
    pub fn flash(&mut self, note: &str, duration: Duration, now: Instant) {
        self.activate(note);
        self.flashes.push((note.to_string(), now + duration));
    }

    pub fn clear(&mut self) {
        self.active.clear();
        self.flashes.clear();
    }

    /// Expires due flashes. Called once per frame.
    pub fn tick(&mut self, now: Instant) {
        let mut expired = Vec::new();
        self.flashes.retain(|(note, expires)| {
            if *expires <= now {
                expired.push(note.clone());
                false
            } else {
                true
            }
        });
        for note in expired {
            self.active.remove(&note);
        }
    }

    pub fn is_active(&self, note: &str) -> bool {
        self.active.contains(note)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flash_expires_after_its_duration() {
        let mut notes = ActiveNotes::new();
        let now = Instant::now();
        notes.flash("C4", Duration::from_millis(250), now);
        assert!(notes.is_active("C4"));

        notes.tick(now + Duration::from_millis(100));
        assert!(notes.is_active("C4"));

        notes.tick(now + Duration::from_millis(300));
        assert!(!notes.is_active("C4"));
    }

    #[test]
    fn deactivate_cancels_a_pending_flash() {
        let mut notes = ActiveNotes::new();
        let now = Instant::now();
        notes.flash("C4", Duration::from_millis(250), now);
        notes.deactivate("C4");
        assert!(!notes.is_active("C4"));

        // A later activate must not be killed by the cancelled flash.
        notes.activate("C4");
        notes.tick(now + Duration::from_millis(300));
        assert!(notes.is_active("C4"));
    }

    #[test]
    fn clear_drops_everything() {
        let mut notes = ActiveNotes::new();
        let now = Instant::now();
        notes.activate("C4");
        notes.flash("D4", Duration::from_millis(250), now);
        notes.clear();
        assert!(!notes.is_active("C4"));
        assert!(!notes.is_active("D4"));
    }
}
