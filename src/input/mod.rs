// src/input/mod.rs
pub mod active_notes;
pub mod keyboard;
pub mod mouse;
pub mod touch;

use crate::voice_engine::VoiceEngine;

/// The adapters' only view of the voice engine. Keeping the seam this
/// narrow lets adapter tests record calls instead of running audio.
pub trait NoteSink {
    fn play_note(&mut self, file_name: &str, note_name: &str, is_keyboard: bool);
    fn stop_note(&mut self, note_name: &str, is_keyboard: bool);
}

impl NoteSink for VoiceEngine {
    fn play_note(&mut self, file_name: &str, note_name: &str, is_keyboard: bool) {
        VoiceEngine::play_note(self, file_name, note_name, is_keyboard);
    }

    fn stop_note(&mut self, note_name: &str, is_keyboard: bool) {
        VoiceEngine::stop_note(self, note_name, is_keyboard);
    }
}
