// src/config.rs
use once_cell::sync::Lazy;
use std::env;
use std::path::PathBuf;

/// Maximum number of simultaneously live voices. Exceeding this evicts the
/// oldest voice rather than rejecting the new trigger.
pub const MAX_POLYPHONY: usize = 128;

/// Fade-out applied to a retiring voice, in milliseconds.
pub const FADE_OUT_MS: u64 = 450;

/// Extra time after the fade before the voice is hard-stopped. The fade is
/// not guaranteed to land exactly on its boundary, so the hard-stop is
/// scheduled slightly late to avoid a dangling sink.
pub const FADE_OUT_BUFFER_MS: u64 = 20;

pub const DEFAULT_VOLUME: f32 = 0.75;

/// Minimum gap between two mouse triggers of the same note.
pub const NOTE_RETRIGGER_COOLDOWN_MS: u64 = 50;

/// How long a momentary (mouse) trigger keeps a key visually lit.
pub const KEY_HIGHLIGHT_DURATION_MS: u64 = 250;

/// Sample preloading is deferred this long after launch (or until the first
/// interaction, whichever comes first) so the window appears immediately.
pub const PRELOAD_DEFER_MS: u64 = 500;

/// How many samples the preloader decodes per frame.
pub const PRELOADS_PER_TICK: usize = 4;

pub const DEFAULT_OCTAVE_RANGE: (u8, u8) = (3, 5);
pub const OCTAVE_MIN: u8 = 1;
pub const OCTAVE_MAX: u8 = 7;

pub const DEFAULT_PIANO_SCALE: f32 = 1.5;
pub const DEFAULT_LABELS_ENABLED: bool = true;
pub const DEFAULT_SOLFEGE_ENABLED: bool = true;
pub const DEFAULT_BG_COLOR: egui::Color32 = egui::Color32::from_rgb(0x1d, 0x15, 0x22);

pub const APP_TITLE: &str = "Clavier";

/// A named bank of samples, selected as a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SoundSet {
    Piano,
    Solfege,
}

impl SoundSet {
    pub const ALL: [SoundSet; 2] = [SoundSet::Piano, SoundSet::Solfege];

    /// Directory under the samples root holding this set's files.
    pub fn folder(&self) -> &'static str {
        match self {
            SoundSet::Piano => "piano",
            SoundSet::Solfege => "solfege",
        }
    }

    /// Some sets only ship samples for a fixed octave window; switching to
    /// them forces the visible range.
    pub fn locked_octave_range(&self) -> Option<(u8, u8)> {
        match self {
            SoundSet::Piano => None,
            SoundSet::Solfege => Some((3, 4)),
        }
    }
}

impl std::fmt::Display for SoundSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SoundSet::Piano => write!(f, "Piano"),
            SoundSet::Solfege => write!(f, "Solfege"),
        }
    }
}

/// Root directory for sample banks: a `samples` folder next to the
/// executable, falling back to the working directory during development.
pub static SAMPLES_DIR: Lazy<PathBuf> = Lazy::new(|| {
    if let Ok(exe_path) = env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let dir = exe_dir.join("samples");
            if dir.exists() {
                return dir;
            }
        }
    }
    PathBuf::from("samples")
});
