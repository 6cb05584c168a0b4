// src/voice_engine.rs
use crate::config::{self, SoundSet};
use crate::notes::NoteDescriptor;
use crate::sample_player::{PlaybackHandle, ResourceHandle, SamplePlayer};
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// One sounding instance of a sample, bound to a single note for its whole
/// lifetime.
struct Voice {
    note_name: String,
    playback: PlaybackHandle,
    created_at: Instant,
    /// The triggering input has signalled note-off.
    released: bool,
    /// Teardown (fade + deferred stop) has been initiated. Guards every
    /// teardown path against double-firing.
    retired: bool,
    /// When the deferred hard-stop is due, set at retirement.
    stop_at: Option<Instant>,
}

struct PreloadState {
    pending: Vec<String>,
    total: usize,
    loaded: usize,
}

/// Single authority for starting, retriggering, sustaining and retiring
/// voices. All side effects go through the injected [`SamplePlayer`]; all
/// timing is frame-driven via [`VoiceEngine::tick`].
pub struct VoiceEngine {
    player: Box<dyn SamplePlayer>,

    voices: Vec<Voice>,
    voices_by_note: HashMap<String, Vec<PlaybackHandle>>,
    held_keys: HashSet<String>,

    volume: f32,
    sound_set: SoundSet,
    sustain_mode: bool,
    pedal_active: bool,

    // (sound set folder)/(file name) -> decoded resource
    resource_cache: HashMap<String, ResourceHandle>,
    preload: Option<PreloadState>,

    max_polyphony: usize,
    fade_out: Duration,
    // fade_out plus the safety buffer before the hard stop
    kill_after: Duration,
}

impl VoiceEngine {
    pub fn new(player: Box<dyn SamplePlayer>) -> Self {
        Self::with_limits(
            player,
            config::MAX_POLYPHONY,
            Duration::from_millis(config::FADE_OUT_MS),
            Duration::from_millis(config::FADE_OUT_BUFFER_MS),
        )
    }

    pub fn with_limits(
        player: Box<dyn SamplePlayer>,
        max_polyphony: usize,
        fade_out: Duration,
        fade_out_buffer: Duration,
    ) -> Self {
        Self {
            player,
            voices: Vec::new(),
            voices_by_note: HashMap::new(),
            held_keys: HashSet::new(),
            volume: config::DEFAULT_VOLUME,
            sound_set: SoundSet::Piano,
            sustain_mode: false,
            pedal_active: false,
            resource_cache: HashMap::new(),
            preload: None,
            max_polyphony,
            fade_out,
            kill_after: fade_out + fade_out_buffer,
        }
    }

    // ----- Note triggers -----

    /// Starts a new voice for `note_name`. Voices already sounding for the
    /// note are faded out, never hard-cut, so rapid re-strikes stay
    /// click-free. At the polyphony ceiling the oldest live voice is
    /// evicted first.
    pub fn play_note(&mut self, file_name: &str, note_name: &str, is_keyboard: bool) {
        if file_name.is_empty() || note_name.is_empty() {
            return;
        }

        while self.live_voice_count() >= self.max_polyphony {
            let Some(oldest) = self.oldest_live_voice() else {
                break;
            };
            self.retire_voice(oldest);
        }

        // Cut the tails of any prior voices for this note.
        if let Some(handles) = self.voices_by_note.get(note_name).cloned() {
            for handle in handles {
                if let Some(idx) = self.voice_index(handle) {
                    self.retire_voice(idx);
                }
            }
        }

        let Some(resource) = self.resolve_resource(file_name) else {
            // Missing sample: degrade to silence, not an error.
            return;
        };
        let Some(playback) = self.player.play(resource) else {
            return;
        };
        self.player.set_gain(playback, self.volume);

        self.voices.push(Voice {
            note_name: note_name.to_string(),
            playback,
            created_at: Instant::now(),
            released: false,
            retired: false,
            stop_at: None,
        });
        self.voices_by_note
            .entry(note_name.to_string())
            .or_default()
            .push(playback);

        if is_keyboard || self.sustain_mode {
            self.held_keys.insert(note_name.to_string());
        }
    }

    /// Releases `note_name`. Under sustain mode this has no audible effect;
    /// with the pedal down the fade is deferred until the pedal lifts.
    /// Idempotent against repeated calls for the same note.
    pub fn stop_note(&mut self, note_name: &str, is_keyboard: bool) {
        if note_name.is_empty() {
            return;
        }
        if is_keyboard {
            self.held_keys.remove(note_name);
        }

        let Some(handles) = self.voices_by_note.get(note_name).cloned() else {
            return;
        };
        for handle in handles {
            let Some(idx) = self.voice_index(handle) else {
                continue;
            };
            self.voices[idx].released = true;
            if !self.pedal_active && !self.sustain_mode {
                self.retire_voice(idx);
            }
        }
    }

    /// Retires every live voice immediately, ignoring pedal and sustain
    /// deferral, and resets all transient input state.
    pub fn stop_all_notes(&mut self) {
        for idx in 0..self.voices.len() {
            self.retire_voice(idx);
        }
        self.voices_by_note.clear();
        self.held_keys.clear();
        self.pedal_active = false;
    }

    // ----- Pedal and modes -----

    /// Momentary hold pedal. Releasing it flushes every fade deferred while
    /// it was down. Inert while sustain mode is on.
    pub fn set_pedal(&mut self, active: bool) {
        if self.pedal_active == active {
            return;
        }
        self.pedal_active = active;
        if !active && !self.sustain_mode {
            for idx in 0..self.voices.len() {
                if self.voices[idx].released && !self.voices[idx].retired {
                    self.retire_voice(idx);
                }
            }
        }
    }

    pub fn set_sustain_mode(&mut self, on: bool) {
        self.sustain_mode = on;
    }

    pub fn sustain_mode(&self) -> bool {
        self.sustain_mode
    }

    pub fn pedal_active(&self) -> bool {
        self.pedal_active
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Switches the active sample bank, unloading the previous bank's
    /// decoded resources. In-flight voices are not force-stopped here; the
    /// caller is expected to stop them first.
    pub fn set_sound_set(&mut self, sound_set: SoundSet) {
        if self.sound_set == sound_set {
            return;
        }
        for (_, handle) in self.resource_cache.drain() {
            self.player.unload(handle);
        }
        self.preload = None;
        self.sound_set = sound_set;
    }

    pub fn sound_set(&self) -> SoundSet {
        self.sound_set
    }

    // ----- Frame tick -----

    /// Advances fades, reaps naturally-ended playbacks and executes deferred
    /// hard-stops whose deadline has passed.
    pub fn tick(&mut self, now: Instant) {
        self.player.tick(now);

        for ended in self.player.take_ended() {
            self.remove_voice(ended);
        }

        let due: Vec<PlaybackHandle> = self
            .voices
            .iter()
            .filter(|v| matches!(v.stop_at, Some(at) if at <= now))
            .map(|v| v.playback)
            .collect();
        for handle in due {
            self.player.stop(handle);
            self.remove_voice(handle);
        }
    }

    // ----- Preloading -----

    /// Begins warming the sample cache for the given note set. Progress is
    /// reported via [`VoiceEngine::preload_progress`]; decode failures count
    /// as loaded so progress always reaches 1.0.
    pub fn start_preload(&mut self, notes: &[NoteDescriptor]) {
        let folder = self.sound_set.folder();
        let pending: Vec<String> = notes
            .iter()
            .map(|n| format!("{}/{}", folder, n.file_name))
            .collect();
        let total = pending.len();
        self.preload = Some(PreloadState {
            pending,
            total,
            loaded: 0,
        });
    }

    /// Loads a bounded batch of pending samples. Called once per frame so a
    /// large bank does not stall the UI.
    pub fn preload_tick(&mut self) {
        let Some(mut state) = self.preload.take() else {
            return;
        };
        for _ in 0..config::PRELOADS_PER_TICK {
            let Some(key) = state.pending.pop() else {
                break;
            };
            if !self.resource_cache.contains_key(&key) {
                if let Some(handle) = self.player.load(&key) {
                    self.resource_cache.insert(key, handle);
                }
            }
            state.loaded += 1;
        }
        self.preload = Some(state);
    }

    pub fn preload_progress(&self) -> f32 {
        match &self.preload {
            Some(state) if state.total > 0 => state.loaded as f32 / state.total as f32,
            _ => 1.0,
        }
    }

    pub fn is_preloading(&self) -> bool {
        matches!(&self.preload, Some(state) if state.loaded < state.total)
    }

    // ----- Introspection -----

    pub fn live_voice_count(&self) -> usize {
        self.voices.iter().filter(|v| !v.retired).count()
    }

    pub fn is_note_live(&self, note_name: &str) -> bool {
        self.voices
            .iter()
            .any(|v| !v.retired && v.note_name == note_name)
    }

    // ----- Internals -----

    fn resolve_resource(&mut self, file_name: &str) -> Option<ResourceHandle> {
        let key = format!("{}/{}", self.sound_set.folder(), file_name);
        if let Some(handle) = self.resource_cache.get(&key) {
            return Some(*handle);
        }
        let handle = self.player.load(&key)?;
        self.resource_cache.insert(key, handle);
        Some(handle)
    }

    fn voice_index(&self, handle: PlaybackHandle) -> Option<usize> {
        self.voices.iter().position(|v| v.playback == handle)
    }

    fn oldest_live_voice(&self) -> Option<usize> {
        self.voices
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.retired)
            .min_by_key(|(_, v)| v.created_at)
            .map(|(idx, _)| idx)
    }

    /// Initiates fade-then-stop teardown for one voice. Does nothing if the
    /// voice is already retired.
    fn retire_voice(&mut self, idx: usize) {
        let voice = &mut self.voices[idx];
        if voice.retired {
            return;
        }
        voice.retired = true;

        // Fade from wherever the gain currently is; the engine volume is a
        // fallback when the backend cannot report it.
        let from = self.player.gain(voice.playback).unwrap_or(self.volume);
        self.player.fade_gain(voice.playback, from, 0.0, self.fade_out);
        voice.stop_at = Some(Instant::now() + self.kill_after);
    }

    /// Drops a voice from both indices. Safe to call for a handle that was
    /// already removed by another path.
    fn remove_voice(&mut self, handle: PlaybackHandle) {
        let Some(idx) = self.voice_index(handle) else {
            return;
        };
        let note_name = self.voices[idx].note_name.clone();
        self.voices.remove(idx);

        if let Some(bucket) = self.voices_by_note.get_mut(&note_name) {
            bucket.retain(|h| *h != handle);
            if bucket.is_empty() {
                self.voices_by_note.remove(&note_name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct MockState {
        next_id: u64,
        loaded: Vec<String>,
        load_failures: HashSet<String>,
        playing: HashMap<PlaybackHandle, f32>,
        fades: Vec<(PlaybackHandle, f32, f32, Duration)>,
        stops: Vec<PlaybackHandle>,
        unloads: Vec<ResourceHandle>,
        ended_queue: Vec<PlaybackHandle>,
        report_gain: bool,
    }

    #[derive(Clone)]
    struct MockPlayer {
        state: Rc<RefCell<MockState>>,
    }

    impl MockPlayer {
        fn new() -> (Self, Rc<RefCell<MockState>>) {
            let state = Rc::new(RefCell::new(MockState {
                report_gain: true,
                ..Default::default()
            }));
            (Self { state: state.clone() }, state)
        }
    }

    impl SamplePlayer for MockPlayer {
        fn load(&mut self, key: &str) -> Option<ResourceHandle> {
            let mut s = self.state.borrow_mut();
            if s.load_failures.contains(key) {
                return None;
            }
            s.loaded.push(key.to_string());
            s.next_id += 1;
            // Shares the playback id counter; uniqueness is all that matters.
            Some(ResourceHandle::new(s.next_id))
        }

        fn play(&mut self, _resource: ResourceHandle) -> Option<PlaybackHandle> {
            let mut s = self.state.borrow_mut();
            s.next_id += 1;
            let handle = PlaybackHandle::new(s.next_id);
            s.playing.insert(handle, 1.0);
            Some(handle)
        }

        fn gain(&self, playback: PlaybackHandle) -> Option<f32> {
            let s = self.state.borrow();
            if !s.report_gain {
                return None;
            }
            s.playing.get(&playback).copied()
        }

        fn set_gain(&mut self, playback: PlaybackHandle, gain: f32) {
            self.state.borrow_mut().playing.insert(playback, gain);
        }

        fn fade_gain(&mut self, playback: PlaybackHandle, from: f32, to: f32, duration: Duration) {
            self.state.borrow_mut().fades.push((playback, from, to, duration));
        }

        fn stop(&mut self, playback: PlaybackHandle) {
            let mut s = self.state.borrow_mut();
            s.playing.remove(&playback);
            s.stops.push(playback);
        }

        fn unload(&mut self, resource: ResourceHandle) {
            self.state.borrow_mut().unloads.push(resource);
        }

        fn take_ended(&mut self) -> Vec<PlaybackHandle> {
            std::mem::take(&mut self.state.borrow_mut().ended_queue)
        }
    }

    fn engine_with_ceiling(ceiling: usize) -> (VoiceEngine, Rc<RefCell<MockState>>) {
        let (player, state) = MockPlayer::new();
        let engine = VoiceEngine::with_limits(
            Box::new(player),
            ceiling,
            Duration::from_millis(config::FADE_OUT_MS),
            Duration::from_millis(config::FADE_OUT_BUFFER_MS),
        );
        (engine, state)
    }

    #[test]
    fn polyphony_ceiling_evicts_the_single_oldest_voice() {
        let (mut engine, state) = engine_with_ceiling(2);
        engine.play_note("C4", "C4", false);
        engine.play_note("D4", "D4", false);
        engine.play_note("E4", "E4", false);

        assert_eq!(engine.live_voice_count(), 2);
        assert!(!engine.is_note_live("C4"));
        assert!(engine.is_note_live("D4"));
        assert!(engine.is_note_live("E4"));

        // The evicted voice was faded, not hard-stopped.
        assert_eq!(state.borrow().fades.len(), 1);
        assert!(state.borrow().stops.is_empty());
    }

    #[test]
    fn retrigger_fades_the_prior_voice_and_keeps_exactly_one_live() {
        let (mut engine, state) = engine_with_ceiling(8);
        engine.play_note("C4", "C4", false);
        engine.play_note("C4", "C4", false);

        assert_eq!(engine.live_voice_count(), 1);
        assert!(engine.is_note_live("C4"));
        assert_eq!(state.borrow().fades.len(), 1);
        assert!(state.borrow().stops.is_empty());
    }

    #[test]
    fn sustain_mode_suppresses_release() {
        let (mut engine, state) = engine_with_ceiling(8);
        engine.set_sustain_mode(true);
        engine.play_note("C4", "C4", false);
        engine.play_note("E4", "E4", false);

        engine.stop_note("C4", false);
        engine.stop_note("C4", false);
        engine.stop_note("E4", false);

        assert_eq!(engine.live_voice_count(), 2);
        assert!(state.borrow().fades.is_empty());

        engine.stop_all_notes();
        assert_eq!(engine.live_voice_count(), 0);
        assert_eq!(state.borrow().fades.len(), 2);
    }

    #[test]
    fn sustain_mode_retrigger_still_replaces_the_old_voice() {
        let (mut engine, state) = engine_with_ceiling(8);
        engine.set_sustain_mode(true);
        engine.play_note("C4", "C4", false);
        engine.play_note("C4", "C4", false);

        assert_eq!(engine.live_voice_count(), 1);
        assert_eq!(state.borrow().fades.len(), 1);
    }

    #[test]
    fn pedal_defers_release_then_flushes_on_lift() {
        let (mut engine, state) = engine_with_ceiling(8);
        engine.set_pedal(true);
        engine.play_note("C4", "C4", false);
        engine.play_note("E4", "E4", false);

        engine.stop_note("C4", false);
        assert_eq!(engine.live_voice_count(), 2);
        assert!(state.borrow().fades.is_empty());

        engine.set_pedal(false);
        // Only the released note is flushed; E4 is still held.
        assert_eq!(engine.live_voice_count(), 1);
        assert!(engine.is_note_live("E4"));
        assert_eq!(state.borrow().fades.len(), 1);
    }

    #[test]
    fn pedal_release_is_inert_under_sustain_mode() {
        let (mut engine, state) = engine_with_ceiling(8);
        engine.set_sustain_mode(true);
        engine.set_pedal(true);
        engine.play_note("C4", "C4", false);
        engine.stop_note("C4", false);
        engine.set_pedal(false);

        assert_eq!(engine.live_voice_count(), 1);
        assert!(state.borrow().fades.is_empty());
    }

    #[test]
    fn teardown_is_idempotent() {
        let (mut engine, state) = engine_with_ceiling(8);
        engine.play_note("C4", "C4", false);
        engine.stop_note("C4", false);
        engine.stop_note("C4", false);
        engine.stop_all_notes();

        assert_eq!(state.borrow().fades.len(), 1);

        engine.tick(Instant::now() + Duration::from_millis(config::FADE_OUT_MS * 2));
        assert_eq!(state.borrow().stops.len(), 1);

        // A second tick past the deadline must not stop the voice again.
        engine.tick(Instant::now() + Duration::from_millis(config::FADE_OUT_MS * 4));
        assert_eq!(state.borrow().stops.len(), 1);
    }

    #[test]
    fn release_then_fade_deadline_silences_everything() {
        let (mut engine, state) = engine_with_ceiling(8);
        engine.play_note("x", "C4", false);
        engine.stop_note("C4", false);

        assert_eq!(state.borrow().fades.len(), 1);
        assert_eq!(engine.live_voice_count(), 0);

        let after_kill = Instant::now()
            + Duration::from_millis(config::FADE_OUT_MS + config::FADE_OUT_BUFFER_MS + 50);
        engine.tick(after_kill);

        assert_eq!(state.borrow().stops.len(), 1);
        assert!(state.borrow().playing.is_empty());
        assert!(engine.voices.is_empty());
        assert!(engine.voices_by_note.is_empty());
    }

    #[test]
    fn fade_starts_from_current_gain_with_volume_fallback() {
        let (mut engine, state) = engine_with_ceiling(8);
        engine.set_volume(0.4);
        engine.play_note("C4", "C4", false);
        engine.stop_note("C4", false);
        {
            let s = state.borrow();
            // set_gain at trigger time put the voice at the engine volume.
            assert!((s.fades[0].1 - 0.4).abs() < 1e-6);
        }

        state.borrow_mut().report_gain = false;
        engine.set_volume(0.9);
        engine.play_note("D4", "D4", false);
        engine.stop_note("D4", false);
        let s = state.borrow();
        assert!((s.fades[1].1 - 0.9).abs() < 1e-6);
    }

    #[test]
    fn naturally_ended_voices_are_reaped() {
        let (mut engine, state) = engine_with_ceiling(8);
        engine.play_note("C4", "C4", false);
        assert_eq!(engine.live_voice_count(), 1);

        let handle = engine.voices[0].playback;
        state.borrow_mut().ended_queue.push(handle);
        engine.tick(Instant::now());

        assert_eq!(engine.live_voice_count(), 0);
        assert!(engine.voices_by_note.is_empty());
        // Natural end needs no explicit stop call.
        assert!(state.borrow().stops.is_empty());
    }

    #[test]
    fn eviction_racing_a_natural_end_is_harmless() {
        let (mut engine, state) = engine_with_ceiling(1);
        engine.play_note("C4", "C4", false);
        let handle = engine.voices[0].playback;

        // The voice is evicted by pressure and its end notification fires in
        // the same frame.
        engine.play_note("D4", "D4", false);
        state.borrow_mut().ended_queue.push(handle);
        engine.tick(Instant::now());
        engine.tick(Instant::now() + Duration::from_secs(2));

        assert_eq!(state.borrow().fades.len(), 1);
        assert!(state.borrow().stops.is_empty());
        assert!(engine.is_note_live("D4"));
    }

    #[test]
    fn missing_sample_degrades_to_silence() {
        let (mut engine, state) = engine_with_ceiling(8);
        state.borrow_mut().load_failures.insert("piano/C4".to_string());

        engine.play_note("C4", "C4", false);
        assert_eq!(engine.live_voice_count(), 0);
        assert!(state.borrow().playing.is_empty());
    }

    #[test]
    fn empty_trigger_arguments_are_rejected() {
        let (mut engine, state) = engine_with_ceiling(8);
        engine.play_note("", "C4", false);
        engine.play_note("C4", "", false);
        engine.stop_note("", false);

        assert_eq!(engine.live_voice_count(), 0);
        assert!(state.borrow().loaded.is_empty());
    }

    #[test]
    fn keyboard_and_sustain_triggers_mark_held_keys() {
        let (mut engine, _) = engine_with_ceiling(8);
        engine.play_note("C4", "C4", true);
        assert!(engine.held_keys.contains("C4"));

        engine.stop_note("C4", true);
        assert!(!engine.held_keys.contains("C4"));

        engine.set_sustain_mode(true);
        engine.play_note("D4", "D4", false);
        assert!(engine.held_keys.contains("D4"));
    }

    #[test]
    fn resources_are_cached_per_sound_set_and_unloaded_on_switch() {
        let (mut engine, state) = engine_with_ceiling(8);
        engine.play_note("C4", "C4", false);
        engine.play_note("C4", "C4", false);
        assert_eq!(state.borrow().loaded, vec!["piano/C4".to_string()]);

        engine.stop_all_notes();
        engine.set_sound_set(SoundSet::Solfege);
        assert_eq!(state.borrow().unloads.len(), 1);

        engine.play_note("C4", "C4", false);
        assert_eq!(state.borrow().loaded.last().unwrap(), "solfege/C4");
    }

    #[test]
    fn preload_counts_failures_as_loaded() {
        let (mut engine, state) = engine_with_ceiling(8);
        state.borrow_mut().load_failures.insert("piano/Cs3".to_string());

        let notes = crate::notes::generate_notes(3, 4);
        engine.start_preload(&notes);
        assert!(engine.is_preloading());
        assert_eq!(engine.preload_progress(), 0.0);

        for _ in 0..64 {
            engine.preload_tick();
        }
        assert!(!engine.is_preloading());
        assert!((engine.preload_progress() - 1.0).abs() < 1e-6);
        // 13 notes, one of which failed to decode.
        assert_eq!(state.borrow().loaded.len(), 12);
    }
}
