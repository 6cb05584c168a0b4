// src/app.rs
use crate::config::{self, SoundSet};
use crate::input::active_notes::ActiveNotes;
use crate::input::keyboard::KeyboardAdapter;
use crate::input::mouse::MouseAdapter;
use crate::input::touch::TouchAdapter;
use crate::notes::{self, NoteDescriptor};
use crate::sample_player::RodioPlayer;
use crate::ui;
use crate::voice_engine::VoiceEngine;
use anyhow::Result;
use egui::{Color32, Event, Key, PointerButton, RichText, TouchPhase};
use std::time::{Duration, Instant};

pub struct ClavierApp {
    pub engine: VoiceEngine,

    keyboard: KeyboardAdapter,
    mouse: MouseAdapter,
    touch: TouchAdapter,
    pub active_notes: ActiveNotes,

    pub notes: Vec<NoteDescriptor>,
    pub start_octave: u8,
    pub end_octave: u8,

    pub volume: f32,
    pub labels_enabled: bool,
    pub solfege_enabled: bool,
    pub piano_scale: f32,
    pub bg_color: Color32,

    /// Key rects recorded by the piano view this frame, for hit-testing.
    pub key_rects: Vec<ui::KeyRect>,

    launched_at: Instant,
    preload_started: bool,
    shift_was_down: bool,
}

impl ClavierApp {
    pub fn new(_cc: &eframe::CreationContext) -> Result<Self> {
        let player = RodioPlayer::new()?;
        let mut engine = VoiceEngine::new(Box::new(player));
        engine.set_volume(config::DEFAULT_VOLUME);

        let (start_octave, end_octave) = config::DEFAULT_OCTAVE_RANGE;

        Ok(Self {
            engine,
            keyboard: KeyboardAdapter::new(),
            mouse: MouseAdapter::new(),
            touch: TouchAdapter::new(),
            active_notes: ActiveNotes::new(),
            notes: notes::generate_notes(start_octave, end_octave),
            start_octave,
            end_octave,
            volume: config::DEFAULT_VOLUME,
            labels_enabled: config::DEFAULT_LABELS_ENABLED,
            solfege_enabled: config::DEFAULT_SOLFEGE_ENABLED,
            piano_scale: config::DEFAULT_PIANO_SCALE,
            bg_color: config::DEFAULT_BG_COLOR,
            key_rects: Vec::new(),
            launched_at: Instant::now(),
            preload_started: false,
            shift_was_down: false,
        })
    }

    /// Space toggles sustain; turning it off cuts everything that was
    /// ringing under it.
    pub fn toggle_sustain(&mut self) {
        let on = !self.engine.sustain_mode();
        self.engine.set_sustain_mode(on);
        if !on {
            self.engine.stop_all_notes();
            self.active_notes.clear();
        }
    }

    /// Switches the sample bank: silence first, then swap the cache, then
    /// apply any octave window the new bank is locked to.
    pub fn apply_sound_set(&mut self, sound_set: SoundSet) {
        if self.engine.sound_set() == sound_set {
            return;
        }
        self.engine.stop_all_notes();
        self.active_notes.clear();
        self.engine.set_sound_set(sound_set);

        if let Some((lo, hi)) = sound_set.locked_octave_range() {
            self.start_octave = lo;
            self.end_octave = hi;
            self.piano_scale = config::DEFAULT_PIANO_SCALE;
        }
        self.rebuild_notes();
    }

    pub fn rebuild_notes(&mut self) {
        self.notes = notes::generate_notes(self.start_octave, self.end_octave);
        if self.preload_started {
            self.engine.start_preload(&self.notes);
        }
    }

    fn maybe_start_preload(&mut self) {
        if !self.preload_started {
            self.preload_started = true;
            self.engine.start_preload(&self.notes);
        }
    }

    fn note_fields(&self, note_index: usize) -> (String, String) {
        let note = &self.notes[note_index];
        (note.file_name.clone(), note.name.clone())
    }

    fn handle_events(&mut self, ctx: &egui::Context, now: Instant) {
        let events = ctx.input(|i| i.events.clone());
        let shift_down = ctx.input(|i| i.modifiers.shift);

        // Shift is the momentary hold pedal; it is inert in sustain mode.
        if shift_down != self.shift_was_down {
            self.shift_was_down = shift_down;
            if !self.engine.sustain_mode() {
                self.engine.set_pedal(shift_down);
            }
        }

        for event in events {
            match event {
                Event::Key { key, pressed, repeat, modifiers, .. } => {
                    self.maybe_start_preload();

                    if key == Key::Space {
                        if pressed && !repeat {
                            self.toggle_sustain();
                        }
                        continue;
                    }
                    // Leave OS/app shortcuts alone.
                    if modifiers.command || modifiers.ctrl || modifiers.alt {
                        continue;
                    }
                    let Some(ch) = key_to_char(key) else {
                        continue;
                    };
                    if pressed {
                        self.keyboard.key_down(
                            &self.notes,
                            ch,
                            repeat,
                            &mut self.engine,
                            &mut self.active_notes,
                        );
                    } else {
                        self.keyboard.key_up(&self.notes, ch, &mut self.engine, &mut self.active_notes);
                    }
                }
                Event::PointerButton { pos, button: PointerButton::Primary, pressed, .. } => {
                    self.maybe_start_preload();

                    if pressed {
                        if let Some(idx) = ui::note_at(&self.key_rects, pos) {
                            let (file, name) = self.note_fields(idx);
                            self.mouse.press(&file, &name, &mut self.engine, &mut self.active_notes, now);
                        }
                    } else {
                        // Global release: the button may come up anywhere.
                        self.mouse.release(&mut self.engine, &mut self.active_notes);
                    }
                }
                Event::PointerMoved(pos) => {
                    if let Some(idx) = ui::note_at(&self.key_rects, pos) {
                        let (file, name) = self.note_fields(idx);
                        self.mouse.hover(&file, &name, &mut self.engine, &mut self.active_notes, now);
                    }
                }
                Event::Touch { id, phase, pos, .. } => {
                    self.maybe_start_preload();

                    match phase {
                        TouchPhase::Start => {
                            if let Some(idx) = ui::note_at(&self.key_rects, pos) {
                                let (file, name) = self.note_fields(idx);
                                self.touch.start(id.0, &file, &name, &mut self.engine, &mut self.active_notes);
                            }
                        }
                        TouchPhase::Move => {
                            if let Some(idx) = ui::note_at(&self.key_rects, pos) {
                                let (file, name) = self.note_fields(idx);
                                self.touch.moved(id.0, &file, &name, &mut self.engine, &mut self.active_notes);
                            }
                        }
                        TouchPhase::End | TouchPhase::Cancel => {
                            self.touch.end(id.0, &mut self.engine, &mut self.active_notes);
                        }
                    }
                }
                Event::WindowFocused(false) => {
                    self.keyboard.release_all(&self.notes, &mut self.engine, &mut self.active_notes);
                    self.mouse.release(&mut self.engine, &mut self.active_notes);
                    if !self.engine.sustain_mode() {
                        self.engine.set_pedal(false);
                        self.shift_was_down = false;
                    }
                }
                _ => {}
            }
        }
    }
}

fn key_to_char(key: Key) -> Option<char> {
    let name = key.name();
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => Some(c.to_ascii_lowercase()),
        _ => None,
    }
}

impl eframe::App for ClavierApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();

        // Deferred preload: first interaction or the launch timeout,
        // whichever comes first.
        if !self.preload_started
            && now.saturating_duration_since(self.launched_at)
                >= Duration::from_millis(config::PRELOAD_DEFER_MS)
        {
            self.maybe_start_preload();
        }

        self.engine.tick(now);
        self.active_notes.tick(now);
        if self.preload_started {
            self.engine.preload_tick();
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(self.bg_color).inner_margin(egui::Margin::same(16)))
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.heading(
                        RichText::new(config::APP_TITLE)
                            .color(crate::color::contrast_color(self.bg_color)),
                    );
                });
                ui.add_space(8.0);
                ui::draw_controls_panel(self, ui);
                ui.add_space(12.0);
                ui::draw_piano_panel(self, ui);
            });

        self.handle_events(ctx, now);

        // Fades, deferred stops and flash expiry all need ticks even while
        // no input arrives.
        ctx.request_repaint_after(Duration::from_millis(16));
    }
}
