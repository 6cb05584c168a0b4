// src/ui/controls_view.rs
use crate::app::ClavierApp;
use crate::color;
use crate::config::{self, SoundSet};
use egui::{ComboBox, DragValue, ProgressBar, RichText, Ui};

pub fn draw_controls_panel(app: &mut ClavierApp, ui: &mut Ui) {
    let text_color = color::contrast_color(app.bg_color);
    let mut sound_set_to_apply = None;
    let mut octaves_changed = false;

    egui::Frame::none()
        .fill(color::panel_color(app.bg_color))
        .rounding(egui::CornerRadius::same(6))
        .inner_margin(egui::Margin::same(8))
        .show(ui, |ui| {
            draw_control_rows(app, ui, text_color, &mut sound_set_to_apply, &mut octaves_changed);
        });

    if let Some(set) = sound_set_to_apply {
        app.apply_sound_set(set);
    }
    if octaves_changed {
        app.rebuild_notes();
    }
}

fn draw_control_rows(
    app: &mut ClavierApp,
    ui: &mut Ui,
    text_color: egui::Color32,
    sound_set_to_apply: &mut Option<SoundSet>,
    octaves_changed: &mut bool,
) {
    ui.horizontal_wrapped(|ui| {
        ui.label(RichText::new(format!("Volume: {:.2}", app.volume)).color(text_color));
        if ui
            .add(egui::Slider::new(&mut app.volume, 0.0..=1.0).show_value(false))
            .changed()
        {
            app.engine.set_volume(app.volume);
        }

        ui.separator();

        ui.checkbox(&mut app.labels_enabled, RichText::new("Keyboard Labels").color(text_color));
        ui.checkbox(&mut app.solfege_enabled, RichText::new("Solfege Labels").color(text_color));

        ui.separator();

        ui.label(RichText::new(format!("Scale: {:.2}", app.piano_scale)).color(text_color));
        ui.add(egui::Slider::new(&mut app.piano_scale, 0.5..=2.0).show_value(false));

        ui.separator();

        ui.label(RichText::new("Background:").color(text_color));
        ui.color_edit_button_srgba(&mut app.bg_color);

        ui.separator();

        ui.label(RichText::new("Sound:").color(text_color));
        ComboBox::from_id_source("sound_set_selector")
            .selected_text(app.engine.sound_set().to_string())
            .show_ui(ui, |ui| {
                for set in SoundSet::ALL {
                    if ui
                        .selectable_label(app.engine.sound_set() == set, set.to_string())
                        .clicked()
                    {
                        *sound_set_to_apply = Some(set);
                    }
                }
            });

        ui.separator();

        let range_locked = app.engine.sound_set().locked_octave_range().is_some();
        ui.label(RichText::new("Octaves:").color(text_color));
        ui.add_enabled_ui(!range_locked, |ui| {
            *octaves_changed |= ui
                .add(DragValue::new(&mut app.start_octave).range(config::OCTAVE_MIN..=app.end_octave))
                .changed();
            *octaves_changed |= ui
                .add(DragValue::new(&mut app.end_octave).range(app.start_octave..=config::OCTAVE_MAX))
                .changed();
        });

        ui.separator();

        let sustain_label = if app.engine.sustain_mode() {
            "Sustain: On (Space)"
        } else {
            "Sustain: Off (Space)"
        };
        if ui
            .selectable_label(app.engine.sustain_mode(), RichText::new(sustain_label).color(text_color))
            .clicked()
        {
            app.toggle_sustain();
        }
        if app.engine.pedal_active() {
            ui.label(RichText::new("Pedal").color(text_color).strong());
        }
    });

    if app.engine.is_preloading() {
        ui.add_space(4.0);
        ui.horizontal(|ui| {
            ui.label(RichText::new("Loading samples…").color(text_color).small());
            ui.add(
                ProgressBar::new(app.engine.preload_progress())
                    .desired_width(200.0)
                    .show_percentage(),
            );
        });
    }
}
