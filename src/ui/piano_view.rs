// src/ui/piano_view.rs
use crate::app::ClavierApp;
use crate::color;
use egui::{
    epaint, pos2, vec2, Align2, Color32, CornerRadius, FontId, Pos2, Rect, Sense, Stroke, Ui,
};

// Key geometry at scale 1.0, in points.
const WHITE_KEY_WIDTH: f32 = 64.0;
const WHITE_KEY_HEIGHT: f32 = 256.0;
const BLACK_KEY_WIDTH: f32 = 40.0;
const BLACK_KEY_HEIGHT: f32 = 160.0;

const WHITE_KEY_FILL: Color32 = Color32::from_rgb(0xfa, 0xfa, 0xfa);
const WHITE_KEY_ACTIVE: Color32 = Color32::from_rgb(0xdb, 0xea, 0xfe);
const BLACK_KEY_FILL: Color32 = Color32::from_rgb(0x12, 0x12, 0x12);
const BLACK_KEY_ACTIVE: Color32 = Color32::from_rgb(0x1f, 0x29, 0x37);
const ACTIVE_RING: Color32 = Color32::from_rgb(0x3b, 0x82, 0xf6);

/// One drawn key, recorded for pointer/touch hit-testing. Black keys are
/// appended after white keys so reverse iteration resolves overlaps.
pub struct KeyRect {
    pub rect: Rect,
    pub note_index: usize,
}

/// Returns the note under `pos`, if any, preferring black keys where they
/// overlap the white row.
pub fn note_at(key_rects: &[KeyRect], pos: Pos2) -> Option<usize> {
    key_rects
        .iter()
        .rev()
        .find(|k| k.rect.contains(pos))
        .map(|k| k.note_index)
}

pub fn draw_piano_panel(app: &mut ClavierApp, ui: &mut Ui) {
    let scale = app.piano_scale;
    let white_w = WHITE_KEY_WIDTH * scale;
    let white_h = WHITE_KEY_HEIGHT * scale;
    let black_w = BLACK_KEY_WIDTH * scale;
    let black_h = BLACK_KEY_HEIGHT * scale;

    let num_white = app.notes.iter().filter(|n| !n.is_sharp).count();
    let keyboard_size = vec2(num_white as f32 * white_w, white_h);

    // Center the keyboard in whatever width the panel gives us.
    let available = ui.available_rect_before_wrap();
    let origin_x = available.min.x + ((available.width() - keyboard_size.x) / 2.0).max(0.0);
    let keyboard_rect = Rect::from_min_size(pos2(origin_x, available.min.y), keyboard_size);

    ui.allocate_rect(keyboard_rect, Sense::hover());
    let painter = ui.painter_at(keyboard_rect.expand(2.0));
    let outline = color::shadow_color(app.bg_color);

    app.key_rects.clear();

    // --- White keys ---
    let mut white_index = 0usize;
    for (note_index, note) in app.notes.iter().enumerate() {
        if note.is_sharp {
            continue;
        }
        let key_x = keyboard_rect.min.x + white_index as f32 * white_w;
        let key_rect = Rect::from_min_size(pos2(key_x, keyboard_rect.min.y), vec2(white_w, white_h));
        let is_active = app.active_notes.is_active(&note.name);

        let fill = if is_active { WHITE_KEY_ACTIVE } else { WHITE_KEY_FILL };
        let stroke = if is_active {
            Stroke::new(2.0, ACTIVE_RING)
        } else {
            Stroke::new(1.0, outline)
        };
        painter.rect(
            key_rect,
            CornerRadius { nw: 0, ne: 0, sw: 4, se: 4 },
            fill,
            stroke,
            epaint::StrokeKind::Inside,
        );

        if app.labels_enabled {
            if let Some(key) = note.key {
                painter.text(
                    pos2(key_rect.center().x, key_rect.max.y - 14.0 * scale),
                    Align2::CENTER_CENTER,
                    key.to_uppercase().to_string(),
                    FontId::proportional(14.0 * scale),
                    Color32::from_gray(90),
                );
            }
        }
        if app.solfege_enabled {
            painter.text(
                pos2(key_rect.center().x, key_rect.max.y - 34.0 * scale),
                Align2::CENTER_CENTER,
                note.solfege,
                FontId::proportional(11.0 * scale),
                Color32::from_gray(140),
            );
        }

        app.key_rects.push(KeyRect { rect: key_rect, note_index });
        white_index += 1;
    }

    // --- Black keys (drawn over the white row) ---
    let mut white_index = 0usize;
    for (note_index, note) in app.notes.iter().enumerate() {
        if !note.is_sharp {
            white_index += 1;
            continue;
        }
        // A sharp sits centered on the boundary after its preceding white key.
        let key_x = keyboard_rect.min.x + white_index as f32 * white_w - black_w / 2.0;
        let key_rect = Rect::from_min_size(pos2(key_x, keyboard_rect.min.y), vec2(black_w, black_h));
        let is_active = app.active_notes.is_active(&note.name);

        let fill = if is_active { BLACK_KEY_ACTIVE } else { BLACK_KEY_FILL };
        let stroke = if is_active {
            Stroke::new(2.0, ACTIVE_RING)
        } else {
            Stroke::new(1.0, outline)
        };
        painter.rect(
            key_rect,
            CornerRadius { nw: 0, ne: 0, sw: 3, se: 3 },
            fill,
            stroke,
            epaint::StrokeKind::Inside,
        );

        if app.solfege_enabled {
            painter.text(
                pos2(key_rect.center().x, key_rect.max.y - 14.0 * scale),
                Align2::CENTER_CENTER,
                note.solfege,
                FontId::proportional(10.0 * scale),
                Color32::from_gray(170),
            );
        }

        app.key_rects.push(KeyRect { rect: key_rect, note_index });
    }
}
