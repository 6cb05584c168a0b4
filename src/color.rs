// src/color.rs
use egui::Color32;

fn channel_luminance(v: u8) -> f32 {
    let v = v as f32 / 255.0;
    if v <= 0.03928 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

/// WCAG relative luminance in [0, 1].
fn relative_luminance(color: Color32) -> f32 {
    channel_luminance(color.r()) * 0.2126
        + channel_luminance(color.g()) * 0.7152
        + channel_luminance(color.b()) * 0.0722
}

/// Black or white, whichever reads best on the given background.
pub fn contrast_color(bg: Color32) -> Color32 {
    if relative_luminance(bg) > 0.5 {
        Color32::BLACK
    } else {
        Color32::WHITE
    }
}

/// Shadow tint for key edges on the given background.
pub fn shadow_color(bg: Color32) -> Color32 {
    let _ = bg;
    Color32::from_black_alpha(128)
}

/// Lightens (positive) or darkens (negative) each channel.
pub fn adjust(color: Color32, amount: i16) -> Color32 {
    let shift = |c: u8| (c as i16 + amount).clamp(0, 255) as u8;
    Color32::from_rgb(shift(color.r()), shift(color.g()), shift(color.b()))
}

/// Translucent panel tint that stays visible on any background.
pub fn panel_color(bg: Color32) -> Color32 {
    let amount = if contrast_color(bg) == Color32::WHITE {
        20
    } else {
        -20
    };
    let adjusted = adjust(bg, amount);
    Color32::from_rgba_unmultiplied(adjusted.r(), adjusted.g(), adjusted.b(), 76)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn light_backgrounds_get_black_text() {
        assert_eq!(contrast_color(Color32::WHITE), Color32::BLACK);
        assert_eq!(contrast_color(Color32::from_rgb(0xee, 0xee, 0xcc)), Color32::BLACK);
    }

    #[test]
    fn dark_backgrounds_get_white_text() {
        assert_eq!(contrast_color(Color32::BLACK), Color32::WHITE);
        assert_eq!(contrast_color(crate::config::DEFAULT_BG_COLOR), Color32::WHITE);
    }

    #[test]
    fn panel_color_is_translucent_and_offset_from_the_background() {
        let dark = crate::config::DEFAULT_BG_COLOR;
        // Compare unmultiplied channels; Color32 stores premultiplied.
        let [r, _, _, a] = panel_color(dark).to_srgba_unmultiplied();
        assert!(a < 255);
        // On a dark background the panel lightens; on a light one it darkens.
        assert!(r > dark.r());
        let light = Color32::from_rgb(0xee, 0xee, 0xee);
        let [r, _, _, _] = panel_color(light).to_srgba_unmultiplied();
        assert!(r < light.r());
    }

    #[test]
    fn adjust_saturates_at_the_channel_bounds() {
        assert_eq!(adjust(Color32::WHITE, 40), Color32::WHITE);
        assert_eq!(adjust(Color32::BLACK, -40), Color32::BLACK);
        assert_eq!(adjust(Color32::from_rgb(100, 100, 100), 20), Color32::from_rgb(120, 120, 120));
    }
}
