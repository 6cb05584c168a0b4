mod controls_view;
mod piano_view;

pub use controls_view::draw_controls_panel;
pub use piano_view::{draw_piano_panel, note_at, KeyRect};
