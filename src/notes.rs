// src/notes.rs

/// One playable key on the piano, produced by [`generate_notes`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoteDescriptor {
    /// Unique identifier within a generated set, e.g. "C4" or "Cs4".
    pub name: String,
    /// Affects presentation only (black key rendering and layout).
    pub is_sharp: bool,
    /// Sample file stem. Sharps use an `s` suffix ("Cs4") so the name is
    /// filesystem-safe.
    pub file_name: String,
    /// Physical keyboard binding, only set for C4..C5.
    pub key: Option<char>,
    /// Solfege syllable for the pitch class.
    pub solfege: &'static str,
}

struct BaseNote {
    base: &'static str,
    is_sharp: bool,
    solfege: &'static str,
}

/// The 12 chromatic pitch classes of one octave, in order.
const BASE_NOTES: [BaseNote; 12] = [
    BaseNote { base: "C", is_sharp: false, solfege: "Do" },
    BaseNote { base: "Cs", is_sharp: true, solfege: "Di" },
    BaseNote { base: "D", is_sharp: false, solfege: "Re" },
    BaseNote { base: "Ds", is_sharp: true, solfege: "Ri" },
    BaseNote { base: "E", is_sharp: false, solfege: "Mi" },
    BaseNote { base: "F", is_sharp: false, solfege: "Fa" },
    BaseNote { base: "Fs", is_sharp: true, solfege: "Fi" },
    BaseNote { base: "G", is_sharp: false, solfege: "Sol" },
    BaseNote { base: "Gs", is_sharp: true, solfege: "Si" },
    BaseNote { base: "A", is_sharp: false, solfege: "La" },
    BaseNote { base: "As", is_sharp: true, solfege: "Li" },
    BaseNote { base: "B", is_sharp: false, solfege: "Ti" },
];

/// Keyboard bindings for the chromatic run C4..B4; C5 takes the final key.
const KEYBOARD_MAP_C4_C5: [char; 13] =
    ['a', 'w', 's', 'e', 'd', 'f', 't', 'g', 'y', 'h', 'u', 'j', 'k'];

/// Generates the ordered note set for an octave range. Every octave
/// contributes the full chromatic set except the final one, which
/// contributes only its root C, so a range of (3, 4) yields 13 notes.
pub fn generate_notes(start_octave: u8, end_octave: u8) -> Vec<NoteDescriptor> {
    let mut notes = Vec::new();

    for octave in start_octave..=end_octave {
        for (i, n) in BASE_NOTES.iter().enumerate() {
            if octave == end_octave && n.base != "C" {
                continue;
            }

            let key = if octave == 4 {
                Some(KEYBOARD_MAP_C4_C5[i])
            } else if octave == 5 && n.base == "C" {
                Some(KEYBOARD_MAP_C4_C5[KEYBOARD_MAP_C4_C5.len() - 1])
            } else {
                None
            };

            notes.push(NoteDescriptor {
                name: format!("{}{}", n.base, octave),
                is_sharp: n.is_sharp,
                file_name: format!("{}{}", n.base, octave),
                key,
                solfege: n.solfege,
            });
        }
    }

    notes
}
