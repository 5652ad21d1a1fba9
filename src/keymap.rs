//! Computer-keyboard to note mapping.
//!
//! The home row plays the white keys from C4, the row above plays the
//! sharps, and the mapping runs on to D5. An octave shift moves the whole
//! layout together with the on-screen keyboard.

use crate::pitch::{NoteIdentity, PitchClass};

pub const MIN_OCTAVE_SHIFT: i32 = -2;
pub const MAX_OCTAVE_SHIFT: i32 = 2;

use PitchClass::*;

const KEYBOARD_MAP: [(char, PitchClass, i32); 15] = [
    ('a', C, 4),
    ('w', CSharp, 4),
    ('s', D, 4),
    ('e', DSharp, 4),
    ('d', E, 4),
    ('f', F, 4),
    ('t', FSharp, 4),
    ('g', G, 4),
    ('y', GSharp, 4),
    ('h', A, 4),
    ('u', ASharp, 4),
    ('j', B, 4),
    ('k', C, 5),
    ('o', CSharp, 5),
    ('l', D, 5),
];

/// Clamp an octave shift to the supported range.
pub fn clamp_shift(octave_shift: i32) -> i32 {
    octave_shift.clamp(MIN_OCTAVE_SHIFT, MAX_OCTAVE_SHIFT)
}

/// Note for a key name as reported by a keyboard event (`"a"`, `"W"`, ...).
/// Multi-character key names (`"Shift"`, `"Enter"`) never map.
pub fn key_to_note(key: &str, octave_shift: i32) -> Option<NoteIdentity> {
    let mut chars = key.chars();
    let ch = chars.next()?.to_ascii_lowercase();
    if chars.next().is_some() {
        return None;
    }
    let &(_, pitch, octave) = KEYBOARD_MAP.iter().find(|(k, _, _)| *k == ch)?;
    NoteIdentity::new(pitch, octave + clamp_shift(octave_shift)).ok()
}

/// The three octaves the on-screen keyboard shows for a shift.
pub fn visible_octaves(octave_shift: i32) -> [i32; 3] {
    let s = clamp_shift(octave_shift);
    [3 + s, 4 + s, 5 + s]
}

/// All mapped key characters, in layout order.
pub fn mapped_keys() -> impl Iterator<Item = char> {
    KEYBOARD_MAP.iter().map(|(k, _, _)| *k)
}
