//! Pitch classes, note identities, and the equal-tempered frequency table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Lowest octave a `NoteIdentity` may address.
pub const MIN_OCTAVE: i32 = 0;
/// Highest octave a `NoteIdentity` may address.
pub const MAX_OCTAVE: i32 = 8;
/// Octave at which the reference frequencies are defined.
pub const REFERENCE_OCTAVE: i32 = 4;

/// One of the twelve sharps-only pitch-class names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PitchClass {
    C,
    #[serde(rename = "C#")]
    CSharp,
    D,
    #[serde(rename = "D#")]
    DSharp,
    E,
    F,
    #[serde(rename = "F#")]
    FSharp,
    G,
    #[serde(rename = "G#")]
    GSharp,
    A,
    #[serde(rename = "A#")]
    ASharp,
    B,
}

impl PitchClass {
    /// All pitch classes in ascending chromatic order from C.
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::CSharp,
        PitchClass::D,
        PitchClass::DSharp,
        PitchClass::E,
        PitchClass::F,
        PitchClass::FSharp,
        PitchClass::G,
        PitchClass::GSharp,
        PitchClass::A,
        PitchClass::ASharp,
        PitchClass::B,
    ];

    /// Display name, e.g. `"F#"`.
    pub fn name(self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::CSharp => "C#",
            PitchClass::D => "D",
            PitchClass::DSharp => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::FSharp => "F#",
            PitchClass::G => "G",
            PitchClass::GSharp => "G#",
            PitchClass::A => "A",
            PitchClass::ASharp => "A#",
            PitchClass::B => "B",
        }
    }

    /// Frequency in Hz at the reference octave (A4 = 440 Hz), rounded to
    /// centihertz.
    pub fn reference_frequency(self) -> f64 {
        match self {
            PitchClass::C => 261.63,
            PitchClass::CSharp => 277.18,
            PitchClass::D => 293.66,
            PitchClass::DSharp => 311.13,
            PitchClass::E => 329.63,
            PitchClass::F => 349.23,
            PitchClass::FSharp => 369.99,
            PitchClass::G => 392.00,
            PitchClass::GSharp => 415.30,
            PitchClass::A => 440.00,
            PitchClass::ASharp => 466.16,
            PitchClass::B => 493.88,
        }
    }
}

impl FromStr for PitchClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        PitchClass::ALL
            .iter()
            .copied()
            .find(|p| p.name() == s)
            .ok_or_else(|| Error::UnknownPitchClass(s.to_string()))
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `reference_frequency(pitch) * 2^(octave - 4)`.
///
/// Scaling by a power of two is exact in binary floating point, so octave
/// doubling holds bit-for-bit.
pub fn frequency(pitch: PitchClass, octave: i32) -> f64 {
    pitch.reference_frequency() * 2.0_f64.powi(octave - REFERENCE_OCTAVE)
}

/// The (pitch class, octave) key addressing a voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NoteIdentity {
    pub octave: i32,
    pub pitch: PitchClass,
}

impl NoteIdentity {
    /// Build an identity, rejecting octaves outside `MIN_OCTAVE..=MAX_OCTAVE`.
    pub fn new(pitch: PitchClass, octave: i32) -> Result<Self> {
        if !(MIN_OCTAVE..=MAX_OCTAVE).contains(&octave) {
            return Err(Error::OctaveOutOfRange(octave));
        }
        Ok(NoteIdentity { octave, pitch })
    }

    /// Parse a pitch-class name plus octave, e.g. `("C#", 4)`.
    pub fn parse(pitch: &str, octave: i32) -> Result<Self> {
        NoteIdentity::new(pitch.parse()?, octave)
    }

    pub fn frequency(&self) -> f64 {
        frequency(self.pitch, self.octave)
    }
}

impl fmt::Display for NoteIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.pitch, self.octave)
    }
}
