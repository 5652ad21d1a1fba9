//! Instrument voice profiles.
//!
//! Each instrument is a fixed recipe: a stack of detuned oscillator layers,
//! envelope timing, an optional lowpass, and whether the voice also feeds the
//! shared reverb send. Profiles are `'static`, so a voice can hold a reference
//! to the one it was started with for its whole lifetime.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dsp::filter::FilterType;
use crate::dsp::oscillator::Waveform;
use crate::error::{Error, Result};

/// The selectable instruments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstrumentName {
    #[default]
    GrandPiano,
    ElectricPiano,
    Synth,
    Guitar,
    Bells,
}

impl InstrumentName {
    pub const ALL: [InstrumentName; 5] = [
        InstrumentName::GrandPiano,
        InstrumentName::ElectricPiano,
        InstrumentName::Synth,
        InstrumentName::Guitar,
        InstrumentName::Bells,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            InstrumentName::GrandPiano => "grand-piano",
            InstrumentName::ElectricPiano => "electric-piano",
            InstrumentName::Synth => "synth",
            InstrumentName::Guitar => "guitar",
            InstrumentName::Bells => "bells",
        }
    }

    pub fn profile(self) -> &'static InstrumentProfile {
        match self {
            InstrumentName::GrandPiano => &GRAND_PIANO,
            InstrumentName::ElectricPiano => &ELECTRIC_PIANO,
            InstrumentName::Synth => &SYNTH,
            InstrumentName::Guitar => &GUITAR,
            InstrumentName::Bells => &BELLS,
        }
    }
}

impl FromStr for InstrumentName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        InstrumentName::ALL
            .iter()
            .copied()
            .find(|i| i.as_str() == s)
            .ok_or_else(|| Error::UnknownInstrument(s.to_string()))
    }
}

impl fmt::Display for InstrumentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One oscillator contributing to a voice's timbre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OscillatorLayer {
    pub waveform: Waveform,
    /// Offset from the note frequency in cents (1200 = one octave).
    pub detune_cents: f64,
    /// Mix gain into the voice sum.
    pub gain: f64,
}

/// Envelope timing in seconds; `sustain` is a gain level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnvelopeTiming {
    pub attack: f64,
    pub decay: f64,
    pub sustain: f64,
    pub release: f64,
}

/// Per-voice filter stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FilterSpec {
    #[serde(rename = "type")]
    pub kind: FilterType,
    /// Cutoff frequency in Hz.
    pub cutoff: f64,
    /// Resonance in dB.
    pub q: f64,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct InstrumentProfile {
    pub name: InstrumentName,
    pub layers: &'static [OscillatorLayer],
    pub envelope: EnvelopeTiming,
    pub filter: Option<FilterSpec>,
    /// Also route the voice into the shared reverb send.
    pub reverb: bool,
}

const fn layer(waveform: Waveform, detune_cents: f64, gain: f64) -> OscillatorLayer {
    OscillatorLayer {
        waveform,
        detune_cents,
        gain,
    }
}

const fn lowpass(cutoff: f64, q: f64) -> Option<FilterSpec> {
    Some(FilterSpec {
        kind: FilterType::Lowpass,
        cutoff,
        q,
    })
}

use Waveform::{Sawtooth, Sine, Square, Triangle};

static GRAND_PIANO: InstrumentProfile = InstrumentProfile {
    name: InstrumentName::GrandPiano,
    layers: &[
        layer(Triangle, 0.0, 0.4),
        layer(Sine, -5.0, 0.3),
        layer(Sine, 1200.0, 0.15),
        layer(Sine, 1900.0, 0.1),
    ],
    envelope: EnvelopeTiming {
        attack: 0.008,
        decay: 0.4,
        sustain: 0.35,
        release: 0.6,
    },
    filter: lowpass(3000.0, 1.0),
    reverb: true,
};

static ELECTRIC_PIANO: InstrumentProfile = InstrumentProfile {
    name: InstrumentName::ElectricPiano,
    layers: &[
        layer(Sine, 0.0, 0.5),
        layer(Triangle, -3.0, 0.25),
        layer(Sine, 1203.0, 0.15),
    ],
    envelope: EnvelopeTiming {
        attack: 0.015,
        decay: 0.3,
        sustain: 0.5,
        release: 0.4,
    },
    filter: lowpass(2500.0, 0.8),
    reverb: true,
};

static SYNTH: InstrumentProfile = InstrumentProfile {
    name: InstrumentName::Synth,
    layers: &[
        layer(Sawtooth, 0.0, 0.35),
        layer(Sawtooth, -7.0, 0.35),
        layer(Square, 1200.0, 0.2),
    ],
    envelope: EnvelopeTiming {
        attack: 0.05,
        decay: 0.15,
        sustain: 0.7,
        release: 0.3,
    },
    filter: lowpass(1500.0, 2.0),
    reverb: false,
};

static GUITAR: InstrumentProfile = InstrumentProfile {
    name: InstrumentName::Guitar,
    layers: &[
        layer(Triangle, 0.0, 0.4),
        layer(Sawtooth, -2.0, 0.2),
        layer(Sine, 1200.0, 0.15),
        layer(Sine, 2400.0, 0.08),
    ],
    envelope: EnvelopeTiming {
        attack: 0.005,
        decay: 0.6,
        sustain: 0.25,
        release: 0.9,
    },
    filter: lowpass(2000.0, 1.5),
    reverb: true,
};

static BELLS: InstrumentProfile = InstrumentProfile {
    name: InstrumentName::Bells,
    layers: &[
        layer(Sine, 0.0, 0.4),
        layer(Sine, 1200.0, 0.25),
        layer(Sine, 1900.0, 0.2),
        layer(Sine, 2400.0, 0.15),
        layer(Triangle, 3600.0, 0.1),
    ],
    envelope: EnvelopeTiming {
        attack: 0.001,
        decay: 1.2,
        sustain: 0.15,
        release: 2.0,
    },
    filter: lowpass(4000.0, 0.5),
    reverb: true,
};

/// Look up a profile by its kebab-case name.
pub fn profile(name: &str) -> Result<&'static InstrumentProfile> {
    Ok(name.parse::<InstrumentName>()?.profile())
}
