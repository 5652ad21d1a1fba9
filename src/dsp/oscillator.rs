//! Band-limited oscillators.
//!
//! Saw and square get a PolyBLEP correction at their steps; sine and
//! triangle are continuous and need none.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Triangle,
    Sawtooth,
    Square,
}

/// 2^(cents/1200).
pub fn cents_ratio(cents: f64) -> f64 {
    (cents / 1200.0).exp2()
}

/// A fixed-pitch oscillator. Phase is kept in cycles, [0, 1).
#[derive(Debug, Clone)]
pub struct Oscillator {
    waveform: Waveform,
    frequency: f64,
    inc: f64,
    phase: f64,
}

impl Oscillator {
    /// Oscillator at `frequency` shifted by `detune` cents, starting at phase 0.
    pub fn tuned(waveform: Waveform, frequency: f64, detune: f64, sample_rate: f64) -> Self {
        let frequency = frequency * cents_ratio(detune);
        Oscillator {
            waveform,
            frequency,
            inc: frequency / sample_rate,
            phase: 0.0,
        }
    }

    /// Frequency after detune.
    pub fn effective_freq(&self) -> f64 {
        self.frequency
    }

    #[inline]
    pub fn next_sample(&mut self) -> f64 {
        let (p, dt) = (self.phase, self.inc);
        let out = match self.waveform {
            Waveform::Sine => (TAU * p).sin(),
            Waveform::Triangle => 1.0 - 4.0 * (p - 0.5).abs(),
            Waveform::Sawtooth => 2.0 * p - 1.0 - poly_blep(p, dt),
            Waveform::Square => {
                let naive = if p < 0.5 { 1.0 } else { -1.0 };
                naive + poly_blep(p, dt) - poly_blep((p + 0.5).fract(), dt)
            }
        };
        self.phase = (p + dt).fract();
        out
    }
}

/// Polynomial band-limited step residual around a wrap at phase 0.
/// `t` is the phase, `dt` the per-sample increment.
fn poly_blep(t: f64, dt: f64) -> f64 {
    if t < dt {
        let x = t / dt;
        x + x - x * x - 1.0
    } else if t > 1.0 - dt {
        let x = (t - 1.0) / dt;
        x * x + x + x + 1.0
    } else {
        0.0
    }
}
