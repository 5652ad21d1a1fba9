//! Second-order lowpass with the Web Audio BiquadFilterNode response.
//!
//! Resonance is a gain in dB at the cutoff, not a bandwidth Q.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    Lowpass,
}

/// Normalised coefficients (a0 = 1).
#[derive(Debug, Clone, Copy, PartialEq)]
struct Coefficients {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl Coefficients {
    const IDENTITY: Coefficients = Coefficients {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    const SILENT: Coefficients = Coefficients {
        b0: 0.0,
        ..Coefficients::IDENTITY
    };

    /// Cookbook lowpass, alpha from the dB resonance.
    fn lowpass(cutoff: f64, resonance_db: f64, sample_rate: f64) -> Self {
        let normalized = 2.0 * cutoff / sample_rate;
        if normalized >= 1.0 {
            return Coefficients::IDENTITY;
        }
        if normalized <= 0.0 {
            return Coefficients::SILENT;
        }
        let w0 = PI * normalized;
        let (sin, cos) = w0.sin_cos();
        let alpha = sin / (2.0 * 10.0_f64.powf(resonance_db / 20.0));
        let a0 = 1.0 + alpha;
        let b1 = (1.0 - cos) / a0;
        Coefficients {
            b0: b1 / 2.0,
            b1,
            b2: b1 / 2.0,
            a1: -2.0 * cos / a0,
            a2: (1.0 - alpha) / a0,
        }
    }
}

/// Per-voice filter stage, transposed direct form II.
#[derive(Debug, Clone)]
pub struct BiquadFilter {
    c: Coefficients,
    s1: f64,
    s2: f64,
}

impl BiquadFilter {
    pub fn new(kind: FilterType, cutoff: f64, resonance_db: f64, sample_rate: f64) -> Self {
        let c = match kind {
            FilterType::Lowpass => Coefficients::lowpass(cutoff, resonance_db, sample_rate),
        };
        BiquadFilter {
            c,
            s1: 0.0,
            s2: 0.0,
        }
    }

    #[inline]
    pub fn process(&mut self, x: f64) -> f64 {
        let c = &self.c;
        let y = c.b0 * x + self.s1;
        self.s1 = c.b1 * x - c.a1 * y + self.s2;
        self.s2 = c.b2 * x - c.a2 * y;
        y
    }

    pub fn reset(&mut self) {
        self.s1 = 0.0;
        self.s2 = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settled_peak(f: &mut BiquadFilter, freq: f64) -> f64 {
        (0..8820)
            .map(|i| f.process((2.0 * PI * freq * i as f64 / 44100.0).sin()))
            .skip(2000)
            .fold(0.0, |m, y| m.max(y.abs()))
    }

    #[test]
    fn unity_gain_at_dc() {
        let mut f = BiquadFilter::new(FilterType::Lowpass, 3000.0, 1.0, 44100.0);
        let y = (0..2000).map(|_| f.process(1.0)).last().unwrap_or_default();
        assert!((y - 1.0).abs() < 1e-3, "DC gain {y}");
    }

    #[test]
    fn stopband_is_attenuated() {
        let mut f = BiquadFilter::new(FilterType::Lowpass, 200.0, 0.0, 44100.0);
        let peak = settled_peak(&mut f, 10000.0);
        assert!(peak < 0.01, "10 kHz through a 200 Hz lowpass: {peak}");
    }

    #[test]
    fn resonance_is_gain_at_cutoff_in_db() {
        let mut f = BiquadFilter::new(FilterType::Lowpass, 1000.0, 6.0, 44100.0);
        let peak = settled_peak(&mut f, 1000.0);
        let expected = 10.0_f64.powf(6.0 / 20.0);
        assert!((peak - expected).abs() < 0.05, "expected ~{expected}, got {peak}");
    }

    #[test]
    fn cutoff_at_nyquist_passes_through() {
        let mut f = BiquadFilter::new(FilterType::Lowpass, 4000.0, 0.5, 8000.0);
        for x in [0.25, -0.5, 1.0, 0.0] {
            assert_eq!(f.process(x), x);
        }
    }

    #[test]
    fn zero_cutoff_is_silent() {
        let mut f = BiquadFilter::new(FilterType::Lowpass, 0.0, 1.0, 44100.0);
        assert_eq!(f.process(1.0), 0.0);
    }

    #[test]
    fn reset_clears_state() {
        let mut f = BiquadFilter::new(FilterType::Lowpass, 1500.0, 2.0, 44100.0);
        for _ in 0..100 {
            f.process(1.0);
        }
        f.reset();
        assert_eq!(f.process(0.0), 0.0);
    }

    #[test]
    fn impulse_response_is_stable() {
        let mut f = BiquadFilter::new(FilterType::Lowpass, 2000.0, 1.5, 44100.0);
        let tail = (0..20000)
            .map(|i| f.process(if i == 0 { 1.0 } else { 0.0 }))
            .last()
            .unwrap_or_default();
        assert!(tail.is_finite() && tail.abs() < 1e-9);
    }
}
