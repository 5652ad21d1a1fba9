//! Procedural reverb impulse — decaying stereo noise standing in for a
//! recorded room response.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Host convolver calibration constants for impulse power normalisation.
const GAIN_CALIBRATION: f32 = 0.00125;
const GAIN_CALIBRATION_SAMPLE_RATE: f32 = 44100.0;
const MIN_POWER: f32 = 0.000125;

/// A two-channel impulse response.
#[derive(Debug, Clone)]
pub struct Impulse {
    pub left: Vec<f32>,
    pub right: Vec<f32>,
}

impl Impulse {
    /// Uniform noise in [-1, 1] under a `(1 - i/len)^2` envelope.
    pub fn generate(sample_rate: f64, seconds: f64, seed: u64) -> Self {
        let length = ((sample_rate * seconds) as usize).max(1);
        let mut rng = SmallRng::seed_from_u64(seed);
        let channel = |rng: &mut SmallRng| -> Vec<f32> {
            (0..length)
                .map(|i| {
                    let decay = 1.0 - i as f32 / length as f32;
                    rng.gen_range(-1.0_f32..=1.0) * decay * decay
                })
                .collect()
        };
        let left = channel(&mut rng);
        let right = channel(&mut rng);
        Impulse { left, right }
    }

    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Scale to the loudness the host convolver produces with
    /// normalisation enabled: an RMS-derived gain times its calibration.
    pub fn normalize(&mut self, sample_rate: f64) {
        let samples = (self.left.len() + self.right.len()) as f32;
        if samples == 0.0 {
            return;
        }
        let energy: f32 = self
            .left
            .iter()
            .chain(self.right.iter())
            .map(|s| s * s)
            .sum();
        let power = (energy / samples).sqrt().max(MIN_POWER);
        let scale =
            GAIN_CALIBRATION / power * (GAIN_CALIBRATION_SAMPLE_RATE / sample_rate as f32);

        for s in self.left.iter_mut().chain(self.right.iter_mut()) {
            *s *= scale;
        }
    }
}
