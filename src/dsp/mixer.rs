//! Master bus — sums voice outputs, returns the reverb send, applies master
//! gain and soft clipping.

use super::impulse::Impulse;
use super::reverb::ReverbSend;

/// Process-wide output stage shared by all voices.
///
/// Every voice adds into the dry buffer; voices whose profile opts in also
/// add into the send buffer. The convolved send returns in parallel with
/// the dry path, and both pass through the master gain.
pub struct MasterBus {
    pub master_gain: f64,
    dry: Vec<f64>,
    send: Vec<f64>,
    reverb: ReverbSend,
}

impl MasterBus {
    pub fn new(master_gain: f64, impulse: &Impulse, block: usize, send_level: f64) -> Self {
        MasterBus {
            master_gain,
            dry: vec![0.0; block],
            send: vec![0.0; block],
            reverb: ReverbSend::new(impulse, block, send_level),
        }
    }

    /// Zero both accumulation buffers for a new block.
    pub fn clear(&mut self) {
        self.dry.fill(0.0);
        self.send.fill(0.0);
    }

    /// Dry and send accumulation buffers, in that order.
    pub fn inputs_mut(&mut self) -> (&mut [f64], &mut [f64]) {
        (&mut self.dry, &mut self.send)
    }

    /// Mix the block into `left`/`right` (one block long).
    pub fn mix_into(&mut self, left: &mut [f32], right: &mut [f32]) {
        let (wet_l, wet_r) = self.reverb.process(&self.send);
        let gain = self.master_gain;
        for i in 0..self.dry.len().min(left.len()).min(right.len()) {
            let dry = self.dry[i];
            left[i] = soft_clip((dry + wet_l[i] as f64) * gain) as f32;
            right[i] = soft_clip((dry + wet_r[i] as f64) * gain) as f32;
        }
    }
}

/// Soft clipper using tanh to prevent harsh digital clipping.
fn soft_clip(x: f64) -> f64 {
    x.tanh()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bus(gain: f64) -> MasterBus {
        let ir = Impulse::generate(8000.0, 0.02, 1);
        MasterBus::new(gain, &ir, 16, 0.2)
    }

    #[test]
    fn empty_block_is_silent() {
        let mut m = bus(1.0);
        m.clear();
        let mut l = [1.0_f32; 16];
        let mut r = [1.0_f32; 16];
        m.mix_into(&mut l, &mut r);
        assert!(l.iter().chain(r.iter()).all(|&s| s == 0.0));
    }

    #[test]
    fn dry_passes_through_master_gain() {
        let mut m = bus(0.5);
        m.clear();
        {
            let (dry, _) = m.inputs_mut();
            dry[0] = 0.4;
            dry[1] = 0.4;
        }
        let mut l = [0.0_f32; 16];
        let mut r = [0.0_f32; 16];
        m.mix_into(&mut l, &mut r);
        assert!((l[0] as f64 - soft_clip(0.2)).abs() < 1e-6);
        assert_eq!(l[0], r[0]);
        assert_eq!(l[2], 0.0);
    }

    #[test]
    fn send_adds_wet_signal_in_parallel() {
        let mut m = bus(1.0);
        m.clear();
        {
            let (_, send) = m.inputs_mut();
            send[0] = 1.0;
        }
        let mut l = [0.0_f32; 16];
        let mut r = [0.0_f32; 16];
        m.mix_into(&mut l, &mut r);
        // Nothing on the dry path, yet the wet return is audible and stereo.
        assert!(l.iter().any(|s| s.abs() > 0.0));
        assert_ne!(l, r);
    }

    #[test]
    fn zero_gain_mutes_everything() {
        let mut m = bus(0.0);
        m.clear();
        {
            let (dry, send) = m.inputs_mut();
            dry[0] = 1.0;
            send[0] = 1.0;
        }
        let mut l = [0.0_f32; 16];
        let mut r = [0.0_f32; 16];
        m.mix_into(&mut l, &mut r);
        assert!(l.iter().chain(r.iter()).all(|&s| s == 0.0));
    }

    #[test]
    fn soft_clip_prevents_overflow() {
        assert!(soft_clip(100.0) <= 1.0);
        assert!(soft_clip(-100.0) >= -1.0);
    }
}
