//! ADSR envelope scheduled as linear ramps on the audio clock.
//!
//! Attack and decay are booked at trigger time; release is booked at note-off
//! from the value the envelope actually has at that instant, so interrupting a
//! ramp never produces a step.

use crate::instrument::EnvelopeTiming;

use super::param::AutomatedParam;

/// Envelope gain stage of one voice.
#[derive(Debug, Clone)]
pub struct Envelope {
    gain: AutomatedParam,
    timing: EnvelopeTiming,
    /// Time the release ramp reaches silence, once released.
    release_end: Option<f64>,
}

impl Envelope {
    /// Trigger at `now`: 0 → 1 over `attack`, then 1 → `sustain` over `decay`.
    pub fn trigger(timing: EnvelopeTiming, now: f64) -> Self {
        let mut gain = AutomatedParam::new(0.0);
        gain.set_value_at_time(0.0, now);
        gain.linear_ramp_to_value_at_time(1.0, now + timing.attack);
        gain.linear_ramp_to_value_at_time(timing.sustain, now + timing.attack + timing.decay);
        Envelope {
            gain,
            timing,
            release_end: None,
        }
    }

    /// Release from the current level to 0 over the captured release time.
    /// Returns the time the envelope reaches silence.
    pub fn release(&mut self, now: f64) -> f64 {
        let current = self.gain.value_at(now);
        let end = now + self.timing.release;
        self.gain.cancel_scheduled_values(now);
        self.gain.set_value_at_time(current, now);
        self.gain.linear_ramp_to_value_at_time(0.0, end);
        self.release_end = Some(end);
        end
    }

    #[inline]
    pub fn level_at(&self, time: f64) -> f64 {
        self.gain.value_at(time)
    }

    pub fn is_released(&self) -> bool {
        self.release_end.is_some()
    }

    pub fn release_end(&self) -> Option<f64> {
        self.release_end
    }

    /// Forget automation that ended before `time`.
    pub fn prune_before(&mut self, time: f64) {
        self.gain.prune_before(time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn timing() -> EnvelopeTiming {
        EnvelopeTiming {
            attack: 0.01,
            decay: 0.1,
            sustain: 0.5,
            release: 0.2,
        }
    }

    #[test]
    fn starts_silent() {
        let env = Envelope::trigger(timing(), 1.0);
        assert_eq!(env.level_at(1.0), 0.0);
        assert_eq!(env.level_at(0.5), 0.0);
    }

    #[test]
    fn attack_reaches_one() {
        let env = Envelope::trigger(timing(), 1.0);
        assert_abs_diff_eq!(env.level_at(1.005), 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(env.level_at(1.01), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn decay_settles_on_sustain() {
        let env = Envelope::trigger(timing(), 0.0);
        assert_abs_diff_eq!(env.level_at(0.06), 0.75, epsilon = 1e-9);
        assert_abs_diff_eq!(env.level_at(0.11), 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(env.level_at(30.0), 0.5, epsilon = 1e-9);
    }

    #[test]
    fn release_from_sustain() {
        let mut env = Envelope::trigger(timing(), 0.0);
        let end = env.release(1.0);
        assert_abs_diff_eq!(end, 1.2, epsilon = 1e-12);
        assert_abs_diff_eq!(env.level_at(1.0), 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(env.level_at(1.1), 0.25, epsilon = 1e-9);
        assert_abs_diff_eq!(env.level_at(1.2), 0.0, epsilon = 1e-9);
        assert_eq!(env.level_at(5.0), 0.0);
    }

    #[test]
    fn release_mid_attack_is_continuous() {
        let mut env = Envelope::trigger(timing(), 0.0);
        let before = env.level_at(0.004);
        env.release(0.004);
        assert_abs_diff_eq!(env.level_at(0.004), before, epsilon = 1e-12);
        // The attack peak must be gone: the level only falls from here.
        let mut last = before;
        for i in 1..=200 {
            let level = env.level_at(0.004 + i as f64 * 0.001);
            assert!(level <= last + 1e-12, "rose to {level} after release");
            last = level;
        }
        assert!(last < 1e-9, "release should end silent, got {last}");
    }

    #[test]
    fn release_mid_decay_never_returns_to_sustain() {
        let mut env = Envelope::trigger(timing(), 0.0);
        env.release(0.03);
        assert_eq!(env.level_at(0.5), 0.0);
        assert!(env.is_released());
    }

    #[test]
    fn release_before_any_audio_stays_silent() {
        let mut env = Envelope::trigger(timing(), 2.0);
        env.release(2.0);
        assert_eq!(env.level_at(2.0), 0.0);
        assert_eq!(env.level_at(2.1), 0.0);
    }

    #[test]
    fn envelope_range() {
        let mut env = Envelope::trigger(timing(), 0.0);
        env.release(0.5);
        for i in 0..1000 {
            let s = env.level_at(i as f64 * 0.001);
            assert!((0.0..=1.0).contains(&s), "Envelope out of range: {s}");
        }
    }
}
