//! Voice — one sounding note: layered oscillators, optional lowpass, and an
//! envelope gain stage, all owned exclusively by the voice.

use crate::instrument::InstrumentProfile;
use crate::pitch::NoteIdentity;

use super::envelope::Envelope;
use super::filter::BiquadFilter;
use super::oscillator::Oscillator;

/// One oscillator and its mix gain.
#[derive(Debug, Clone)]
struct Layer {
    oscillator: Oscillator,
    gain: f64,
}

/// A live voice, addressable or releasing.
#[derive(Debug, Clone)]
pub struct ActiveVoice {
    identity: NoteIdentity,
    /// Captured at note-on; release timing always comes from here.
    profile: &'static InstrumentProfile,
    layers: Vec<Layer>,
    filter: Option<BiquadFilter>,
    envelope: Envelope,
    started_at: f64,
    /// Oscillators stop at this time, once released.
    stop_at: Option<f64>,
}

impl ActiveVoice {
    /// Build the graph for `identity` and start it at `now`.
    pub fn start(
        identity: NoteIdentity,
        profile: &'static InstrumentProfile,
        sample_rate: f64,
        now: f64,
    ) -> Self {
        let frequency = identity.frequency();
        let layers = profile
            .layers
            .iter()
            .map(|l| Layer {
                oscillator: Oscillator::tuned(l.waveform, frequency, l.detune_cents, sample_rate),
                gain: l.gain,
            })
            .collect();
        let filter = profile
            .filter
            .map(|f| BiquadFilter::new(f.kind, f.cutoff, f.q, sample_rate));

        ActiveVoice {
            identity,
            profile,
            layers,
            filter,
            envelope: Envelope::trigger(profile.envelope, now),
            started_at: now,
            stop_at: None,
        }
    }

    /// Begin the release ramp at `now` and schedule the oscillator stop.
    /// Returns the stop time.
    pub fn release(&mut self, now: f64) -> f64 {
        let end = self.envelope.release(now);
        self.stop_at = Some(end);
        end
    }

    /// Produce the sample at audio-clock `time`.
    #[inline]
    pub fn next_sample(&mut self, time: f64) -> f64 {
        let mut sum = 0.0;
        for layer in &mut self.layers {
            sum += layer.oscillator.next_sample() * layer.gain;
        }
        if let Some(filter) = &mut self.filter {
            sum = filter.process(sum);
        }
        sum * self.envelope.level_at(time)
    }

    /// Add `dry.len()` samples starting at `start` into the bus inputs.
    /// Samples at or after the stop time are silent.
    pub fn render_into(&mut self, start: f64, period: f64, dry: &mut [f64], send: &mut [f64]) {
        let to_send = self.profile.reverb;
        for i in 0..dry.len() {
            let time = start + i as f64 * period;
            if self.is_stopped_at(time) {
                break;
            }
            let s = self.next_sample(time);
            dry[i] += s;
            if to_send {
                send[i] += s;
            }
        }
        self.envelope.prune_before(start);
    }

    pub fn is_stopped_at(&self, time: f64) -> bool {
        self.stop_at.is_some_and(|stop| time >= stop)
    }

    pub fn identity(&self) -> NoteIdentity {
        self.identity
    }

    pub fn profile(&self) -> &'static InstrumentProfile {
        self.profile
    }

    pub fn started_at(&self) -> f64 {
        self.started_at
    }

    pub fn stop_time(&self) -> Option<f64> {
        self.stop_at
    }

    pub fn is_releasing(&self) -> bool {
        self.envelope.is_released()
    }

    /// Envelope gain at `time`, independent of the master bus.
    pub fn envelope_level(&self, time: f64) -> f64 {
        self.envelope.level_at(time)
    }

    /// Effective frequencies of the oscillator layers.
    pub fn layer_frequencies(&self) -> Vec<f64> {
        self.layers
            .iter()
            .map(|l| l.oscillator.effective_freq())
            .collect()
    }

    pub fn has_filter(&self) -> bool {
        self.filter.is_some()
    }
}
