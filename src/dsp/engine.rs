//! Audio Engine — the voice lifecycle manager and render loop.
//!
//! The engine owns the voice registry (one addressable voice per
//! `NoteIdentity`), the list of released voices still ringing out, the
//! master bus with its reverb send, and the audio clock. Control-plane
//! calls never block: they either edit the registry or book ramps and stop
//! times on the clock, which the render loop then honours sample by sample.

use std::collections::BTreeMap;

use log::{debug, info, trace};

use crate::config::{EngineConfig, is_unit};
use crate::error::{Error, Result};
use crate::instrument::InstrumentName;
use crate::pitch::NoteIdentity;
use crate::recording::{Recorder, Recording};

use super::RENDER_QUANTUM;
use super::clock::AudioClock;
use super::impulse::Impulse;
use super::mixer::MasterBus;
use super::voice::ActiveVoice;

/// The real-time synthesis engine.
pub struct PianoEngine {
    clock: AudioClock,
    instrument: InstrumentName,
    /// Addressable voices, at most one per note, summed lowest first.
    voices: BTreeMap<NoteIdentity, ActiveVoice>,
    /// Released voices, rendered until their stop time.
    releasing: Vec<ActiveVoice>,
    bus: MasterBus,
    /// Rendered quantum not yet handed to the caller.
    out_l: Vec<f32>,
    out_r: Vec<f32>,
    out_pos: usize,
    recorder: Option<Recorder>,
}

impl PianoEngine {
    /// Build an engine for an output running at `config.sample_rate`.
    /// Fails when the output cannot be driven with this configuration.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let mut impulse =
            Impulse::generate(config.sample_rate, config.reverb_seconds, config.reverb_seed);
        if config.normalize_reverb {
            impulse.normalize(config.sample_rate);
        }
        let bus = MasterBus::new(
            config.master_volume,
            &impulse,
            RENDER_QUANTUM,
            config.reverb_send_level,
        );

        info!(
            "engine ready: {} Hz, {} impulse frames, instrument {}",
            config.sample_rate,
            impulse.len(),
            config.instrument
        );

        Ok(PianoEngine {
            clock: AudioClock::new(config.sample_rate),
            instrument: config.instrument,
            voices: BTreeMap::new(),
            releasing: Vec::new(),
            bus,
            out_l: vec![0.0; RENDER_QUANTUM],
            out_r: vec![0.0; RENDER_QUANTUM],
            out_pos: RENDER_QUANTUM,
            recorder: None,
        })
    }

    // ── Control plane ───────────────────────────────────────

    /// Note-on by name; rejects unknown pitch classes and octaves.
    pub fn play_note(&mut self, pitch: &str, octave: i32) -> Result<()> {
        self.note_on(NoteIdentity::parse(pitch, octave)?);
        Ok(())
    }

    /// Note-off by name; rejects unknown pitch classes and octaves.
    pub fn stop_note(&mut self, pitch: &str, octave: i32) -> Result<()> {
        self.note_off(NoteIdentity::parse(pitch, octave)?);
        Ok(())
    }

    /// Start a voice for `identity` unless one is already registered.
    pub fn note_on(&mut self, identity: NoteIdentity) {
        if self.voices.contains_key(&identity) {
            trace!("note-on {identity} ignored, already sounding");
            return;
        }

        let now = self.clock.current_time();
        let profile = self.instrument.profile();
        let voice = ActiveVoice::start(identity, profile, self.clock.sample_rate(), now);
        debug!("note-on {identity} ({}) at {now:.4}s", profile.name);
        self.voices.insert(identity, voice);

        if let Some(recorder) = &mut self.recorder {
            recorder.note_on(identity, now);
        }
    }

    /// Release the voice registered for `identity`, if any. The voice stops
    /// being addressable at once and keeps sounding for its release time.
    pub fn note_off(&mut self, identity: NoteIdentity) {
        let Some(mut voice) = self.voices.remove(&identity) else {
            trace!("note-off {identity} ignored, not sounding");
            return;
        };

        let now = self.clock.current_time();
        let stop = voice.release(now);
        debug!("note-off {identity} at {now:.4}s, stops at {stop:.4}s");
        self.releasing.push(voice);

        if let Some(recorder) = &mut self.recorder {
            recorder.note_off(identity, now);
        }
    }

    /// Select the profile used by subsequent note-ons.
    pub fn set_instrument(&mut self, instrument: InstrumentName) {
        if instrument != self.instrument {
            info!("instrument {} -> {instrument}", self.instrument);
            self.instrument = instrument;
        }
    }

    /// `set_instrument` by kebab-case name.
    pub fn set_instrument_by_name(&mut self, name: &str) -> Result<()> {
        self.set_instrument(name.parse()?);
        Ok(())
    }

    /// Set the master gain immediately (no ramp).
    pub fn set_volume(&mut self, level: f64) -> Result<()> {
        if !is_unit(level) {
            return Err(Error::InvalidVolume(level));
        }
        self.bus.master_gain = level;
        Ok(())
    }

    /// Release every registered voice.
    pub fn stop_all_notes(&mut self) {
        let held: Vec<NoteIdentity> = self.voices.keys().copied().collect();
        for identity in held {
            self.note_off(identity);
        }
    }

    pub fn start_recording(&mut self) {
        debug!("recording started at {:.4}s", self.clock.current_time());
        self.recorder = Some(Recorder::start(self.clock.current_time()));
    }

    /// Finish the take in progress, if any.
    pub fn stop_recording(&mut self) -> Option<Recording> {
        let recording = self.recorder.take()?.finish(self.clock.current_time());
        debug!("recording stopped with {} notes", recording.len());
        Some(recording)
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_some()
    }

    // ── Introspection ───────────────────────────────────────

    pub fn current_time(&self) -> f64 {
        self.clock.current_time()
    }

    pub fn sample_rate(&self) -> f64 {
        self.clock.sample_rate()
    }

    pub fn instrument(&self) -> InstrumentName {
        self.instrument
    }

    pub fn volume(&self) -> f64 {
        self.bus.master_gain
    }

    /// Number of registered voices (current polyphony).
    pub fn polyphony(&self) -> usize {
        self.voices.len()
    }

    pub fn is_active(&self, identity: &NoteIdentity) -> bool {
        self.voices.contains_key(identity)
    }

    pub fn voice(&self, identity: &NoteIdentity) -> Option<&ActiveVoice> {
        self.voices.get(identity)
    }

    /// Registered notes, lowest first.
    pub fn active_notes(&self) -> Vec<NoteIdentity> {
        self.voices.keys().copied().collect()
    }

    /// Released voices still ringing out.
    pub fn releasing_voices(&self) -> impl Iterator<Item = &ActiveVoice> {
        self.releasing.iter()
    }

    /// Registered plus releasing voices.
    pub fn sounding_voices(&self) -> usize {
        self.voices.len() + self.releasing.len()
    }

    // ── Render loop ─────────────────────────────────────────

    /// Fill `left` and `right` with the next frames of output.
    pub fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        let frames = left.len().min(right.len());
        let mut written = 0;
        while written < frames {
            if self.out_pos == RENDER_QUANTUM {
                self.render_quantum();
                self.out_pos = 0;
            }
            let n = (frames - written).min(RENDER_QUANTUM - self.out_pos);
            left[written..written + n]
                .copy_from_slice(&self.out_l[self.out_pos..self.out_pos + n]);
            right[written..written + n]
                .copy_from_slice(&self.out_r[self.out_pos..self.out_pos + n]);
            self.out_pos += n;
            written += n;
        }
    }

    /// Render one quantum at the current clock time, then advance the clock
    /// and drop voices whose stop time has passed.
    fn render_quantum(&mut self) {
        let start = self.clock.current_time();
        let period = self.clock.sample_period();

        self.bus.clear();
        {
            let (dry, send) = self.bus.inputs_mut();
            for voice in self.voices.values_mut().chain(self.releasing.iter_mut()) {
                voice.render_into(start, period, dry, send);
            }
        }
        self.bus.mix_into(&mut self.out_l, &mut self.out_r);

        self.clock.advance(RENDER_QUANTUM);
        let now = self.clock.current_time();
        self.releasing.retain(|v| !v.is_stopped_at(now));
    }
}
