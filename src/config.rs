//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::instrument::InstrumentName;

/// Lowest sample rate an output device may run at.
pub const MIN_SAMPLE_RATE: f64 = 3000.0;
/// Highest sample rate an output device may run at.
pub const MAX_SAMPLE_RATE: f64 = 768_000.0;

/// Construction-time engine settings. Every field has a default, so a
/// partial JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Output device sample rate in Hz.
    pub sample_rate: f64,
    /// Initial master volume [0, 1].
    pub master_volume: f64,
    /// Length of the procedural reverb impulse in seconds.
    pub reverb_seconds: f64,
    /// Fixed gain on the reverb return [0, 1].
    pub reverb_send_level: f64,
    /// Seed for the impulse noise.
    pub reverb_seed: u64,
    /// Apply the host convolver's power normalisation to the impulse.
    pub normalize_reverb: bool,
    /// Instrument selected at construction.
    pub instrument: InstrumentName,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            sample_rate: 44100.0,
            master_volume: 0.3,
            reverb_seconds: 2.0,
            reverb_send_level: 0.2,
            reverb_seed: 0x5EED_0F_2EE7,
            normalize_reverb: true,
            instrument: InstrumentName::GrandPiano,
        }
    }
}

impl EngineConfig {
    pub fn with_sample_rate(sample_rate: f64) -> Self {
        EngineConfig {
            sample_rate,
            ..Default::default()
        }
    }

    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reject settings the engine cannot run with. An unusable sample rate
    /// means there is no output to drive.
    pub fn validate(&self) -> Result<()> {
        if !self.sample_rate.is_finite()
            || !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&self.sample_rate)
        {
            return Err(Error::AudioUnavailable(format!(
                "sample rate {} Hz is outside {MIN_SAMPLE_RATE}..={MAX_SAMPLE_RATE}",
                self.sample_rate
            )));
        }
        if !is_unit(self.master_volume) {
            return Err(Error::InvalidVolume(self.master_volume));
        }
        if !self.reverb_seconds.is_finite() || self.reverb_seconds <= 0.0 || self.reverb_seconds > 10.0
        {
            return Err(Error::InvalidConfig(format!(
                "reverbSeconds must be in (0, 10], got {}",
                self.reverb_seconds
            )));
        }
        if !is_unit(self.reverb_send_level) {
            return Err(Error::InvalidConfig(format!(
                "reverbSendLevel must be in [0, 1], got {}",
                self.reverb_send_level
            )));
        }
        Ok(())
    }
}

pub(crate) fn is_unit(x: f64) -> bool {
    x.is_finite() && (0.0..=1.0).contains(&x)
}
