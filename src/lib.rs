pub mod config;
pub mod dsp;
pub mod error;
pub mod instrument;
pub mod keymap;
pub mod pitch;
pub mod recording;

use wasm_bindgen::prelude::*;

use crate::config::EngineConfig;
use crate::dsp::engine::PianoEngine;
use crate::instrument::InstrumentName;
use crate::recording::Recording;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{e}"))
}

/// WASM-exposed: return the keysynth-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// WASM-exposed: route `log` records and panics to the browser console.
#[cfg(feature = "console-log")]
#[wasm_bindgen]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    // A second call finds the logger already installed.
    let _ = console_log::init_with_level(log::Level::Debug);
}

/// WASM-exposed: the selectable instrument names, in menu order.
#[wasm_bindgen]
pub fn instrument_names() -> Vec<String> {
    InstrumentName::ALL
        .iter()
        .map(|n| n.as_str().to_string())
        .collect()
}

/// WASM-exposed: the profile for `name` as a JS object.
#[wasm_bindgen]
pub fn instrument_profile(name: &str) -> Result<JsValue, JsValue> {
    let profile = instrument::profile(name).map_err(js_err)?;
    serde_wasm_bindgen::to_value(profile).map_err(js_err)
}

/// WASM-exposed: map a keyboard-event key to `{ octave, pitch }`, or null.
#[wasm_bindgen]
pub fn key_to_note(key: &str, octave_shift: i32) -> Result<JsValue, JsValue> {
    match keymap::key_to_note(key, octave_shift) {
        Some(note) => serde_wasm_bindgen::to_value(&note).map_err(js_err),
        None => Ok(JsValue::NULL),
    }
}

/// WASM-exposed: render a recording (JSON) to a WAV byte array.
#[wasm_bindgen]
pub fn render_recording_wav(
    recording_json: &str,
    instrument: &str,
    sample_rate: f64,
) -> Result<Vec<u8>, JsValue> {
    let recording = Recording::from_json(recording_json).map_err(js_err)?;
    let instrument: InstrumentName = instrument.parse().map_err(js_err)?;
    dsp::renderer::render_wav(
        &recording,
        instrument,
        &EngineConfig::with_sample_rate(sample_rate),
    )
    .map_err(js_err)
}

/// The live synthesizer, driven from an AudioWorklet processor.
#[wasm_bindgen]
pub struct PianoSynth {
    engine: PianoEngine,
}

#[wasm_bindgen]
impl PianoSynth {
    /// Fails when the output device cannot be driven at `sample_rate`.
    #[wasm_bindgen(constructor)]
    pub fn new(sample_rate: f64) -> Result<PianoSynth, JsValue> {
        let engine = PianoEngine::new(EngineConfig::with_sample_rate(sample_rate)).map_err(js_err)?;
        Ok(PianoSynth { engine })
    }

    /// Build from a JSON config object; missing fields take defaults.
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(config_json: &str) -> Result<PianoSynth, JsValue> {
        let config = EngineConfig::from_json(config_json).map_err(js_err)?;
        let engine = PianoEngine::new(config).map_err(js_err)?;
        Ok(PianoSynth { engine })
    }

    #[wasm_bindgen(js_name = playNote)]
    pub fn play_note(&mut self, pitch: &str, octave: i32) -> Result<(), JsValue> {
        self.engine.play_note(pitch, octave).map_err(js_err)
    }

    #[wasm_bindgen(js_name = stopNote)]
    pub fn stop_note(&mut self, pitch: &str, octave: i32) -> Result<(), JsValue> {
        self.engine.stop_note(pitch, octave).map_err(js_err)
    }

    #[wasm_bindgen(js_name = setInstrument)]
    pub fn set_instrument(&mut self, name: &str) -> Result<(), JsValue> {
        self.engine.set_instrument_by_name(name).map_err(js_err)
    }

    #[wasm_bindgen(js_name = setVolume)]
    pub fn set_volume(&mut self, level: f64) -> Result<(), JsValue> {
        self.engine.set_volume(level).map_err(js_err)
    }

    #[wasm_bindgen(js_name = stopAllNotes)]
    pub fn stop_all_notes(&mut self) {
        self.engine.stop_all_notes();
    }

    /// Fill one output block; both channels must be the same length.
    pub fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        self.engine.process(left, right);
    }

    #[wasm_bindgen(getter, js_name = currentTime)]
    pub fn current_time(&self) -> f64 {
        self.engine.current_time()
    }

    #[wasm_bindgen(getter)]
    pub fn instrument(&self) -> String {
        self.engine.instrument().as_str().to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn volume(&self) -> f64 {
        self.engine.volume()
    }

    /// Registered notes as `[{ octave, pitch }, ...]`, lowest first.
    #[wasm_bindgen(js_name = activeNotes)]
    pub fn active_notes(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.engine.active_notes()).map_err(js_err)
    }

    #[wasm_bindgen(js_name = startRecording)]
    pub fn start_recording(&mut self) {
        self.engine.start_recording();
    }

    /// The finished take as JSON, or null when nothing was recording.
    #[wasm_bindgen(js_name = stopRecording)]
    pub fn stop_recording(&mut self) -> Result<Option<String>, JsValue> {
        self.engine
            .stop_recording()
            .map(|take| take.to_json())
            .transpose()
            .map_err(js_err)
    }
}
