//! DSP Engine — Pure Rust audio synthesis and processing.
//!
//! Everything runs on the audio clock: control calls book parameter events
//! at the start of the next render quantum, and the render loop evaluates
//! them sample by sample. The same code drives the AudioWorklet (via WASM)
//! and offline WAV export of recordings.

pub mod clock;
pub mod engine;
pub mod envelope;
pub mod filter;
pub mod impulse;
pub mod mixer;
pub mod oscillator;
pub mod param;
pub mod renderer;
pub mod reverb;
pub mod voice;

/// Frames rendered per block, matching the Web Audio render quantum.
pub const RENDER_QUANTUM: usize = 128;
