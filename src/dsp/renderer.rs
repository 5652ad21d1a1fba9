//! Offline renderer — plays a `Recording` through a fresh engine and encodes
//! the result as a WAV byte buffer.

use log::debug;

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::instrument::InstrumentName;
use crate::pitch::NoteIdentity;
use crate::recording::Recording;

use super::engine::PianoEngine;

/// Longest recording accepted for offline rendering, in seconds.
pub const MAX_RENDER_SECONDS: f64 = 3600.0;

/// Event order at equal times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Edge {
    // Releases of earlier notes go first so a key released and pressed at
    // the same instant retriggers.
    Off,
    // A zero-length note presses and releases before other presses, so it
    // cannot swallow a real note starting at the same time.
    TapOn,
    TapOff,
    On,
}

/// Render `recording` with `instrument` into a stereo buffer at
/// `config.sample_rate`. The buffer runs until the last release and the
/// reverb tail have decayed.
pub fn render_recording(
    recording: &Recording,
    instrument: InstrumentName,
    config: &EngineConfig,
) -> Result<(Vec<f32>, Vec<f32>)> {
    let mut engine = PianoEngine::new(EngineConfig {
        instrument,
        ..config.clone()
    })?;
    let sr = engine.sample_rate();

    let mut events: Vec<(f64, Edge, NoteIdentity)> = Vec::with_capacity(recording.len() * 2);
    for note in &recording.notes {
        if !(note.timestamp.is_finite() && note.duration.is_finite()) || note.duration < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "note {}{} has invalid timing ({} ms, {} ms)",
                note.note, note.octave, note.timestamp, note.duration
            )));
        }
        let identity = note.identity()?;
        let on = note.timestamp.max(0.0);
        let off = note.end().max(0.0);
        let (press, release) = if off > on {
            (Edge::On, Edge::Off)
        } else {
            (Edge::TapOn, Edge::TapOff)
        };
        events.push((on, press, identity));
        events.push((off, release, identity));
    }
    events.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    let seconds = recording.duration_ms() / 1000.0;
    if seconds > MAX_RENDER_SECONDS {
        return Err(Error::InvalidConfig(format!(
            "recording lasts {seconds:.0}s, longer than {MAX_RENDER_SECONDS}s"
        )));
    }
    let tail = instrument.profile().envelope.release + config.reverb_seconds;
    let total = ((recording.duration_ms() / 1000.0 + tail) * sr).ceil() as usize;

    let mut left = vec![0.0_f32; total];
    let mut right = vec![0.0_f32; total];
    let mut cursor = 0;
    for (at_ms, edge, identity) in events {
        let frame = ((at_ms / 1000.0 * sr).round() as usize).min(total);
        if frame > cursor {
            engine.process(&mut left[cursor..frame], &mut right[cursor..frame]);
            cursor = frame;
        }
        match edge {
            Edge::On | Edge::TapOn => engine.note_on(identity),
            Edge::Off | Edge::TapOff => engine.note_off(identity),
        }
    }
    engine.process(&mut left[cursor..], &mut right[cursor..]);

    debug!(
        "rendered {} notes into {total} frames ({:.2}s)",
        recording.len(),
        total as f64 / sr
    );
    Ok((left, right))
}

/// Render `recording` to a WAV file as bytes (16-bit stereo PCM).
pub fn render_wav(
    recording: &Recording,
    instrument: InstrumentName,
    config: &EngineConfig,
) -> Result<Vec<u8>> {
    let (left, right) = render_recording(recording, instrument, config)?;
    let pcm: Vec<i16> = left
        .iter()
        .zip(&right)
        .flat_map(|(&l, &r)| [to_i16(l), to_i16(r)])
        .collect();
    Ok(encode_wav(&pcm, config.sample_rate.round() as u32, 2))
}

fn to_i16(s: f32) -> i16 {
    (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Encode interleaved i16 PCM samples to a WAV byte buffer.
fn encode_wav(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
    let bits_per_sample: u16 = 16;
    let byte_rate = sample_rate * channels as u32 * (bits_per_sample as u32 / 8);
    let block_align = channels * (bits_per_sample / 8);
    let data_size = (samples.len() * 2) as u32;
    let file_size = 36 + data_size;

    let mut buf = Vec::with_capacity(44 + data_size as usize);

    // RIFF header
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&file_size.to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    // fmt chunk
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM format
    buf.extend_from_slice(&channels.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&bits_per_sample.to_le_bytes());

    // data chunk
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for &sample in samples {
        buf.extend_from_slice(&sample.to_le_bytes());
    }

    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pitch::PitchClass;
    use crate::recording::RecordedNote;

    fn config() -> EngineConfig {
        EngineConfig {
            sample_rate: 22050.0,
            reverb_seconds: 0.1,
            ..Default::default()
        }
    }

    fn frames_for(duration_ms: f64, instrument: InstrumentName) -> usize {
        let cfg = config();
        let tail = instrument.profile().envelope.release + cfg.reverb_seconds;
        ((duration_ms / 1000.0 + tail) * cfg.sample_rate).ceil() as usize
    }

    fn note(pitch: PitchClass, octave: i32, timestamp: f64, duration: f64) -> RecordedNote {
        RecordedNote {
            note: pitch,
            octave,
            timestamp,
            duration,
        }
    }

    #[test]
    fn wav_header_valid() {
        let take = Recording {
            notes: vec![note(PitchClass::C, 4, 0.0, 250.0)],
        };
        let wav = render_wav(&take, InstrumentName::GrandPiano, &config()).unwrap();

        // Check RIFF header
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(&wav[36..40], b"data");

        let sr = u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]);
        assert_eq!(sr, 22050);

        let ch = u16::from_le_bytes([wav[22], wav[23]]);
        assert_eq!(ch, 2);
    }

    #[test]
    fn length_covers_release_and_tail() {
        let take = Recording {
            notes: vec![note(PitchClass::A, 4, 100.0, 400.0)],
        };
        let (l, r) = render_recording(&take, InstrumentName::Synth, &config()).unwrap();
        // 0.5s of notes + 0.3s release + 0.1s reverb
        let expected = frames_for(500.0, InstrumentName::Synth);
        assert!(expected >= 19845);
        assert_eq!(l.len(), expected);
        assert_eq!(r.len(), expected);
    }

    #[test]
    fn wav_size_matches_frames() {
        let take = Recording::default();
        let wav = render_wav(&take, InstrumentName::Synth, &config()).unwrap();
        let frames = frames_for(0.0, InstrumentName::Synth) as u32;
        let data_size = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]);
        assert_eq!(data_size, frames * 2 * 2);
        assert_eq!(wav.len(), 44 + data_size as usize);
    }

    #[test]
    fn notes_start_at_their_timestamp() {
        let take = Recording {
            notes: vec![note(PitchClass::E, 4, 200.0, 200.0)],
        };
        let (l, _) = render_recording(&take, InstrumentName::Synth, &config()).unwrap();
        let onset = (0.2 * 22050.0) as usize;
        assert!(l[..onset - 128].iter().all(|s| *s == 0.0));
        assert!(l[onset..onset + 2048].iter().any(|s| s.abs() > 0.001));
    }

    #[test]
    fn back_to_back_repeats_retrigger() {
        let take = Recording {
            notes: vec![
                note(PitchClass::C, 4, 0.0, 100.0),
                note(PitchClass::C, 4, 100.0, 100.0),
            ],
        };
        let (l, _) = render_recording(&take, InstrumentName::Synth, &config()).unwrap();
        assert!(l.iter().any(|s| s.abs() > 0.001));
    }

    #[test]
    fn zero_length_notes_release() {
        let take = Recording {
            notes: vec![
                note(PitchClass::C, 4, 0.0, 0.0),
                note(PitchClass::E, 4, 50.0, 0.0),
            ],
        };
        let (l, r) = render_recording(&take, InstrumentName::Synth, &config()).unwrap();
        // Released at the instant of the press, like a live tap inside one
        // quantum: no voice is left holding.
        assert!(l.iter().chain(&r).all(|s| *s == 0.0));
    }

    #[test]
    fn retrigger_after_zero_length_note() {
        let take = Recording {
            notes: vec![
                note(PitchClass::D, 4, 100.0, 0.0),
                note(PitchClass::D, 4, 100.0, 200.0),
            ],
        };
        let (l, _) = render_recording(&take, InstrumentName::Synth, &config()).unwrap();
        let tail = l.len() - 512;
        assert!(l[..tail].iter().any(|s| s.abs() > 0.001));
        assert!(l[tail..].iter().all(|s| *s == 0.0));
    }

    #[test]
    fn overlong_recording_is_rejected() {
        let take = Recording {
            notes: vec![note(PitchClass::C, 4, 1e12, 100.0)],
        };
        assert!(matches!(
            render_recording(&take, InstrumentName::Synth, &config()),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn invalid_notes_are_rejected() {
        let take = Recording {
            notes: vec![note(PitchClass::C, 11, 0.0, 100.0)],
        };
        assert!(matches!(
            render_recording(&take, InstrumentName::Synth, &config()),
            Err(Error::OctaveOutOfRange(11))
        ));

        let take = Recording {
            notes: vec![note(PitchClass::C, 4, 0.0, f64::NAN)],
        };
        assert!(render_recording(&take, InstrumentName::Synth, &config()).is_err());
    }

    #[test]
    fn rendered_take_is_not_silent() {
        let take = Recording {
            notes: vec![
                note(PitchClass::C, 4, 0.0, 200.0),
                note(PitchClass::E, 4, 200.0, 200.0),
                note(PitchClass::G, 4, 400.0, 200.0),
            ],
        };
        let wav = render_wav(&take, InstrumentName::ElectricPiano, &config()).unwrap();
        let has_nonzero = wav[44..]
            .chunks_exact(2)
            .any(|b| i16::from_le_bytes([b[0], b[1]]) != 0);
        assert!(has_nonzero, "Rendered WAV should contain non-silent audio");
    }
}
