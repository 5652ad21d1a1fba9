//! Performance recording.
//!
//! A `Recorder` listens to the note-on/note-off calls the engine accepted
//! and turns them into timed notes; a `Recording` is the JSON document the
//! UI stores and plays back.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::pitch::{NoteIdentity, PitchClass};

/// One played note. Times are milliseconds from the start of recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedNote {
    pub note: PitchClass,
    pub octave: i32,
    pub timestamp: f64,
    pub duration: f64,
}

impl RecordedNote {
    pub fn identity(&self) -> Result<NoteIdentity> {
        NoteIdentity::new(self.note, self.octave)
    }

    pub fn end(&self) -> f64 {
        self.timestamp + self.duration
    }
}

/// A finished take, notes ordered by timestamp. Serialises as a bare array
/// of notes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Recording {
    pub notes: Vec<RecordedNote>,
}

impl Recording {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Time at which the last note is released, in milliseconds.
    pub fn duration_ms(&self) -> f64 {
        self.notes.iter().map(RecordedNote::end).fold(0.0, f64::max)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

/// Captures notes against the audio clock.
#[derive(Debug, Clone)]
pub struct Recorder {
    started_at: f64,
    held: HashMap<NoteIdentity, f64>,
    notes: Vec<RecordedNote>,
}

impl Recorder {
    /// Start a take at audio-clock time `now` (seconds).
    pub fn start(now: f64) -> Self {
        Recorder {
            started_at: now,
            held: HashMap::new(),
            notes: Vec::new(),
        }
    }

    fn offset_ms(&self, now: f64) -> f64 {
        ((now - self.started_at) * 1000.0).max(0.0)
    }

    pub fn note_on(&mut self, identity: NoteIdentity, now: f64) {
        let at = self.offset_ms(now);
        self.held.entry(identity).or_insert(at);
    }

    pub fn note_off(&mut self, identity: NoteIdentity, now: f64) {
        if let Some(pressed) = self.held.remove(&identity) {
            let released = self.offset_ms(now);
            self.notes.push(RecordedNote {
                note: identity.pitch,
                octave: identity.octave,
                timestamp: pressed,
                duration: released - pressed,
            });
        }
    }

    /// Notes currently held down.
    pub fn held_count(&self) -> usize {
        self.held.len()
    }

    /// End the take, closing held notes at `now`.
    pub fn finish(mut self, now: f64) -> Recording {
        let held: Vec<NoteIdentity> = self.held.keys().copied().collect();
        for identity in held {
            self.note_off(identity, now);
        }
        let mut notes = self.notes;
        notes.sort_by(|a, b| {
            a.timestamp
                .total_cmp(&b.timestamp)
                .then_with(|| (a.octave, a.note).cmp(&(b.octave, b.note)))
        });
        Recording { notes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(p: &str, o: i32) -> NoteIdentity {
        NoteIdentity::parse(p, o).unwrap()
    }

    #[test]
    fn records_timestamp_and_duration() {
        let mut r = Recorder::start(10.0);
        r.note_on(id("C", 4), 10.5);
        r.note_off(id("C", 4), 11.25);
        let take = r.finish(12.0);
        assert_eq!(take.len(), 1);
        let n = &take.notes[0];
        assert_eq!((n.note, n.octave), (PitchClass::C, 4));
        assert!((n.timestamp - 500.0).abs() < 1e-9);
        assert!((n.duration - 750.0).abs() < 1e-9);
    }

    #[test]
    fn finish_closes_held_notes() {
        let mut r = Recorder::start(0.0);
        r.note_on(id("E", 4), 0.0);
        r.note_on(id("G", 4), 0.1);
        assert_eq!(r.held_count(), 2);
        let take = r.finish(1.0);
        assert_eq!(take.len(), 2);
        assert!((take.duration_ms() - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn notes_sorted_by_press_time() {
        let mut r = Recorder::start(0.0);
        r.note_on(id("A", 4), 0.2);
        r.note_on(id("C", 4), 0.1);
        r.note_off(id("A", 4), 0.3);
        r.note_off(id("C", 4), 0.4);
        let take = r.finish(1.0);
        let order: Vec<PitchClass> = take.notes.iter().map(|n| n.note).collect();
        assert_eq!(order, vec![PitchClass::C, PitchClass::A]);
    }

    #[test]
    fn release_without_press_is_ignored() {
        let mut r = Recorder::start(0.0);
        r.note_off(id("D", 4), 0.5);
        assert!(r.finish(1.0).is_empty());
    }

    #[test]
    fn json_uses_original_field_names() {
        let take = Recording {
            notes: vec![RecordedNote {
                note: PitchClass::FSharp,
                octave: 3,
                timestamp: 0.0,
                duration: 250.0,
            }],
        };
        let json = take.to_json().unwrap();
        assert!(json.starts_with('['), "{json}");
        assert!(json.contains(r#""note":"F#""#), "{json}");
        assert!(json.contains(r#""duration":250.0"#), "{json}");
        assert_eq!(Recording::from_json(&json).unwrap(), take);
    }

    #[test]
    fn loads_bare_note_array() {
        let json = r#"[{"note":"C","octave":4,"timestamp":0,"duration":120.5},
                       {"note":"A#","octave":3,"timestamp":200,"duration":80}]"#;
        let take = Recording::from_json(json).unwrap();
        assert_eq!(take.len(), 2);
        assert_eq!(take.notes[1].note, PitchClass::ASharp);
        assert_eq!(take.duration_ms(), 280.0);
        assert!(Recording::from_json(r#"{"notes":[]}"#).is_err());
    }

    #[test]
    fn empty_recording_has_zero_duration() {
        assert_eq!(Recording::default().duration_ms(), 0.0);
    }
}
