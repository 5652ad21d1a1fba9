//! Audio clock — the sample-counting timeline every schedule is expressed on.

/// Frames rendered so far at a fixed sample rate.
#[derive(Debug, Clone, Copy)]
pub struct AudioClock {
    sample_rate: f64,
    frame: u64,
}

impl AudioClock {
    pub fn new(sample_rate: f64) -> Self {
        AudioClock {
            sample_rate,
            frame: 0,
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Seconds between consecutive frames.
    pub fn sample_period(&self) -> f64 {
        1.0 / self.sample_rate
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Time of the next frame to be rendered.
    pub fn current_time(&self) -> f64 {
        self.frame_time(self.frame)
    }

    /// Time of an absolute frame index.
    pub fn frame_time(&self, frame: u64) -> f64 {
        frame as f64 / self.sample_rate
    }

    pub fn advance(&mut self, frames: usize) {
        self.frame += frames as u64;
    }
}
