//! Automation timeline for a single audio-rate parameter.
//!
//! Values are scheduled against the audio clock ("set to X at T", "ramp to X
//! by T") and evaluated per sample, so envelope segments land on exact
//! sample times without any polling.

/// A scheduled change on the timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ParamEvent {
    /// Jump to `value` at `time`, hold until the next event.
    SetValue { time: f64, value: f64 },
    /// Arrive at `value` at `time`, linearly from the previous event.
    LinearRamp { time: f64, value: f64 },
}

impl ParamEvent {
    fn time(&self) -> f64 {
        match *self {
            ParamEvent::SetValue { time, .. } | ParamEvent::LinearRamp { time, .. } => time,
        }
    }

    fn value(&self) -> f64 {
        match *self {
            ParamEvent::SetValue { value, .. } | ParamEvent::LinearRamp { value, .. } => value,
        }
    }
}

/// A parameter whose value is a function of audio-clock time.
#[derive(Debug, Clone)]
pub struct AutomatedParam {
    default_value: f64,
    events: Vec<ParamEvent>,
}

impl AutomatedParam {
    pub fn new(default_value: f64) -> Self {
        AutomatedParam {
            default_value,
            events: Vec::with_capacity(4),
        }
    }

    pub fn set_value_at_time(&mut self, value: f64, time: f64) {
        self.insert(ParamEvent::SetValue { time, value });
    }

    pub fn linear_ramp_to_value_at_time(&mut self, value: f64, end_time: f64) {
        self.insert(ParamEvent::LinearRamp {
            time: end_time,
            value,
        });
    }

    /// Remove every event scheduled at or after `start_time`.
    pub fn cancel_scheduled_values(&mut self, start_time: f64) {
        let keep = self.events.partition_point(|e| e.time() < start_time);
        self.events.truncate(keep);
    }

    /// Instantaneous value at `time`.
    pub fn value_at(&self, time: f64) -> f64 {
        let next = self.events.partition_point(|e| e.time() <= time);
        let Some(prev) = next.checked_sub(1).map(|i| self.events[i]) else {
            return self.default_value;
        };

        match self.events.get(next) {
            Some(&ParamEvent::LinearRamp { time: end, value }) => {
                let start = prev.time();
                if end <= start {
                    value
                } else {
                    let t = (time - start) / (end - start);
                    prev.value() + (value - prev.value()) * t
                }
            }
            _ => prev.value(),
        }
    }

    /// Drop history that can no longer influence `value_at(t)` for any
    /// `t >= time`. The event opening the active segment is kept.
    pub fn prune_before(&mut self, time: f64) {
        let next = self.events.partition_point(|e| e.time() <= time);
        if next > 1 {
            self.events.drain(..next - 1);
        }
    }

    /// Events at equal time keep insertion order.
    fn insert(&mut self, event: ParamEvent) {
        let idx = self.events.partition_point(|e| e.time() <= event.time());
        self.events.insert(idx, event);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.events.len()
    }
}
