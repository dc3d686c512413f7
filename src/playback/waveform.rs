//! Vibration waveforms.

use std::time::Duration;

use serde::Serialize;

use super::timing::PlaybackTiming;

/// An on/off pattern handed to a vibration device as one unit.
///
/// `timings[i]` is the length of segment `i` and `amplitudes[i]` its
/// strength, 0 meaning off. The first segment is a start delay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Waveform {
    /// Segment durations.
    #[serde(serialize_with = "serialize_millis")]
    pub timings: Vec<Duration>,
    /// Segment amplitudes, same length as `timings`.
    pub amplitudes: Vec<u8>,
    /// Index to loop back to after the last segment, `None` to play once.
    pub repeat: Option<usize>,
}

impl Waveform {
    /// Single burst: `[0, dot, 0, 0]`.
    #[must_use]
    pub fn dot(timing: &PlaybackTiming) -> Self {
        Self::two_phase(timing, timing.dot_length, Duration::ZERO, Duration::ZERO)
    }

    /// Two bursts separated by the dash spacing: `[0, dot, spacing, dot]`.
    #[must_use]
    pub fn dash(timing: &PlaybackTiming) -> Self {
        Self::two_phase(timing, timing.dot_length, timing.dash_spacing, timing.dot_length)
    }

    fn two_phase(timing: &PlaybackTiming, on: Duration, gap: Duration, second_on: Duration) -> Self {
        Self {
            timings: vec![Duration::ZERO, on, gap, second_on],
            amplitudes: vec![0, timing.intensity, 0, timing.intensity],
            repeat: None,
        }
    }

    /// Sum of all segments.
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.timings.iter().sum()
    }

    /// Sum of the segments with a non-zero amplitude.
    #[must_use]
    pub fn on_duration(&self) -> Duration {
        self.segments()
            .filter(|(_, amplitude)| *amplitude > 0)
            .map(|(duration, _)| duration)
            .sum()
    }

    /// Iterates `(duration, amplitude)` pairs.
    pub fn segments(&self) -> impl Iterator<Item = (Duration, u8)> + '_ {
        self.timings
            .iter()
            .copied()
            .zip(self.amplitudes.iter().copied())
    }
}

fn serialize_millis<S: serde::Serializer>(timings: &[Duration], s: S) -> Result<S::Ok, S::Error> {
    s.collect_seq(timings.iter().map(|d| d.as_millis() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlaybackConfig;

    fn timing() -> PlaybackTiming {
        PlaybackTiming::from_config(&PlaybackConfig::default())
    }

    #[test]
    fn test_dot_waveform() {
        let dot = Waveform::dot(&timing());
        assert_eq!(
            dot.timings,
            vec![
                Duration::ZERO,
                Duration::from_millis(50),
                Duration::ZERO,
                Duration::ZERO
            ]
        );
        assert_eq!(dot.amplitudes, vec![0, 255, 0, 255]);
        assert_eq!(dot.repeat, None);
        assert_eq!(dot.total_duration(), Duration::from_millis(50));
        assert_eq!(dot.on_duration(), Duration::from_millis(50));
    }

    #[test]
    fn test_dash_waveform() {
        let dash = Waveform::dash(&timing());
        assert_eq!(dash.total_duration(), Duration::from_millis(200));
        assert_eq!(dash.on_duration(), Duration::from_millis(100));
        assert_eq!(dash.amplitudes, vec![0, 255, 0, 255]);
    }

    #[test]
    fn test_waveform_json_uses_millis() {
        let json = serde_json::to_value(Waveform::dash(&timing())).unwrap();
        assert_eq!(json["timings"], serde_json::json!([0, 50, 100, 50]));
        assert_eq!(json["repeat"], serde_json::Value::Null);
    }
}
