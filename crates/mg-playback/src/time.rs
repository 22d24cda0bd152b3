//! Engine-native time representation.

use serde::Serialize;

/// Ticks per second (100ns units).
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// A point on the media timeline in 100ns ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct MediaTime(i64);

impl MediaTime {
    pub const ZERO: MediaTime = MediaTime(0);

    pub const fn from_ticks(ticks: i64) -> Self {
        MediaTime(ticks)
    }

    /// Convert seconds to ticks, rounding to the nearest tick. Non-finite
    /// input is `None`.
    pub fn from_secs_f64(secs: f64) -> Option<Self> {
        if !secs.is_finite() {
            return None;
        }
        Some(MediaTime((secs * TICKS_PER_SECOND as f64).round() as i64))
    }

    pub fn from_duration(d: std::time::Duration) -> Self {
        MediaTime(i64::try_from(d.as_nanos() / 100).unwrap_or(i64::MAX))
    }

    pub const fn ticks(self) -> i64 {
        self.0
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / TICKS_PER_SECOND as f64
    }

    pub fn saturating_add(self, other: MediaTime) -> MediaTime {
        MediaTime(self.0.saturating_add(other.0))
    }

    /// Clamp into `[0, max]`; only the lower bound applies when `max` is
    /// unknown.
    pub fn clamp_to(self, max: Option<MediaTime>) -> MediaTime {
        let lower = self.max(MediaTime::ZERO);
        match max {
            Some(m) => lower.min(m),
            None => lower,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn seconds_round_trip() {
        let t = MediaTime::from_secs_f64(12.5).unwrap();
        assert_eq!(t.ticks(), 125_000_000);
        assert_eq!(t.as_secs_f64(), 12.5);
    }

    #[test]
    fn non_finite_seconds_rejected() {
        assert_eq!(MediaTime::from_secs_f64(f64::NAN), None);
        assert_eq!(MediaTime::from_secs_f64(f64::INFINITY), None);
    }

    #[test]
    fn from_duration_uses_100ns_units() {
        assert_eq!(MediaTime::from_duration(Duration::from_millis(1)).ticks(), 10_000);
    }

    #[test]
    fn clamp_bounds() {
        let max = MediaTime::from_ticks(100);
        assert_eq!(MediaTime::from_ticks(-5).clamp_to(Some(max)), MediaTime::ZERO);
        assert_eq!(MediaTime::from_ticks(500).clamp_to(Some(max)), max);
        assert_eq!(MediaTime::from_ticks(500).clamp_to(None).ticks(), 500);
    }
}
