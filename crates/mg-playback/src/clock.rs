//! Headless engine that keeps transport state against a monotonic clock.
//!
//! Nothing is decoded. Position advances at rate 1.0 while playing and
//! stops at the duration when one is known.

use tokio::time::Instant;

use mg_core::Result;

use crate::player::PlaybackEngine;
use crate::time::MediaTime;

#[derive(Debug, Clone)]
pub struct ClockEngine {
    duration: Option<MediaTime>,
    /// Position at the last transport change.
    base: MediaTime,
    /// When playback last (re)started; `None` while paused.
    started: Option<Instant>,
}

impl ClockEngine {
    pub fn new(duration: Option<MediaTime>) -> Self {
        Self {
            duration,
            base: MediaTime::ZERO,
            started: None,
        }
    }

    /// Build with a duration in seconds, e.g. the probed `duration_secs`.
    pub fn with_duration_secs(secs: Option<f64>) -> Self {
        Self::new(secs.and_then(MediaTime::from_secs_f64))
    }

    fn now_position(&self) -> MediaTime {
        let elapsed = self
            .started
            .map(|s| MediaTime::from_duration(s.elapsed()))
            .unwrap_or(MediaTime::ZERO);
        self.base.saturating_add(elapsed).clamp_to(self.duration)
    }
}

impl PlaybackEngine for ClockEngine {
    fn play(&mut self) -> Result<()> {
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        if self.started.is_some() {
            self.base = self.now_position();
            self.started = None;
        }
        Ok(())
    }

    fn seek(&mut self, to: MediaTime) -> Result<()> {
        self.base = to.clamp_to(self.duration);
        if self.started.is_some() {
            self.started = Some(Instant::now());
        }
        Ok(())
    }

    fn position(&self) -> MediaTime {
        self.now_position()
    }

    fn duration(&self) -> Option<MediaTime> {
        self.duration
    }

    fn is_playing(&self) -> bool {
        self.started.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::Player;
    use std::time::Duration;

    fn player(duration_secs: Option<f64>) -> Player<ClockEngine> {
        Player::open("/tmp/in.mov", ClockEngine::with_duration_secs(duration_secs)).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn position_advances_only_while_playing() {
        let mut p = player(Some(60.0));
        assert_eq!(p.duration(), 60.0);

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(p.position(), 0.0);

        p.play().unwrap();
        assert!(p.is_playing());
        tokio::time::advance(Duration::from_secs(3)).await;
        assert_eq!(p.position(), 3.0);

        p.pause().unwrap();
        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(p.position(), 3.0);
        assert!(!p.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn seek_clamps_and_keeps_playing() {
        let mut p = player(Some(10.0));
        p.seek(25.0).unwrap();
        assert_eq!(p.position(), 10.0);

        p.seek(-4.0).unwrap();
        assert_eq!(p.position(), 0.0);

        p.play().unwrap();
        p.seek(2.0).unwrap();
        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(p.position(), 3.0);
    }

    #[tokio::test(start_paused = true)]
    async fn position_stops_at_duration() {
        let mut p = player(Some(2.0));
        p.play().unwrap();
        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(p.position(), 2.0);
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_duration_reports_zero_and_is_unbounded() {
        let mut p = player(None);
        assert_eq!(p.duration(), 0.0);
        p.play().unwrap();
        tokio::time::advance(Duration::from_secs(90)).await;
        assert_eq!(p.position(), 90.0);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_play_does_not_reset_clock() {
        let mut p = player(Some(60.0));
        p.play().unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;
        p.play().unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(p.position(), 4.0);
    }
}
