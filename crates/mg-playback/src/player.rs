//! The [`Player`] facade and the [`PlaybackEngine`] seam it delegates to.

use std::fmt;
use std::path::PathBuf;

use mg_core::{Error, Result};

use crate::time::MediaTime;

/// What a player was opened on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    /// Local file (plain path or `file://` URL).
    File(PathBuf),
    /// Anything with a non-file scheme, passed to the engine verbatim.
    Remote(String),
}

impl MediaSource {
    /// Classify a URL or path. Empty input is a validation error.
    pub fn parse(url: &str) -> Result<Self> {
        let url = url.trim();
        if url.is_empty() {
            return Err(Error::Validation("media URL is empty".into()));
        }

        if let Some(path) = url.strip_prefix("file://") {
            return Ok(MediaSource::File(PathBuf::from(path)));
        }

        match url.split_once("://") {
            Some((scheme, rest))
                if !scheme.is_empty()
                    && !rest.is_empty()
                    && scheme.chars().all(|c| c.is_ascii_alphanumeric() || "+-.".contains(c)) =>
            {
                Ok(MediaSource::Remote(url.to_string()))
            }
            _ => Ok(MediaSource::File(PathBuf::from(url))),
        }
    }
}

impl fmt::Display for MediaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaSource::File(p) => write!(f, "{}", p.display()),
            MediaSource::Remote(u) => f.write_str(u),
        }
    }
}

/// The external playback engine a [`Player`] drives.
pub trait PlaybackEngine: Send {
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self) -> Result<()>;
    fn seek(&mut self, to: MediaTime) -> Result<()>;
    fn position(&self) -> MediaTime;
    /// `None` while the duration is not known.
    fn duration(&self) -> Option<MediaTime>;
    fn is_playing(&self) -> bool;
}

/// One source bound to one engine instance.
#[derive(Debug)]
pub struct Player<E> {
    source: MediaSource,
    engine: E,
}

impl<E: PlaybackEngine> Player<E> {
    /// Bind `url` to `engine`.
    pub fn open(url: &str, engine: E) -> Result<Self> {
        let source = MediaSource::parse(url)?;
        tracing::debug!("Opened player on {source}");
        Ok(Self { source, engine })
    }

    pub fn source(&self) -> &MediaSource {
        &self.source
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn play(&mut self) -> Result<()> {
        let result = self.engine.play();
        self.report("play", result)
    }

    pub fn pause(&mut self) -> Result<()> {
        let result = self.engine.pause();
        self.report("pause", result)
    }

    /// Seek to `seconds` from the start.
    pub fn seek(&mut self, seconds: f64) -> Result<()> {
        let to = MediaTime::from_secs_f64(seconds)
            .ok_or_else(|| Error::Validation(format!("seek target {seconds} is not finite")))?;
        let result = self.engine.seek(to);
        self.report("seek", result)
    }

    /// Current position in seconds.
    pub fn position(&self) -> f64 {
        self.engine.position().as_secs_f64()
    }

    /// Total duration in seconds; zero while unknown.
    pub fn duration(&self) -> f64 {
        self.engine
            .duration()
            .map(MediaTime::as_secs_f64)
            .unwrap_or(0.0)
    }

    pub fn is_playing(&self) -> bool {
        self.engine.is_playing()
    }

    fn report(&self, op: &str, result: Result<()>) -> Result<()> {
        result.map_err(|e| {
            tracing::warn!("{op} failed on {}: {e}", self.source);
            match e {
                Error::Playback(_) => e,
                other => Error::Playback(other.to_string()),
            }
        })
    }
}
