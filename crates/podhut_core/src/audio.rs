use std::collections::VecDeque;
use std::time::Instant;

/// Notifications raised by an audio output, drained by the player.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioEvent {
    TimeUpdate(f64),
    LoadedMetadata(f64),
    Ended,
    Play,
    Pause,
    Error(String),
}

/// One addressable media session. Positions and durations are in seconds.
///
/// Failures while loading or decoding are reported as [`AudioEvent::Error`]
/// rather than returned, since the player models no playback error state.
pub trait AudioOutput {
    fn load(&mut self, source: &str);
    fn play(&mut self);
    fn pause(&mut self);
    /// Moves the playhead, clamping to the media's valid range.
    fn seek(&mut self, position: f64);
    fn set_volume(&mut self, volume: f32);
    fn position(&self) -> f64;
    /// `None` until the media's metadata is known.
    fn duration(&self) -> Option<f64>;
    fn poll_events(&mut self) -> Vec<AudioEvent>;
}

/// A headless output that advances its playhead with the wall clock.
///
/// Nothing is decoded, so the duration is whatever was configured with
/// [`ClockOutput::set_duration`] (unknown by default).
#[derive(Debug, Default)]
pub struct ClockOutput {
    source: Option<String>,
    duration: Option<f64>,
    playing: bool,
    volume: f32,
    playback_started_at: Option<Instant>,
    paused_position: f64,
    ended: bool,
    events: VecDeque<AudioEvent>,
}

impl ClockOutput {
    pub fn new() -> Self {
        Self {
            volume: 1.0,
            ..Self::default()
        }
    }

    pub fn with_duration(duration: f64) -> Self {
        let mut output = Self::new();
        output.duration = Some(duration);
        output
    }

    /// Duration reported for every source loaded from now on.
    pub fn set_duration(&mut self, duration: Option<f64>) {
        self.duration = duration;
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    fn clamp(&self, position: f64) -> f64 {
        let position = position.max(0.0);
        match self.duration {
            Some(duration) => position.min(duration),
            None => position,
        }
    }
}

impl AudioOutput for ClockOutput {
    fn load(&mut self, source: &str) {
        self.source = Some(source.to_string());
        self.playing = false;
        self.playback_started_at = None;
        self.paused_position = 0.0;
        self.ended = false;
        self.events.clear();
        if let Some(duration) = self.duration {
            self.events.push_back(AudioEvent::LoadedMetadata(duration));
        }
    }

    fn play(&mut self) {
        if self.source.is_none() || self.playing {
            return;
        }
        if self.ended {
            self.paused_position = 0.0;
            self.ended = false;
        }
        self.playing = true;
        self.playback_started_at = Some(Instant::now());
        self.events.push_back(AudioEvent::Play);
    }

    fn pause(&mut self) {
        if !self.playing {
            return;
        }
        self.paused_position = self.position();
        self.playback_started_at = None;
        self.playing = false;
        self.events.push_back(AudioEvent::Pause);
    }

    fn seek(&mut self, position: f64) {
        if self.source.is_none() {
            return;
        }
        self.paused_position = self.clamp(position);
        if self.playing {
            self.playback_started_at = Some(Instant::now());
        }
        self.events
            .push_back(AudioEvent::TimeUpdate(self.paused_position));
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    fn position(&self) -> f64 {
        match self.playback_started_at {
            Some(started_at) if self.playing => {
                self.clamp(self.paused_position + started_at.elapsed().as_secs_f64())
            }
            _ => self.paused_position,
        }
    }

    fn duration(&self) -> Option<f64> {
        self.source.as_ref().and(self.duration)
    }

    fn poll_events(&mut self) -> Vec<AudioEvent> {
        if self.playing {
            let position = self.position();
            self.events.push_back(AudioEvent::TimeUpdate(position));

            if self.duration.is_some_and(|d| position >= d) {
                self.paused_position = position;
                self.playback_started_at = None;
                self.playing = false;
                self.ended = true;
                self.events.push_back(AudioEvent::Pause);
                self.events.push_back(AudioEvent::Ended);
            }
        }

        self.events.drain(..).collect()
    }
}
