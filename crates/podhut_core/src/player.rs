use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::audio::{AudioEvent, AudioOutput};
use crate::catalog::{Episode, Season, ShowInfo};
use crate::error::StoreResult;
use crate::playback::{CurrentlyPlaying, PlaybackState, PlayerCommand, ProgressUpdate};

pub const SKIP_SECONDS: f64 = 15.0;
pub const PROGRESS_SAVE_INTERVAL: Duration = Duration::from_secs(10);
pub const EXIT_WARNING: &str = "You have audio playing. Are you sure you want to leave?";

/// Somewhere the player can persist listening progress.
pub trait ProgressSink {
    /// Whether saving is possible at all right now (someone is signed in).
    fn accepts_progress(&self) -> bool;
    fn save_progress(&mut self, update: ProgressUpdate) -> StoreResult<()>;
}

/// Owns the single audio output and the session loaded into it.
///
/// All state lives here; views read it through the accessors and change it
/// only through the transport methods or [`Player::apply`].
pub struct Player<O> {
    output: O,
    current: Option<CurrentlyPlaying>,
    state: PlaybackState,
    position: f64,
    duration: f64,
    volume: f32,
    skip_step: f64,
    save_interval: Duration,
    last_saved_at: Option<Instant>,
}

impl<O: AudioOutput> Player<O> {
    pub fn new(output: O) -> Self {
        Self {
            output,
            current: None,
            state: PlaybackState::Stopped,
            position: 0.0,
            duration: 0.0,
            volume: 1.0,
            skip_step: SKIP_SECONDS,
            save_interval: PROGRESS_SAVE_INTERVAL,
            last_saved_at: None,
        }
    }

    pub fn with_skip_step(mut self, seconds: f64) -> Self {
        self.skip_step = seconds;
        self
    }

    pub fn with_save_interval(mut self, interval: Duration) -> Self {
        self.save_interval = interval;
        self
    }

    pub fn currently_playing(&self) -> Option<&CurrentlyPlaying> {
        self.current.as_ref()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    /// True while audio is playing; quitting now would drop unsaved progress.
    pub fn confirm_exit_required(&self) -> bool {
        self.is_playing()
    }

    /// Replaces whatever is loaded and starts playing `episode`.
    pub fn play(
        &mut self,
        show: impl Into<ShowInfo>,
        season: Season,
        episode: Episode,
        episode_index: usize,
    ) {
        let show = show.into();
        info!(
            "Playing {} S{} E{}: {}",
            show.title, season.season, episode.episode, episode.title
        );

        self.output.load(&episode.file);
        self.current = Some(CurrentlyPlaying {
            show,
            season,
            episode,
            episode_index,
        });
        self.position = 0.0;
        self.duration = self.output.duration().unwrap_or(0.0);
        self.last_saved_at = Some(Instant::now());

        self.output.play();
        self.state = PlaybackState::Playing;
    }

    pub fn pause(&mut self) {
        if self.current.is_none() {
            return;
        }
        self.output.pause();
        self.position = self.output.position();
        self.state = PlaybackState::Paused;
    }

    pub fn resume(&mut self) {
        if self.current.is_none() {
            return;
        }
        self.output.play();
        self.state = PlaybackState::Playing;
    }

    pub fn toggle_playback(&mut self) {
        match self.state {
            PlaybackState::Playing => self.pause(),
            PlaybackState::Paused | PlaybackState::Stopped => self.resume(),
        }
    }

    pub fn seek(&mut self, time: f64) {
        if self.current.is_none() {
            return;
        }
        self.output.seek(time);
        self.position = self.output.position();
    }

    /// Not validated here; callers keep `volume` within `[0, 1]`.
    pub fn set_volume(&mut self, volume: f32) {
        self.output.set_volume(volume);
        self.volume = volume;
    }

    pub fn skip_forward(&mut self) {
        if self.current.is_none() {
            return;
        }
        let target = self.output.position() + self.skip_step;
        let target = match self.output.duration() {
            Some(duration) => target.min(duration),
            None => target,
        };
        self.seek(target);
    }

    pub fn skip_backward(&mut self) {
        if self.current.is_none() {
            return;
        }
        let target = (self.output.position() - self.skip_step).max(0.0);
        self.seek(target);
    }

    /// Moves to the next episode of the current season. No-op on the last one.
    pub fn next_episode(&mut self) {
        let Some(current) = &self.current else {
            return;
        };
        let next_index = current.episode_index + 1;
        let Some(next) = current.season.episodes.get(next_index).cloned() else {
            debug!("Already at the last episode of the season");
            return;
        };
        let show = current.show.clone();
        let season = current.season.clone();
        self.play(show, season, next, next_index);
    }

    /// Moves to the previous episode of the current season. No-op on the first one.
    pub fn previous_episode(&mut self) {
        let Some(current) = &self.current else {
            return;
        };
        let Some(prev_index) = current.episode_index.checked_sub(1) else {
            return;
        };
        let Some(prev) = current.season.episodes.get(prev_index).cloned() else {
            return;
        };
        let show = current.show.clone();
        let season = current.season.clone();
        self.play(show, season, prev, prev_index);
    }

    pub fn apply(&mut self, command: PlayerCommand) {
        debug!("Player command: {:?}", command);
        match command {
            PlayerCommand::Pause => self.pause(),
            PlayerCommand::Resume => self.resume(),
            PlayerCommand::Toggle => self.toggle_playback(),
            PlayerCommand::Next => self.next_episode(),
            PlayerCommand::Previous => self.previous_episode(),
            PlayerCommand::SkipForward => self.skip_forward(),
            PlayerCommand::SkipBackward => self.skip_backward(),
            PlayerCommand::Seek(time) => self.seek(time),
            PlayerCommand::SetVolume(volume) => self.set_volume(volume),
        }
    }

    pub fn handle_event(&mut self, event: AudioEvent) {
        match event {
            AudioEvent::TimeUpdate(position) => self.position = position,
            AudioEvent::LoadedMetadata(duration) => self.duration = duration,
            AudioEvent::Play => {
                if self.current.is_some() {
                    self.state = PlaybackState::Playing;
                }
            }
            AudioEvent::Pause => {
                if self.state == PlaybackState::Playing {
                    self.state = PlaybackState::Paused;
                }
            }
            AudioEvent::Ended => {
                self.state = PlaybackState::Paused;
                self.next_episode();
            }
            AudioEvent::Error(message) => {
                warn!("Audio output error: {}", message);
                self.state = PlaybackState::Paused;
            }
        }
    }

    /// Drains pending audio events and, once per save interval, persists the
    /// live progress of the active session to `sink`.
    ///
    /// Returns the update that was saved, if any.
    pub fn tick(
        &mut self,
        now: Instant,
        sink: &mut dyn ProgressSink,
    ) -> StoreResult<Option<ProgressUpdate>> {
        for event in self.output.poll_events() {
            self.handle_event(event);
        }

        let Some(current) = &self.current else {
            return Ok(None);
        };
        if !sink.accepts_progress() {
            return Ok(None);
        }
        let due = self
            .last_saved_at
            .is_none_or(|last| now.saturating_duration_since(last) >= self.save_interval);
        if !due {
            return Ok(None);
        }

        let update = ProgressUpdate::new(current, self.output.position(), self.output.duration());
        self.last_saved_at = Some(now);
        debug!(
            "Saving progress for {} {}: {:.0}s",
            update.show_id, update.episode_key, update.position
        );
        sink.save_progress(update.clone())?;
        Ok(Some(update))
    }
}
