use crate::backend::EpisodeRef;
use crate::catalog::{Episode, EpisodeKey, Season, ShowId, ShowInfo};

/// An episode counts as completed once playback is this close to the end.
pub const COMPLETION_MARGIN_SECS: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// The session loaded into the audio output.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentlyPlaying {
    pub show: ShowInfo,
    pub season: Season,
    pub episode: Episode,
    pub episode_index: usize,
}

impl CurrentlyPlaying {
    pub fn episode_key(&self) -> EpisodeKey {
        self.episode.key(self.season.season)
    }

    /// Episode keys only repeat across shows; this pairs one with its show.
    pub fn episode_ref(&self) -> EpisodeRef {
        EpisodeRef::new(self.show.id.clone(), self.season.season, self.episode_key())
    }
}

/// A snapshot of listening progress, ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub show_id: ShowId,
    pub season_number: u32,
    pub episode_key: EpisodeKey,
    pub episode_title: String,
    pub episode_file: Option<String>,
    pub position: f64,
    pub duration: f64,
    pub completed: bool,
}

impl ProgressUpdate {
    /// Builds an update for `current` at `position`. An unknown duration is
    /// stored as zero and never counts as completed.
    pub fn new(current: &CurrentlyPlaying, position: f64, duration: Option<f64>) -> Self {
        let completed = duration.is_some_and(|d| is_completed(position, d));

        Self {
            show_id: current.show.id.clone(),
            season_number: current.season.season,
            episode_key: current.episode_key(),
            episode_title: current.episode.title.clone(),
            episode_file: Some(current.episode.file.clone()),
            position,
            duration: duration.unwrap_or(0.0),
            completed,
        }
    }
}

pub fn is_completed(position: f64, duration: f64) -> bool {
    position >= duration - COMPLETION_MARGIN_SECS
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerCommand {
    Pause,
    Resume,
    Toggle,
    Next,
    Previous,
    SkipForward,
    SkipBackward,
    Seek(f64),
    SetVolume(f32),
}
