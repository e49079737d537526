use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use souvlaki::{
    MediaControlEvent, MediaControls, MediaMetadata, MediaPlayback, MediaPosition, PlatformConfig,
    SeekDirection,
};
use thiserror::Error;

use crate::catalog::{EpisodeKey, ShowId};
use crate::playback::{CurrentlyPlaying, PlayerCommand};

#[derive(Debug, Error)]
pub enum MediaControlsError {
    #[error("Failed to initialize media controls: {0}")]
    InitFailed(String),
    #[error("Failed to attach media controls: {0}")]
    AttachFailed(String),
    #[error("Failed to update media controls: {0}")]
    UpdateFailed(String),
}

/// OS media keys and the "now playing" widget, translated to player commands.
pub struct MediaControlsHandler {
    controls: MediaControls,
    receiver: Receiver<PlayerCommand>,
    // Metadata is only pushed when the episode or its known duration changes.
    announced: Option<(ShowId, EpisodeKey, u64)>,
}

fn update_failed(e: impl std::fmt::Display) -> MediaControlsError {
    MediaControlsError::UpdateFailed(e.to_string())
}

fn to_command(event: MediaControlEvent) -> Option<PlayerCommand> {
    match event {
        MediaControlEvent::Play => Some(PlayerCommand::Resume),
        MediaControlEvent::Pause => Some(PlayerCommand::Pause),
        MediaControlEvent::Toggle => Some(PlayerCommand::Toggle),
        MediaControlEvent::Next => Some(PlayerCommand::Next),
        MediaControlEvent::Previous => Some(PlayerCommand::Previous),
        MediaControlEvent::Stop => Some(PlayerCommand::Pause),
        MediaControlEvent::Seek(SeekDirection::Forward) => Some(PlayerCommand::SkipForward),
        MediaControlEvent::Seek(SeekDirection::Backward) => Some(PlayerCommand::SkipBackward),
        MediaControlEvent::SetPosition(pos) => Some(PlayerCommand::Seek(pos.0.as_secs_f64())),
        MediaControlEvent::SetVolume(volume) => Some(PlayerCommand::SetVolume(volume as f32)),
        _ => None,
    }
}

impl MediaControlsHandler {
    pub fn new() -> Result<Self, MediaControlsError> {
        let config = PlatformConfig {
            dbus_name: "podhut",
            display_name: "PodHut",
            hwnd: None,
        };

        let mut controls = MediaControls::new(config)
            .map_err(|e| MediaControlsError::InitFailed(e.to_string()))?;

        let (sender, receiver) = mpsc::channel::<PlayerCommand>();
        Self::attach_handler(&mut controls, sender)?;

        Ok(Self {
            controls,
            receiver,
            announced: None,
        })
    }

    fn attach_handler(
        controls: &mut MediaControls,
        sender: Sender<PlayerCommand>,
    ) -> Result<(), MediaControlsError> {
        controls
            .attach(move |event: MediaControlEvent| {
                if let Some(command) = to_command(event) {
                    let _ = sender.send(command);
                }
            })
            .map_err(|e| MediaControlsError::AttachFailed(e.to_string()))
    }

    pub fn poll_commands(&self) -> Vec<PlayerCommand> {
        self.receiver.try_iter().collect()
    }

    pub fn update(
        &mut self,
        current: Option<&CurrentlyPlaying>,
        playing: bool,
        position: f64,
        duration: f64,
    ) -> Result<(), MediaControlsError> {
        let Some(current) = current else {
            if self.announced.take().is_some() {
                self.controls
                    .set_metadata(MediaMetadata::default())
                    .map_err(update_failed)?;
            }
            return self
                .controls
                .set_playback(MediaPlayback::Stopped)
                .map_err(update_failed);
        };

        let episode = (
            current.show.id.clone(),
            current.episode_key(),
            duration.max(0.0).round() as u64,
        );
        if self.announced.as_ref() != Some(&episode) {
            self.controls
                .set_metadata(MediaMetadata {
                    title: Some(&current.episode.title),
                    artist: Some(&current.show.title),
                    album: Some(&current.season.title),
                    duration: (duration > 0.0).then(|| Duration::from_secs_f64(duration)),
                    ..Default::default()
                })
                .map_err(update_failed)?;
            self.announced = Some(episode);
        }

        let progress = Some(MediaPosition(Duration::from_secs_f64(position.max(0.0))));
        let playback = if playing {
            MediaPlayback::Playing { progress }
        } else {
            MediaPlayback::Paused { progress }
        };
        self.controls.set_playback(playback).map_err(update_failed)
    }
}
