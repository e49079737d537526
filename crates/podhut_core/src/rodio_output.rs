use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use tracing::{debug, warn};
use ureq::Agent;

use crate::audio::{AudioEvent, AudioOutput};
use crate::error::AudioError;

const MAX_EPISODE_BYTES: u64 = 512 * 1024 * 1024;

/// Plays episodes on the default output device.
///
/// Sources are downloaded on a worker thread; until the bytes arrive,
/// transport calls only record what should happen once they do.
pub struct RodioOutput {
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
    agent: Agent,
    sink: Option<Sink>,
    loading: Option<Receiver<Result<Vec<u8>, AudioError>>>,
    wants_play: bool,
    pending_seek: Option<f64>,
    volume: f32,
    duration: Option<f64>,
    playback_started_at: Option<Instant>,
    paused_position: f64,
    events: VecDeque<AudioEvent>,
}

impl RodioOutput {
    pub fn new(timeout: Duration) -> Result<Self, AudioError> {
        let (stream, stream_handle) =
            OutputStream::try_default().map_err(|e| AudioError::OutputStream(e.to_string()))?;
        let agent = Agent::config_builder()
            .timeout_connect(Some(timeout))
            .build()
            .new_agent();

        Ok(Self {
            _stream: stream,
            stream_handle,
            agent,
            sink: None,
            loading: None,
            wants_play: false,
            pending_seek: None,
            volume: 1.0,
            duration: None,
            playback_started_at: None,
            paused_position: 0.0,
            events: VecDeque::new(),
        })
    }

    fn is_playing(&self) -> bool {
        self.sink.is_some() && self.playback_started_at.is_some()
    }

    fn stop_internal(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.loading = None;
        self.playback_started_at = None;
        self.paused_position = 0.0;
        self.pending_seek = None;
        self.duration = None;
    }

    fn start_sink(&mut self, bytes: Vec<u8>) -> Result<(), AudioError> {
        let source =
            Decoder::new(Cursor::new(bytes)).map_err(|e| AudioError::Decode(e.to_string()))?;
        self.duration = source.total_duration().map(|d| d.as_secs_f64());

        let sink = Sink::try_new(&self.stream_handle)
            .map_err(|e| AudioError::Sink(e.to_string()))?;
        sink.set_volume(self.volume);
        sink.pause();
        sink.append(source);
        self.sink = Some(sink);

        if let Some(duration) = self.duration {
            self.events.push_back(AudioEvent::LoadedMetadata(duration));
        }
        if let Some(position) = self.pending_seek.take() {
            self.seek(position);
        }
        if self.wants_play {
            self.wants_play = false;
            self.play();
        }
        Ok(())
    }

    fn poll_loading(&mut self) {
        let Some(receiver) = &self.loading else {
            return;
        };

        let result = match receiver.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => {
                Err(AudioError::Source("download thread went away".to_string()))
            }
        };
        self.loading = None;

        if let Err(e) = result.and_then(|bytes| self.start_sink(bytes)) {
            warn!("Failed to load episode audio: {}", e);
            self.events.push_back(AudioEvent::Error(e.to_string()));
        }
    }
}

fn fetch_source(agent: &Agent, source: &str) -> Result<Vec<u8>, AudioError> {
    if !source.starts_with("http://") && !source.starts_with("https://") {
        return std::fs::read(source).map_err(|e| AudioError::Source(e.to_string()));
    }

    let mut response = agent
        .get(source)
        .call()
        .map_err(|e| AudioError::Source(e.to_string()))?;
    response
        .body_mut()
        .with_config()
        .limit(MAX_EPISODE_BYTES)
        .read_to_vec()
        .map_err(|e| AudioError::Source(e.to_string()))
}

impl AudioOutput for RodioOutput {
    fn load(&mut self, source: &str) {
        self.stop_internal();
        self.events.clear();
        self.wants_play = false;

        let (sender, receiver) = mpsc::channel();
        let agent = self.agent.clone();
        let source = source.to_string();
        thread::spawn(move || {
            debug!("Downloading {}", source);
            let _ = sender.send(fetch_source(&agent, &source));
        });
        self.loading = Some(receiver);
    }

    fn play(&mut self) {
        let Some(sink) = &self.sink else {
            self.wants_play = true;
            return;
        };
        if self.playback_started_at.is_some() {
            return;
        }
        sink.play();
        self.playback_started_at = Some(Instant::now());
        self.events.push_back(AudioEvent::Play);
    }

    fn pause(&mut self) {
        let Some(sink) = &self.sink else {
            self.wants_play = false;
            return;
        };
        if self.playback_started_at.is_none() {
            return;
        }
        sink.pause();
        self.paused_position = self.position();
        self.playback_started_at = None;
        self.events.push_back(AudioEvent::Pause);
    }

    fn seek(&mut self, position: f64) {
        let position = match self.duration {
            Some(duration) => position.clamp(0.0, duration),
            None => position.max(0.0),
        };
        let Some(sink) = &self.sink else {
            self.pending_seek = Some(position);
            return;
        };

        if sink.try_seek(Duration::from_secs_f64(position)).is_ok() {
            self.paused_position = position;
            if self.playback_started_at.is_some() {
                self.playback_started_at = Some(Instant::now());
            }
            self.events.push_back(AudioEvent::TimeUpdate(position));
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(sink) = &self.sink {
            sink.set_volume(self.volume);
        }
    }

    fn position(&self) -> f64 {
        match self.playback_started_at {
            Some(started_at) => self.paused_position + started_at.elapsed().as_secs_f64(),
            None => self.paused_position,
        }
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }

    fn poll_events(&mut self) -> Vec<AudioEvent> {
        self.poll_loading();

        if self.is_playing() {
            let position = self.position();
            self.events.push_back(AudioEvent::TimeUpdate(position));

            if self.sink.as_ref().is_some_and(|s| s.empty()) {
                self.paused_position = position;
                self.playback_started_at = None;
                self.events.push_back(AudioEvent::Pause);
                self.events.push_back(AudioEvent::Ended);
            }
        }

        self.events.drain(..).collect()
    }
}
