use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::catalog::{EpisodeKey, ShowId};
use crate::error::BackendResult;
use crate::playback::ProgressUpdate;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: String,
}

impl User {
    /// A local account keyed by its normalised email address.
    pub fn from_email(email: &str) -> Self {
        let email = email.trim().to_lowercase();
        Self {
            id: UserId(email.clone()),
            email,
        }
    }
}

/// Identifies one episode of one show; the uniqueness key of both tables
/// once paired with a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EpisodeRef {
    pub show_id: ShowId,
    pub season_number: u32,
    pub episode_key: EpisodeKey,
}

impl EpisodeRef {
    pub fn new(show_id: ShowId, season_number: u32, episode_key: EpisodeKey) -> Self {
        Self {
            show_id,
            season_number,
            episode_key,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Favourite {
    pub id: Uuid,
    pub user_id: UserId,
    pub show_id: ShowId,
    pub show_title: String,
    pub season_number: u32,
    pub season_title: Option<String>,
    pub episode_id: EpisodeKey,
    pub episode_title: String,
    pub episode_file: Option<String>,
    pub favourited_at: DateTime<Utc>,
}

impl Favourite {
    pub fn episode_ref(&self) -> EpisodeRef {
        EpisodeRef::new(self.show_id.clone(), self.season_number, self.episode_id.clone())
    }

    fn is(&self, user: &UserId, episode: &EpisodeRef) -> bool {
        &self.user_id == user
            && self.show_id == episode.show_id
            && self.season_number == episode.season_number
            && self.episode_id == episode.episode_key
    }
}

/// A favourite as submitted by the client; the backend assigns the rest.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFavourite {
    pub show_id: ShowId,
    pub show_title: String,
    pub season_number: u32,
    pub season_title: Option<String>,
    pub episode_id: EpisodeKey,
    pub episode_title: String,
    pub episode_file: Option<String>,
}

impl NewFavourite {
    pub fn episode_ref(&self) -> EpisodeRef {
        EpisodeRef::new(self.show_id.clone(), self.season_number, self.episode_id.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListeningProgress {
    pub id: Uuid,
    pub user_id: UserId,
    pub show_id: ShowId,
    pub season_number: u32,
    pub episode_id: EpisodeKey,
    pub episode_title: String,
    pub episode_file: Option<String>,
    pub playback_position: f64,
    pub duration: f64,
    pub completed: bool,
    pub last_played_at: DateTime<Utc>,
}

impl ListeningProgress {
    pub fn episode_ref(&self) -> EpisodeRef {
        EpisodeRef::new(self.show_id.clone(), self.season_number, self.episode_id.clone())
    }

    /// Share of the episode played, from 0 to 100.
    pub fn percent(&self) -> f64 {
        if self.duration > 0.0 {
            (self.playback_position / self.duration * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        }
    }

    pub fn remaining(&self) -> f64 {
        (self.duration - self.playback_position).max(0.0)
    }

    fn is(&self, user: &UserId, episode: &EpisodeRef) -> bool {
        &self.user_id == user
            && self.show_id == episode.show_id
            && self.season_number == episode.season_number
            && self.episode_id == episode.episode_key
    }
}

/// Row-level persistence for the two user-scoped tables.
///
/// Listings are newest first. Inserting a favourite that already exists
/// returns the existing row and deleting a missing one succeeds, so the
/// per-episode uniqueness holds whatever the caller does.
pub trait Backend {
    fn list_favourites(&self, user: &UserId) -> BackendResult<Vec<Favourite>>;
    fn insert_favourite(&mut self, user: &UserId, favourite: NewFavourite)
        -> BackendResult<Favourite>;
    fn delete_favourite(&mut self, user: &UserId, episode: &EpisodeRef) -> BackendResult<()>;

    fn list_progress(&self, user: &UserId) -> BackendResult<Vec<ListeningProgress>>;
    fn upsert_progress(
        &mut self,
        user: &UserId,
        update: ProgressUpdate,
    ) -> BackendResult<ListeningProgress>;
    fn delete_all_progress(&mut self, user: &UserId) -> BackendResult<usize>;
}

/// Both tables, oldest row first.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Tables {
    pub favourites: Vec<Favourite>,
    pub listening_progress: Vec<ListeningProgress>,
}

// Rows are kept in write order, so for equal timestamps the later write wins.
fn newest_first<T: Clone>(rows: &[T], timestamp: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    let mut rows: Vec<T> = rows.iter().rev().cloned().collect();
    rows.sort_by_key(|row| std::cmp::Reverse(timestamp(row)));
    rows
}

impl Tables {
    fn list_favourites(&self, user: &UserId) -> Vec<Favourite> {
        let rows: Vec<Favourite> = self
            .favourites
            .iter()
            .filter(|f| &f.user_id == user)
            .cloned()
            .collect();
        newest_first(&rows, |f| f.favourited_at)
    }

    fn insert_favourite(&mut self, user: &UserId, new: NewFavourite) -> Favourite {
        let episode = new.episode_ref();
        if let Some(existing) = self.favourites.iter().find(|f| f.is(user, &episode)) {
            return existing.clone();
        }

        let favourite = Favourite {
            id: Uuid::new_v4(),
            user_id: user.clone(),
            show_id: new.show_id,
            show_title: new.show_title,
            season_number: new.season_number,
            season_title: new.season_title,
            episode_id: new.episode_id,
            episode_title: new.episode_title,
            episode_file: new.episode_file,
            favourited_at: Utc::now(),
        };
        self.favourites.push(favourite.clone());
        favourite
    }

    fn delete_favourite(&mut self, user: &UserId, episode: &EpisodeRef) -> bool {
        let before = self.favourites.len();
        self.favourites.retain(|f| !f.is(user, episode));
        self.favourites.len() != before
    }

    fn list_progress(&self, user: &UserId) -> Vec<ListeningProgress> {
        let rows: Vec<ListeningProgress> = self
            .listening_progress
            .iter()
            .filter(|p| &p.user_id == user)
            .cloned()
            .collect();
        newest_first(&rows, |p| p.last_played_at)
    }

    fn upsert_progress(&mut self, user: &UserId, update: ProgressUpdate) -> ListeningProgress {
        let episode = EpisodeRef::new(
            update.show_id.clone(),
            update.season_number,
            update.episode_key.clone(),
        );

        let id = match self
            .listening_progress
            .iter()
            .position(|p| p.is(user, &episode))
        {
            Some(pos) => self.listening_progress.remove(pos).id,
            None => Uuid::new_v4(),
        };

        let row = ListeningProgress {
            id,
            user_id: user.clone(),
            show_id: update.show_id,
            season_number: update.season_number,
            episode_id: update.episode_key,
            episode_title: update.episode_title,
            episode_file: update.episode_file,
            playback_position: update.position,
            duration: update.duration,
            completed: update.completed,
            last_played_at: Utc::now(),
        };
        self.listening_progress.push(row.clone());
        row
    }

    fn delete_all_progress(&mut self, user: &UserId) -> usize {
        let before = self.listening_progress.len();
        self.listening_progress.retain(|p| &p.user_id != user);
        before - self.listening_progress.len()
    }
}

/// Tables held in memory for the life of the process.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: Tables,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tables(&self) -> &Tables {
        &self.tables
    }
}

impl Backend for MemoryBackend {
    fn list_favourites(&self, user: &UserId) -> BackendResult<Vec<Favourite>> {
        Ok(self.tables.list_favourites(user))
    }

    fn insert_favourite(
        &mut self,
        user: &UserId,
        favourite: NewFavourite,
    ) -> BackendResult<Favourite> {
        Ok(self.tables.insert_favourite(user, favourite))
    }

    fn delete_favourite(&mut self, user: &UserId, episode: &EpisodeRef) -> BackendResult<()> {
        self.tables.delete_favourite(user, episode);
        Ok(())
    }

    fn list_progress(&self, user: &UserId) -> BackendResult<Vec<ListeningProgress>> {
        Ok(self.tables.list_progress(user))
    }

    fn upsert_progress(
        &mut self,
        user: &UserId,
        update: ProgressUpdate,
    ) -> BackendResult<ListeningProgress> {
        Ok(self.tables.upsert_progress(user, update))
    }

    fn delete_all_progress(&mut self, user: &UserId) -> BackendResult<usize> {
        Ok(self.tables.delete_all_progress(user))
    }
}

pub const FAVOURITES_FILE: &str = "favourites.json";
pub const PROGRESS_FILE: &str = "listening_progress.json";

/// Tables persisted as JSON files under a data directory, rewritten after
/// every mutation.
#[derive(Debug)]
pub struct FileBackend {
    root: PathBuf,
    tables: Tables,
}

impl FileBackend {
    pub fn open(root: impl AsRef<Path>) -> BackendResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;

        let tables = Tables {
            favourites: read_table(&root.join(FAVOURITES_FILE))?,
            listening_progress: read_table(&root.join(PROGRESS_FILE))?,
        };
        debug!(
            "Opened backend at {} ({} favourites, {} progress rows)",
            root.display(),
            tables.favourites.len(),
            tables.listening_progress.len()
        );

        Ok(Self { root, tables })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn save_favourites(&mut self, previous: Vec<Favourite>) -> BackendResult<()> {
        let path = self.root.join(FAVOURITES_FILE);
        write_or_restore(&path, &mut self.tables.favourites, previous)
    }

    fn save_progress(&mut self, previous: Vec<ListeningProgress>) -> BackendResult<()> {
        let path = self.root.join(PROGRESS_FILE);
        write_or_restore(&path, &mut self.tables.listening_progress, previous)
    }
}

fn read_table<T: DeserializeOwned>(path: &Path) -> BackendResult<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

// Written to a sibling file first so a crash never leaves a truncated table.
fn write_table<T: Serialize>(path: &Path, rows: &[T]) -> BackendResult<()> {
    let content = serde_json::to_string_pretty(rows)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

// The in-memory table only keeps a mutation once it is on disk.
fn write_or_restore<T: Serialize>(
    path: &Path,
    rows: &mut Vec<T>,
    previous: Vec<T>,
) -> BackendResult<()> {
    if let Err(e) = write_table(path, rows) {
        *rows = previous;
        return Err(e);
    }
    Ok(())
}

impl Backend for FileBackend {
    fn list_favourites(&self, user: &UserId) -> BackendResult<Vec<Favourite>> {
        Ok(self.tables.list_favourites(user))
    }

    fn insert_favourite(
        &mut self,
        user: &UserId,
        favourite: NewFavourite,
    ) -> BackendResult<Favourite> {
        let previous = self.tables.favourites.clone();
        let row = self.tables.insert_favourite(user, favourite);
        if self.tables.favourites.len() != previous.len() {
            self.save_favourites(previous)?;
        }
        Ok(row)
    }

    fn delete_favourite(&mut self, user: &UserId, episode: &EpisodeRef) -> BackendResult<()> {
        let previous = self.tables.favourites.clone();
        if self.tables.delete_favourite(user, episode) {
            self.save_favourites(previous)?;
        }
        Ok(())
    }

    fn list_progress(&self, user: &UserId) -> BackendResult<Vec<ListeningProgress>> {
        Ok(self.tables.list_progress(user))
    }

    fn upsert_progress(
        &mut self,
        user: &UserId,
        update: ProgressUpdate,
    ) -> BackendResult<ListeningProgress> {
        let previous = self.tables.listening_progress.clone();
        let row = self.tables.upsert_progress(user, update);
        self.save_progress(previous)?;
        Ok(row)
    }

    fn delete_all_progress(&mut self, user: &UserId) -> BackendResult<usize> {
        let previous = self.tables.listening_progress.clone();
        let removed = self.tables.delete_all_progress(user);
        if removed > 0 {
            self.save_progress(previous)?;
        }
        Ok(removed)
    }
}
