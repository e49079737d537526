//! User-scoped favourites and listening progress, with cached lists.
//!
//! Each list carries a generation counter. A successful mutation bumps the
//! generation of the list it touched; a read refetches whenever the
//! generation it holds is stale. A failed mutation leaves the cache as it was
//! and returns the error.

use tracing::{debug, info};

use crate::backend::{Backend, EpisodeRef, Favourite, ListeningProgress, NewFavourite, User};
use crate::catalog::{EpisodeKey, ShowId};
use crate::error::{StoreError, StoreResult};
use crate::player::ProgressSink;
use crate::playback::ProgressUpdate;

/// In-progress rows must be past this point to show up in "continue listening".
pub const CONTINUE_MIN_POSITION_SECS: f64 = 10.0;
pub const CONTINUE_LISTENING_LIMIT: usize = 4;

#[derive(Debug)]
struct CachedList<T> {
    generation: u64,
    held: Option<(u64, Vec<T>)>,
}

impl<T: Clone> CachedList<T> {
    fn new() -> Self {
        Self {
            generation: 0,
            held: None,
        }
    }

    fn fresh(&self) -> Option<&[T]> {
        match &self.held {
            Some((generation, rows)) if *generation == self.generation => Some(rows.as_slice()),
            _ => None,
        }
    }

    fn last_known(&self) -> &[T] {
        self.held.as_ref().map(|(_, rows)| rows.as_slice()).unwrap_or(&[])
    }

    fn fill(&mut self, rows: Vec<T>) {
        self.held = Some((self.generation, rows));
    }

    fn invalidate(&mut self) {
        self.generation += 1;
    }

    fn reset(&mut self) {
        self.generation += 1;
        self.held = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
}

/// Favourites of one show and season, in the order first seen.
#[derive(Debug, Clone, PartialEq)]
pub struct FavouriteGroup {
    pub show_id: ShowId,
    pub show_title: String,
    pub season_number: u32,
    pub season_title: Option<String>,
    pub episodes: Vec<Favourite>,
}

pub struct Store<B> {
    backend: B,
    user: Option<User>,
    favourites: CachedList<Favourite>,
    progress: CachedList<ListeningProgress>,
}

impl<B: Backend> Store<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            user: None,
            favourites: CachedList::new(),
            progress: CachedList::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn current_user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn sign_in(&mut self, user: User) {
        info!("Signed in as {}", user.email);
        self.user = Some(user);
        self.favourites.reset();
        self.progress.reset();
    }

    pub fn sign_out(&mut self) {
        if let Some(user) = self.user.take() {
            info!("Signed out {}", user.email);
        }
        self.favourites.reset();
        self.progress.reset();
    }

    fn require_user(&self) -> StoreResult<User> {
        self.user.clone().ok_or(StoreError::AuthenticationRequired)
    }

    // ============ Favourites ============

    /// The signed-in user's favourites, newest first. Empty when signed out.
    pub fn list_favourites(&mut self) -> StoreResult<&[Favourite]> {
        let Some(user) = &self.user else {
            return Ok(&[]);
        };

        if self.favourites.fresh().is_none() {
            let rows = self.backend.list_favourites(&user.id)?;
            debug!("Fetched {} favourites", rows.len());
            self.favourites.fill(rows);
        }
        Ok(self.favourites.last_known())
    }

    /// Favourites as of the last successful fetch, without touching the backend.
    pub fn cached_favourites(&self) -> &[Favourite] {
        self.favourites.last_known()
    }

    pub fn is_favourite(
        &self,
        show_id: &ShowId,
        season_number: u32,
        episode_key: &EpisodeKey,
    ) -> bool {
        self.favourites.last_known().iter().any(|f| {
            &f.show_id == show_id
                && f.season_number == season_number
                && &f.episode_id == episode_key
        })
    }

    pub fn add_favourite(&mut self, favourite: NewFavourite) -> StoreResult<Favourite> {
        let user = self.require_user()?;
        let row = self.backend.insert_favourite(&user.id, favourite)?;
        self.favourites.invalidate();
        Ok(row)
    }

    pub fn remove_favourite(
        &mut self,
        show_id: &ShowId,
        season_number: u32,
        episode_key: &EpisodeKey,
    ) -> StoreResult<()> {
        let user = self.require_user()?;
        let episode = EpisodeRef::new(show_id.clone(), season_number, episode_key.clone());
        self.backend.delete_favourite(&user.id, &episode)?;
        self.favourites.invalidate();
        Ok(())
    }

    /// Adds the favourite if the cached list lacks it, removes it otherwise.
    ///
    /// The check and the write are separate steps: another process toggling
    /// the same episode in between can make this add a row that already
    /// exists or remove one that is already gone. The backend treats both as
    /// no-ops, so the table itself stays consistent.
    pub fn toggle_favourite(&mut self, favourite: NewFavourite) -> StoreResult<ToggleOutcome> {
        self.require_user()?;
        self.list_favourites()?;

        if self.is_favourite(&favourite.show_id, favourite.season_number, &favourite.episode_id) {
            self.remove_favourite(
                &favourite.show_id,
                favourite.season_number,
                &favourite.episode_id,
            )?;
            Ok(ToggleOutcome::Removed)
        } else {
            self.add_favourite(favourite)?;
            Ok(ToggleOutcome::Added)
        }
    }

    /// Favourites grouped by show and season.
    pub fn favourite_groups(&mut self) -> StoreResult<Vec<FavouriteGroup>> {
        let mut groups: Vec<FavouriteGroup> = Vec::new();
        for favourite in self.list_favourites()? {
            match groups.iter_mut().find(|g| {
                g.show_id == favourite.show_id && g.season_number == favourite.season_number
            }) {
                Some(group) => group.episodes.push(favourite.clone()),
                None => groups.push(FavouriteGroup {
                    show_id: favourite.show_id.clone(),
                    show_title: favourite.show_title.clone(),
                    season_number: favourite.season_number,
                    season_title: favourite.season_title.clone(),
                    episodes: vec![favourite.clone()],
                }),
            }
        }
        Ok(groups)
    }

    // ============ Listening progress ============

    /// The signed-in user's progress rows, most recently played first.
    pub fn list_progress(&mut self) -> StoreResult<&[ListeningProgress]> {
        let Some(user) = &self.user else {
            return Ok(&[]);
        };

        if self.progress.fresh().is_none() {
            let rows = self.backend.list_progress(&user.id)?;
            debug!("Fetched {} progress rows", rows.len());
            self.progress.fill(rows);
        }
        Ok(self.progress.last_known())
    }

    pub fn cached_progress(&self) -> &[ListeningProgress] {
        self.progress.last_known()
    }

    pub fn upsert_progress(&mut self, update: ProgressUpdate) -> StoreResult<ListeningProgress> {
        let user = self.require_user()?;
        let row = self.backend.upsert_progress(&user.id, update)?;
        self.progress.invalidate();
        Ok(row)
    }

    /// Deletes every progress row of the signed-in user. Irreversible.
    pub fn reset_all_progress(&mut self) -> StoreResult<usize> {
        let user = self.require_user()?;
        let removed = self.backend.delete_all_progress(&user.id)?;
        info!("Reset {} progress rows for {}", removed, user.email);
        self.progress.invalidate();
        Ok(removed)
    }

    pub fn get_progress(
        &mut self,
        show_id: &ShowId,
        season_number: u32,
        episode_key: &EpisodeKey,
    ) -> StoreResult<Option<&ListeningProgress>> {
        Ok(self.list_progress()?.iter().find(|p| {
            &p.show_id == show_id
                && p.season_number == season_number
                && &p.episode_id == episode_key
        }))
    }

    pub fn last_played(&mut self) -> StoreResult<Option<&ListeningProgress>> {
        Ok(self.list_progress()?.first())
    }

    /// Unfinished episodes that got past the intro, most recent first.
    pub fn continue_listening(&mut self, limit: usize) -> StoreResult<Vec<ListeningProgress>> {
        Ok(self
            .list_progress()?
            .iter()
            .filter(|p| !p.completed && p.playback_position > CONTINUE_MIN_POSITION_SECS)
            .take(limit)
            .cloned()
            .collect())
    }
}

impl<B: Backend> ProgressSink for Store<B> {
    fn accepts_progress(&self) -> bool {
        self.is_authenticated()
    }

    fn save_progress(&mut self, update: ProgressUpdate) -> StoreResult<()> {
        self.upsert_progress(update).map(|_| ())
    }
}
