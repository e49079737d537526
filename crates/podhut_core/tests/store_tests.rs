mod fixtures;

use fixtures::{new_favourite, progress};
use podhut_core::{
    Backend, EpisodeKey, FileBackend, MemoryBackend, ShowId, Store, StoreError, ToggleOutcome,
    User, CONTINUE_LISTENING_LIMIT,
};

fn signed_in_store() -> Store<MemoryBackend> {
    let mut store = Store::new(MemoryBackend::new());
    store.sign_in(User::from_email("Listener@Example.com "));
    store
}

#[test]
fn user_from_email_normalises() {
    let user = User::from_email("  Listener@Example.COM ");
    assert_eq!(user.email, "listener@example.com");
    assert_eq!(user.id.to_string(), "listener@example.com");
}

#[test]
fn signed_out_reads_are_empty() {
    let mut store = Store::new(MemoryBackend::new());

    assert!(store.list_favourites().unwrap().is_empty());
    assert!(store.list_progress().unwrap().is_empty());
    assert!(store.continue_listening(CONTINUE_LISTENING_LIMIT).unwrap().is_empty());
    assert!(store.last_played().unwrap().is_none());
}

#[test]
fn signed_out_writes_require_authentication() {
    let mut store = Store::new(MemoryBackend::new());

    let result = store.add_favourite(new_favourite("10716", 1, 1));
    assert!(matches!(result, Err(StoreError::AuthenticationRequired)));

    let result = store.toggle_favourite(new_favourite("10716", 1, 1));
    assert!(matches!(result, Err(StoreError::AuthenticationRequired)));

    let result = store.upsert_progress(progress("10716", 1, 1, 30.0, 100.0));
    assert!(matches!(result, Err(StoreError::AuthenticationRequired)));

    let result = store.reset_all_progress();
    assert!(matches!(result, Err(StoreError::AuthenticationRequired)));

    assert!(store.backend().tables().favourites.is_empty());
}

#[test]
fn toggle_twice_restores_presence() {
    let mut store = signed_in_store();
    let show = ShowId::from("10716");
    let key = EpisodeKey::new(1, 2);

    let first = store.toggle_favourite(new_favourite("10716", 1, 2)).unwrap();
    assert_eq!(first, ToggleOutcome::Added);
    store.list_favourites().unwrap();
    assert!(store.is_favourite(&show, 1, &key));

    let second = store.toggle_favourite(new_favourite("10716", 1, 2)).unwrap();
    assert_eq!(second, ToggleOutcome::Removed);
    assert!(store.list_favourites().unwrap().is_empty());
    assert!(!store.is_favourite(&show, 1, &key));
}

#[test]
fn adding_same_favourite_twice_keeps_one_row() {
    let mut store = signed_in_store();

    let first = store.add_favourite(new_favourite("10716", 1, 1)).unwrap();
    let second = store.add_favourite(new_favourite("10716", 1, 1)).unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(store.list_favourites().unwrap().len(), 1);
}

#[test]
fn removing_missing_favourite_succeeds() {
    let mut store = signed_in_store();

    store
        .remove_favourite(&ShowId::from("10716"), 1, &EpisodeKey::new(1, 9))
        .unwrap();

    assert!(store.list_favourites().unwrap().is_empty());
}

#[test]
fn same_episode_key_in_different_shows_is_distinct() {
    let mut store = signed_in_store();

    store.add_favourite(new_favourite("10716", 1, 1)).unwrap();
    store.add_favourite(new_favourite("5675", 1, 1)).unwrap();

    assert_eq!(store.list_favourites().unwrap().len(), 2);
}

#[test]
fn favourites_are_scoped_to_the_user() {
    let mut store = signed_in_store();
    store.add_favourite(new_favourite("10716", 1, 1)).unwrap();

    store.sign_in(User::from_email("someone-else@example.com"));
    assert!(store.list_favourites().unwrap().is_empty());

    store.sign_out();
    assert!(store.cached_favourites().is_empty());
}

#[test]
fn cache_refreshes_after_mutation() {
    let mut store = signed_in_store();
    assert!(store.list_favourites().unwrap().is_empty());

    store.add_favourite(new_favourite("10716", 1, 1)).unwrap();

    // stale until the next read
    assert!(store.cached_favourites().is_empty());
    assert_eq!(store.list_favourites().unwrap().len(), 1);
    assert_eq!(store.cached_favourites().len(), 1);
}

#[test]
fn favourite_groups_by_show_and_season() {
    let mut store = signed_in_store();
    store.add_favourite(new_favourite("10716", 1, 1)).unwrap();
    store.add_favourite(new_favourite("10716", 1, 2)).unwrap();
    store.add_favourite(new_favourite("10716", 2, 1)).unwrap();
    store.add_favourite(new_favourite("5675", 1, 1)).unwrap();

    let groups = store.favourite_groups().unwrap();

    assert_eq!(groups.len(), 3);
    let season_one = groups
        .iter()
        .find(|g| g.show_id.as_str() == "10716" && g.season_number == 1)
        .unwrap();
    assert_eq!(season_one.episodes.len(), 2);
    assert_eq!(season_one.season_title.as_deref(), Some("Season 1"));
}

#[test]
fn upsert_twice_keeps_one_row() {
    let mut store = signed_in_store();

    let first = store
        .upsert_progress(progress("10716", 1, 1, 30.0, 100.0))
        .unwrap();
    let second = store
        .upsert_progress(progress("10716", 1, 1, 60.0, 100.0))
        .unwrap();

    assert_eq!(first.id, second.id);
    let rows = store.list_progress().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].playback_position, 60.0);
}

#[test]
fn completion_threshold_is_ten_seconds() {
    let mut store = signed_in_store();

    let done = store
        .upsert_progress(progress("10716", 1, 1, 90.0, 100.0))
        .unwrap();
    let not_done = store
        .upsert_progress(progress("10716", 1, 2, 89.0, 100.0))
        .unwrap();

    assert!(done.completed);
    assert!(!not_done.completed);
}

#[test]
fn progress_percent_and_remaining() {
    let mut store = signed_in_store();

    let row = store
        .upsert_progress(progress("10716", 1, 1, 25.0, 100.0))
        .unwrap();

    assert_eq!(row.percent(), 25.0);
    assert_eq!(row.remaining(), 75.0);
}

#[test]
fn most_recent_progress_comes_first() {
    let mut store = signed_in_store();
    store
        .upsert_progress(progress("10716", 1, 1, 30.0, 100.0))
        .unwrap();
    store
        .upsert_progress(progress("10716", 1, 2, 30.0, 100.0))
        .unwrap();
    store
        .upsert_progress(progress("10716", 1, 1, 45.0, 100.0))
        .unwrap();

    let last = store.last_played().unwrap().unwrap();
    assert_eq!(last.episode_id.as_str(), "1-1");
    assert_eq!(last.playback_position, 45.0);

    let found = store
        .get_progress(&ShowId::from("10716"), 1, &EpisodeKey::new(1, 2))
        .unwrap()
        .unwrap();
    assert_eq!(found.playback_position, 30.0);
}

#[test]
fn continue_listening_skips_finished_and_barely_started() {
    let mut store = signed_in_store();
    store
        .upsert_progress(progress("10716", 1, 1, 95.0, 100.0))
        .unwrap();
    store
        .upsert_progress(progress("10716", 1, 2, 5.0, 100.0))
        .unwrap();
    store
        .upsert_progress(progress("10716", 1, 3, 40.0, 100.0))
        .unwrap();

    let rows = store.continue_listening(CONTINUE_LISTENING_LIMIT).unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].episode_id.as_str(), "1-3");
}

#[test]
fn continue_listening_is_limited() {
    let mut store = signed_in_store();
    for episode in 1..=6 {
        store
            .upsert_progress(progress("10716", 1, episode, 40.0, 100.0))
            .unwrap();
    }

    let rows = store.continue_listening(CONTINUE_LISTENING_LIMIT).unwrap();

    assert_eq!(rows.len(), 4);
}

#[test]
fn reset_removes_only_own_progress() {
    let mut store = signed_in_store();
    store
        .upsert_progress(progress("10716", 1, 1, 30.0, 100.0))
        .unwrap();
    store
        .upsert_progress(progress("10716", 1, 2, 30.0, 100.0))
        .unwrap();

    store.sign_in(User::from_email("other@example.com"));
    store
        .upsert_progress(progress("10716", 1, 1, 50.0, 100.0))
        .unwrap();

    store.sign_in(User::from_email("listener@example.com"));
    let removed = store.reset_all_progress().unwrap();

    assert_eq!(removed, 2);
    assert!(store.list_progress().unwrap().is_empty());
    assert_eq!(store.backend().tables().listening_progress.len(), 1);
}

#[test]
fn file_backend_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let user = User::from_email("listener@example.com");

    {
        let mut store = Store::new(FileBackend::open(dir.path()).unwrap());
        store.sign_in(user.clone());
        store.add_favourite(new_favourite("10716", 1, 1)).unwrap();
        store
            .upsert_progress(progress("10716", 1, 1, 30.0, 100.0))
            .unwrap();
        store
            .upsert_progress(progress("10716", 1, 1, 70.0, 100.0))
            .unwrap();
    }

    let backend = FileBackend::open(dir.path()).unwrap();
    let favourites = backend.list_favourites(&user.id).unwrap();
    let rows = backend.list_progress(&user.id).unwrap();

    assert_eq!(favourites.len(), 1);
    assert_eq!(favourites[0].episode_id.as_str(), "1-1");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].playback_position, 70.0);
}

#[test]
fn file_backend_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("nested").join("data");

    let mut backend = FileBackend::open(&root).unwrap();
    let user = User::from_email("listener@example.com");

    assert!(backend.list_favourites(&user.id).unwrap().is_empty());
    assert_eq!(backend.delete_all_progress(&user.id).unwrap(), 0);
    assert!(root.exists());
}

#[test]
fn file_backend_rejects_corrupt_table() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(podhut_core::FAVOURITES_FILE), "not json").unwrap();

    let result = FileBackend::open(dir.path());

    assert!(matches!(result, Err(podhut_core::BackendError::Json(_))));
}

// Turns a table file into a non-empty directory so the next rewrite fails.
fn block_table(root: &std::path::Path, table: &str) {
    let path = root.join(table);
    std::fs::remove_file(&path).unwrap();
    std::fs::create_dir(&path).unwrap();
    std::fs::write(path.join("keep"), "").unwrap();
}

fn unblock_table(root: &std::path::Path, table: &str) {
    std::fs::remove_dir_all(root.join(table)).unwrap();
}

#[test]
fn failed_write_leaves_tables_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let user = User::from_email("listener@example.com");
    let mut store = Store::new(FileBackend::open(dir.path()).unwrap());
    store.sign_in(user.clone());
    store.add_favourite(new_favourite("10716", 1, 1)).unwrap();
    store
        .upsert_progress(progress("10716", 1, 1, 30.0, 100.0))
        .unwrap();

    block_table(dir.path(), podhut_core::FAVOURITES_FILE);
    block_table(dir.path(), podhut_core::PROGRESS_FILE);

    assert!(store.add_favourite(new_favourite("10716", 1, 2)).is_err());
    assert!(store
        .remove_favourite(&ShowId::from("10716"), 1, &EpisodeKey::new(1, 1))
        .is_err());
    assert!(store
        .upsert_progress(progress("10716", 1, 1, 70.0, 100.0))
        .is_err());
    assert!(store.reset_all_progress().is_err());

    let favourites = store.backend().list_favourites(&user.id).unwrap();
    assert_eq!(favourites.len(), 1);
    assert_eq!(favourites[0].episode_id.as_str(), "1-1");
    let rows = store.backend().list_progress(&user.id).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].playback_position, 30.0);

    unblock_table(dir.path(), podhut_core::FAVOURITES_FILE);
    unblock_table(dir.path(), podhut_core::PROGRESS_FILE);
    store.add_favourite(new_favourite("5675", 1, 1)).unwrap();
    store
        .upsert_progress(progress("5675", 1, 1, 12.0, 100.0))
        .unwrap();
    drop(store);

    let backend = FileBackend::open(dir.path()).unwrap();
    let favourites = backend.list_favourites(&user.id).unwrap();
    let rows = backend.list_progress(&user.id).unwrap();
    assert_eq!(favourites.len(), 2);
    assert!(favourites.iter().all(|f| f.episode_id.as_str() == "1-1"));
    assert_eq!(rows.len(), 2);
    assert!(rows
        .iter()
        .any(|p| p.show_id.as_str() == "10716" && p.playback_position == 30.0));
}
