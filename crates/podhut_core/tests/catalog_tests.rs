mod fixtures;

use std::thread;
use std::time::Duration;

use fixtures::{SHOWS_JSON, SHOW_JSON};
use podhut_core::{Catalog, CatalogError, HttpCatalog, ShowDetails};

const TIMEOUT: Duration = Duration::from_secs(5);
const LONG_TTL: Duration = Duration::from_secs(300);

fn catalog(server: &mockito::ServerGuard, ttl: Duration) -> Catalog<HttpCatalog> {
    Catalog::new(HttpCatalog::new(&server.url(), TIMEOUT), ttl, ttl)
}

#[test]
fn show_details_decode_with_mixed_genres() {
    let show: ShowDetails = serde_json::from_str(SHOW_JSON).unwrap();

    assert_eq!(show.genres, vec![2]);
    assert_eq!(show.seasons.len(), 2);
    assert_eq!(show.episode_count(), 3);
    assert_eq!(show.season(1).unwrap().episode_index(2), Some(1));
    assert!(show.season(3).is_none());
}

#[test]
fn list_shows_is_cached_within_ttl() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/shows")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(SHOWS_JSON)
        .expect(1)
        .create();
    let catalog = catalog(&server, LONG_TTL);

    let first = catalog.list_shows().unwrap();
    let second = catalog.list_shows().unwrap();

    assert_eq!(first.len(), 2);
    assert_eq!(first[0].title, "Something Was Wrong");
    assert_eq!(second.len(), 2);
    mock.assert();
}

#[test]
fn list_shows_refetches_after_ttl() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/shows")
        .with_status(200)
        .with_body(SHOWS_JSON)
        .expect(2)
        .create();
    let catalog = catalog(&server, Duration::from_millis(100));

    catalog.list_shows().unwrap();
    thread::sleep(Duration::from_millis(300));
    catalog.list_shows().unwrap();

    mock.assert();
}

#[test]
fn clones_share_the_cache() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/id/10716")
        .with_status(200)
        .with_body(SHOW_JSON)
        .expect(1)
        .create();
    let catalog = catalog(&server, LONG_TTL);
    let worker = catalog.clone();

    let fetched = thread::spawn(move || worker.get_show("10716").unwrap().title.clone())
        .join()
        .unwrap();
    let cached = catalog.get_show("10716").unwrap();

    assert_eq!(fetched, "Something Was Wrong");
    assert_eq!(cached.title, fetched);
    mock.assert();
}

#[test]
fn invalidate_forces_refetch() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/shows")
        .with_status(200)
        .with_body(SHOWS_JSON)
        .expect(2)
        .create();
    let catalog = catalog(&server, LONG_TTL);

    catalog.list_shows().unwrap();
    catalog.invalidate();
    catalog.list_shows().unwrap();

    mock.assert();
}

#[test]
fn unknown_show_is_not_found_and_not_cached() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/id/nope")
        .with_status(404)
        .expect(2)
        .create();
    let catalog = catalog(&server, LONG_TTL);

    let first = catalog.get_show("nope");
    let second = catalog.get_show("nope");

    assert!(first.unwrap_err().is_not_found());
    assert!(second.unwrap_err().is_not_found());
    mock.assert();
}

#[test]
fn empty_id_fails_without_request() {
    let mut server = mockito::Server::new();
    let mock = server.mock("GET", mockito::Matcher::Any).expect(0).create();
    let catalog = catalog(&server, LONG_TTL);

    let result = catalog.get_show("  ");

    match result {
        Err(CatalogError::NotFound(message)) => assert_eq!(message, "No show ID provided"),
        other => panic!("expected NotFound, got {:?}", other.map(|s| s.id.clone())),
    }
    mock.assert();
}

#[test]
fn server_error_on_list_is_a_network_error() {
    let mut server = mockito::Server::new();
    server.mock("GET", "/shows").with_status(500).create();
    let catalog = catalog(&server, LONG_TTL);

    let result = catalog.list_shows();

    assert!(matches!(result, Err(CatalogError::Network(_))));
}

#[test]
fn malformed_body_is_a_decode_error() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/shows")
        .with_status(200)
        .with_body("{\"not\": \"a list\"}")
        .create();
    let catalog = catalog(&server, LONG_TTL);

    let result = catalog.list_shows();

    assert!(matches!(result, Err(CatalogError::Decode(_))));
}
