#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use podhut_core::{
    Episode, NewFavourite, ProgressUpdate, Season, ShowDetails, ShowId, ShowPreview,
};

pub fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 7, 0, 0).unwrap()
}

pub fn episode(number: u32) -> Episode {
    Episode {
        title: format!("Episode {}", number),
        description: format!("Description of episode {}", number),
        episode: number,
        file: format!("https://cdn.example.com/audio/{}.mp3", number),
    }
}

pub fn season(number: u32, episodes: u32) -> Season {
    Season {
        season: number,
        title: format!("Season {}", number),
        image: format!("https://cdn.example.com/s{}.jpg", number),
        episodes: (1..=episodes).map(episode).collect(),
    }
}

pub fn show(id: &str, seasons: &[u32]) -> ShowDetails {
    ShowDetails {
        id: ShowId::from(id),
        title: format!("Show {}", id),
        description: "A show about things".to_string(),
        seasons: seasons
            .iter()
            .enumerate()
            .map(|(i, &count)| season(i as u32 + 1, count))
            .collect(),
        image: String::new(),
        genres: vec![1],
        updated: date(2022, 11, 3),
    }
}

pub fn preview(
    id: &str,
    title: &str,
    description: &str,
    genres: &[u32],
    updated: DateTime<Utc>,
) -> ShowPreview {
    ShowPreview {
        id: ShowId::from(id),
        title: title.to_string(),
        description: description.to_string(),
        seasons: 1,
        image: String::new(),
        genres: genres.to_vec(),
        updated,
    }
}

/// Three shows with distinct genres and update dates.
pub fn three_previews() -> Vec<ShowPreview> {
    vec![
        preview(
            "10716",
            "Something Was Wrong",
            "An Iris Award winning true crime docuseries",
            &[1, 2],
            date(2022, 11, 3),
        ),
        preview(
            "5675",
            "This Is Actually Happening",
            "What if your life changed in an instant?",
            &[3],
            date(2021, 6, 10),
        ),
        preview(
            "9177",
            "American History Tellers",
            "Our history shapes who we are",
            &[3, 5],
            date(2023, 1, 20),
        ),
    ]
}

pub fn new_favourite(show_id: &str, season_number: u32, episode_number: u32) -> NewFavourite {
    let episode = episode(episode_number);
    NewFavourite {
        show_id: ShowId::from(show_id),
        show_title: format!("Show {}", show_id),
        season_number,
        season_title: Some(format!("Season {}", season_number)),
        episode_id: episode.key(season_number),
        episode_title: episode.title,
        episode_file: Some(episode.file),
    }
}

pub fn progress(
    show_id: &str,
    season_number: u32,
    episode_number: u32,
    position: f64,
    duration: f64,
) -> ProgressUpdate {
    let episode = episode(episode_number);
    ProgressUpdate {
        show_id: ShowId::from(show_id),
        season_number,
        episode_key: episode.key(season_number),
        episode_title: episode.title,
        episode_file: Some(episode.file),
        position,
        duration,
        completed: podhut_core::is_completed(position, duration),
    }
}

pub const SHOWS_JSON: &str = r#"[
  {"id":"10716","title":"Something Was Wrong","description":"True crime","seasons":14,"image":"https://content.production.cdn.art19.com/images/a.jpeg","genres":[1,2],"updated":"2022-11-03T07:00:00.000Z"},
  {"id":"5675","title":"This Is Actually Happening","description":"Life changes","seasons":12,"image":"https://content.production.cdn.art19.com/images/b.jpeg","genres":[1,2],"updated":"2022-11-01T00:00:00.000Z"}
]"#;

pub const SHOW_JSON: &str = r#"{
  "id":"10716",
  "title":"Something Was Wrong",
  "description":"True crime",
  "seasons":[
    {"season":1,"title":"Season 1","image":"https://example.com/s1.jpg","episodes":[
      {"title":"Ep 1","description":"First","episode":1,"file":"https://example.com/1.mp3"},
      {"title":"Ep 2","description":"Second","episode":2,"file":"https://example.com/2.mp3"}
    ]},
    {"season":2,"title":"Season 2","image":"https://example.com/s2.jpg","episodes":[
      {"title":"Ep 1","description":"First","episode":1,"file":"https://example.com/2-1.mp3"}
    ]}
  ],
  "image":"https://example.com/show.jpg",
  "genres":["All","Featured",2],
  "updated":"2022-11-03T07:00:00.000Z"
}"#;
