use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Genre codes used by the catalog, in display order.
pub const GENRES: [(u32, &str); 9] = [
    (1, "Personal Growth"),
    (2, "True Crime"),
    (3, "History"),
    (4, "Comedy"),
    (5, "Entertainment"),
    (6, "Business"),
    (7, "Fiction"),
    (8, "News"),
    (9, "Kids & Family"),
];

pub fn genre_name(code: u32) -> Option<&'static str> {
    GENRES
        .iter()
        .find(|(id, _)| *id == code)
        .map(|(_, name)| *name)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShowId(pub String);

impl ShowId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ShowId {
    fn from(id: &str) -> Self {
        ShowId(id.to_string())
    }
}

/// `"{season}-{episode}"`. Only unique within a single show.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EpisodeKey(pub String);

impl EpisodeKey {
    pub fn new(season_number: u32, episode_number: u32) -> Self {
        EpisodeKey(format!("{}-{}", season_number, episode_number))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EpisodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowPreview {
    pub id: ShowId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Number of seasons; the preview does not carry the seasons themselves.
    #[serde(default)]
    pub seasons: u32,
    #[serde(default)]
    pub image: String,
    #[serde(default, deserialize_with = "genre_codes")]
    pub genres: Vec<u32>,
    pub updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowDetails {
    pub id: ShowId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub seasons: Vec<Season>,
    #[serde(default)]
    pub image: String,
    #[serde(default, deserialize_with = "genre_codes")]
    pub genres: Vec<u32>,
    pub updated: DateTime<Utc>,
}

impl ShowDetails {
    pub fn season(&self, number: u32) -> Option<&Season> {
        self.seasons.iter().find(|s| s.season == number)
    }

    pub fn episode_count(&self) -> usize {
        self.seasons.iter().map(|s| s.episodes.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Season {
    pub season: u32,
    pub title: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub episodes: Vec<Episode>,
}

impl Season {
    /// Position of the episode with the given number, in catalog order.
    pub fn episode_index(&self, episode_number: u32) -> Option<usize> {
        self.episodes
            .iter()
            .position(|e| e.episode == episode_number)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub episode: u32,
    pub file: String,
}

impl Episode {
    pub fn key(&self, season_number: u32) -> EpisodeKey {
        EpisodeKey::new(season_number, self.episode)
    }
}

/// The parts of a show the player and the store need, whichever form it came in.
#[derive(Debug, Clone, PartialEq)]
pub struct ShowInfo {
    pub id: ShowId,
    pub title: String,
    pub image: String,
}

impl From<&ShowPreview> for ShowInfo {
    fn from(show: &ShowPreview) -> Self {
        Self {
            id: show.id.clone(),
            title: show.title.clone(),
            image: show.image.clone(),
        }
    }
}

impl From<&ShowDetails> for ShowInfo {
    fn from(show: &ShowDetails) -> Self {
        Self {
            id: show.id.clone(),
            title: show.title.clone(),
            image: show.image.clone(),
        }
    }
}

// The live API sometimes mixes labels such as "Featured" into `genres`.
fn genre_codes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u32>, D::Error> {
    let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .iter()
        .filter_map(|value| match value {
            serde_json::Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .collect())
}
