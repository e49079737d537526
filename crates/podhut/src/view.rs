use std::fmt::Write;

use podhut_core::{
    genre_name, BrowsePage, BrowseState, CurrentlyPlaying, EpisodeKey, Favourite, FavouriteGroup,
    ListeningProgress, PageLink, PlaybackState, ShowDetails, ShowId, ShowPreview, GENRES,
};

const BAR_WIDTH: usize = 30;

/// `m:ss`, with `0:00` for anything that is not a positive time.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0:00".to_string();
    }
    let total_seconds = seconds as u64;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{}:{:02}", minutes, seconds)
}

pub fn progress_bar(position: f64, duration: f64, width: usize) -> String {
    let progress = if duration > 0.0 {
        (position / duration).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled = (progress * width as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

fn genre_labels(codes: &[u32]) -> String {
    codes
        .iter()
        .filter_map(|&code| genre_name(code))
        .collect::<Vec<_>>()
        .join(", ")
}

fn show_line(show: &ShowPreview) -> String {
    format!(
        "{:>6}  {}  ({} season{}, updated {}){}",
        show.id,
        show.title,
        show.seasons,
        if show.seasons == 1 { "" } else { "s" },
        show.updated.format("%Y-%m-%d"),
        match genre_labels(&show.genres) {
            labels if labels.is_empty() => String::new(),
            labels => format!("  [{}]", labels),
        }
    )
}

pub fn browse(page: &BrowsePage<'_>, state: &BrowseState) -> String {
    let mut out = String::new();

    let mut filters = Vec::new();
    if !state.search().trim().is_empty() {
        filters.push(format!("search \"{}\"", state.search().trim()));
    }
    if !state.genres().is_all() {
        filters.push(format!("genres: {}", genre_labels(state.genres().selected())));
    }
    filters.push(format!("sort: {}", state.sort().label()));
    let _ = writeln!(out, "{}", filters.join(" | "));

    if page.is_empty() {
        let _ = writeln!(out, "No podcasts found.");
        if state.is_filtered() {
            let _ = writeln!(out, "Try 'search' with no text or 'genre all'.");
        }
        return out;
    }

    for show in &page.items {
        let _ = writeln!(out, "{}", show_line(show));
    }

    let window: Vec<String> = page
        .window()
        .into_iter()
        .map(|link| match link {
            PageLink::Page(n) if n == page.current_page => format!("[{}]", n),
            PageLink::Page(n) => n.to_string(),
            PageLink::Ellipsis => "...".to_string(),
        })
        .collect();
    let _ = write!(
        out,
        "{} show{}",
        page.total_matches,
        if page.total_matches == 1 { "" } else { "s" }
    );
    if !window.is_empty() {
        let _ = write!(out, ", page {}", window.join(" "));
    }
    out.push('\n');
    out
}

pub fn featured(shows: &[ShowPreview]) -> String {
    let mut out = String::from("Featured\n");
    for show in shows {
        let _ = writeln!(out, "{}", show_line(show));
    }
    out
}

pub fn stats(shows: &[ShowPreview]) -> String {
    let seasons: u32 = shows.iter().map(|s| s.seasons).sum();
    let mut out = format!(
        "{} podcasts, {} seasons, {} genres\n",
        shows.len(),
        seasons,
        GENRES.len()
    );
    for (code, name) in GENRES {
        let count = shows.iter().filter(|s| s.genres.contains(&code)).count();
        let _ = writeln!(out, "  {} {:<16} {}", code, name, count);
    }
    out
}

fn is_current(
    current: Option<&CurrentlyPlaying>,
    show: &ShowDetails,
    season: u32,
    episode: u32,
) -> bool {
    current.is_some_and(|c| {
        c.show.id == show.id && c.season.season == season && c.episode.episode == episode
    })
}

pub fn show(
    show: &ShowDetails,
    current: Option<&CurrentlyPlaying>,
    favourites: &[Favourite],
    progress: &[ListeningProgress],
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", show.title, show.id);
    if !show.genres.is_empty() {
        let _ = writeln!(out, "{}", genre_labels(&show.genres));
    }
    let _ = writeln!(
        out,
        "{} season{}, {} episodes, updated {}",
        show.seasons.len(),
        if show.seasons.len() == 1 { "" } else { "s" },
        show.episode_count(),
        show.updated.format("%Y-%m-%d")
    );
    if !show.description.is_empty() {
        let _ = writeln!(out, "{}", show.description);
    }

    for season in &show.seasons {
        let _ = writeln!(out, "\n{} (season {})", season.title, season.season);
        for episode in &season.episodes {
            let key = episode.key(season.season);
            let same_episode = |show_id: &ShowId, number: u32, id: &EpisodeKey| {
                show_id == &show.id && number == season.season && id == &key
            };

            let marker = if is_current(current, show, season.season, episode.episode) {
                '>'
            } else {
                ' '
            };
            let heart = if favourites
                .iter()
                .any(|f| same_episode(&f.show_id, f.season_number, &f.episode_id))
            {
                " *"
            } else {
                ""
            };
            let listened = progress
                .iter()
                .find(|p| same_episode(&p.show_id, p.season_number, &p.episode_id))
                .map(|p| {
                    if p.completed {
                        "  (played)".to_string()
                    } else {
                        format!("  ({:.0}%)", p.percent())
                    }
                })
                .unwrap_or_default();

            let _ = writeln!(
                out,
                "{} {:>3}. {}{}{}",
                marker, episode.episode, episode.title, heart, listened
            );
        }
    }
    out
}

pub fn status(
    current: Option<&CurrentlyPlaying>,
    state: PlaybackState,
    position: f64,
    duration: f64,
    volume: f32,
) -> String {
    let Some(current) = current else {
        return "Nothing playing.".to_string();
    };

    let state = match state {
        PlaybackState::Playing => "Playing",
        PlaybackState::Paused => "Paused",
        PlaybackState::Stopped => "Stopped",
    };
    format!(
        "{}: {}\n{} - {}\n{} {} / {}  vol {:.0}%",
        state,
        current.episode.title,
        current.show.title,
        current.season.title,
        progress_bar(position, duration, BAR_WIDTH),
        format_time(position),
        format_time(duration),
        volume * 100.0
    )
}

pub fn favourite_groups(groups: &[FavouriteGroup]) -> String {
    if groups.is_empty() {
        return "No favourites yet. Use 'fav' on an episode.".to_string();
    }

    let mut out = String::new();
    for group in groups {
        let season = group
            .season_title
            .clone()
            .unwrap_or_else(|| format!("Season {}", group.season_number));
        let _ = writeln!(out, "{} ({}) - {}", group.show_title, group.show_id, season);
        for favourite in &group.episodes {
            let _ = writeln!(
                out,
                "  {}  {}  added {}",
                favourite.episode_id,
                favourite.episode_title,
                favourite.favourited_at.format("%Y-%m-%d %H:%M")
            );
        }
    }
    out
}

pub fn progress_rows(rows: &[ListeningProgress]) -> String {
    if rows.is_empty() {
        return "No listening history.".to_string();
    }

    let mut out = String::new();
    for row in rows {
        let detail = if row.completed {
            "played".to_string()
        } else {
            format!(
                "{} / {}",
                format_time(row.playback_position),
                format_time(row.duration)
            )
        };
        let _ = writeln!(
            out,
            "{:>6}  {:<5} {}  {}  {}",
            row.show_id,
            row.episode_id,
            row.episode_title,
            detail,
            row.last_played_at.format("%Y-%m-%d %H:%M")
        );
    }
    out
}

pub fn continue_listening(rows: &[ListeningProgress]) -> String {
    if rows.is_empty() {
        return "Nothing to continue.".to_string();
    }

    let mut out = String::from("Continue listening\n");
    for row in rows {
        let _ = writeln!(
            out,
            "{:>6}  {:<5} {}  {} {} left",
            row.show_id,
            row.episode_id,
            row.episode_title,
            progress_bar(row.playback_position, row.duration, 10),
            format_time(row.remaining())
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(f64::NAN), "0:00");
        assert_eq!(format_time(59.9), "0:59");
        assert_eq!(format_time(95.0), "1:35");
        assert_eq!(format_time(3725.0), "62:05");
    }

    #[test]
    fn progress_bar_fills_proportionally() {
        assert_eq!(progress_bar(5.0, 10.0, 4), "[##--]");
        assert_eq!(progress_bar(20.0, 10.0, 4), "[####]");
        assert_eq!(progress_bar(5.0, 0.0, 4), "[----]");
    }
}
