use podhut_core::SortOrder;

#[derive(Debug, Clone, PartialEq)]
pub enum GenreArg {
    Toggle(u32),
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageArg {
    Number(usize),
    Next,
    Previous,
}

/// An episode of the open show, addressed by season and episode number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeArg {
    pub season: u32,
    pub episode: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Shows,
    Search(String),
    Genre(GenreArg),
    Sort(SortOrder),
    Page(PageArg),
    Featured,
    Stats,
    Show(String),
    Play(EpisodeArg),
    Pause,
    Resume,
    Toggle,
    Seek(f64),
    Forward,
    Back,
    Next,
    Prev,
    Volume(f32),
    Status,
    /// Toggles the given episode, or the one playing when none is given.
    Fav(Option<EpisodeArg>),
    Favs,
    Progress,
    Continue,
    ResetProgress,
    Login(String),
    Logout,
    WhoAmI,
    Help,
    Quit,
}

pub const HELP: &str = "\
Browse
  shows                     list shows (current search, genres, sort, page)
  search [text]             fuzzy search titles and descriptions; no text clears
  genre <code>|all          toggle a genre filter, or clear them all
  sort a-z|z-a|date-asc|date-desc
  page <n>|next|prev
  featured                  the first eight shows
  stats                     catalog totals
  show <id>                 open a show with its seasons and episodes

Playback
  play <season> <episode>   play an episode of the open show
  pause | resume | toggle
  seek <m:ss|seconds>
  fwd | back                skip forward or back
  next | prev               next or previous episode in the season
  vol <0-100>
  status

Library (requires login)
  fav [<season> <episode>]  toggle a favourite (defaults to what is playing)
  favs                      favourites grouped by show and season
  progress                  everything you have listened to
  continue                  unfinished episodes
  reset-progress            delete all listening progress

Account
  login <email> | logout | whoami

  help | quit";

/// Parses one input line. `Ok(None)` for a blank line.
pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    let command = match name.to_lowercase().as_str() {
        "shows" | "ls" => Command::Shows,
        "search" | "/" => Command::Search(rest.to_string()),
        "genre" => Command::Genre(parse_genre(&args)?),
        "sort" => {
            let order = args.first().ok_or("usage: sort a-z|z-a|date-asc|date-desc")?;
            Command::Sort(order.parse()?)
        }
        "page" => Command::Page(parse_page(&args)?),
        "featured" => Command::Featured,
        "stats" => Command::Stats,
        "show" | "open" => {
            let id = args.first().ok_or("usage: show <id>")?;
            Command::Show(id.to_string())
        }
        "play" => Command::Play(
            parse_episode(&args)?.ok_or("usage: play <season> <episode>")?,
        ),
        "pause" => Command::Pause,
        "resume" => Command::Resume,
        "toggle" | "p" => Command::Toggle,
        "seek" => {
            let at = args.first().ok_or("usage: seek <m:ss|seconds>")?;
            Command::Seek(parse_time(at)?)
        }
        "fwd" | "forward" => Command::Forward,
        "back" | "rewind" => Command::Back,
        "next" | "n" => Command::Next,
        "prev" | "previous" => Command::Prev,
        "vol" | "volume" => Command::Volume(parse_volume(&args)?),
        "status" | "now" => Command::Status,
        "fav" => Command::Fav(parse_episode(&args)?),
        "favs" | "favourites" => Command::Favs,
        "progress" | "history" => Command::Progress,
        "continue" => Command::Continue,
        "reset-progress" => Command::ResetProgress,
        "login" => {
            let email = args.first().ok_or("usage: login <email>")?;
            if !email.contains('@') {
                return Err(format!("'{}' is not an email address", email));
            }
            Command::Login(email.to_string())
        }
        "logout" => Command::Logout,
        "whoami" => Command::WhoAmI,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("unknown command '{}' (try 'help')", other)),
    };

    Ok(Some(command))
}

fn parse_genre(args: &[&str]) -> Result<GenreArg, String> {
    match args.first() {
        None => Err("usage: genre <code>|all".to_string()),
        Some(arg) if arg.eq_ignore_ascii_case("all") => Ok(GenreArg::All),
        Some(arg) => arg
            .parse()
            .map(GenreArg::Toggle)
            .map_err(|_| format!("'{}' is not a genre code", arg)),
    }
}

fn parse_page(args: &[&str]) -> Result<PageArg, String> {
    match args.first().map(|a| a.to_lowercase()).as_deref() {
        None => Err("usage: page <n>|next|prev".to_string()),
        Some("next") => Ok(PageArg::Next),
        Some("prev") | Some("previous") => Ok(PageArg::Previous),
        Some(n) => match n.parse::<usize>() {
            Ok(n) if n > 0 => Ok(PageArg::Number(n)),
            _ => Err(format!("'{}' is not a page number", n)),
        },
    }
}

fn parse_episode(args: &[&str]) -> Result<Option<EpisodeArg>, String> {
    match args {
        [] => Ok(None),
        [season, episode] => {
            let season = season
                .parse()
                .map_err(|_| format!("'{}' is not a season number", season))?;
            let episode = episode
                .parse()
                .map_err(|_| format!("'{}' is not an episode number", episode))?;
            Ok(Some(EpisodeArg { season, episode }))
        }
        _ => Err("expected <season> <episode>".to_string()),
    }
}

fn parse_volume(args: &[&str]) -> Result<f32, String> {
    let arg = args.first().ok_or("usage: vol <0-100>")?;
    match arg.trim_end_matches('%').parse::<u8>() {
        Ok(percent) if percent <= 100 => Ok(f32::from(percent) / 100.0),
        _ => Err(format!("'{}' is not a volume between 0 and 100", arg)),
    }
}

/// Accepts plain seconds (`95`, `12.5`) or `m:ss`.
pub fn parse_time(arg: &str) -> Result<f64, String> {
    let invalid = || format!("'{}' is not a time", arg);

    let seconds = match arg.split_once(':') {
        Some((minutes, seconds)) => {
            let minutes: u32 = minutes.parse().map_err(|_| invalid())?;
            let seconds: f64 = seconds.parse().map_err(|_| invalid())?;
            if !(0.0..60.0).contains(&seconds) {
                return Err(invalid());
            }
            f64::from(minutes) * 60.0 + seconds
        }
        None => arg.parse().map_err(|_| invalid())?,
    };

    if seconds.is_finite() && seconds >= 0.0 {
        Ok(seconds)
    } else {
        Err(invalid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(line: &str) -> Command {
        parse(line).unwrap().unwrap()
    }

    #[test]
    fn blank_line_is_nothing() {
        assert_eq!(parse("   ").unwrap(), None);
    }

    #[test]
    fn search_keeps_the_whole_query() {
        assert_eq!(
            parsed("search  true crime "),
            Command::Search("true crime".to_string())
        );
        assert_eq!(parsed("search"), Command::Search(String::new()));
    }

    #[test]
    fn genre_arguments() {
        assert_eq!(parsed("genre 3"), Command::Genre(GenreArg::Toggle(3)));
        assert_eq!(parsed("genre ALL"), Command::Genre(GenreArg::All));
        assert!(parse("genre crime").is_err());
    }

    #[test]
    fn sort_uses_the_sort_order_names() {
        assert_eq!(parsed("sort z-a"), Command::Sort(SortOrder::TitleDesc));
        assert!(parse("sort sideways").is_err());
        assert!(parse("sort").is_err());
    }

    #[test]
    fn page_arguments() {
        assert_eq!(parsed("page 2"), Command::Page(PageArg::Number(2)));
        assert_eq!(parsed("page next"), Command::Page(PageArg::Next));
        assert_eq!(parsed("page prev"), Command::Page(PageArg::Previous));
        assert!(parse("page 0").is_err());
    }

    #[test]
    fn play_needs_season_and_episode() {
        assert_eq!(
            parsed("play 2 5"),
            Command::Play(EpisodeArg {
                season: 2,
                episode: 5
            })
        );
        assert!(parse("play").is_err());
        assert!(parse("play 2").is_err());
        assert!(parse("play two 5").is_err());
    }

    #[test]
    fn fav_defaults_to_current() {
        assert_eq!(parsed("fav"), Command::Fav(None));
        assert_eq!(
            parsed("fav 1 3"),
            Command::Fav(Some(EpisodeArg {
                season: 1,
                episode: 3
            }))
        );
    }

    #[test]
    fn seek_accepts_seconds_and_minutes() {
        assert_eq!(parsed("seek 95"), Command::Seek(95.0));
        assert_eq!(parsed("seek 1:35"), Command::Seek(95.0));
        assert!(parse("seek 1:75").is_err());
        assert!(parse("seek -5").is_err());
    }

    #[test]
    fn volume_is_a_percentage() {
        assert_eq!(parsed("vol 50"), Command::Volume(0.5));
        assert_eq!(parsed("vol 100%"), Command::Volume(1.0));
        assert!(parse("vol 150").is_err());
    }

    #[test]
    fn login_requires_an_email() {
        assert_eq!(
            parsed("login me@example.com"),
            Command::Login("me@example.com".to_string())
        );
        assert!(parse("login me").is_err());
    }

    #[test]
    fn commands_are_case_insensitive() {
        assert_eq!(parsed("QUIT"), Command::Quit);
        assert_eq!(parsed("Reset-Progress"), Command::ResetProgress);
    }

    #[test]
    fn unknown_command_is_an_error() {
        assert!(parse("dance").is_err());
    }
}
