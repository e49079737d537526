mod commands;
mod view;

use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use podhut_core::{
    default_config_path, featured, genre_name, ApproximateMatcher, BrowseState, Catalog,
    CatalogResult, Config, Episode, FileBackend, HttpCatalog, NewFavourite, Player, PlayerCommand,
    Season, ShowDetails, ShowId, ShowPreview, Store, ToggleOutcome, User,
    CONTINUE_LISTENING_LIMIT, EXIT_WARNING,
};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use commands::{Command, EpisodeArg, GenreArg, PageArg, HELP};

#[cfg(not(feature = "native-audio"))]
type Output = podhut_core::ClockOutput;
#[cfg(feature = "native-audio")]
type Output = podhut_core::RodioOutput;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

enum AppEvent {
    Line(String),
    InputClosed,
    ShowsLoaded(CatalogResult<Arc<Vec<ShowPreview>>>),
    ShowLoaded {
        id: String,
        result: CatalogResult<Arc<ShowDetails>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Listing {
    Browse,
    Featured,
    Stats,
}

enum Confirm {
    Quit,
    ResetProgress,
}

enum Flow {
    Continue,
    Exit,
}

struct App {
    catalog: Catalog<HttpCatalog>,
    store: Store<FileBackend>,
    player: Player<Output>,
    browse: BrowseState,
    matcher: ApproximateMatcher,
    shows: Option<Arc<Vec<ShowPreview>>>,
    fetching_shows: bool,
    listing_wanted: Option<Listing>,
    open_show: Option<Arc<ShowDetails>>,
    wanted_show: Option<String>,
    pending: Option<Confirm>,
    events: Sender<AppEvent>,
    #[cfg(feature = "native-audio")]
    media_controls: Option<podhut_core::MediaControlsHandler>,
}

fn new_favourite(
    show_id: &ShowId,
    show_title: &str,
    season: &Season,
    episode: &Episode,
) -> NewFavourite {
    NewFavourite {
        show_id: show_id.clone(),
        show_title: show_title.to_string(),
        season_number: season.season,
        season_title: Some(season.title.clone()),
        episode_id: episode.key(season.season),
        episode_title: episode.title.clone(),
        episode_file: Some(episode.file.clone()),
    }
}

fn find_episode(
    show: &ShowDetails,
    arg: EpisodeArg,
) -> Result<(&Season, usize, &Episode), String> {
    let season = show
        .season(arg.season)
        .ok_or_else(|| format!("{} has no season {}.", show.title, arg.season))?;
    season
        .episode_index(arg.episode)
        .and_then(|index| season.episodes.get(index).map(|episode| (season, index, episode)))
        .ok_or_else(|| format!("Season {} has no episode {}.", arg.season, arg.episode))
}

impl App {
    fn new(
        config: &Config,
        store: Store<FileBackend>,
        output: Output,
        events: Sender<AppEvent>,
    ) -> Self {
        let player = Player::new(output)
            .with_skip_step(config.skip_seconds)
            .with_save_interval(config.progress_interval());

        #[cfg(feature = "native-audio")]
        let media_controls = match podhut_core::MediaControlsHandler::new() {
            Ok(controls) => Some(controls),
            Err(e) => {
                warn!("Media controls unavailable: {}", e);
                None
            }
        };

        Self {
            catalog: Catalog::from_config(config),
            store,
            player,
            browse: BrowseState::with_page_size(config.page_size),
            matcher: ApproximateMatcher::with_threshold(config.search_threshold),
            shows: None,
            fetching_shows: false,
            listing_wanted: None,
            open_show: None,
            wanted_show: None,
            pending: None,
            events,
            #[cfg(feature = "native-audio")]
            media_controls,
        }
    }

    fn run(mut self, events: Receiver<AppEvent>) {
        self.fetch_shows();
        prompt();

        loop {
            let flow = match events.recv_timeout(POLL_INTERVAL) {
                Ok(AppEvent::Line(line)) => {
                    let flow = self.handle_line(&line);
                    if let Flow::Continue = flow {
                        prompt();
                    }
                    flow
                }
                Ok(AppEvent::InputClosed) => {
                    info!("Input closed");
                    Flow::Exit
                }
                Ok(AppEvent::ShowsLoaded(result)) => {
                    self.on_shows_loaded(result);
                    Flow::Continue
                }
                Ok(AppEvent::ShowLoaded { id, result }) => {
                    self.on_show_loaded(id, result);
                    Flow::Continue
                }
                Err(RecvTimeoutError::Timeout) => Flow::Continue,
                Err(RecvTimeoutError::Disconnected) => Flow::Exit,
            };

            self.tick();
            if let Flow::Exit = flow {
                break;
            }
        }
    }

    fn tick(&mut self) {
        #[cfg(feature = "native-audio")]
        if let Some(controls) = &mut self.media_controls {
            for command in controls.poll_commands() {
                self.player.apply(command);
            }
            if let Err(e) = controls.update(
                self.player.currently_playing(),
                self.player.is_playing(),
                self.player.position(),
                self.player.duration(),
            ) {
                debug!("{}", e);
            }
        }

        let before = self.player.currently_playing().map(|c| c.episode_ref());
        match self.player.tick(Instant::now(), &mut self.store) {
            Ok(Some(update)) => debug!("Progress saved at {:.0}s", update.position),
            Ok(None) => {}
            Err(e) => warn!("Failed to save progress: {}", e),
        }

        if let Some(current) = self.player.currently_playing() {
            if before.as_ref() != Some(&current.episode_ref()) {
                println!("\nNow playing: {}", current.episode.title);
                prompt();
            }
        }
    }

    // ============ Catalog ============

    fn fetch_shows(&mut self) {
        if self.fetching_shows {
            return;
        }
        self.fetching_shows = true;

        let catalog = self.catalog.clone();
        let events = self.events.clone();
        thread::spawn(move || {
            let _ = events.send(AppEvent::ShowsLoaded(catalog.list_shows()));
        });
    }

    fn fetch_show(&mut self, id: String) {
        println!("Loading show {}...", id);
        self.wanted_show = Some(id.clone());

        let catalog = self.catalog.clone();
        let events = self.events.clone();
        thread::spawn(move || {
            let result = catalog.get_show(&id);
            let _ = events.send(AppEvent::ShowLoaded { id, result });
        });
    }

    fn on_shows_loaded(&mut self, result: CatalogResult<Arc<Vec<ShowPreview>>>) {
        self.fetching_shows = false;
        let wanted = self.listing_wanted.take();

        match result {
            Ok(shows) => {
                info!("{} shows available", shows.len());
                self.shows = Some(shows);
                if let Some(listing) = wanted {
                    self.print_listing(listing);
                    prompt();
                }
            }
            Err(e) => {
                println!("\n{}", e);
                prompt();
            }
        }
    }

    fn on_show_loaded(&mut self, id: String, result: CatalogResult<Arc<ShowDetails>>) {
        if self.wanted_show.as_deref() != Some(id.as_str()) {
            debug!("Dropping reply for show {}, no longer wanted", id);
            return;
        }
        self.wanted_show = None;

        match result {
            Ok(show) => {
                self.open_show = Some(show);
                self.print_open_show();
            }
            Err(e) => println!("{}", e),
        }
        prompt();
    }

    /// Prints the listing now if the shows are loaded, otherwise once they are.
    fn listing(&mut self, listing: Listing) {
        if self.shows.is_some() {
            self.print_listing(listing);
        } else {
            println!("Loading shows...");
            self.listing_wanted = Some(listing);
            self.fetch_shows();
        }
    }

    fn print_listing(&self, listing: Listing) {
        let Some(shows) = &self.shows else {
            return;
        };
        match listing {
            Listing::Browse => {
                let page = self.browse.apply(shows, &self.matcher);
                print!("{}", view::browse(&page, &self.browse));
            }
            Listing::Featured => print!("{}", view::featured(featured(shows))),
            Listing::Stats => print!("{}", view::stats(shows)),
        }
    }

    fn print_open_show(&mut self) {
        let Some(show) = self.open_show.clone() else {
            println!("No show open. Use 'show <id>'.");
            return;
        };
        if let Err(e) = self.store.list_favourites() {
            warn!("Failed to load favourites: {}", e);
        }
        if let Err(e) = self.store.list_progress() {
            warn!("Failed to load progress: {}", e);
        }
        print!(
            "{}",
            view::show(
                &show,
                self.player.currently_playing(),
                self.store.cached_favourites(),
                self.store.cached_progress(),
            )
        );
    }

    // ============ Commands ============

    fn handle_line(&mut self, line: &str) -> Flow {
        if let Some(confirm) = self.pending.take() {
            if !line.trim().eq_ignore_ascii_case("y") {
                println!("Cancelled.");
                return Flow::Continue;
            }
            return match confirm {
                Confirm::Quit => Flow::Exit,
                Confirm::ResetProgress => {
                    match self.store.reset_all_progress() {
                        Ok(removed) => println!("Deleted {} progress entries.", removed),
                        Err(e) => println!("{}", e),
                    }
                    Flow::Continue
                }
            };
        }

        match commands::parse(line) {
            Ok(Some(command)) => self.execute(command),
            Ok(None) => Flow::Continue,
            Err(message) => {
                println!("{}", message);
                Flow::Continue
            }
        }
    }

    fn execute(&mut self, command: Command) -> Flow {
        debug!("Command: {:?}", command);
        match command {
            Command::Shows => {
                self.listing_wanted = Some(Listing::Browse);
                self.fetch_shows();
            }
            Command::Search(query) => {
                self.browse.set_search(&query);
                self.listing(Listing::Browse);
            }
            Command::Genre(GenreArg::Toggle(code)) => {
                if genre_name(code).is_none() {
                    println!("Unknown genre {}. See 'stats' for the list.", code);
                } else {
                    self.browse.toggle_genre(code);
                    self.listing(Listing::Browse);
                }
            }
            Command::Genre(GenreArg::All) => {
                self.browse.clear_genres();
                self.listing(Listing::Browse);
            }
            Command::Sort(order) => {
                self.browse.set_sort(order);
                self.listing(Listing::Browse);
            }
            Command::Page(arg) => {
                self.turn_page(arg);
                self.listing(Listing::Browse);
            }
            Command::Featured => self.listing(Listing::Featured),
            Command::Stats => self.listing(Listing::Stats),
            Command::Show(id) => self.fetch_show(id),
            Command::Play(arg) => self.play(arg),
            Command::Pause => self.transport(PlayerCommand::Pause),
            Command::Resume => self.transport(PlayerCommand::Resume),
            Command::Toggle => self.transport(PlayerCommand::Toggle),
            Command::Seek(at) => self.transport(PlayerCommand::Seek(at)),
            Command::Forward => self.transport(PlayerCommand::SkipForward),
            Command::Back => self.transport(PlayerCommand::SkipBackward),
            Command::Next => self.step_episode(PlayerCommand::Next),
            Command::Prev => self.step_episode(PlayerCommand::Previous),
            Command::Volume(volume) => {
                self.player.set_volume(volume);
                println!("Volume {:.0}%", volume * 100.0);
            }
            Command::Status => self.print_status(),
            Command::Fav(arg) => self.toggle_favourite(arg),
            Command::Favs => {
                if !self.store.is_authenticated() {
                    println!("Log in to see your favourites.");
                } else {
                    match self.store.favourite_groups() {
                        Ok(groups) => println!("{}", view::favourite_groups(&groups)),
                        Err(e) => println!("{}", e),
                    }
                }
            }
            Command::Progress => match self.store.list_progress() {
                Ok(rows) => println!("{}", view::progress_rows(rows)),
                Err(e) => println!("{}", e),
            },
            Command::Continue => match self.store.continue_listening(CONTINUE_LISTENING_LIMIT) {
                Ok(rows) => println!("{}", view::continue_listening(&rows)),
                Err(e) => println!("{}", e),
            },
            Command::ResetProgress => {
                if !self.store.is_authenticated() {
                    println!("Log in first.");
                } else {
                    println!("Delete all of your listening progress? This cannot be undone. [y/N]");
                    self.pending = Some(Confirm::ResetProgress);
                }
            }
            Command::Login(email) => {
                self.store.sign_in(User::from_email(&email));
                println!("Logged in as {}.", email.trim().to_lowercase());
            }
            Command::Logout => {
                if self.store.is_authenticated() {
                    self.store.sign_out();
                    println!("Logged out.");
                } else {
                    println!("Not logged in.");
                }
            }
            Command::WhoAmI => match self.store.current_user() {
                Some(user) => println!("{}", user.email),
                None => println!("Not logged in."),
            },
            Command::Help => println!("{}", HELP),
            Command::Quit => {
                if !self.player.confirm_exit_required() {
                    return Flow::Exit;
                }
                println!("{} [y/N]", EXIT_WARNING);
                self.pending = Some(Confirm::Quit);
            }
        }
        Flow::Continue
    }

    fn turn_page(&mut self, arg: PageArg) {
        let total_pages = self
            .shows
            .as_ref()
            .map(|shows| self.browse.apply(shows, &self.matcher).total_pages)
            .unwrap_or(1)
            .max(1);
        let current = self.browse.page().min(total_pages);

        let page = match arg {
            PageArg::Number(n) => n,
            PageArg::Next => current + 1,
            PageArg::Previous => current.saturating_sub(1),
        };
        self.browse.set_page(page.clamp(1, total_pages));
    }

    fn play(&mut self, arg: EpisodeArg) {
        let Some(show) = self.open_show.clone() else {
            println!("Open a show first with 'show <id>'.");
            return;
        };
        let (season, index, episode) = match find_episode(&show, arg) {
            Ok(found) => found,
            Err(message) => {
                println!("{}", message);
                return;
            }
        };

        let already_loaded = self.player.currently_playing().is_some_and(|c| {
            c.show.id == show.id && c.season.season == season.season && c.episode_index == index
        });
        if already_loaded {
            self.player.toggle_playback();
        } else {
            self.player.play(&*show, season.clone(), episode.clone(), index);
        }
        self.print_status();
    }

    fn transport(&mut self, command: PlayerCommand) {
        if self.player.currently_playing().is_none() {
            println!("Nothing playing.");
            return;
        }
        self.player.apply(command);
        self.print_status();
    }

    fn step_episode(&mut self, command: PlayerCommand) {
        let Some(before) = self.player.currently_playing().map(|c| c.episode_index) else {
            println!("Nothing playing.");
            return;
        };
        self.player.apply(command);
        if self.player.currently_playing().map(|c| c.episode_index) == Some(before) {
            match command {
                PlayerCommand::Next => println!("Already at the last episode of the season."),
                _ => println!("Already at the first episode of the season."),
            }
            return;
        }
        self.print_status();
    }

    fn print_status(&self) {
        println!(
            "{}",
            view::status(
                self.player.currently_playing(),
                self.player.state(),
                self.player.position(),
                self.player.duration(),
                self.player.volume(),
            )
        );
    }

    fn toggle_favourite(&mut self, arg: Option<EpisodeArg>) {
        if !self.store.is_authenticated() {
            println!("Log in to save favourites ('login <email>').");
            return;
        }

        let favourite = match arg {
            Some(arg) => {
                let Some(show) = self.open_show.clone() else {
                    println!("Open a show first with 'show <id>'.");
                    return;
                };
                match find_episode(&show, arg) {
                    Ok((season, _, episode)) => {
                        new_favourite(&show.id, &show.title, season, episode)
                    }
                    Err(message) => {
                        println!("{}", message);
                        return;
                    }
                }
            }
            None => match self.player.currently_playing() {
                Some(current) => new_favourite(
                    &current.show.id,
                    &current.show.title,
                    &current.season,
                    &current.episode,
                ),
                None => {
                    println!("Nothing playing. Use 'fav <season> <episode>'.");
                    return;
                }
            },
        };

        let title = favourite.episode_title.clone();
        match self.store.toggle_favourite(favourite) {
            Ok(ToggleOutcome::Added) => println!("Added \"{}\" to favourites.", title),
            Ok(ToggleOutcome::Removed) => println!("Removed \"{}\" from favourites.", title),
            Err(e) => println!("{}", e),
        }
    }
}

fn prompt() {
    print!("> ");
    let _ = io::stdout().flush();
}

fn spawn_input_reader(events: Sender<AppEvent>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if events.send(AppEvent::Line(line)).is_err() {
                        return;
                    }
                }
                Err(e) => {
                    warn!("Failed to read input: {}", e);
                    break;
                }
            }
        }
        let _ = events.send(AppEvent::InputClosed);
    });
}

fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[cfg(not(feature = "native-audio"))]
fn create_output(_config: &Config) -> Result<Output, podhut_core::AudioError> {
    Ok(podhut_core::ClockOutput::new())
}

#[cfg(feature = "native-audio")]
fn create_output(config: &Config) -> Result<Output, podhut_core::AudioError> {
    podhut_core::RodioOutput::new(config.http_timeout())
}

fn main() -> ExitCode {
    let config = Config::load();
    init_logging(
        config
            .as_ref()
            .map(|c| c.log_filter.as_str())
            .unwrap_or("info"),
    );
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let data_dir = config.data_dir();
    let backend = match FileBackend::open(&data_dir) {
        Ok(backend) => backend,
        Err(e) => {
            error!("Failed to open data directory {}: {}", data_dir.display(), e);
            return ExitCode::FAILURE;
        }
    };
    let output = match create_output(&config) {
        Ok(output) => output,
        Err(e) => {
            error!("Failed to open audio output: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if !default_config_path().exists() {
        if let Err(e) = config.save() {
            warn!("Failed to write default config: {}", e);
        }
    }
    info!("Catalog at {}, data in {}", config.api_base, data_dir.display());

    let (sender, receiver) = mpsc::channel();
    spawn_input_reader(sender.clone());

    println!("PodHut. Type 'help' for commands.");
    App::new(&config, Store::new(backend), output, sender).run(receiver);
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    #[test]
    fn native_audio_is_on_by_default() {
        let manifest = include_str!("../Cargo.toml");
        assert!(manifest
            .lines()
            .any(|line| line.trim() == r#"default = ["native-audio"]"#));
    }
}
