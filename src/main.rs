use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod cli_style;

use betterboxd::catalog_store::{CatalogStore, CrewCredit, Movie, MovieDraft};
use betterboxd::collection::{Collection, CollectionId, CollectionStore};
use betterboxd::config::{AppConfig, CliConfig, FileConfig, LoggingLevel};
use betterboxd::error::StoreError;
use betterboxd::stores::Stores;
use betterboxd::user::{AccountId, AccountStore, PasswordDigest, Session};
use betterboxd::validation::ValidationError;
use cli_style::{
    get_styles, print_banner, print_empty_list, print_error, print_info, print_key_value,
    print_ranked_item, print_section_header, print_success, stars, PROMPT,
};

use rustyline::{
    completion::Completer, highlight::Highlighter, history::FileHistory, validate::Validator,
    CompletionType, Config, Editor, Helper,
};
use tracing::{debug, error, info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(styles = get_styles(), version, about = "Catalog, rate and rank the movies you watch")]
struct CliArgs {
    /// TOML config file. Its values take precedence over the flags below.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// SQLite database file, created if missing.
    #[clap(long, value_parser = parse_path)]
    pub db_path: Option<PathBuf>,

    #[clap(long, value_enum)]
    pub logging_level: Option<LoggingLevel>,

    /// Where the shell history is kept. Defaults to the database directory.
    #[clap(long, value_parser = parse_path)]
    pub history_path: Option<PathBuf>,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            db_path: self.db_path.clone(),
            logging_level: self.logging_level,
            history_path: self.history_path.clone(),
        }
    }
}

#[derive(Parser)]
#[command(styles = get_styles(), name = "")]
struct InnerCli {
    #[command(subcommand)]
    command: InnerCommand,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SearchField {
    Title,
    Crew,
    Score,
    Genre,
}

#[derive(Subcommand)]
enum InnerCommand {
    /// Creates an account and logs into it.
    Signup { username: String, password: String },

    /// Logs into an existing account.
    Login { username: String, password: String },

    Logout,

    /// Shows the logged in user.
    Whoami,

    /// Adds a movie to the catalog.
    AddMovie {
        title: String,

        /// Run time in minutes.
        #[arg(long)]
        runtime: i64,

        /// Crew credit, repeatable, e.g. --crew "Henry Mancini=Composer".
        #[arg(long = "crew", value_name = "NAME=ROLE,ROLE")]
        crew: Vec<String>,

        /// Song of the score, repeatable, in track order.
        #[arg(long = "song")]
        songs: Vec<String>,

        #[arg(long = "genre")]
        genres: Vec<String>,
    },

    /// Shows a movie by title.
    Show {
        title: String,

        /// Print the movie as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Rates a movie you watched (0 to 5), optionally with a short review.
    Log {
        title: String,
        rating: f64,
        review: Option<String>,
    },

    /// Searches the catalog.
    Search {
        #[arg(value_enum)]
        field: SearchField,
        term: String,
    },

    /// Sets your favorite movie.
    Favorite { title: String },

    /// Changes your password.
    Passwd { password: String },

    /// Deletes your account, its lists and reviews.
    DeleteAccount { password: String },

    /// Shows your lists.
    Lists,

    /// Creates a ranked list from movie titles, best first.
    ListCreate { name: String, titles: Vec<String> },

    ListShow { id: CollectionId },

    ListRename { id: CollectionId, name: String },

    /// Inserts a movie at the given rank (1 is the top).
    ListInsert {
        id: CollectionId,
        title: String,
        rank: usize,
    },

    /// Moves the movie at rank FROM to rank TO.
    ListMove {
        id: CollectionId,
        from: usize,
        to: usize,
    },

    ListDelete { id: CollectionId },

    /// Close this program.
    Exit,
}

enum CommandExecutionResult {
    Continue,
    Exit,
    Error(String),
}

/// Parses "Name=Role1,Role2". A bare name gets no roles.
fn parse_credit(s: &str) -> CrewCredit {
    match s.split_once('=') {
        Some((name, roles)) => CrewCredit::new(
            name.trim(),
            roles
                .split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty()),
        ),
        None => CrewCredit::new(s.trim(), Vec::<String>::new()),
    }
}

fn rank_to_index(rank: usize, len: usize) -> Result<usize, StoreError> {
    if rank == 0 || rank > len {
        return Err(ValidationError::RankOutOfRange { rank, max: len }.into());
    }
    Ok(rank - 1)
}

fn display_movie(movie: &Movie) {
    print_section_header(&movie.title);
    print_key_value("ID", &movie.id.to_string());
    print_key_value("Run time", &format!("{} min", movie.runtime));
    if !movie.genres.is_empty() {
        print_key_value("Genres", &movie.genres.join(", "));
    }
    for (name, roles) in &movie.crew {
        let roles: Vec<&str> = roles.iter().map(String::as_str).collect();
        print_key_value(name, &roles.join(", "));
    }
    print_key_value("Score by", movie.composer());
    for song in &movie.score.songs {
        print_ranked_item(song.track_number as usize, &song.title);
    }
    print_key_value(
        "Rating",
        &format!(
            "{} ({} ratings)",
            stars(movie.calculate_rating()),
            movie.rating_count
        ),
    );
    let review_count: usize = movie.reviews.values().map(Vec::len).sum();
    if review_count > 0 {
        print_key_value("Reviews", &review_count.to_string());
    }
}

fn display_movie_list(movies: &[Movie]) {
    if movies.is_empty() {
        print_empty_list("No movies found.");
        return;
    }
    for (idx, movie) in movies.iter().enumerate() {
        print_ranked_item(
            idx + 1,
            &format!("{} ({} min) {}", movie.title, movie.runtime, stars(movie.calculate_rating())),
        );
    }
}

struct Shell {
    stores: Stores,
    session: Session,
}

impl Shell {
    fn new(stores: Stores) -> Self {
        Self {
            stores,
            session: Session::new(),
        }
    }

    fn prompt(&self) -> String {
        match self.session.user() {
            Some(user) => format!("{}@{}", user.username, PROMPT),
            None => PROMPT.to_string(),
        }
    }

    fn require_user(&self) -> Result<AccountId, StoreError> {
        self.session.user_id().ok_or(StoreError::NoActiveSession)
    }

    fn movie_by_title(&self, title: &str) -> Result<Movie, StoreError> {
        self.stores
            .catalog
            .find_by_title_exact(title)?
            .ok_or_else(|| StoreError::NotFound {
                entity: "movie",
                key: title.to_string(),
            })
    }

    fn owned_collection(&self, id: CollectionId) -> Result<Collection, StoreError> {
        let account_id = self.require_user()?;
        let collection = self
            .stores
            .collections
            .get(id)?
            .ok_or_else(|| StoreError::NotFound {
                entity: "collection",
                key: id.to_string(),
            })?;
        if collection.owner != account_id {
            return Err(StoreError::NotOwner {
                collection_id: id,
                account_id,
            });
        }
        Ok(collection)
    }

    fn execute_command(&mut self, line: String) -> CommandExecutionResult {
        if line.trim().is_empty() {
            return CommandExecutionResult::Continue;
        }

        let args = shlex::split(&line)
            .unwrap_or_else(|| line.split_whitespace().map(String::from).collect());

        let cli =
            InnerCli::try_parse_from(std::iter::once(" ").chain(args.iter().map(String::as_str)));

        match cli {
            Ok(cli) => match self.run(cli.command) {
                Ok(result) => result,
                Err(err) => {
                    if !err.is_recoverable() {
                        error!("Command '{}' failed: {:?}", line, err);
                    }
                    CommandExecutionResult::Error(err.to_string())
                }
            },
            Err(e) => {
                if e.print().is_err() {
                    println!("{}", e);
                }
                CommandExecutionResult::Continue
            }
        }
    }

    fn run(&mut self, command: InnerCommand) -> Result<CommandExecutionResult, StoreError> {
        match command {
            InnerCommand::Signup { username, password } => {
                let digest = PasswordDigest::from_plaintext(&password)?;
                let user = self.stores.accounts.create(&username, &digest)?;
                self.stores
                    .accounts
                    .set_session(&mut self.session, &user.username)?;
                print_success(&format!("Welcome, {}!", user.username));
            }
            InnerCommand::Login { username, password } => {
                if !self.stores.accounts.exists(&username)? {
                    return Err(StoreError::NotFound {
                        entity: "account",
                        key: username,
                    });
                }
                let digest = PasswordDigest::from_plaintext(&password)?;
                if !self.stores.accounts.verify(&username, &digest)? {
                    return Ok(CommandExecutionResult::Error(
                        "Incorrect password.".to_string(),
                    ));
                }
                self.stores
                    .accounts
                    .set_session(&mut self.session, &username)?;
                if let Some(user) = self.session.user() {
                    print_success(&format!("Welcome back, {}!", user.username));
                }
            }
            InnerCommand::Logout => match self.session.logout() {
                Some(user) => print_success(&format!("See you soon, {}.", user.username)),
                None => print_info("Nobody is logged in."),
            },
            InnerCommand::Whoami => {
                self.stores.accounts.refresh_session(&mut self.session)?;
                let user = self.session.user().ok_or(StoreError::NoActiveSession)?;
                print_section_header(&user.username);
                let favorite = match user.favorite_movie_id {
                    Some(movie_id) => self
                        .stores
                        .catalog
                        .get_by_id(movie_id)?
                        .map(|m| m.title)
                        .unwrap_or_else(|| "-".to_string()),
                    None => "-".to_string(),
                };
                print_key_value("Favorite movie", &favorite);
                print_key_value("Lists", &user.collections.len().to_string());
            }
            InnerCommand::AddMovie {
                title,
                runtime,
                crew,
                songs,
                genres,
            } => {
                let draft = MovieDraft {
                    title,
                    runtime,
                    genres,
                    crew: crew.iter().map(|c| parse_credit(c)).collect(),
                    score: songs,
                };
                let movie = self.stores.catalog.insert(&draft)?;
                print_success(&format!("Added '{}' to the catalog.", movie.title));
                display_movie(&movie);
            }
            InnerCommand::Show { title, json } => {
                let movie = self.movie_by_title(&title)?;
                if json {
                    match serde_json::to_string_pretty(&movie) {
                        Ok(json) => println!("{}", json),
                        Err(err) => return Ok(CommandExecutionResult::Error(err.to_string())),
                    }
                } else {
                    display_movie(&movie);
                }
            }
            InnerCommand::Log {
                title,
                rating,
                review,
            } => {
                let movie = self.movie_by_title(&title)?;
                let review = review.filter(|r| !r.trim().is_empty());
                let average =
                    self.stores
                        .catalog
                        .add_log(&self.session, movie.id, rating, review.as_deref())?;
                print_success(&format!(
                    "Logged '{}', it now averages {}.",
                    movie.title,
                    stars(average)
                ));
            }
            InnerCommand::Search { field, term } => {
                let catalog = &self.stores.catalog;
                let movies = match field {
                    SearchField::Title => catalog.find_by_title_inexact(&term)?,
                    SearchField::Crew => catalog.find_by_crew_inexact(&term)?,
                    SearchField::Score => catalog.find_by_score_inexact(&term)?,
                    SearchField::Genre => catalog.find_by_genre_exact(&term)?,
                };
                display_movie_list(&movies);
            }
            InnerCommand::Favorite { title } => {
                let account_id = self.require_user()?;
                let movie = self.movie_by_title(&title)?;
                self.stores
                    .accounts
                    .set_favorite_movie(account_id, Some(movie.id))?;
                self.stores.accounts.refresh_session(&mut self.session)?;
                print_success(&format!("'{}' is now your favorite movie.", movie.title));
            }
            InnerCommand::Passwd { password } => {
                let account_id = self.require_user()?;
                let digest = PasswordDigest::from_plaintext(&password)?;
                self.stores.accounts.set_password(account_id, &digest)?;
                self.stores.accounts.refresh_session(&mut self.session)?;
                print_success("Password changed.");
            }
            InnerCommand::DeleteAccount { password } => {
                let user = self
                    .session
                    .user()
                    .ok_or(StoreError::NoActiveSession)?
                    .clone();
                let digest = PasswordDigest::from_plaintext(&password)?;
                if !self.stores.accounts.verify(&user.username, &digest)? {
                    return Ok(CommandExecutionResult::Error(
                        "Incorrect password.".to_string(),
                    ));
                }
                self.stores.accounts.delete(&mut self.session, user.id)?;
                print_success(&format!("Account '{}' deleted.", user.username));
            }
            InnerCommand::Lists => {
                let account_id = self.require_user()?;
                let collections = self.stores.collections.list_for_owner(account_id)?;
                if collections.is_empty() {
                    print_empty_list("You have no lists yet, create one with list-create.");
                }
                for collection in collections {
                    print_key_value(
                        &format!("#{}", collection.id),
                        &format!("{} ({} movies)", collection.name, collection.len()),
                    );
                }
            }
            InnerCommand::ListCreate { name, titles } => {
                let account_id = self.require_user()?;
                let movie_ids = titles
                    .iter()
                    .map(|title| self.movie_by_title(title).map(|m| m.id))
                    .collect::<Result<Vec<_>, _>>()?;
                let collection = self
                    .stores
                    .collections
                    .create(account_id, &name, &movie_ids)?;
                self.stores.accounts.refresh_session(&mut self.session)?;
                print_success(&format!(
                    "Created list #{} '{}'.",
                    collection.id, collection.name
                ));
            }
            InnerCommand::ListShow { id } => {
                let collection = self.owned_collection(id)?;
                let entries = self
                    .stores
                    .collections
                    .render(collection.id, &self.stores.catalog)?;
                print_section_header(&collection.name);
                if entries.is_empty() {
                    print_empty_list("This list is empty.");
                }
                for entry in entries {
                    print_ranked_item(entry.rank, &entry.title);
                }
            }
            InnerCommand::ListRename { id, name } => {
                self.owned_collection(id)?;
                let collection = self.stores.collections.rename(id, &name)?;
                self.stores.accounts.refresh_session(&mut self.session)?;
                print_success(&format!("List #{} renamed to '{}'.", id, collection.name));
            }
            InnerCommand::ListInsert { id, title, rank } => {
                self.owned_collection(id)?;
                let movie = self.movie_by_title(&title)?;
                self.stores.collections.insert_at_rank(id, movie.id, rank)?;
                self.stores.accounts.refresh_session(&mut self.session)?;
                print_success(&format!("'{}' is now #{}.", movie.title, rank));
            }
            InnerCommand::ListMove { id, from, to } => {
                let collection = self.owned_collection(id)?;
                let from_index = rank_to_index(from, collection.len())?;
                let to_index = rank_to_index(to, collection.len())?;
                self.stores
                    .collections
                    .move_entry(id, from_index, to_index)?;
                self.stores.accounts.refresh_session(&mut self.session)?;
                print_success(&format!("Moved #{} to #{}.", from, to));
            }
            InnerCommand::ListDelete { id } => {
                let account_id = self.require_user()?;
                if self.stores.collections.delete(account_id, id)? {
                    self.stores.accounts.refresh_session(&mut self.session)?;
                    print_success(&format!("List #{} deleted.", id));
                } else {
                    print_info(&format!("There is no list #{}.", id));
                }
            }
            InnerCommand::Exit => return Ok(CommandExecutionResult::Exit),
        }
        Ok(CommandExecutionResult::Continue)
    }
}

#[derive(rustyline_derive::Hinter)]
struct ShellHelper {
    commands_names: Vec<String>,
}

impl ShellHelper {
    pub fn new() -> Self {
        let commands_names: Vec<String> = InnerCli::command()
            .get_subcommands()
            .map(|sc| sc.get_name().to_string())
            .collect();

        ShellHelper { commands_names }
    }
}

impl Completer for ShellHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        _pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        if line.contains(' ') {
            return Ok((0, Vec::with_capacity(0)));
        }
        let matches = self
            .commands_names
            .iter()
            .filter(|c| c.starts_with(line))
            .cloned()
            .collect::<Vec<_>>();

        Ok((0, matches))
    }
}

impl Highlighter for ShellHelper {}
impl Validator for ShellHelper {}
impl Helper for ShellHelper {}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();
    let file_config = cli_args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::from(config.logging_level).into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to install the tracing subscriber")?;

    let stores = Stores::open(&config.db_path)?;
    info!("Opened database {:?}", config.db_path);
    let mut shell = Shell::new(stores);

    let rl_config = Config::builder()
        .completion_type(CompletionType::List)
        .build();
    let mut rl = Editor::<ShellHelper, FileHistory>::with_config(rl_config)?;
    rl.set_helper(Some(ShellHelper::new()));
    if rl.load_history(&config.history_path).is_err() {
        debug!("No shell history at {:?}", config.history_path);
    }

    print_banner(&config.db_path.display().to_string());

    loop {
        match rl.readline(&shell.prompt()) {
            Ok(line) => {
                let _ = rl.add_history_entry(&line);
                match shell.execute_command(line) {
                    CommandExecutionResult::Continue => {}
                    CommandExecutionResult::Exit => break,
                    CommandExecutionResult::Error(err) => print_error(&err),
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("CTRL-D: exiting.");
                break;
            }
            Err(e) => {
                println!("Error: {:?}", e);
                break;
            }
        }
    }

    if let Err(err) = rl.save_history(&config.history_path) {
        warn!("Could not save shell history: {}", err);
    }
    Ok(())
}
