use chimptype::{
    accounts::{AccountClient, AccountStore, ProfileCache, UsernameCheck},
    app::{App, Control},
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    logging,
    quotes::{ApiQuoteProvider, QuoteLoader, QuoteProvider, QuoteSource},
    runtime::{dispatch, CrosstermEventSource, FixedTicker, Runner},
    ui::screen,
};
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::{Duration, Instant},
};
use tracing::{info, warn};

const TICK_RATE_MS: u64 = 100;

/// typing speed test with local accounts and running averages
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A typing speed test for the terminal. Type the quote, fix your mistakes, and track your words per minute and accuracy as a guest or with a local account."
)]
pub struct Cli {
    /// custom prompt to use instead of a quote
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// never contact the quote service
    #[clap(long)]
    offline: bool,

    /// path to the account database
    #[clap(long)]
    database: Option<PathBuf>,

    /// path to the config file
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// log filter, e.g. `debug` or `chimptype=trace`
    #[clap(long, default_value = logging::DEFAULT_LOG_LEVEL)]
    log_level: String,
}

impl Cli {
    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }

    /// Command line flags take precedence over the config file.
    fn apply_to(&self, config: &mut Config) {
        if self.offline {
            config.offline = true;
        }
        if let Some(path) = &self.database {
            config.database_path = Some(path.clone());
        }
    }
}

fn load_config(cli: &Cli) -> Config {
    let store = cli.config_store();
    let mut config = store.load();
    if !store.exists() {
        match store.save(&config) {
            Ok(()) => info!(path = %store.path().display(), "wrote default config"),
            Err(err) => warn!(error = %err, "could not write default config"),
        }
    }
    cli.apply_to(&mut config);
    config
}

fn quote_source(cli: &Cli, config: &Config) -> QuoteSource {
    let provider: Option<Box<dyn QuoteProvider>> = match config.quote_api_key() {
        Some(key) => {
            match ApiQuoteProvider::new(&config.quote_api_url, key, config.quote_timeout()) {
                Ok(provider) => Some(Box::new(provider)),
                Err(err) => {
                    warn!(error = %err, "quote service disabled");
                    None
                }
            }
        }
        None => {
            info!("no quote service configured, using built-in texts");
            None
        }
    };
    QuoteSource::new(cli.prompt.clone(), provider)
}

fn account_client(config: &Config) -> Option<AccountClient> {
    let path = config.database_path();
    match AccountStore::open(&path) {
        Ok(store) => {
            info!(path = %path.display(), "account database ready");
            Some(AccountClient::spawn(store))
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "accounts disabled");
            None
        }
    }
}

fn build_app(cli: &Cli, config: &Config) -> App {
    App::new(
        QuoteLoader::new(quote_source(cli, config)),
        account_client(config),
        Some(ProfileCache::new()),
        UsernameCheck::new(config.username_check_delay()),
    )
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let _log_guard = AppDirs::log_dir().and_then(|dir| logging::init(&dir, &cli.log_level));
    info!(version = env!("CARGO_PKG_VERSION"), "starting");

    let config = load_config(&cli);
    let mut app = build_app(&cli, &config);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = &result {
        tracing::error!(error = %err, "event loop failed");
    }
    info!("exiting");
    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    loop {
        terminal.draw(|f| screen::draw(app, f))?;

        if dispatch(app, runner.step(), Instant::now()) == Control::Quit {
            return Ok(());
        }
    }
}
