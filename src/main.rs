mod ui;

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
    time::Instant,
};

use keypace::{
    app::{Action, App, Settings},
    app_dirs::AppDirs,
    best_score::{FileStore, KeyValueStore, MemoryStore},
    config::{Config, ConfigStore, FileConfigStore},
    logging,
    passage::{Difficulty, PassageLibrary},
    runtime::{AppEvent, CrosstermEventSource, EventSource, FixedTicker, Runner, Ticker},
    session::Mode,
};

/// minimal typing speed test with live wpm, accuracy and a personal best
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Type a passage against the clock. Live WPM and accuracy while you type, a results screen when you finish, and a personal best kept between runs."
)]
pub struct Cli {
    /// passage difficulty (defaults to the last one used)
    #[clap(short = 'd', long, value_enum)]
    difficulty: Option<Difficulty>,

    /// timed (60 seconds) or full passage (defaults to the last one used)
    #[clap(short = 'm', long, value_enum)]
    mode: Option<Mode>,

    /// custom passage to type instead of a built-in one
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// do not read or write the personal best on disk
    #[clap(long)]
    no_save: bool,

    /// write debug logs to the state directory (also enabled by KEYPACE_LOG)
    #[clap(long)]
    log: bool,
}

impl Cli {
    /// Saved choices overridden by whatever was passed on the command line.
    fn to_settings(&self, saved: Config) -> Settings {
        Settings {
            difficulty: self.difficulty.unwrap_or(saved.difficulty),
            mode: self.mode.unwrap_or(saved.mode),
            prompt: self.prompt.clone(),
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let _log_guard = if cli.log || logging::requested_by_env() {
        Some(logging::init_file_logging(&AppDirs::log_path())?)
    } else {
        None
    };

    let config_store = FileConfigStore::new();
    let settings = cli.to_settings(config_store.load());

    let store: Box<dyn KeyValueStore> = if cli.no_save {
        Box::new(MemoryStore::new())
    } else {
        Box::new(FileStore::with_path(AppDirs::best_score_path()))
    };

    let mut app = App::new(settings, PassageLibrary::load()?, store)?;

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());
    let res = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    if let Err(e) = config_store.save(&Config::from(&app.settings)) {
        tracing::warn!(error = %e, "could not save config");
    }

    res
}

fn start_tui<B: Backend, E: EventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    draw(terminal, app)?;

    while let Some(event) = runner.step() {
        match event {
            AppEvent::Tick => app.on_tick(Instant::now()),
            AppEvent::Resize => {}
            AppEvent::Key(key) => {
                if app.on_key(key, Instant::now()) == Action::Quit {
                    break;
                }
            }
        }

        // one timer, alive only while a run is in progress
        if app.wants_ticks() {
            runner.arm(Instant::now());
        } else {
            runner.cancel();
        }

        draw(terminal, app)?;
    }

    Ok(())
}

fn draw<B: Backend>(terminal: &mut Terminal<B>, app: &App) -> io::Result<()> {
    terminal.draw(|f| f.render_widget(ui::AppView::new(app), f.area()))?;
    Ok(())
}
