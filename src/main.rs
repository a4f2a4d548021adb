use std::{
    error::Error,
    fs,
    io::{self, stdin, Write},
    path::{Path, PathBuf},
    sync::{mpsc::Receiver, Arc},
    time::Duration,
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
use tracing::{info, warn};

use studytimer::{
    app::{App, Flow},
    app_dirs::AppDirs,
    clock::{Clock, CLOCK_INTERVAL},
    config::{ConfigStore, FileConfigStore},
    export::write_sessions_csv,
    i18n::Locale,
    logging, report,
    runtime::{AppEvent, AppEventSource, CrosstermEventSource, FixedTicker, Runner, Ticker},
    store::{FileKeyValueStore, HistoryStore, KeyValueStore, LocaleStore, MemoryKeyValueStore},
    tracker::{SessionTracker, TodaySummary, TrackerChange},
    ui,
    util::today_key,
};

const TICK_RATE_MS: u64 = 250;

/// minimal focus timer that adds up study time per day
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A manual start/stop focus timer. Saving folds the current session into today's total; history is kept per day in local storage."
)]
pub struct Cli {
    /// label language, remembered for later runs
    #[clap(short = 'l', long, value_enum)]
    lang: Option<Locale>,

    /// directory holding history and language files
    #[clap(long)]
    state_dir: Option<PathBuf>,

    /// print today's total and the daily history, then exit
    #[clap(long)]
    print_history: bool,

    /// write every saved session to a CSV file, then exit
    #[clap(long, value_name = "PATH")]
    export_csv: Option<PathBuf>,

    /// log level for the log files (trace, debug, info, warn, error)
    #[clap(long)]
    log_level: Option<String>,

    /// config file to use instead of the platform default
    #[clap(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

impl Cli {
    fn is_batch(&self) -> bool {
        self.print_history || self.export_csv.is_some()
    }
}

/// File store in `dir`, or an in-memory one when the directory can't be created
fn open_store(dir: &Path) -> Arc<dyn KeyValueStore> {
    match fs::create_dir_all(dir) {
        Ok(()) => Arc::new(FileKeyValueStore::new(dir)),
        Err(e) => {
            warn!(
                "state directory {} unusable, keeping data in memory: {e}",
                dir.display()
            );
            Arc::new(MemoryKeyValueStore::new())
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config_store = cli
        .config
        .as_ref()
        .map(FileConfigStore::with_path)
        .unwrap_or_default();
    let config = config_store.load();

    let state_dir = cli
        .state_dir
        .clone()
        .unwrap_or_else(|| config.resolved_state_dir());
    let log_level = cli.log_level.clone().or_else(|| config.log_level.clone());
    // the timer works without logs
    let _ = logging::enable_logging(&AppDirs::log_dir(&state_dir), log_level.as_deref());

    let kv = open_store(&state_dir);

    // batch runs only read
    if cli.is_batch() {
        return run_batch(&cli, kv);
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    match config_store.init_if_missing() {
        Ok(true) => info!(path = %config_store.path().display(), "wrote default config"),
        Ok(false) => {}
        Err(e) => warn!("could not write default config: {e}"),
    }

    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    let clock = Clock::new(runner.sender(), CLOCK_INTERVAL);
    let mut tracker = SessionTracker::new(kv, clock, cli.lang);
    let changes = tracker.subscribe();
    let mut app = App::new(tracker, config.confirm_clear);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app, &runner, &changes);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // stops the timer thread before exit
    drop(app);
    info!("exiting");
    result
}

/// `--print-history` and `--export-csv`. Reads the stores, never writes them.
fn run_batch(cli: &Cli, kv: Arc<dyn KeyValueStore>) -> Result<(), Box<dyn Error>> {
    let history = HistoryStore::new(kv.clone()).load();

    if cli.print_history {
        let locale = Locale::resolve(cli.lang, LocaleStore::new(kv).load());
        let today = TodaySummary::for_date(&history, &today_key());
        let text = report::render_text(&history, &today, locale);
        io::stdout().write_all(text.as_bytes())?;
    }

    if let Some(path) = &cli.export_csv {
        let file = fs::File::create(path)?;
        let rows = write_sessions_csv(&history, file)?;
        info!(rows, path = %path.display(), "exported sessions");
    }

    Ok(())
}

fn start_tui<B: Backend, E: AppEventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
    changes: &Receiver<TrackerChange>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| ui::draw(app, f))?;
    let mut drawn_for = app.tracker.today_key();

    loop {
        let event = runner.step();
        let is_input = matches!(event, AppEvent::Key(_) | AppEvent::Resize);

        if app.on_event(event) == Flow::Quit {
            break;
        }

        // redraw on input, on any tracker change, and when the date rolls over
        let changed = changes.try_iter().count() > 0;
        let today = app.tracker.today_key();
        if is_input || changed || today != drawn_for {
            terminal.draw(|f| ui::draw(app, f))?;
            drawn_for = today;
        }
    }

    Ok(())
}
