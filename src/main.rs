use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::Rect,
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    time::Duration,
};
use tracing::{info, warn};

use quizring::{
    app::{App, Flow},
    app_dirs::AppDirs,
    chart::ChartBasis,
    clock::{Clock, SystemClock},
    config::{Config, ConfigStore, FileConfigStore},
    decks, logging,
    runtime::{CrosstermEventSource, FixedTicker, QuizEvent, QuizEventSource, Runner, Ticker},
    session::{SessionConfig, SessionController},
    store::History,
    ui::results_chart_area,
};

const TICK_RATE_MS: u64 = 50;

/// quiz sessions with streak scoring and a radial per-topic proficiency chart
#[derive(Parser, Debug, Clone)]
#[clap(version, about)]
pub struct Cli {
    /// bundled deck name or path to a deck json file
    #[clap(default_value = "general")]
    deck: String,

    /// test to run from a multi-test deck file (default: the first one)
    #[clap(short = 't', long)]
    test: Option<String>,

    /// list bundled decks and exit
    #[clap(long)]
    list: bool,

    /// seed for question and option order
    #[clap(long)]
    seed: Option<u64>,

    /// pause after a correct answer, in milliseconds
    #[clap(long)]
    delay_ms: Option<u64>,

    /// start with the dark chart palette
    #[clap(long)]
    dark: bool,

    /// tally that drives sector radius on the results chart
    #[clap(long, value_enum)]
    chart_basis: Option<ChartBasis>,

    /// do not write results to the history database or csv log
    #[clap(long)]
    no_save: bool,
}

impl Cli {
    /// Apply command line overrides on top of the stored configuration.
    fn apply(&self, mut config: Config) -> Config {
        if let Some(ms) = self.delay_ms {
            config.advance_delay_ms = ms;
        }
        if self.dark {
            config.dark_mode = true;
        }
        if let Some(basis) = self.chart_basis {
            config.chart_basis = basis;
        }
        config
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if cli.list {
        for name in decks::bundled_names() {
            println!("{name}");
        }
        return Ok(());
    }

    let _log_guard = logging::init(AppDirs::log_dir().as_deref());

    let config_store = FileConfigStore::new();
    let stored = config_store.load();
    let config = cli.apply(stored.clone());

    let deck = match decks::resolve(&cli.deck, cli.test.as_deref()) {
        Ok(deck) => deck,
        Err(err) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::InvalidValue, err.to_string()).exit();
        }
    };

    let session_config = SessionConfig::from(&config);
    let session = match cli.seed {
        Some(seed) => SessionController::with_seed(session_config, SystemClock, seed),
        None => SessionController::new(session_config, SystemClock),
    };
    let mut app = match App::new(deck, config, session) {
        Ok(app) => app,
        Err(err) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::InvalidValue, err.to_string()).exit();
        }
    };

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut history = if cli.no_save {
        History::default()
    } else {
        History::open_default()
    };

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    let result = start_tui(&mut terminal, &mut app, &runner, &mut history);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if app.is_dark() != stored.dark_mode {
        let updated = Config {
            dark_mode: app.is_dark(),
            ..stored
        };
        if let Err(err) = config_store.save(&updated) {
            warn!(error = %err, "could not save config");
        }
    }

    result
}

fn start_tui<B: Backend, E: QuizEventSource, T: Ticker, C: Clock>(
    terminal: &mut Terminal<B>,
    app: &mut App<C>,
    runner: &Runner<E, T>,
    history: &mut History,
) -> Result<(), Box<dyn Error>> {
    loop {
        let size = terminal.size()?;
        app.sync_chart_area(results_chart_area(Rect::new(0, 0, size.width, size.height)));
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        let flow = match runner.step() {
            QuizEvent::Tick => app.on_tick(),
            QuizEvent::Resize => Flow::Continue,
            QuizEvent::Mouse { column, row } => {
                app.on_mouse(column, row);
                Flow::Continue
            }
            QuizEvent::Key(key) => app.handle_key(key),
        };

        match flow {
            Flow::Continue => {}
            Flow::Finished => finish(app, history),
            Flow::Quit => break,
        }
    }

    Ok(())
}

/// Look up the previous best, then persist the run that just ended.
fn finish<C: Clock>(app: &mut App<C>, history: &mut History) {
    let Some(summary) = app.summary() else {
        return;
    };
    app.set_personal_best(history.best_points(&summary.test_id));

    match history.record(&summary, &app.config) {
        Ok(true) => info!(test_id = %summary.test_id, "new achievement"),
        Ok(false) => {}
        Err(err) => warn!(error = %err, "could not record session"),
    }
}
