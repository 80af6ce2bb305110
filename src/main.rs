use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use keypulse::{
    analysis::HttpAnalyzer,
    app::{App, Flow},
    app_dirs::AppDirs,
    config::{ConfigStore, FileConfigStore},
    logging::init_tracing,
    runtime::{CrosstermEventSource, FixedTicker, PulseEvent, PulseEventSource, Runner, Ticker},
    TICK_RATE_MS,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing::info;

/// typing-rhythm capture with remote mood analysis
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Type freely: keypulse records the rhythm between your key presses, draws it as a waveform and asks a remote classifier what mood it suggests."
)]
pub struct Cli {
    /// analysis endpoint receiving {data, text} as JSON
    #[clap(short = 'e', long)]
    endpoint: Option<String>,

    /// seconds to wait for the analysis service before giving up
    #[clap(short = 't', long)]
    timeout_secs: Option<u64>,

    /// config file to read instead of the default location
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// persist the effective endpoint and timeout as defaults
    #[clap(long)]
    save_config: bool,

    /// log file (defaults to ~/.local/state/keypulse/keypulse.log)
    #[clap(long)]
    log_file: Option<PathBuf>,

    /// log at debug level
    #[clap(long)]
    debug: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Some(log_path) = cli.log_file.clone().or_else(AppDirs::log_path) {
        // logging is best effort; the TUI still runs without it
        let _ = init_tracing(&log_path, cli.debug);
    }

    let store = match &cli.config {
        Some(path) => FileConfigStore::with_path(path),
        None => FileConfigStore::new(),
    };
    let config = store
        .load()
        .with_overrides(cli.endpoint.clone(), cli.timeout_secs);
    if cli.save_config {
        store.save(&config)?;
        info!(path = %store.path().display(), "saved config");
    }

    let analyzer = HttpAnalyzer::new(config.endpoint.clone(), config.request_timeout())?;
    info!(endpoint = %analyzer.endpoint(), timeout = ?config.request_timeout(), "starting");

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    let mut app = App::new(Arc::new(analyzer), runner.sender());
    let result = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, E: PulseEventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| f.render_widget(&*app, f.area()))?;

    loop {
        match runner.step() {
            PulseEvent::Tick => {
                app.on_tick();
                // only the spinner moves between events
                if app.machine.in_flight().is_none() {
                    continue;
                }
            }
            PulseEvent::Resize => {}
            PulseEvent::Key { key, at } => {
                if app.on_key(key, at) == Flow::Quit {
                    break;
                }
            }
            PulseEvent::Analysis(outcome) => app.on_analysis(outcome),
        }
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;
    }

    info!("exiting");
    Ok(())
}
